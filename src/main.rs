//! Headless frame renderer.
//!
//! ```text
//! neocxr-render <image> [annotations.json] [out.png]
//! ```
//!
//! Opens the image fitted at its native size, replays the annotations (either
//! a saved submission or a bare list of items) and writes the frame as PNG.
//! Logging follows the config file level; `RUST_LOG` overrides it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use neocxr::data::{FileImageSource, ImageSource};
use neocxr::error::PersistenceError;
use neocxr::format::{MemorySink, PersistenceSink, Submission, SubmissionMeta, WireAnnotation};
use neocxr::render::PixmapCanvas;
use neocxr::{AppConfig, ViewingSession};

/// Task id used to replay annotations through the in-memory sink.
const REPLAY_TASK: &str = "replay";

#[derive(Parser)]
#[command(name = "neocxr-render", about = "Render a radiograph with its annotations to PNG")]
#[command(version)]
struct Args {
    /// Image file to render
    image: PathBuf,

    /// Saved submission or list of annotation items to replay
    annotations: Option<PathBuf>,

    /// Output PNG (defaults to `<image>.frame.png`)
    output: Option<PathBuf>,
}

impl Args {
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.image.with_extension("frame.png"))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = AppConfig::load_from_default_path().unwrap_or_default();

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match pollster::block_on(run(config, &args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ {}", e);
            eprintln!("neocxr-render: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig, args: &Args) -> neocxr::Result<()> {
    let root = args
        .image
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let id = args
        .image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let source = FileImageSource::new(root);

    // Render at the image's native size
    let frame = source.resolve(id).await?;
    let (width, height) = (frame.width() as u32, frame.height() as u32);
    let mut session = ViewingSession::new(config, frame.size());
    let token = session.begin_load(id);
    session.finish_load(token, Ok(frame))?;

    if let Some(path) = &args.annotations {
        let items = read_annotations(path)?;
        let sink = MemorySink::new();
        sink.submit(&Submission::new(REPLAY_TASK, items, SubmissionMeta::default()))
            .await?;
        session.set_task_id(Some(REPLAY_TASK.to_string()));
        let count = session.load_existing(&sink).await?;
        log::info!("Replayed {} annotations from {:?}", count, path);
    }

    let mut canvas = PixmapCanvas::new(width, height)?;
    session.render(&mut canvas);
    let output = args.output_path();
    canvas.save_png(&output)?;
    log::info!("💾 Wrote {}x{} frame to {:?}", width, height, output);
    Ok(())
}

/// Accepts a saved submission or a bare array of items.
fn read_annotations(path: &Path) -> Result<Vec<WireAnnotation>, PersistenceError> {
    let json = std::fs::read_to_string(path)?;
    if let Ok(submission) = serde_json::from_str::<Submission>(&json) {
        return Ok(submission.items);
    }
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_defaults_next_to_image() {
        let args = Args::try_parse_from(["neocxr-render", "cases/chest.npy"]).unwrap();
        assert_eq!(args.annotations, None);
        assert_eq!(args.output_path(), PathBuf::from("cases/chest.frame.png"));
    }

    #[test]
    fn test_all_positionals() {
        let args =
            Args::try_parse_from(["neocxr-render", "chest.png", "items.json", "out.png"]).unwrap();
        assert_eq!(args.annotations, Some(PathBuf::from("items.json")));
        assert_eq!(args.output_path(), PathBuf::from("out.png"));
    }

    #[test]
    fn test_missing_and_extra_arguments_rejected() {
        assert!(Args::try_parse_from(["neocxr-render"]).is_err());
        assert!(Args::try_parse_from(["neocxr-render", "a", "b", "c", "d"]).is_err());
    }
}
