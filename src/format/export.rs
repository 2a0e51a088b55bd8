//! Zip export bundle: manifest, annotations and a label mask.
//!
//! Layout:
//! - `manifest.json` - image and class metadata
//! - `annotations.json` - wire-form annotations in commit order
//! - `mask.png` - 8-bit label mask (pixel value = class id)

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::color::Color;
use crate::error::ExportError;
use crate::model::{Annotation, Taxonomy};

use super::mask::{mask_to_image, rasterize_label_mask};
use super::wire::WireAnnotation;

/// Bundle format identifier written into the manifest.
pub const BUNDLE_FORMAT: &str = "neocxr-bundle";

/// Bundle format version.
pub const BUNDLE_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ANNOTATIONS_FILE: &str = "annotations.json";
pub const MASK_FILE: &str = "mask.png";

/// Class entry in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestClass {
    pub id: u32,
    pub name: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub format: String,
    pub version: u32,
    pub image_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub image_width: u32,
    pub image_height: u32,
    pub annotation_count: usize,
    pub classes: Vec<ManifestClass>,
    pub files: Vec<String>,
}

/// What to export.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub image_id: &'a str,
    pub task_id: Option<&'a str>,
    pub image_width: u32,
    pub image_height: u32,
    pub annotations: &'a [Annotation],
    pub taxonomy: &'a Taxonomy,
}

impl ExportRequest<'_> {
    fn manifest(&self) -> ExportManifest {
        let used: BTreeSet<u32> = self.annotations.iter().map(|a| a.class_id()).collect();
        let classes = used
            .into_iter()
            .map(|id| match self.taxonomy.get(id) {
                Some(c) => ManifestClass {
                    id,
                    name: c.name.clone(),
                    color: c.color,
                },
                None => ManifestClass {
                    id,
                    name: format!("class {}", id),
                    color: self
                        .annotations
                        .iter()
                        .find(|a| a.class_id() == id)
                        .map(|a| a.color())
                        .unwrap_or_default(),
                },
            })
            .collect();

        ExportManifest {
            format: BUNDLE_FORMAT.to_string(),
            version: BUNDLE_VERSION,
            image_id: self.image_id.to_string(),
            task_id: self.task_id.map(str::to_string),
            image_width: self.image_width,
            image_height: self.image_height,
            annotation_count: self.annotations.len(),
            classes,
            files: vec![
                MANIFEST_FILE.to_string(),
                ANNOTATIONS_FILE.to_string(),
                MASK_FILE.to_string(),
            ],
        }
    }
}

/// Write a bundle into any seekable writer.
pub fn write_bundle<W: Write + Seek>(
    writer: W,
    request: &ExportRequest<'_>,
) -> Result<ExportManifest, ExportError> {
    let manifest = request.manifest();
    let items: Vec<WireAnnotation> = request.annotations.iter().map(WireAnnotation::from).collect();

    let mask = rasterize_label_mask(
        request.annotations,
        request.image_width as usize,
        request.image_height as usize,
    );
    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(mask_to_image(&mask))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file(MANIFEST_FILE, options)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    zip.start_file(ANNOTATIONS_FILE, options)?;
    zip.write_all(serde_json::to_string_pretty(&items)?.as_bytes())?;

    // PNG is already compressed
    zip.start_file(
        MASK_FILE,
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )?;
    zip.write_all(&png)?;

    zip.finish()?;

    log::info!(
        "📦 Exported {} annotations for '{}' ({}x{})",
        manifest.annotation_count,
        manifest.image_id,
        manifest.image_width,
        manifest.image_height
    );
    Ok(manifest)
}

/// Write a bundle to a file. Refuses to replace an existing file unless `overwrite` is set.
pub fn export_bundle_to_path(
    path: &Path,
    request: &ExportRequest<'_>,
    overwrite: bool,
) -> Result<ExportManifest, ExportError> {
    if path.exists() && !overwrite {
        return Err(ExportError::TargetExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_bundle(file, request)
}

/// Read the manifest and annotations back from a bundle.
pub fn read_bundle<R: Read + Seek>(
    reader: R,
) -> Result<(ExportManifest, Vec<WireAnnotation>), ExportError> {
    let mut archive = ZipArchive::new(reader)?;

    let mut read_entry = |name: &str| -> Result<String, ExportError> {
        let mut entry = archive.by_name(name)?;
        let mut text = String::with_capacity(entry.size() as usize);
        entry.read_to_string(&mut text)?;
        Ok(text)
    };

    let manifest: ExportManifest = serde_json::from_str(&read_entry(MANIFEST_FILE)?)?;
    let items: Vec<WireAnnotation> = serde_json::from_str(&read_entry(ANNOTATIONS_FILE)?)?;
    Ok((manifest, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{AnnotationId, AnnotationShape, Polarity, Timestamp, default_classes};

    fn annotations() -> Vec<Annotation> {
        let stroke = AnnotationShape::stroke(
            Polarity::Positive,
            2.0,
            vec![Point::new(4.0, 4.0), Point::new(8.0, 4.0)],
        )
        .unwrap();
        let line =
            AnnotationShape::polyline(vec![Point::new(0.0, 10.0), Point::new(15.0, 10.0)], false)
                .unwrap();
        vec![
            Annotation::new(AnnotationId(1), 1, Color::RED, Timestamp(0), stroke),
            Annotation::new(AnnotationId(2), 42, Color::WHITE, Timestamp(1), line),
        ]
    }

    #[test]
    fn test_bundle_round_trip_in_memory() {
        let taxonomy = Taxonomy::new(default_classes());
        let annotations = annotations();
        let request = ExportRequest {
            image_id: "study-1/image-3",
            task_id: Some("task-9"),
            image_width: 16,
            image_height: 16,
            annotations: &annotations,
            taxonomy: &taxonomy,
        };

        let mut buf = Cursor::new(Vec::new());
        let manifest = write_bundle(&mut buf, &request).unwrap();
        assert_eq!(manifest.annotation_count, 2);
        assert_eq!(manifest.classes.len(), 2);
        assert_eq!(manifest.classes[0].name, "Pneumothorax");
        assert_eq!(manifest.classes[1].name, "class 42");
        assert_eq!(manifest.classes[1].color, Color::WHITE);

        buf.set_position(0);
        let (read_manifest, items) = read_bundle(&mut buf).unwrap();
        assert_eq!(read_manifest, manifest);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].class_id(), 42);

        buf.set_position(0);
        let mut archive = ZipArchive::new(&mut buf).unwrap();
        let mut png = Vec::new();
        archive.by_name(MASK_FILE).unwrap().read_to_end(&mut png).unwrap();
        let mask = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(mask.dimensions(), (16, 16));
        assert_eq!(mask.get_pixel(6, 4).0, [1]);
        assert_eq!(mask.get_pixel(7, 10).0, [42]);
        assert_eq!(mask.get_pixel(15, 0).0, [0]);
    }

    #[test]
    fn test_export_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("bundle.zip");
        let taxonomy = Taxonomy::default();
        let request = ExportRequest {
            image_id: "img",
            task_id: None,
            image_width: 4,
            image_height: 4,
            annotations: &[],
            taxonomy: &taxonomy,
        };

        export_bundle_to_path(&path, &request, false).unwrap();
        assert!(matches!(
            export_bundle_to_path(&path, &request, false),
            Err(ExportError::TargetExists(_))
        ));
        let manifest = export_bundle_to_path(&path, &request, true).unwrap();
        assert!(manifest.task_id.is_none());
        assert!(manifest.classes.is_empty());
    }
}
