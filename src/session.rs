//! One reader's view of one image at a time.
//!
//! [`ViewingSession`] owns everything that changes while an image is open:
//! the viewport transform, the capture machine and the annotation store.
//! Hosts feed it events and ask it to render; nothing here is global.
//!
//! Image loading is split in two so input keeps flowing while the source is
//! busy: [`ViewingSession::begin_load`] hands out a token and
//! [`ViewingSession::finish_load`] only accepts the result for the newest
//! token. Results for older tokens are dropped.

use std::path::Path;

use crate::capture::{ActiveClass, CaptureOutcome, CaptureSession, GestureEvent, ToolConfig, ToolRegistry};
use crate::config::AppConfig;
use crate::data::{ImageFrame, ImageSource};
use crate::error::{Error, ImageLoadError, PersistenceError, ValidationError};
use crate::format::{
    ExportManifest, ExportRequest, PersistenceSink, Submission, SubmissionMeta,
    annotations_from_wire, export_bundle_to_path,
};
use crate::geometry::Size;
use crate::model::{Annotation, PathologyClass, Polarity, Taxonomy};
use crate::render::{Canvas, RenderCompositor, Scene};
use crate::store::AnnotationStore;
use crate::viewport::ViewportTransform;

/// Placeholder text while an image is being resolved.
const LOADING_MESSAGE: &str = "Loading image...";
const EMPTY_MESSAGE: &str = "No image";

/// Identifies one `begin_load` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken(u64);

/// An image that finished loading, with its view.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub frame: ImageFrame,
    pub transform: ViewportTransform,
}

/// Image lifecycle.
#[derive(Debug, Clone, Default)]
pub enum ImageState {
    #[default]
    Empty,
    Loading { token: LoadToken, id: String },
    Loaded(Box<LoadedImage>),
    Failed { id: String, message: String },
}

/// What happened to a load result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// A newer load was started; the result was dropped
    Stale,
}

/// Viewer state for one reader and one image at a time.
#[derive(Debug)]
pub struct ViewingSession {
    config: AppConfig,
    taxonomy: Taxonomy,
    tools: ToolRegistry,
    capture: CaptureSession,
    store: AnnotationStore,
    image: ImageState,
    viewport_size: Size,
    task_id: Option<String>,
    next_token: u64,
    compositor: RenderCompositor,
}

impl ViewingSession {
    pub fn new(config: AppConfig, viewport_size: Size) -> Self {
        let prefs = &config.preferences;
        let capture = CaptureSession::new().with_config(ToolConfig {
            polarity: Polarity::Positive,
            radius: prefs.stroke_radius,
        });
        let store = AnnotationStore::with_max_history(prefs.max_history);

        Self {
            taxonomy: config.taxonomy(),
            config,
            tools: ToolRegistry::new(),
            capture,
            store,
            image: ImageState::Empty,
            viewport_size,
            task_id: None,
            next_token: 0,
            compositor: RenderCompositor::new(),
        }
    }

    /// Use a host-provided taxonomy instead of the configured classes.
    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut CaptureSession {
        &mut self.capture
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn image_state(&self) -> &ImageState {
        &self.image
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn frame(&self) -> Option<&ImageFrame> {
        match &self.image {
            ImageState::Loaded(loaded) => Some(&loaded.frame),
            _ => None,
        }
    }

    pub fn transform(&self) -> Option<&ViewportTransform> {
        match &self.image {
            ImageState::Loaded(loaded) => Some(&loaded.transform),
            _ => None,
        }
    }

    pub fn transform_mut(&mut self) -> Option<&mut ViewportTransform> {
        match &mut self.image {
            ImageState::Loaded(loaded) => Some(&mut loaded.transform),
            _ => None,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn set_task_id(&mut self, task_id: Option<String>) {
        self.task_id = task_id;
    }

    /// The host surface changed size. The current view is kept.
    pub fn resize(&mut self, viewport_size: Size) {
        self.viewport_size = viewport_size;
        if let Some(t) = self.transform_mut() {
            t.set_viewport_size(viewport_size);
        }
    }

    // ---------------------------------------------------------------
    // Image lifecycle
    // ---------------------------------------------------------------

    /// Start loading a new image. Drops any gesture and the previous image's annotations.
    pub fn begin_load(&mut self, id: &str) -> LoadToken {
        self.capture.cancel(&self.tools);
        self.store.clear();

        self.next_token += 1;
        let token = LoadToken(self.next_token);
        self.image = ImageState::Loading {
            token,
            id: id.to_string(),
        };
        log::info!("⏳ Loading image '{}'", id);
        token
    }

    /// Accept the result of a load started with `token`.
    pub fn finish_load(
        &mut self,
        token: LoadToken,
        result: Result<ImageFrame, ImageLoadError>,
    ) -> Result<LoadOutcome, ImageLoadError> {
        let current = matches!(&self.image, ImageState::Loading { token: t, .. } if *t == token);
        if !current {
            log::debug!("Dropping stale load result {:?}", token);
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(frame) => {
                let voi = frame.initial_voi(&self.config.preferences.default_voi);
                let transform = ViewportTransform::for_image(frame.size(), self.viewport_size, voi);
                log::info!(
                    "🖼️ Image '{}' ready ({}x{}, W/L {}/{})",
                    frame.id,
                    frame.width(),
                    frame.height(),
                    voi.window_width,
                    voi.window_center
                );
                self.image = ImageState::Loaded(Box::new(LoadedImage { frame, transform }));
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                log::warn!("Image load failed: {}", e);
                self.image = ImageState::Failed {
                    id: e.id().to_string(),
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Resolve and install an image in one call.
    pub async fn load_image<S: ImageSource>(
        &mut self,
        source: &S,
        id: &str,
    ) -> Result<LoadOutcome, ImageLoadError> {
        let token = self.begin_load(id);
        let result = source.resolve(id).await;
        self.finish_load(token, result)
    }

    // ---------------------------------------------------------------
    // Selection and capture
    // ---------------------------------------------------------------

    /// Select a class by id, or `None` for "no finding".
    pub fn select_class(&mut self, class_id: Option<u32>) -> Result<(), ValidationError> {
        let class = match class_id {
            Some(id) => {
                let c = self
                    .taxonomy
                    .get(id)
                    .ok_or(ValidationError::UnknownClass(id))?;
                Some(ActiveClass {
                    id: c.id,
                    color: c.color,
                })
            }
            None => None,
        };
        self.capture.set_class(class)
    }

    /// Select the class at a position in the taxonomy. Positions past the end are ignored.
    pub fn select_class_index(&mut self, index: usize) -> Result<Option<u32>, ValidationError> {
        let Some(id) = self.taxonomy.by_index(index).map(|c| c.id) else {
            log::debug!("No class at position {}", index);
            return Ok(None);
        };
        self.select_class(Some(id))?;
        Ok(Some(id))
    }

    pub fn active_class(&self) -> Option<&PathologyClass> {
        self.capture
            .active_class()
            .and_then(|c| self.taxonomy.get(c.id))
    }

    /// Feed an image-space gesture event. Committed annotations go to the store.
    ///
    /// Without a loaded image every event is ignored.
    pub fn handle_gesture(&mut self, event: &GestureEvent) -> Result<CaptureOutcome, ValidationError> {
        if self.transform().is_none() {
            log::trace!("Ignoring {:?}: no image", event);
            return Ok(CaptureOutcome::Ignored);
        }

        let outcome = self.capture.handle(event, &self.tools)?;
        if let CaptureOutcome::Committed(annotation) = &outcome {
            self.store.append(annotation.clone());
        }
        Ok(outcome)
    }

    pub fn cancel_gesture(&mut self) -> bool {
        self.capture.cancel(&self.tools)
    }

    /// Remove the last committed annotation. An in-flight gesture is
    /// discarded instead, leaving the store untouched.
    pub fn undo(&mut self) -> Option<Annotation> {
        if self.capture.cancel(&self.tools) {
            return None;
        }
        self.store.remove_last()
    }

    pub fn redo(&mut self) -> Option<&Annotation> {
        if self.capture.is_active() {
            return None;
        }
        self.store.redo()
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    fn submission(&self, meta: SubmissionMeta) -> Result<Submission, PersistenceError> {
        let task_id = self.task_id.clone().ok_or_else(|| PersistenceError::Rejected {
            task_id: String::new(),
            reason: "no task assigned".to_string(),
        })?;
        Ok(Submission::new(task_id, self.store.to_persistable_payload(), meta))
    }

    /// Send the committed annotations as a draft. The store is kept either way.
    pub async fn save_draft<P: PersistenceSink>(
        &self,
        sink: &P,
        meta: SubmissionMeta,
    ) -> Result<(), PersistenceError> {
        let submission = self.submission(meta)?;
        if self.capture.is_active() {
            log::debug!("Saving without the gesture in progress");
        }
        sink.submit(&submission).await
    }

    /// Save, then mark the task complete.
    pub async fn complete_task<P: PersistenceSink>(
        &self,
        sink: &P,
        meta: SubmissionMeta,
    ) -> Result<(), PersistenceError> {
        let submission = self.submission(meta)?;
        sink.submit(&submission).await?;
        sink.complete_task(&submission.task_id).await
    }

    /// Replace the store with previously saved work for the current task.
    /// Returns the number of annotations restored; invalid entries are skipped.
    pub async fn load_existing<P: PersistenceSink>(
        &mut self,
        sink: &P,
    ) -> Result<usize, PersistenceError> {
        let Some(task_id) = self.task_id.clone() else {
            return Ok(0);
        };
        let Some(submission) = sink.fetch(&task_id).await? else {
            log::debug!("No saved work for task {}", task_id);
            return Ok(0);
        };

        let (annotations, errors) = annotations_from_wire(submission.items, 1, self.capture.now());
        if !errors.is_empty() {
            log::warn!("Skipped {} invalid saved annotations", errors.len());
        }
        let count = annotations.len();
        self.store.replace_all(annotations);
        self.capture.reserve_ids_below(self.store.next_id());
        Ok(count)
    }

    /// Write a zip bundle with the current annotations and label mask.
    pub fn export_bundle(&self, path: &Path, overwrite: bool) -> Result<ExportManifest, Error> {
        let frame = self.frame().ok_or(ValidationError::NoImage)?;
        let request = ExportRequest {
            image_id: &frame.id,
            task_id: self.task_id.as_deref(),
            image_width: frame.width() as u32,
            image_height: frame.height() as u32,
            annotations: self.store.all(),
            taxonomy: &self.taxonomy,
        };
        Ok(export_bundle_to_path(path, &request, overwrite)?)
    }

    // ---------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------

    pub fn render(&self, canvas: &mut dyn Canvas) {
        let scene = match &self.image {
            ImageState::Loaded(loaded) => Scene {
                image: Some((&loaded.frame, &loaded.transform)),
                annotations: self.store.all(),
                capture: Some((&self.capture, &self.tools)),
                placeholder: "",
            },
            ImageState::Loading { .. } => Scene::loading(LOADING_MESSAGE),
            ImageState::Empty => Scene::loading(EMPTY_MESSAGE),
            ImageState::Failed { message, .. } => Scene::loading(message),
        };
        self.compositor.render(canvas, &scene);
    }
}
