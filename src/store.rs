//! Ordered store of committed annotations for one image.
//!
//! Annotations are kept in commit order and never edited in place; a wrong
//! mark is corrected by removing it and drawing it again. Removal is
//! last-in-first-out and the removed annotations are kept on a bounded redo
//! stack until the next commit.

use crate::constants::DEFAULT_MAX_HISTORY;
use crate::format::WireAnnotation;
use crate::model::{Annotation, AnnotationId};

/// Committed annotations plus a redo history.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    /// Undone annotations, most recent at the end
    redo_stack: Vec<Annotation>,
    max_history: usize,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            annotations: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Append a committed annotation. Returns its position. Clears the redo stack.
    pub fn append(&mut self, annotation: Annotation) -> usize {
        if !self.redo_stack.is_empty() {
            log::debug!("📝 New annotation clears {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
        log::debug!(
            "➕ Stored {} {} (total {})",
            annotation.shape().kind(),
            annotation.id(),
            self.annotations.len() + 1
        );
        self.annotations.push(annotation);
        self.annotations.len() - 1
    }

    /// Remove the most recently appended annotation. `None` means the store was empty.
    pub fn remove_last(&mut self) -> Option<Annotation> {
        let Some(removed) = self.annotations.pop() else {
            log::debug!("Nothing to undo: store is empty");
            return None;
        };

        self.redo_stack.push(removed.clone());
        if self.redo_stack.len() > self.max_history {
            self.redo_stack.remove(0);
        }
        log::debug!("⏪ Removed {} (redo stack: {})", removed.id(), self.redo_stack.len());
        Some(removed)
    }

    /// Re-append the most recently removed annotation.
    pub fn redo(&mut self) -> Option<&Annotation> {
        let Some(annotation) = self.redo_stack.pop() else {
            log::debug!("Nothing to redo");
            return None;
        };
        log::debug!("⏩ Restored {}", annotation.id());
        self.annotations.push(annotation);
        self.annotations.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.annotations.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Read-only view in commit order.
    pub fn all(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    /// Id one past the largest id in the store or its redo history.
    pub fn next_id(&self) -> u64 {
        self.annotations
            .iter()
            .chain(self.redo_stack.iter())
            .map(|a| a.id().0 + 1)
            .max()
            .unwrap_or(1)
    }

    /// Drop everything, including redo history (navigating away from the image).
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.redo_stack.clear();
    }

    /// Replace the contents with previously saved annotations.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        log::info!("Loaded {} existing annotations", annotations.len());
        self.annotations = annotations;
        self.redo_stack.clear();
    }

    /// Wire form of every annotation, in commit order.
    pub fn to_persistable_payload(&self) -> Vec<WireAnnotation> {
        self.annotations.iter().map(WireAnnotation::from).collect()
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}
