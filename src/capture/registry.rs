//! Caller-owned mapping from tool id to capture capability.

use super::polyline::PolylineCapture;
use super::stroke::StrokeCapture;
use super::tool::{CaptureTool, ToolId};

/// Registry of drawing tools.
///
/// Built once per viewing session and passed by reference to the capture
/// session. View tools (pan, zoom, window/level) are not registered here.
pub struct ToolRegistry {
    tools: Vec<Box<dyn CaptureTool>>,
}

impl ToolRegistry {
    /// Registry with the built-in stroke and polyline tools.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(StrokeCapture));
        registry.register(Box::new(PolylineCapture));
        registry
    }

    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, replacing any tool with the same id.
    pub fn register(&mut self, tool: Box<dyn CaptureTool>) {
        let id = tool.id();
        if let Some(existing) = self.tools.iter_mut().find(|t| t.id() == id) {
            log::debug!("Replacing capture tool {}", id.name());
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn get(&self, id: ToolId) -> Option<&dyn CaptureTool> {
        self.tools.iter().find(|t| t.id() == id).map(|t| t.as_ref())
    }

    pub fn contains(&self, id: ToolId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<ToolId> {
        self.tools.iter().map(|t| t.id()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tools() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.ids(), vec![ToolId::Stroke, ToolId::Polyline]);
        assert!(registry.contains(ToolId::Stroke));
        assert!(!registry.contains(ToolId::Pan));
        assert!(ToolRegistry::empty().get(ToolId::Stroke).is_none());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StrokeCapture));
        assert_eq!(registry.ids().len(), 2);
    }
}
