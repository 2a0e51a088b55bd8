//! Pathology taxonomy: the classes an annotation can be tagged with.
//!
//! Classes are kept sorted by priority with inactive entries removed.
//! "No finding" is represented by selecting no class at all.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Whether a class describes a finding or an inserted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Pathology,
    Device,
}

/// A class annotations can be tagged with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathologyClass {
    pub id: u32,
    pub name: String,
    /// Localized label shown to the reader
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub kind: ClassKind,
    pub color: Color,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PathologyClass {
    pub fn new(id: u32, name: &str, color: Color, priority: i32) -> Self {
        Self {
            id,
            name: name.to_string(),
            display_name: name.to_string(),
            kind: ClassKind::Pathology,
            color,
            priority,
            active: true,
        }
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = display_name.to_string();
        self
    }

    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Label for display, falling back to the canonical name.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// Ordered set of selectable classes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Taxonomy {
    classes: Vec<PathologyClass>,
}

impl Taxonomy {
    /// Keep active classes and sort them by priority (stable for ties).
    pub fn new(classes: Vec<PathologyClass>) -> Self {
        let mut classes: Vec<PathologyClass> = classes.into_iter().filter(|c| c.active).collect();
        classes.sort_by_key(|c| c.priority);
        Self { classes }
    }

    pub fn classes(&self) -> &[PathologyClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&PathologyClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    /// Class at a display position (used by number-key hotkeys).
    pub fn by_index(&self, index: usize) -> Option<&PathologyClass> {
        self.classes.get(index)
    }

    pub fn of_kind(&self, kind: ClassKind) -> impl Iterator<Item = &PathologyClass> {
        self.classes.iter().filter(move |c| c.kind == kind)
    }

    /// Parse an ontology document:
    /// `{"version": "1.0", "pathologies": [...], "devices": [...]}`.
    ///
    /// Ids are assigned from 1 in document order, pathologies first.
    pub fn from_ontology_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: OntologyDocument = serde_json::from_str(json)?;
        Ok(doc.into_taxonomy())
    }

    /// Serialize back to the ontology document layout.
    pub fn to_ontology_json(&self) -> Result<String, serde_json::Error> {
        let entry = |c: &PathologyClass| OntologyEntry {
            name: c.name.clone(),
            name_tr: Some(c.display_name.clone()),
            color: Some(c.color),
            priority: Some(c.priority),
            active: Some(c.active),
        };
        let doc = OntologyDocument {
            version: "1.0".to_string(),
            pathologies: self.of_kind(ClassKind::Pathology).map(entry).collect(),
            devices: self.of_kind(ClassKind::Device).map(entry).collect(),
        };
        serde_json::to_string_pretty(&doc)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OntologyDocument {
    #[serde(default)]
    version: String,
    #[serde(default)]
    pathologies: Vec<OntologyEntry>,
    #[serde(default)]
    devices: Vec<OntologyEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OntologyEntry {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name_tr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
}

/// Priority offset for devices without an explicit priority.
const DEVICE_PRIORITY_BASE: i32 = 100;

impl OntologyDocument {
    fn into_taxonomy(self) -> Taxonomy {
        let mut next_id = 1;
        let mut classes = Vec::with_capacity(self.pathologies.len() + self.devices.len());

        let groups = [
            (self.pathologies, ClassKind::Pathology, Color::RED, 0),
            (
                self.devices,
                ClassKind::Device,
                Color::new(0x00, 0x00, 0xff),
                DEVICE_PRIORITY_BASE,
            ),
        ];
        for (entries, kind, default_color, priority_base) in groups {
            for (idx, e) in entries.into_iter().enumerate() {
                classes.push(PathologyClass {
                    id: next_id,
                    display_name: e.name_tr.unwrap_or_else(|| e.name.clone()),
                    name: e.name,
                    kind,
                    color: e.color.unwrap_or(default_color),
                    priority: e.priority.unwrap_or(priority_base + idx as i32),
                    active: e.active.unwrap_or(true),
                });
                next_id += 1;
            }
        }

        log::debug!("Parsed ontology v{} with {} classes", self.version, classes.len());
        Taxonomy::new(classes)
    }
}

/// Built-in chest radiograph taxonomy used when no ontology is configured.
pub fn default_classes() -> Vec<PathologyClass> {
    let hex = |s: &str| Color::from_hex(s).unwrap_or_default();
    vec![
        PathologyClass::new(1, "Pneumothorax", hex("#ff0000"), 1)
            .with_display_name("Pnömotoraks"),
        PathologyClass::new(2, "Atelectasis", hex("#ff6600"), 2).with_display_name("Atelektazi"),
        PathologyClass::new(3, "Ground Glass Opacity", hex("#ff9900"), 3)
            .with_display_name("Buzlu Cam Opasitesi"),
        PathologyClass::new(4, "Consolidation", hex("#ffcc00"), 4)
            .with_display_name("Konsolidasyon"),
        PathologyClass::new(5, "Pleural Effusion", hex("#9900ff"), 5)
            .with_display_name("Plevral Efüzyon"),
        PathologyClass::new(6, "ETT", hex("#0066ff"), 101)
            .with_display_name("Endotrakeal Tüp")
            .with_kind(ClassKind::Device),
        PathologyClass::new(7, "UVC", hex("#00ccff"), 102)
            .with_display_name("Umbilikal Ven Kateteri")
            .with_kind(ClassKind::Device),
        PathologyClass::new(8, "UAC", hex("#00ffcc"), 103)
            .with_display_name("Umbilikal Arter Kateteri")
            .with_kind(ClassKind::Device),
        PathologyClass::new(9, "NG Tube", hex("#00ff66"), 104)
            .with_display_name("Nazogastrik Sonda")
            .with_kind(ClassKind::Device),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_filtered() {
        let taxonomy = Taxonomy::new(vec![
            PathologyClass::new(1, "B", Color::RED, 5),
            PathologyClass::new(2, "A", Color::GREEN, 1),
            PathologyClass::new(3, "Hidden", Color::WHITE, 0).with_active(false),
        ]);
        let names: Vec<&str> = taxonomy.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(taxonomy.get(3).is_none());
        assert_eq!(taxonomy.by_index(0).map(|c| c.id), Some(2));
    }

    #[test]
    fn test_default_classes() {
        let taxonomy = Taxonomy::new(default_classes());
        assert_eq!(taxonomy.len(), 9);
        assert_eq!(taxonomy.of_kind(ClassKind::Device).count(), 4);
        assert_eq!(taxonomy.get(1).map(|c| c.label()), Some("Pnömotoraks"));
        assert_eq!(taxonomy.get(9).map(|c| c.color.to_hex()), Some("#00ff66".to_string()));
    }

    #[test]
    fn test_ontology_document() {
        let json = r##"{
            "version": "1.0",
            "pathologies": [
                {"name": "Nodule", "color": "#123456", "priority": 7},
                {"name": "Mass", "name_tr": "Kitle"},
                {"name": "Old", "active": false}
            ],
            "devices": [
                {"name": "Chest Tube"}
            ]
        }"##;
        let taxonomy = Taxonomy::from_ontology_json(json).unwrap();
        assert_eq!(taxonomy.len(), 3);

        let mass = taxonomy.get(2).unwrap();
        assert_eq!(mass.display_name, "Kitle");
        assert_eq!(mass.priority, 1);
        assert_eq!(mass.color, Color::RED);

        let tube = taxonomy.get(4).unwrap();
        assert_eq!(tube.kind, ClassKind::Device);
        assert_eq!(tube.priority, 100);
        assert_eq!(tube.color, Color::new(0, 0, 255));
        assert_eq!(tube.label(), "Chest Tube");

        let order: Vec<u32> = taxonomy.classes().iter().map(|c| c.id).collect();
        assert_eq!(order, vec![2, 1, 4]);
    }

    #[test]
    fn test_ontology_export_reimports() {
        let taxonomy = Taxonomy::new(default_classes());
        let json = taxonomy.to_ontology_json().unwrap();
        let back = Taxonomy::from_ontology_json(&json).unwrap();
        assert_eq!(back.len(), taxonomy.len());
        assert_eq!(back.get(6).map(|c| c.name.as_str()), Some("ETT"));
    }
}
