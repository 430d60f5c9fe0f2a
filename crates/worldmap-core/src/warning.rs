use serde::{Deserialize, Serialize};

use crate::id::{EntityId, EntityKind};

/// An entity a warning points at. The renderer highlights it, using
/// `color` when the entity is a province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSource {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<u32>,
}

/// A recoverable problem found while loading. Warnings are rebuilt on every
/// load and never edited after they are pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub source: Vec<WarningSource>,
    pub related_files: Vec<String>,
    pub text: String,
}

impl Warning {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            source: Vec::new(),
            related_files: Vec::new(),
            text: text.into(),
        }
    }

    pub fn with_source(mut self, kind: EntityKind, id: EntityId) -> Self {
        self.source.push(WarningSource {
            kind,
            id,
            color: None,
        });
        self
    }

    pub fn with_province(mut self, id: EntityId, color: Option<u32>) -> Self {
        self.source.push(WarningSource {
            kind: EntityKind::Province,
            id,
            color,
        });
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        let file = file.into();
        if !self.related_files.contains(&file) {
            self.related_files.push(file);
        }
        self
    }
}
