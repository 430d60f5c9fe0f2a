use serde::{Deserialize, Serialize};

/// Numeric id of a province, state, strategic region or supply area.
///
/// Ids are assigned by the definition files. `0` and negative values never
/// come from a well-formed record: negative ids are synthesized during
/// reconciliation for records that could not keep the id they declared.
pub type EntityId = i32;

/// Largest id a definition file may declare before reconciliation aborts.
pub const DEFAULT_MAX_ID: EntityId = 10_000;

/// Returns `true` for ids that address a canonical (non-bad) slot.
pub const fn is_canonical(id: EntityId) -> bool {
    id > 0
}

/// The kind of entity an id belongs to. Serialized as the warning source
/// `type` tag the renderer uses to highlight things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Province,
    State,
    #[serde(rename = "strategicregion")]
    StrategicRegion,
    #[serde(rename = "supplyarea")]
    SupplyArea,
}

impl EntityKind {
    /// Human readable name used in warning texts.
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Province => "Province",
            EntityKind::State => "State",
            EntityKind::StrategicRegion => "Strategic region",
            EntityKind::SupplyArea => "Supply area",
        }
    }

    /// Lower-case form for use in the middle of a sentence.
    pub const fn noun(self) -> &'static str {
        match self {
            EntityKind::Province => "province",
            EntityKind::State => "state",
            EntityKind::StrategicRegion => "strategic region",
            EntityKind::SupplyArea => "supply area",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.noun())
    }
}

/// Byte range of a record inside its definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
