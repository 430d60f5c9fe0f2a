//! World map entities as they appear in a loaded snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::Region;
use crate::id::{EntityId, EntityKind, SourceSpan};

/// Common access to the id and origin of a reconciled record.
pub trait Identified {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;
    fn set_id(&mut self, id: EntityId);
    /// Path of the definition file the record came from.
    fn file(&self) -> &str;
}

macro_rules! impl_identified {
    ($ty:ty, $kind:expr) => {
        impl Identified for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> EntityId {
                self.id
            }

            fn set_id(&mut self, id: EntityId) {
                self.id = id;
            }

            fn file(&self) -> &str {
                &self.file
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Provinces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvinceKind {
    #[default]
    Land,
    Sea,
    Lake,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjacencyKind {
    #[default]
    Land,
    Sea,
    Impassable,
}

/// One side of an adjacency between two provinces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvinceEdge {
    pub to: EntityId,
    pub kind: AdjacencyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Province {
    pub id: EntityId,
    /// Packed `0xRRGGBB`.
    pub color: u32,
    pub kind: ProvinceKind,
    pub coastal: bool,
    pub terrain: String,
    pub continent: u32,
    pub edges: Vec<ProvinceEdge>,
    pub region: Region,
    pub file: String,
    pub span: Option<SourceSpan>,
}

impl Province {
    pub fn is_sea(&self) -> bool {
        self.kind == ProvinceKind::Sea
    }

    pub fn is_land(&self) -> bool {
        self.kind == ProvinceKind::Land
    }

    /// Neighbours reachable without crossing an impassable border.
    pub fn passable_neighbours(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.edges
            .iter()
            .filter(|e| e.kind != AdjacencyKind::Impassable)
            .map(|e| e.to)
    }
}

impl_identified!(Province, EntityKind::Province);

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: EntityId,
    pub name: String,
    pub manpower: u64,
    pub category: String,
    pub owner: Option<String>,
    pub provinces: Vec<EntityId>,
    pub cores: Vec<String>,
    pub impassable: bool,
    pub victory_points: BTreeMap<EntityId, f64>,
    pub region: Region,
    pub file: String,
    pub span: Option<SourceSpan>,
}

impl_identified!(State, EntityKind::State);

// ---------------------------------------------------------------------------
// Strategic regions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicRegion {
    pub id: EntityId,
    pub name: String,
    pub provinces: Vec<EntityId>,
    pub naval_terrain: Option<String>,
    pub region: Region,
    pub file: String,
    pub span: Option<SourceSpan>,
}

impl_identified!(StrategicRegion, EntityKind::StrategicRegion);

// ---------------------------------------------------------------------------
// Supply areas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyArea {
    pub id: EntityId,
    pub name: String,
    pub value: u32,
    pub states: Vec<EntityId>,
    pub region: Region,
    pub file: String,
    pub span: Option<SourceSpan>,
}

impl_identified!(SupplyArea, EntityKind::SupplyArea);

// ---------------------------------------------------------------------------
// Countries
// ---------------------------------------------------------------------------

/// A country tag with the color the renderer paints its states in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub tag: String,
    pub color: u32,
    pub file: String,
}

/// Pack an `[r, g, b]` triple into `0xRRGGBB`.
pub fn pack_color([r, g, b]: [u8; 3]) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}
