//! Serde structs for the on-disk definition formats.
//!
//! Records are deserialized from RON, JSON or TOML files and then turned
//! into core entities by the loaders. Every field except the ones that make
//! a record meaningful is optional, so partially written files still load.

use serde::Deserialize;

use worldmap_core::entity::{AdjacencyKind, ProvinceKind};
use worldmap_core::id::EntityId;

// ===========================================================================
// Default map
// ===========================================================================

/// The map descriptor: dimensions and where the province data lives.
/// File names are resolved relative to the descriptor's folder.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultMapData {
    pub width: i32,
    pub height: i32,
    pub definitions: String,
    #[serde(default)]
    pub adjacencies: Option<String>,
    #[serde(default)]
    pub continents: Vec<String>,
}

// ===========================================================================
// Provinces
// ===========================================================================

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundsData {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// A province definition. `mass` is the pixel count when known; a province
/// without one weighs 1. `center` overrides the box center.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvinceData {
    #[serde(default)]
    pub id: EntityId,
    pub color: [u8; 3],
    #[serde(default)]
    pub kind: ProvinceKind,
    #[serde(default)]
    pub coastal: bool,
    #[serde(default)]
    pub terrain: String,
    #[serde(default)]
    pub continent: u32,
    pub bounds: BoundsData,
    #[serde(default)]
    pub mass: Option<u64>,
    #[serde(default)]
    pub center: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjacencyData {
    pub from: EntityId,
    pub to: EntityId,
    #[serde(default)]
    pub kind: AdjacencyKind,
}

// ===========================================================================
// Countries
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CountryData {
    pub tag: String,
    #[serde(default)]
    pub color: [u8; 3],
}

// ===========================================================================
// States
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VictoryPointData {
    pub province: EntityId,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateData {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manpower: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub provinces: Vec<EntityId>,
    #[serde(default)]
    pub cores: Vec<String>,
    #[serde(default)]
    pub impassable: bool,
    #[serde(default)]
    pub victory_points: Vec<VictoryPointData>,
}

// ===========================================================================
// Strategic regions and supply areas
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StrategicRegionData {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provinces: Vec<EntityId>,
    #[serde(default)]
    pub naval_terrain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplyAreaData {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub states: Vec<EntityId>,
}

// ===========================================================================
// Tests
// ===========================================================================
