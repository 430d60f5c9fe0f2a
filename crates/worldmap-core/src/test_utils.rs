//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`; downstream
//! crates enable the `test-utils` feature in their dev-dependencies.

use std::collections::BTreeMap;

use crate::entity::*;
use crate::geometry::{BoundingBox, Region};
use crate::id::EntityId;
use crate::reconcile::sort_items;
use crate::snapshot::{SnapshotParts, WorldMapData};

// ===========================================================================
// Entity builders
// ===========================================================================

/// A 1x1 land province at `(x, y)` whose color is its id.
pub fn land_province(id: EntityId, x: i32, y: i32) -> Province {
    Province {
        id,
        color: id as u32,
        kind: ProvinceKind::Land,
        coastal: false,
        terrain: "plains".to_string(),
        continent: 1,
        edges: Vec::new(),
        region: Region::leaf(BoundingBox::new(x, y, 1, 1), 1),
        file: "map/definition.ron".to_string(),
        span: None,
    }
}

pub fn sea_province(id: EntityId, x: i32, y: i32) -> Province {
    Province {
        kind: ProvinceKind::Sea,
        terrain: "ocean".to_string(),
        continent: 0,
        ..land_province(id, x, y)
    }
}

pub fn state(id: EntityId, provinces: &[EntityId]) -> State {
    State {
        id,
        name: format!("STATE_{id}"),
        manpower: 1000,
        category: "rural".to_string(),
        owner: None,
        provinces: provinces.to_vec(),
        cores: Vec::new(),
        impassable: false,
        victory_points: BTreeMap::new(),
        region: Region::default(),
        file: "history/states/test.ron".to_string(),
        span: None,
    }
}

pub fn strategic_region(id: EntityId, provinces: &[EntityId]) -> StrategicRegion {
    StrategicRegion {
        id,
        name: format!("REGION_{id}"),
        provinces: provinces.to_vec(),
        naval_terrain: None,
        region: Region::default(),
        file: "map/strategicregions/test.ron".to_string(),
        span: None,
    }
}

pub fn supply_area(id: EntityId, states: &[EntityId]) -> SupplyArea {
    SupplyArea {
        id,
        name: format!("SUPPLYAREA_{id}"),
        value: 1,
        states: states.to_vec(),
        region: Region::default(),
        file: "map/supplyareas/test.ron".to_string(),
        span: None,
    }
}

pub fn country(tag: &str, color: u32) -> Country {
    Country {
        tag: tag.to_string(),
        color,
        file: "common/countries/test.ron".to_string(),
    }
}

// ===========================================================================
// Snapshots
// ===========================================================================

/// A snapshot with provinces `1..=n` laid out on one row.
pub fn world_map_with_provinces(n: EntityId) -> WorldMapData {
    let provinces = (1..=n).map(|id| land_province(id, id - 1, 0)).collect();
    let mut warnings = Vec::new();
    let provinces = sort_items(provinces, EntityId::MAX, &mut warnings)
        .unwrap_or_default();
    WorldMapData::assemble(SnapshotParts {
        width: n.max(1),
        height: 1,
        provinces,
        terrains: vec!["plains".to_string()],
        continents: vec!["europe".to_string()],
        ..Default::default()
    })
}

/// Small but complete snapshot: four provinces, two states, one country, a
/// strategic region, a supply area and a warning.
pub fn sample_world_map() -> WorldMapData {
    let mut warnings = Vec::new();
    let provinces = sort_items(
        vec![
            land_province(1, 0, 0),
            land_province(2, 1, 0),
            land_province(3, 2, 0),
            sea_province(4, 3, 0),
        ],
        10_000,
        &mut warnings,
    )
    .unwrap_or_default();
    let states = sort_items(vec![state(1, &[1, 2]), state(2, &[3])], 10_000, &mut warnings)
        .unwrap_or_default();
    let strategic_regions =
        sort_items(vec![strategic_region(1, &[1, 2, 3, 4])], 10_000, &mut warnings)
            .unwrap_or_default();
    let supply_areas =
        sort_items(vec![supply_area(1, &[1, 2])], 10_000, &mut warnings).unwrap_or_default();
    warnings.push(crate::warning::Warning::new("sample warning"));

    WorldMapData::assemble(SnapshotParts {
        width: 4,
        height: 1,
        provinces,
        states,
        countries: vec![country("AAA", 0xff0000)],
        strategic_regions,
        supply_areas,
        continents: vec!["europe".to_string()],
        terrains: vec!["ocean".to_string(), "plains".to_string()],
        warnings,
    })
}
