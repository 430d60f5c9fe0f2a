//! A small consistent game directory shared by the loader tests.
//!
//! Five provinces in a row (1-4 land, 5 sea), two states, two countries,
//! two strategic regions and one supply area. Loading it produces no
//! warnings.

use crate::source::MemoryFileSource;

pub const DEFAULT_MAP: &str = r#"(
    width: 100,
    height: 10,
    definitions: "definition.json",
    adjacencies: Some("adjacencies.ron"),
    continents: ["europe"],
)"#;

pub const DEFINITIONS: &str = r#"[
    {"id": 1, "color": [10, 0, 0], "terrain": "plains", "continent": 1, "bounds": {"x": 0, "y": 0, "w": 10, "h": 10}},
    {"id": 2, "color": [20, 0, 0], "terrain": "plains", "continent": 1, "bounds": {"x": 10, "y": 0, "w": 10, "h": 10}},
    {"id": 3, "color": [30, 0, 0], "terrain": "forest", "continent": 1, "bounds": {"x": 20, "y": 0, "w": 10, "h": 10}},
    {"id": 4, "color": [40, 0, 0], "terrain": "hills", "continent": 1, "coastal": true, "bounds": {"x": 30, "y": 0, "w": 10, "h": 10}},
    {"id": 5, "color": [0, 0, 50], "kind": "sea", "terrain": "ocean", "bounds": {"x": 40, "y": 0, "w": 60, "h": 10}}
]"#;

pub const ADJACENCIES: &str = r#"[
    (from: 1, to: 2),
    (from: 2, to: 3),
    (from: 3, to: 4),
    (from: 4, to: 5, kind: sea),
]"#;

pub const COUNTRIES: &str = r#"[
    (tag: "AAA", color: (200, 0, 0)),
    (tag: "BBB", color: (0, 200, 0)),
]"#;

pub const STATE_1: &str = r#"[
    (id: 1, name: "STATE_1", manpower: 1000, category: "town", owner: Some("AAA"),
     cores: ["AAA"], provinces: [1, 2], victory_points: [(province: 1, value: 5.0)]),
]"#;

pub const STATE_2: &str = r#"[
    (id: 2, name: "STATE_2", manpower: 500, category: "rural", owner: Some("BBB"),
     provinces: [3, 4]),
]"#;

pub const STRATEGIC_REGIONS: &str = r#"[
    (id: 1, name: "LAND", provinces: [1, 2, 3, 4]),
    (id: 2, name: "SEA", provinces: [5], naval_terrain: Some("ocean")),
]"#;

pub const SUPPLY_AREAS: &str = r#"[
    (id: 1, name: "AREA", value: 5, states: [1, 2]),
]"#;

pub fn sample_game() -> MemoryFileSource {
    MemoryFileSource::with_files([
        ("map/default_map.ron", DEFAULT_MAP),
        ("map/definition.json", DEFINITIONS),
        ("map/adjacencies.ron", ADJACENCIES),
        ("common/countries/countries.ron", COUNTRIES),
        ("history/states/1.ron", STATE_1),
        ("history/states/2.ron", STATE_2),
        ("map/strategicregions/regions.ron", STRATEGIC_REGIONS),
        ("map/supplyareas/areas.ron", SUPPLY_AREAS),
    ])
}
