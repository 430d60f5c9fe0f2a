//! A small game directory on disk, written in all three data formats.

use std::path::Path;

use tempfile::TempDir;

pub const DEFAULT_MAP: &str = r#"(
    width: 60,
    height: 10,
    definitions: "definition.json",
    adjacencies: Some("adjacencies.json"),
    continents: ["north"],
)"#;

pub const DEFINITIONS: &str = r#"[
    {"id": 1, "color": [1, 0, 0], "terrain": "plains", "continent": 1, "bounds": {"x": 0, "y": 0, "w": 10, "h": 10}},
    {"id": 2, "color": [2, 0, 0], "terrain": "plains", "continent": 1, "bounds": {"x": 10, "y": 0, "w": 10, "h": 10}},
    {"id": 3, "color": [3, 0, 0], "terrain": "forest", "continent": 1, "bounds": {"x": 20, "y": 0, "w": 10, "h": 10}},
    {"id": 4, "color": [4, 0, 0], "terrain": "forest", "continent": 1, "bounds": {"x": 30, "y": 0, "w": 10, "h": 10}},
    {"id": 5, "color": [0, 0, 5], "kind": "sea", "terrain": "ocean", "bounds": {"x": 40, "y": 0, "w": 20, "h": 10}}
]"#;

pub const ADJACENCIES: &str = r#"[
    {"from": 1, "to": 2},
    {"from": 2, "to": 3},
    {"from": 3, "to": 4},
    {"from": 4, "to": 5, "kind": "sea"}
]"#;

pub const COUNTRIES: &str = r#"
[[countries]]
tag = "AAA"
color = [200, 0, 0]

[[countries]]
tag = "BBB"
color = [0, 0, 200]
"#;

pub const STATES: &str = r#"
[[states]]
id = 1
name = "STATE_1"
owner = "AAA"
cores = ["AAA"]
provinces = [1, 2]

[[states.victory_points]]
province = 1
value = 5.0

[[states]]
id = 2
name = "STATE_2"
owner = "BBB"
provinces = [3, 4]
"#;

pub const STRATEGIC_REGIONS: &str = r#"[
    (id: 1, name: "LAND", provinces: [1, 2, 3, 4]),
    (id: 2, name: "SEA", provinces: [5], naval_terrain: Some("ocean")),
]"#;

pub const SUPPLY_AREAS: &str = r#"[{"id": 1, "name": "AREA", "value": 3, "states": [1, 2]}]"#;

pub fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, text).unwrap();
}

pub fn game_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "map/default_map.ron", DEFAULT_MAP);
    write(root, "map/definition.json", DEFINITIONS);
    write(root, "map/adjacencies.json", ADJACENCIES);
    write(root, "common/countries/countries.toml", COUNTRIES);
    write(root, "history/states/states.toml", STATES);
    write(root, "map/strategicregions/regions.ron", STRATEGIC_REGIONS);
    write(root, "map/supplyareas/areas.json", SUPPLY_AREAS);
    dir
}
