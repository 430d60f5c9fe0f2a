//! Loading a game directory from disk through the full loader stack.

mod common;

use std::sync::Arc;

use common::{game_dir, write};
use worldmap_data::{FsFileSource, Loader, Reloadable, WorldMapConfig, WorldMapLoader};

fn loader(root: &std::path::Path) -> WorldMapLoader {
    WorldMapLoader::new(Arc::new(FsFileSource::new(root)), &WorldMapConfig::default())
}

#[tokio::test]
async fn mixed_formats_load_cleanly() {
    let dir = game_dir();
    let result = loader(dir.path()).load(false).await.unwrap();
    let data = &result.result;

    assert!(data.warnings.is_empty(), "{:?}", data.warnings);
    assert_eq!(data.provinces_count, 6);
    assert_eq!(data.states_count, 3);
    assert_eq!(data.countries_count, 2);
    assert_eq!(data.strategic_regions_count, 3);
    assert_eq!(data.supply_areas_count, 2);
    assert_eq!(data.terrains, vec!["forest", "ocean", "plains"]);

    let state = data.states[1].as_ref().unwrap();
    assert_eq!(state.owner.as_deref(), Some("AAA"));
    assert_eq!(state.victory_points.get(&1), Some(&5.0));
    assert_eq!(state.region.mass, 2);
    assert_eq!(state.region.bounding_box.w, 20);

    // The span covers the state's table in the TOML file, nested tables included.
    let span = state.span.unwrap();
    let text = std::fs::read_to_string(dir.path().join(&state.file)).unwrap();
    let record = &text[span.start..span.end];
    assert!(record.starts_with("[[states]]"));
    assert!(record.contains("STATE_1"));
    assert!(record.contains("value = 5.0"));
    assert!(!record.contains("STATE_2"));

    let area = data.supply_areas[1].as_ref().unwrap();
    assert_eq!(area.region.mass, 4);
    assert_eq!(area.file, "map/supplyareas/areas.json");
}

#[tokio::test]
async fn edits_are_picked_up_on_the_next_load() {
    let dir = game_dir();
    let loader = loader(dir.path());
    let first = loader.load(false).await.unwrap();
    assert!(!loader.should_reload().await);

    write(
        dir.path(),
        "history/states/states.toml",
        &common::STATES.replace("STATE_2", "A_MUCH_LONGER_STATE_NAME"),
    );
    assert!(loader.should_reload().await);

    let second = loader.load(false).await.unwrap();
    assert!(second.generation > first.generation);
    assert_eq!(
        second.result.states[2].as_ref().unwrap().name,
        "A_MUCH_LONGER_STATE_NAME"
    );
    assert_eq!(first.result.provinces, second.result.provinces);
}

#[tokio::test]
async fn added_and_removed_files_change_the_record_set() {
    let dir = game_dir();
    let loader = loader(dir.path());
    loader.load(false).await.unwrap();

    write(
        dir.path(),
        "history/states/extra.ron",
        r#"[(id: 3, name: "EXTRA", provinces: [4])]"#,
    );
    assert!(loader.should_reload().await);
    let added = loader.load(false).await.unwrap();
    assert_eq!(added.result.states_count, 4);
    assert!(
        added
            .result
            .warnings
            .iter()
            .any(|w| w.text == "Province 4 is in multiple states: 2, 3.")
    );

    std::fs::remove_file(dir.path().join("history/states/extra.ron")).unwrap();
    let removed = loader.load(false).await.unwrap();
    assert_eq!(removed.result.states_count, 3);
    assert!(removed.result.warnings.is_empty());
}

#[tokio::test]
async fn broken_file_degrades_to_a_warning() {
    let dir = game_dir();
    write(dir.path(), "map/supplyareas/broken.json", r#"[{"id": 2, "states": ["#);
    let result = loader(dir.path()).load(false).await.unwrap();

    let data = &result.result;
    assert_eq!(data.supply_areas_count, 2);
    assert_eq!(data.warnings.len(), 1);
    assert!(data.warnings[0].text.contains("map/supplyareas/broken.json"));
    assert_eq!(
        data.warnings[0].related_files,
        vec!["map/supplyareas/broken.json"]
    );
}

#[tokio::test]
async fn non_data_files_are_ignored() {
    let dir = game_dir();
    write(dir.path(), "history/states/README.txt", "not a state");
    write(dir.path(), "history/states/old/1.ron", "[(id: 9)]");
    let result = loader(dir.path()).load(false).await.unwrap();
    assert_eq!(result.result.states_count, 3);
    assert!(result.result.warnings.is_empty());
}

#[tokio::test]
async fn missing_default_map_fails() {
    let dir = game_dir();
    std::fs::remove_file(dir.path().join("map/default_map.ron")).unwrap();
    assert!(loader(dir.path()).load(false).await.is_err());
}

#[tokio::test]
async fn config_file_moves_folders() {
    let dir = game_dir();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::rename(
        dir.path().join("history/states"),
        dir.path().join("data/states"),
    )
    .unwrap();
    write(dir.path(), "worldmap.toml", "states = \"data/states\"\n");

    let source = Arc::new(FsFileSource::new(dir.path()));
    let config = WorldMapConfig::load(source.as_ref(), "worldmap.toml")
        .await
        .unwrap();
    assert_eq!(config.states, "data/states");

    let result = WorldMapLoader::new(source, &config).load(false).await.unwrap();
    assert_eq!(result.result.states_count, 3);
    assert!(result.dependencies.contains(&"data/states/*".to_string()));
}
