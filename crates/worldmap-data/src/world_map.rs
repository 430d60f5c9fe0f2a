//! The composite loader behind a world map snapshot.
//!
//! Wires the entity loaders together:
//!
//! ```text
//! countries ─┐
//!            ├─> states ─┬─> strategic regions ─┐
//! provinces ─┘           └─> supply areas ──────┴─> WorldMapData
//! ```
//!
//! Only this loader passes `force` down; entity loaders load their upstreams
//! unforced, so a forced refresh rereads every file exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use worldmap_core::snapshot::{SnapshotParts, WorldMapData};

use crate::config::WorldMapConfig;
use crate::countries::{CountriesLoader, CountriesMerge};
use crate::framework::{LoadResult, Loader, Reloadable};
use crate::loader::DataLoadError;
use crate::provinces::DefaultMapLoader;
use crate::source::FileSource;
use crate::states::{StatesLoader, StatesMerge};
use crate::strategic_regions::{StrategicRegionsLoader, StrategicRegionsMerge};
use crate::supply_areas::{SupplyAreasLoader, SupplyAreasMerge};

/// Generations of the five entity results a snapshot was built from.
type Generations = [u64; 5];

struct Cached {
    generations: Generations,
    result: LoadResult<WorldMapData>,
}

pub struct WorldMapLoader {
    provinces: Arc<DefaultMapLoader>,
    countries: Arc<CountriesLoader>,
    states: Arc<StatesLoader>,
    strategic_regions: Arc<StrategicRegionsLoader>,
    supply_areas: Arc<SupplyAreasLoader>,
    cached: Mutex<Option<Cached>>,
    generation: AtomicU64,
}

impl WorldMapLoader {
    pub fn new(source: Arc<dyn FileSource>, config: &WorldMapConfig) -> Self {
        let max_id = config.max_id;
        let provinces = Arc::new(DefaultMapLoader::new(
            config.default_map.clone(),
            Arc::clone(&source),
            max_id,
        ));
        let countries = Arc::new(CountriesLoader::new(
            "countries",
            config.countries.clone(),
            Arc::clone(&source),
            CountriesMerge,
        ));
        let states = Arc::new(
            StatesLoader::new(
                "states",
                config.states.clone(),
                Arc::clone(&source),
                StatesMerge::new(provinces.clone(), countries.clone(), max_id),
            )
            .with_upstream(provinces.clone())
            .with_upstream(countries.clone()),
        );
        let strategic_regions = Arc::new(
            StrategicRegionsLoader::new(
                "strategic regions",
                config.strategic_regions.clone(),
                Arc::clone(&source),
                StrategicRegionsMerge::new(provinces.clone(), states.clone(), max_id),
            )
            .with_upstream(provinces.clone())
            .with_upstream(states.clone()),
        );
        let supply_areas = Arc::new(
            SupplyAreasLoader::new(
                "supply areas",
                config.supply_areas.clone(),
                source,
                SupplyAreasMerge::new(provinces.clone(), states.clone(), max_id),
            )
            .with_upstream(provinces.clone())
            .with_upstream(states.clone()),
        );

        Self {
            provinces,
            countries,
            states,
            strategic_regions,
            supply_areas,
            cached: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn provinces(&self) -> &Arc<DefaultMapLoader> {
        &self.provinces
    }

    pub fn states(&self) -> &Arc<StatesLoader> {
        &self.states
    }

    pub fn strategic_regions(&self) -> &Arc<StrategicRegionsLoader> {
        &self.strategic_regions
    }

    pub fn supply_areas(&self) -> &Arc<SupplyAreasLoader> {
        &self.supply_areas
    }

    fn children(&self) -> [&dyn Reloadable; 5] {
        [
            self.provinces.as_ref(),
            self.countries.as_ref(),
            self.states.as_ref(),
            self.strategic_regions.as_ref(),
            self.supply_areas.as_ref(),
        ]
    }
}

#[async_trait]
impl Reloadable for WorldMapLoader {
    fn name(&self) -> &str {
        "worldmap"
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    async fn should_reload(&self) -> bool {
        if self.cached.lock().await.is_none() {
            return true;
        }
        for child in self.children() {
            if child.should_reload().await {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl Loader for WorldMapLoader {
    type Output = WorldMapData;

    async fn load(&self, force: bool) -> Result<LoadResult<WorldMapData>, DataLoadError> {
        let mut cached = self.cached.lock().await;

        let (countries, provinces) =
            tokio::try_join!(self.countries.load(force), self.provinces.load(force))?;
        let states = self.states.load(force).await?;
        let (strategic_regions, supply_areas) = tokio::try_join!(
            self.strategic_regions.load(force),
            self.supply_areas.load(force)
        )?;

        let generations = [
            provinces.generation,
            countries.generation,
            states.generation,
            strategic_regions.generation,
            supply_areas.generation,
        ];
        if !force {
            if let Some(hit) = cached.as_ref().filter(|c| c.generations == generations) {
                tracing::debug!(loader = "worldmap", "snapshot unchanged");
                return Ok(hit.result.clone());
            }
        }

        let mut warnings = Vec::new();
        let mut dependencies: Vec<String> = Vec::new();
        for (w, deps) in [
            (&provinces.warnings, &provinces.dependencies),
            (&countries.warnings, &countries.dependencies),
            (&states.warnings, &states.dependencies),
            (&strategic_regions.warnings, &strategic_regions.dependencies),
            (&supply_areas.warnings, &supply_areas.dependencies),
        ] {
            warnings.extend(w.iter().cloned());
            for dep in deps {
                if !dependencies.contains(dep) {
                    dependencies.push(dep.clone());
                }
            }
        }

        let data = WorldMapData::assemble(SnapshotParts {
            width: provinces.result.width,
            height: provinces.result.height,
            provinces: provinces.result.provinces.clone(),
            states: states.result.states.clone(),
            countries: countries.result.countries.clone(),
            strategic_regions: strategic_regions.result.strategic_regions.clone(),
            supply_areas: supply_areas.result.supply_areas.clone(),
            continents: provinces.result.continents.clone(),
            terrains: provinces.result.terrains.clone(),
            warnings,
        });

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            loader = "worldmap",
            provinces = data.provinces_count,
            states = data.states_count,
            countries = data.countries_count,
            strategic_regions = data.strategic_regions_count,
            supply_areas = data.supply_areas_count,
            warnings = data.warnings.len(),
            generation,
            "world map assembled"
        );

        let result = LoadResult {
            warnings: data.warnings.clone(),
            result: Arc::new(data),
            dependencies,
            generation,
        };
        *cached = Some(Cached {
            generations,
            result: result.clone(),
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFileSource;
    use crate::test_support::*;

    fn loader(source: &Arc<MemoryFileSource>) -> WorldMapLoader {
        WorldMapLoader::new(source.clone(), &WorldMapConfig::default())
    }

    #[tokio::test]
    async fn sample_game_assembles_clean_snapshot() {
        let source = Arc::new(sample_game());
        let result = loader(&source).load(false).await.unwrap();
        let data = &result.result;

        assert!(data.warnings.is_empty(), "{:?}", data.warnings);
        assert_eq!((data.width, data.height), (100, 10));
        // Slot 0 is the unused id 0.
        assert_eq!(data.provinces_count, 6);
        assert_eq!(data.states_count, 3);
        assert_eq!(data.countries_count, 2);
        assert_eq!(data.strategic_regions_count, 3);
        assert_eq!(data.supply_areas_count, 2);
        assert_eq!(data.bad_states_count, 0);
        assert_eq!(data.continents, vec!["europe"]);
        assert_eq!(data.terrains, vec!["forest", "hills", "ocean", "plains"]);

        assert_eq!(
            result.dependencies,
            vec![
                "map/default_map.ron",
                "map/definition.json",
                "map/adjacencies.ron",
                "common/countries/*",
                "history/states/*",
                "map/strategicregions/*",
                "map/supplyareas/*",
            ]
        );
    }

    #[tokio::test]
    async fn unchanged_files_reuse_snapshot() {
        let source = Arc::new(sample_game());
        let loader = loader(&source);
        let first = loader.load(false).await.unwrap();
        assert!(!loader.should_reload().await);
        let second = loader.load(false).await.unwrap();
        assert!(Arc::ptr_eq(&first.result, &second.result));
        assert_eq!(first.generation, second.generation);
    }

    #[tokio::test]
    async fn force_builds_a_new_snapshot() {
        let source = Arc::new(sample_game());
        let loader = loader(&source);
        let first = loader.load(false).await.unwrap();
        let forced = loader.load(true).await.unwrap();
        assert!(!Arc::ptr_eq(&first.result, &forced.result));
        assert_eq!(first.result, forced.result);
        assert_eq!(forced.generation, first.generation + 1);
    }

    #[tokio::test]
    async fn warnings_are_concatenated_in_loader_order() {
        let source = Arc::new(sample_game());
        source.write(
            "map/definition.json",
            r#"[
                {"id": 1, "color": [10, 0, 0], "continent": 3, "bounds": {"x": 0, "y": 0, "w": 10, "h": 10}},
                {"id": 2, "color": [20, 0, 0], "bounds": {"x": 10, "y": 0, "w": 10, "h": 10}},
                {"id": 3, "color": [30, 0, 0], "bounds": {"x": 20, "y": 0, "w": 10, "h": 10}},
                {"id": 4, "color": [40, 0, 0], "bounds": {"x": 30, "y": 0, "w": 10, "h": 10}},
                {"id": 5, "color": [0, 0, 50], "kind": "sea", "terrain": "ocean", "bounds": {"x": 40, "y": 0, "w": 60, "h": 10}}
            ]"#,
        );
        source.write("common/countries/more.ron", r#"[(tag: "AAA")]"#);
        source.write("map/supplyareas/areas.ron", r#"[(id: 1, states: [1])]"#);

        let result = loader(&source).load(false).await.unwrap();
        let texts: Vec<&str> = result.result.warnings.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts.len(), 3, "{texts:?}");
        assert!(texts[0].starts_with("Province 1 has continent 3"));
        assert!(texts[1].starts_with("Country tag AAA is defined in both"));
        assert_eq!(texts[2], "State 2 is not in any supply area.");
    }

    #[tokio::test]
    async fn state_edit_changes_only_states() {
        let source = Arc::new(sample_game());
        let loader = loader(&source);
        let first = loader.load(false).await.unwrap();

        source.write(
            "history/states/2.ron",
            r#"[(id: 2, name: "RENAMED", owner: Some("BBB"), provinces: [3, 4])]"#,
        );
        assert!(loader.should_reload().await);
        let second = loader.load(false).await.unwrap();

        assert_eq!(first.result.provinces, second.result.provinces);
        assert_eq!(first.result.countries, second.result.countries);
        let renamed = second.result.states[2].as_ref().unwrap();
        assert_eq!(renamed.name, "RENAMED");
    }

    #[tokio::test]
    async fn province_change_marks_every_dependent_for_reload() {
        let source = Arc::new(sample_game());
        let loader = loader(&source);
        loader.load(false).await.unwrap();
        assert!(!loader.states().should_reload().await);
        assert!(!loader.strategic_regions().should_reload().await);
        assert!(!loader.supply_areas().should_reload().await);

        source.write("map/definition.json", DEFINITIONS);
        assert!(loader.provinces().should_reload().await);
        assert!(loader.states().should_reload().await);
        assert!(loader.strategic_regions().should_reload().await);
        assert!(loader.supply_areas().should_reload().await);

        // Reloading through one consumer refreshes provinces and states, but
        // the other consumer still holds results built from the old ones.
        loader.strategic_regions().load(false).await.unwrap();
        assert!(!loader.provinces().should_reload().await);
        assert!(!loader.states().should_reload().await);
        assert!(!loader.strategic_regions().should_reload().await);
        assert!(loader.supply_areas().should_reload().await);
        assert!(loader.should_reload().await);

        loader.load(false).await.unwrap();
        assert!(!loader.supply_areas().should_reload().await);
        assert!(!loader.should_reload().await);
    }

    #[tokio::test]
    async fn province_id_overflow_fails_the_load() {
        let source = Arc::new(sample_game());
        let config = WorldMapConfig {
            max_id: 3,
            ..WorldMapConfig::default()
        };
        let loader = WorldMapLoader::new(source.clone(), &config);
        let err = loader.load(false).await.unwrap_err();
        assert!(matches!(err, DataLoadError::Reconcile(_)));
    }
}
