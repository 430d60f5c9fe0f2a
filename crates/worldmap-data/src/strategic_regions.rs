use std::sync::Arc;

use async_trait::async_trait;

use worldmap_core::composite::resolve_composites;
use worldmap_core::entity::StrategicRegion;
use worldmap_core::geometry::Region;
use worldmap_core::id::{EntityId, EntityKind};
use worldmap_core::reconcile::{SortedItems, sort_items};
use worldmap_core::validation::{
    OwnershipMap, check_multiple_parents, check_naval_terrain, check_state_region_consistency,
    check_unassigned,
};

use crate::framework::{FolderLoader, FolderMerge, Merged};
use crate::loader::{DataLoadError, parse_records_with_spans};
use crate::provinces::DefaultMapLoader;
use crate::schema::StrategicRegionData;
use crate::states::StatesLoader;
use crate::tracker::UpstreamTracker;

#[derive(Debug, Clone, Default)]
pub struct StrategicRegionMap {
    pub strategic_regions: SortedItems<StrategicRegion>,
    /// Province id to the strategic regions claiming it.
    pub province_region: OwnershipMap,
}

pub type StrategicRegionsLoader = FolderLoader<StrategicRegionsMerge>;

/// Strategic regions cover every province, land and sea.
pub struct StrategicRegionsMerge {
    provinces: Arc<DefaultMapLoader>,
    states: Arc<StatesLoader>,
    max_id: EntityId,
}

impl StrategicRegionsMerge {
    pub fn new(
        provinces: Arc<DefaultMapLoader>,
        states: Arc<StatesLoader>,
        max_id: EntityId,
    ) -> Self {
        Self {
            provinces,
            states,
            max_id,
        }
    }
}

#[async_trait]
impl FolderMerge for StrategicRegionsMerge {
    type Record = StrategicRegion;
    type Output = StrategicRegionMap;

    fn parse(path: &str, text: &str) -> Result<Vec<StrategicRegion>, DataLoadError> {
        let records =
            parse_records_with_spans::<StrategicRegionData>(path, text, "strategic_regions")?;
        Ok(records
            .into_iter()
            .map(|(r, span)| StrategicRegion {
                id: r.id,
                name: r.name,
                provinces: r.provinces,
                naval_terrain: r.naval_terrain,
                region: Region::default(),
                file: path.to_string(),
                span,
            })
            .collect())
    }

    async fn merge(
        &self,
        records: Vec<StrategicRegion>,
        upstream: &mut UpstreamTracker,
    ) -> Result<Merged<StrategicRegionMap>, DataLoadError> {
        let provinces = upstream.load(&self.provinces).await?;
        let states = upstream.load(&self.states).await?;

        let mut warnings = Vec::new();
        let mut strategic_regions = sort_items(records, self.max_id, &mut warnings)?;
        let province_region = resolve_composites(
            &mut strategic_regions,
            |p| provinces.contains(p),
            |p| provinces.region_of(p),
            provinces.width,
            &mut warnings,
        );

        warnings.extend(check_multiple_parents(
            &province_region,
            &strategic_regions,
            EntityKind::Province,
            |p| provinces.color_of(p),
        ));
        warnings.extend(check_unassigned(
            provinces
                .provinces
                .canonical()
                .map(|p| (p.id, Some(p.color))),
            &province_region,
            EntityKind::Province,
            EntityKind::StrategicRegion,
        ));
        warnings.extend(check_naval_terrain(&strategic_regions, &provinces.terrains));
        warnings.extend(check_state_region_consistency(
            &states.states,
            &province_region,
            |p| provinces.color_of(p),
        ));

        Ok(Merged {
            result: StrategicRegionMap {
                strategic_regions,
                province_region,
            },
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::{CountriesLoader, CountriesMerge};
    use crate::framework::Loader;
    use crate::source::{FileSource, MemoryFileSource};
    use crate::states::StatesMerge;
    use crate::test_support::*;

    fn loader(source: &Arc<MemoryFileSource>) -> StrategicRegionsLoader {
        let source: Arc<dyn FileSource> = source.clone();
        let provinces = Arc::new(DefaultMapLoader::new(
            "map/default_map.ron",
            source.clone(),
            10_000,
        ));
        let countries = Arc::new(CountriesLoader::new(
            "countries",
            "common/countries",
            source.clone(),
            CountriesMerge,
        ));
        let states = Arc::new(
            StatesLoader::new(
                "states",
                "history/states",
                source.clone(),
                StatesMerge::new(provinces.clone(), countries.clone(), 10_000),
            )
            .with_upstream(provinces.clone())
            .with_upstream(countries),
        );
        StrategicRegionsLoader::new(
            "strategic regions",
            "map/strategicregions",
            source,
            StrategicRegionsMerge::new(provinces.clone(), states.clone(), 10_000),
        )
        .with_upstream(provinces)
        .with_upstream(states)
    }

    #[tokio::test]
    async fn regions_cover_land_and_sea() {
        let source = Arc::new(sample_game());
        let result = loader(&source).load(false).await.unwrap();
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);

        let map = &result.result;
        assert_eq!(map.province_region.owner(5), Some(2));
        let sea = map.strategic_regions.get(2).unwrap();
        assert_eq!(sea.region.mass, 1);
        assert_eq!(sea.naval_terrain.as_deref(), Some("ocean"));
        assert_eq!(map.strategic_regions.get(1).unwrap().region.mass, 4);
        assert!(result.dependencies.contains(&"history/states/*".to_string()));
    }

    #[tokio::test]
    async fn split_state_and_unknown_terrain_are_warned() {
        let source = Arc::new(sample_game());
        source.write(
            "map/strategicregions/regions.ron",
            r#"[
                (id: 1, provinces: [1, 2, 3]),
                (id: 2, provinces: [4, 5], naval_terrain: Some("lava")),
            ]"#,
        );
        let result = loader(&source).load(false).await.unwrap();
        let texts: Vec<&str> = result.warnings.iter().map(|w| w.text.as_str()).collect();

        assert_eq!(texts.len(), 2, "{texts:?}");
        assert_eq!(texts[0], "Strategic region 2 has unknown naval terrain lava.");
        assert!(texts[1].starts_with("Province 4 of state 2 is in strategic region 2"));
        assert!(texts[1].ends_with("Provinces outside it: 4."));
    }

    #[tokio::test]
    async fn sea_province_outside_any_region_is_warned() {
        let source = Arc::new(sample_game());
        source.write(
            "map/strategicregions/regions.ron",
            r#"[(id: 1, provinces: [1, 2, 3, 4])]"#,
        );
        let result = loader(&source).load(false).await.unwrap();
        let texts: Vec<&str> = result.warnings.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Province 5 is not in any strategic region."]);
        assert_eq!(result.warnings[0].source.len(), 1);
    }

    #[tokio::test]
    async fn state_edit_reloads_regions() {
        let source = Arc::new(sample_game());
        let regions = loader(&source);
        let first = regions.load(false).await.unwrap();
        source.write("history/states/2.ron", STATE_2);
        let second = regions.load(false).await.unwrap();
        assert_eq!(second.generation, first.generation + 1);
        let third = regions.load(false).await.unwrap();
        assert_eq!(third.generation, second.generation);
    }
}
