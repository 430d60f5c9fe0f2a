//! States: groups of provinces with an owner, cores and victory points.

use std::sync::Arc;

use async_trait::async_trait;

use worldmap_core::composite::resolve_composites;
use worldmap_core::entity::State;
use worldmap_core::geometry::Region;
use worldmap_core::id::{EntityId, EntityKind, SourceSpan};
use worldmap_core::reconcile::{SortedItems, sort_items};
use worldmap_core::validation::{
    OwnershipMap, check_country_tags, check_multiple_parents, check_sea_provinces_in_states,
    check_unassigned, check_victory_points,
};

use crate::countries::CountriesLoader;
use crate::framework::{FolderLoader, FolderMerge, Merged};
use crate::loader::{DataLoadError, parse_records_with_spans};
use crate::provinces::DefaultMapLoader;
use crate::schema::StateData;
use crate::tracker::UpstreamTracker;

#[derive(Debug, Clone, Default)]
pub struct StateMap {
    pub states: SortedItems<State>,
    /// Province id to the states claiming it.
    pub province_owner: OwnershipMap,
}

impl StateMap {
    pub fn contains(&self, id: EntityId) -> bool {
        self.states.contains(id)
    }

    pub fn region_of(&self, id: EntityId) -> Option<Region> {
        self.states.get(id).filter(|_| id > 0).map(|s| s.region)
    }
}

pub type StatesLoader = FolderLoader<StatesMerge>;

pub struct StatesMerge {
    provinces: Arc<DefaultMapLoader>,
    countries: Arc<CountriesLoader>,
    max_id: EntityId,
}

impl StatesMerge {
    pub fn new(
        provinces: Arc<DefaultMapLoader>,
        countries: Arc<CountriesLoader>,
        max_id: EntityId,
    ) -> Self {
        Self {
            provinces,
            countries,
            max_id,
        }
    }
}

fn to_state(path: &str, (data, span): (StateData, Option<SourceSpan>)) -> State {
    State {
        id: data.id,
        name: data.name,
        manpower: data.manpower,
        category: data.category,
        owner: data.owner,
        provinces: data.provinces,
        cores: data.cores,
        impassable: data.impassable,
        victory_points: data
            .victory_points
            .into_iter()
            .map(|vp| (vp.province, vp.value))
            .collect(),
        region: Region::default(),
        file: path.to_string(),
        span,
    }
}

#[async_trait]
impl FolderMerge for StatesMerge {
    type Record = State;
    type Output = StateMap;

    fn parse(path: &str, text: &str) -> Result<Vec<State>, DataLoadError> {
        let records = parse_records_with_spans::<StateData>(path, text, "states")?;
        Ok(records.into_iter().map(|r| to_state(path, r)).collect())
    }

    async fn merge(
        &self,
        records: Vec<State>,
        upstream: &mut UpstreamTracker,
    ) -> Result<Merged<StateMap>, DataLoadError> {
        let provinces = upstream.load(&self.provinces).await?;
        let countries = upstream.load(&self.countries).await?;

        let mut warnings = Vec::new();
        let mut states = sort_items(records, self.max_id, &mut warnings)?;
        let province_owner = resolve_composites(
            &mut states,
            |p| provinces.contains(p),
            |p| provinces.region_of(p),
            provinces.width,
            &mut warnings,
        );

        let color_of = |p| provinces.color_of(p);
        warnings.extend(check_multiple_parents(
            &province_owner,
            &states,
            EntityKind::Province,
            color_of,
        ));
        warnings.extend(check_unassigned(
            provinces
                .provinces
                .canonical()
                .filter(|p| p.is_land())
                .map(|p| (p.id, Some(p.color))),
            &province_owner,
            EntityKind::Province,
            EntityKind::State,
        ));
        warnings.extend(check_sea_provinces_in_states(&states, &provinces.provinces));
        warnings.extend(check_victory_points(&states));
        warnings.extend(check_country_tags(&states, &countries.tags));

        Ok(Merged {
            result: StateMap {
                states,
                province_owner,
            },
            warnings,
        })
    }
}
