use std::sync::Arc;

use async_trait::async_trait;

use worldmap_core::composite::resolve_composites;
use worldmap_core::entity::SupplyArea;
use worldmap_core::geometry::Region;
use worldmap_core::id::{EntityId, EntityKind};
use worldmap_core::reconcile::{SortedItems, sort_items};
use worldmap_core::validation::{
    OwnershipMap, check_multiple_parents, check_supply_area_contiguity, check_unassigned,
};

use crate::framework::{FolderLoader, FolderMerge, Merged};
use crate::loader::{DataLoadError, parse_records_with_spans};
use crate::provinces::DefaultMapLoader;
use crate::schema::SupplyAreaData;
use crate::states::StatesLoader;
use crate::tracker::UpstreamTracker;

#[derive(Debug, Clone, Default)]
pub struct SupplyAreaMap {
    pub supply_areas: SortedItems<SupplyArea>,
    /// State id to the supply areas claiming it.
    pub state_area: OwnershipMap,
}

pub type SupplyAreasLoader = FolderLoader<SupplyAreasMerge>;

/// Supply areas group states. Impassable states need no area.
pub struct SupplyAreasMerge {
    provinces: Arc<DefaultMapLoader>,
    states: Arc<StatesLoader>,
    max_id: EntityId,
}

impl SupplyAreasMerge {
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
impl FolderMerge for SupplyAreasMerge {
    type Record = SupplyArea;
    type Output = SupplyAreaMap;

    fn parse(path: &str, text: &str) -> Result<Vec<SupplyArea>, DataLoadError> {
        let records = parse_records_with_spans::<SupplyAreaData>(path, text, "supply_areas")?;
        Ok(records
            .into_iter()
            .map(|(a, span)| SupplyArea {
                id: a.id,
                name: a.name,
                value: a.value,
                states: a.states,
                region: Region::default(),
                file: path.to_string(),
                span,
            })
            .collect())
    }

    async fn merge(
        &self,
        records: Vec<SupplyArea>,
        upstream: &mut UpstreamTracker,
    ) -> Result<Merged<SupplyAreaMap>, DataLoadError> {
        let provinces = upstream.load(&self.provinces).await?;
        let states = upstream.load(&self.states).await?;

        let mut warnings = Vec::new();
        let mut supply_areas = sort_items(records, self.max_id, &mut warnings)?;
        let state_area = resolve_composites(
            &mut supply_areas,
            |s| states.contains(s),
            |s| states.region_of(s),
            provinces.width,
            &mut warnings,
        );

        warnings.extend(check_multiple_parents(
            &state_area,
            &supply_areas,
            EntityKind::State,
            |_| None,
        ));
        warnings.extend(check_unassigned(
            states
                .states
                .canonical()
                .filter(|s| !s.impassable)
                .map(|s| (s.id, None)),
            &state_area,
            EntityKind::State,
            EntityKind::SupplyArea,
        ));
        warnings.extend(check_supply_area_contiguity(
            &supply_areas,
            &states.states,
            &states.province_owner,
            &state_area,
            &provinces.graph,
        ));

        Ok(Merged {
            result: SupplyAreaMap {
                supply_areas,
                state_area,
            },
            warnings,
        })
    }
}
