use serde::{Deserialize, Serialize};

use crate::entity::{Country, Province, State, StrategicRegion, SupplyArea};
use crate::reconcile::SortedItems;
use crate::warning::Warning;

/// The complete loaded world map, as sent to the renderer.
///
/// Id-keyed lists are slot arrays: index `i` holds the entity with id
/// `i - bad_x_count`, gaps are `null`. A snapshot is never mutated after it
/// has been published; a refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldMapData {
    pub width: i32,
    pub height: i32,

    pub provinces: Vec<Option<Province>>,
    pub states: Vec<Option<State>>,
    pub countries: Vec<Country>,
    pub strategic_regions: Vec<Option<StrategicRegion>>,
    pub supply_areas: Vec<Option<SupplyArea>>,

    pub provinces_count: usize,
    pub states_count: usize,
    pub countries_count: usize,
    pub strategic_regions_count: usize,
    pub supply_areas_count: usize,

    pub bad_provinces_count: usize,
    pub bad_states_count: usize,
    pub bad_strategic_regions_count: usize,
    pub bad_supply_areas_count: usize,

    pub continents: Vec<String>,
    pub terrains: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// Inputs for [`WorldMapData::assemble`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotParts {
    pub width: i32,
    pub height: i32,
    pub provinces: SortedItems<Province>,
    pub states: SortedItems<State>,
    pub countries: Vec<Country>,
    pub strategic_regions: SortedItems<StrategicRegion>,
    pub supply_areas: SortedItems<SupplyArea>,
    pub continents: Vec<String>,
    pub terrains: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl WorldMapData {
    /// Flatten reconciled lists into a snapshot, deriving every count from
    /// the lists so they cannot disagree.
    pub fn assemble(parts: SnapshotParts) -> Self {
        let SnapshotParts {
            width,
            height,
            provinces,
            states,
            countries,
            strategic_regions,
            supply_areas,
            continents,
            terrains,
            warnings,
        } = parts;

        Self {
            width,
            height,
            provinces_count: provinces.len(),
            states_count: states.len(),
            countries_count: countries.len(),
            strategic_regions_count: strategic_regions.len(),
            supply_areas_count: supply_areas.len(),
            bad_provinces_count: provinces.bad_count(),
            bad_states_count: states.bad_count(),
            bad_strategic_regions_count: strategic_regions.bad_count(),
            bad_supply_areas_count: supply_areas.bad_count(),
            provinces: provinces.into_slots(),
            states: states.into_slots(),
            countries,
            strategic_regions: strategic_regions.into_slots(),
            supply_areas: supply_areas.into_slots(),
            continents,
            terrains,
            warnings,
        }
    }

    /// Copy with the bulk per-entity arrays emptied. Counts and the small
    /// wholesale lists are kept; the renderer pages the rest in on demand.
    pub fn summary(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            provinces: Vec::new(),
            states: Vec::new(),
            countries: Vec::new(),
            strategic_regions: Vec::new(),
            supply_areas: Vec::new(),
            provinces_count: self.provinces_count,
            states_count: self.states_count,
            countries_count: self.countries_count,
            strategic_regions_count: self.strategic_regions_count,
            supply_areas_count: self.supply_areas_count,
            bad_provinces_count: self.bad_provinces_count,
            bad_states_count: self.bad_states_count,
            bad_strategic_regions_count: self.bad_strategic_regions_count,
            bad_supply_areas_count: self.bad_supply_areas_count,
            continents: self.continents.clone(),
            terrains: self.terrains.clone(),
            warnings: self.warnings.clone(),
        }
    }
}
