//! Cross-entity validation.
//!
//! Validators are pure: they read reconciled entities and the ownership maps
//! built during geometry, and return warnings. Nothing here is fatal.

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::{Identified, Province, State, StrategicRegion, SupplyArea};
use crate::graph::{ProvinceGraph, check_contiguous};
use crate::id::{EntityId, EntityKind};
use crate::reconcile::SortedItems;
use crate::warning::Warning;

// ---------------------------------------------------------------------------
// Ownership map
// ---------------------------------------------------------------------------

/// Reverse map from child id to every parent that claims it, in the order
/// the parents were visited.
///
/// The first parent is the owner: geometry and downstream lookups only
/// count a child toward its owner, and the other claims become warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipMap {
    parents: BTreeMap<EntityId, Vec<EntityId>>,
}

impl OwnershipMap {
    /// Build from `(parent, children)` pairs. Parents must be given in
    /// reconciled order (ascending canonical id) for first-seen-wins to be
    /// deterministic. A parent listing the same child twice claims it once.
    pub fn build<'a>(claims: impl IntoIterator<Item = (EntityId, &'a [EntityId])>) -> Self {
        let mut parents: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
        for (parent, children) in claims {
            for &child in children {
                let entry = parents.entry(child).or_default();
                if !entry.contains(&parent) {
                    entry.push(parent);
                }
            }
        }
        Self { parents }
    }

    /// The parent that owns `child`: the first one that claimed it.
    pub fn owner(&self, child: EntityId) -> Option<EntityId> {
        self.parents.get(&child).and_then(|p| p.first().copied())
    }

    pub fn parents(&self, child: EntityId) -> &[EntityId] {
        self.parents.get(&child).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_owned_by(&self, child: EntityId, parent: EntityId) -> bool {
        self.owner(child) == Some(parent)
    }

    /// Children claimed by more than one parent, ascending by child id.
    pub fn multi_owned(&self) -> impl Iterator<Item = (EntityId, &[EntityId])> {
        self.parents
            .iter()
            .filter(|(_, p)| p.len() > 1)
            .map(|(&c, p)| (c, p.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Member resolution
// ---------------------------------------------------------------------------

/// Splits declared child ids into resolvable ones, warning once for each
/// reference that points at nothing. Order and duplicates are preserved.
pub fn resolve_members(
    parent_kind: EntityKind,
    parent_id: EntityId,
    parent_file: &str,
    child_kind: EntityKind,
    declared: &[EntityId],
    exists: impl Fn(EntityId) -> bool,
    warnings: &mut Vec<Warning>,
) -> Vec<EntityId> {
    let mut valid = Vec::with_capacity(declared.len());
    for &child in declared {
        if exists(child) {
            valid.push(child);
        } else {
            warnings.push(
                Warning::new(format!(
                    "{} {} references {} {}, which doesn't exist.",
                    parent_kind.label(),
                    parent_id,
                    child_kind.noun(),
                    child
                ))
                .with_source(parent_kind, parent_id)
                .with_file(parent_file),
            );
        }
    }
    valid
}

pub fn no_valid_members(
    parent_kind: EntityKind,
    parent_id: EntityId,
    parent_file: &str,
    child_kind: EntityKind,
) -> Warning {
    Warning::new(format!(
        "{} {} doesn't have any valid {}.",
        parent_kind.label(),
        parent_id,
        plural(child_kind)
    ))
    .with_source(parent_kind, parent_id)
    .with_file(parent_file)
}

fn plural(kind: EntityKind) -> String {
    format!("{}s", kind.noun())
}

fn id_list(ids: &[EntityId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn child_source(w: Warning, kind: EntityKind, id: EntityId, color: Option<u32>) -> Warning {
    if kind == EntityKind::Province {
        w.with_province(id, color)
    } else {
        w.with_source(kind, id)
    }
}

// ---------------------------------------------------------------------------
// Generic ownership checks
// ---------------------------------------------------------------------------

/// One warning per child claimed by more than one parent.
pub fn check_multiple_parents<P: Identified>(
    map: &OwnershipMap,
    parents: &SortedItems<P>,
    child_kind: EntityKind,
    color_of: impl Fn(EntityId) -> Option<u32>,
) -> Vec<Warning> {
    let parent_kind = P::KIND;
    map.multi_owned()
        .map(|(child, owners)| {
            let mut w = Warning::new(format!(
                "{} {} is in multiple {}: {}.",
                child_kind.label(),
                child,
                plural(parent_kind),
                id_list(owners)
            ));
            w = child_source(w, child_kind, child, color_of(child));
            for &owner in owners {
                w = w.with_source(parent_kind, owner);
                if let Some(p) = parents.get(owner) {
                    w = w.with_file(p.file());
                }
            }
            w
        })
        .collect()
}

/// One warning per candidate child that no parent claims.
///
/// Callers pass only the children that must be assigned, each with its
/// highlight color when it is a province.
pub fn check_unassigned(
    candidates: impl IntoIterator<Item = (EntityId, Option<u32>)>,
    map: &OwnershipMap,
    child_kind: EntityKind,
    parent_kind: EntityKind,
) -> Vec<Warning> {
    candidates
        .into_iter()
        .filter(|(id, _)| map.owner(*id).is_none())
        .map(|(id, color)| {
            let w = Warning::new(format!(
                "{} {} is not in any {}.",
                child_kind.label(),
                id,
                parent_kind.noun()
            ));
            child_source(w, child_kind, id, color)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Sea provinces must not belong to a state.
pub fn check_sea_provinces_in_states(
    states: &SortedItems<State>,
    provinces: &SortedItems<Province>,
) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for state in states.canonical() {
        for &p in &state.provinces {
            let Some(province) = provinces.get(p).filter(|_| p > 0) else {
                continue;
            };
            if province.is_sea() {
                warnings.push(
                    Warning::new(format!(
                        "Sea province {} should not belong to state {}.",
                        p, state.id
                    ))
                    .with_source(EntityKind::State, state.id)
                    .with_province(p, Some(province.color))
                    .with_file(&state.file),
                );
            }
        }
    }
    warnings
}

/// Victory points may only sit on the state's own provinces.
pub fn check_victory_points(states: &SortedItems<State>) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for state in states.canonical() {
        for &p in state.victory_points.keys() {
            if !state.provinces.contains(&p) {
                warnings.push(
                    Warning::new(format!(
                        "State {} has a victory point in province {}, which is not part of the state.",
                        state.id, p
                    ))
                    .with_source(EntityKind::State, state.id)
                    .with_file(&state.file),
                );
            }
        }
    }
    warnings
}

/// Owner and core tags must name a defined country.
pub fn check_country_tags(states: &SortedItems<State>, tags: &BTreeSet<String>) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for state in states.canonical() {
        let owner = state.owner.iter().map(|t| ("owner", t));
        let cores = state.cores.iter().map(|t| ("core", t));
        for (role, tag) in owner.chain(cores) {
            if !tags.contains(tag) {
                warnings.push(
                    Warning::new(format!(
                        "State {} has {} tag {}, which is not a defined country.",
                        state.id, role, tag
                    ))
                    .with_source(EntityKind::State, state.id)
                    .with_file(&state.file),
                );
            }
        }
    }
    warnings
}

// ---------------------------------------------------------------------------
// Strategic regions
// ---------------------------------------------------------------------------

/// Naval terrain, when given, must be one of the known terrains.
pub fn check_naval_terrain(
    regions: &SortedItems<StrategicRegion>,
    terrains: &[String],
) -> Vec<Warning> {
    regions
        .canonical()
        .filter_map(|r| {
            let terrain = r.naval_terrain.as_ref()?;
            if terrains.contains(terrain) {
                return None;
            }
            Some(
                Warning::new(format!(
                    "Strategic region {} has unknown naval terrain {}.",
                    r.id, terrain
                ))
                .with_source(EntityKind::StrategicRegion, r.id)
                .with_file(&r.file),
            )
        })
        .collect()
}

/// A state's provinces should share one strategic region.
///
/// For each state whose provinces span several regions, the region holding
/// the most of them is the majority (ties go to the region seen first). Every
/// province outside the majority gets its own warning that also lists the
/// whole minority set. Provinces without a region are skipped.
pub fn check_state_region_consistency(
    states: &SortedItems<State>,
    province_region: &OwnershipMap,
    color_of: impl Fn(EntityId) -> Option<u32>,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for state in states.canonical() {
        let mut counts: Vec<(EntityId, usize)> = Vec::new();
        for &p in &state.provinces {
            let Some(region) = province_region.owner(p) else {
                continue;
            };
            match counts.iter_mut().find(|(r, _)| *r == region) {
                Some((_, n)) => *n += 1,
                None => counts.push((region, 1)),
            }
        }
        if counts.len() < 2 {
            continue;
        }

        let mut majority = counts[0];
        for &candidate in &counts[1..] {
            if candidate.1 > majority.1 {
                majority = candidate;
            }
        }

        let minority: Vec<EntityId> = state
            .provinces
            .iter()
            .copied()
            .filter(|&p| province_region.owner(p).is_some_and(|r| r != majority.0))
            .collect();

        for &p in &minority {
            let region = province_region.owner(p).unwrap_or_default();
            warnings.push(
                Warning::new(format!(
                    "Province {} of state {} is in strategic region {}, but most of the state is in strategic region {}. Provinces outside it: {}.",
                    p,
                    state.id,
                    region,
                    majority.0,
                    id_list(&minority)
                ))
                .with_province(p, color_of(p))
                .with_source(EntityKind::State, state.id)
                .with_source(EntityKind::StrategicRegion, region)
                .with_file(&state.file),
            );
        }
    }

    warnings
}

// ---------------------------------------------------------------------------
// Supply areas
// ---------------------------------------------------------------------------

/// Every supply area's owned member states must be connected.
///
/// A state takes part with the provinces it owns in `province_state`, the
/// same provinces its region is built from.
pub fn check_supply_area_contiguity(
    areas: &SortedItems<SupplyArea>,
    states: &SortedItems<State>,
    province_state: &OwnershipMap,
    state_area: &OwnershipMap,
    graph: &ProvinceGraph,
) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for area in areas.canonical() {
        let mut seen = BTreeSet::new();
        let members: Vec<(EntityId, Vec<EntityId>)> = area
            .states
            .iter()
            .copied()
            .filter(|&s| seen.insert(s) && state_area.is_owned_by(s, area.id))
            .filter_map(|s| {
                states
                    .get(s)
                    .map(|state| (s, owned_provinces(state, province_state)))
            })
            .collect();

        if let Some((reached, unreached)) = check_contiguous(&members, graph) {
            warnings.push(
                Warning::new(format!(
                    "Supply area {} is not contiguous: state {} can't reach state {}.",
                    area.id, reached, unreached
                ))
                .with_source(EntityKind::SupplyArea, area.id)
                .with_source(EntityKind::State, reached)
                .with_source(EntityKind::State, unreached)
                .with_file(&area.file),
            );
        }
    }
    warnings
}

fn owned_provinces(state: &State, province_state: &OwnershipMap) -> Vec<EntityId> {
    let mut seen = BTreeSet::new();
    state
        .provinces
        .iter()
        .copied()
        .filter(|&p| seen.insert(p) && province_state.is_owned_by(p, state.id))
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AdjacencyKind;
    use crate::reconcile::sort_items;
    use crate::test_utils::*;

    fn sorted<T: Identified>(items: Vec<T>) -> SortedItems<T> {
        let mut w = Vec::new();
        sort_items(items, 10_000, &mut w).unwrap()
    }

    #[test]
    fn first_claim_owns_the_child() {
        let map = OwnershipMap::build([(1, &[10, 11][..]), (2, &[11, 12][..])]);
        assert_eq!(map.owner(11), Some(1));
        assert_eq!(map.parents(11), &[1, 2]);
        assert!(map.is_owned_by(12, 2));
        assert_eq!(map.owner(99), None);
        let multi: Vec<_> = map.multi_owned().collect();
        assert_eq!(multi, vec![(11, &[1, 2][..])]);
    }

    #[test]
    fn duplicate_claim_by_same_parent_is_not_multi_owned() {
        let map = OwnershipMap::build([(1, &[10, 10][..])]);
        assert_eq!(map.parents(10), &[1]);
        assert_eq!(map.multi_owned().count(), 0);
    }

    #[test]
    fn dangling_references_are_warned_and_dropped() {
        let mut warnings = Vec::new();
        let valid = resolve_members(
            EntityKind::State,
            3,
            "history/states/3.ron",
            EntityKind::Province,
            &[1, 99, 2],
            |p| p < 10,
            &mut warnings,
        );
        assert_eq!(valid, vec![1, 2]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].text,
            "State 3 references province 99, which doesn't exist."
        );
    }

    #[test]
    fn multiple_parents_warning_lists_all_parents() {
        let states = sorted(vec![state(1, &[5]), state(2, &[5])]);
        let map = OwnershipMap::build(states.canonical().map(|s| (s.id, s.provinces.as_slice())));
        let warnings = check_multiple_parents(&map, &states, EntityKind::Province, |_| Some(0xabcdef));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].text, "Province 5 is in multiple states: 1, 2.");
        assert_eq!(warnings[0].source[0].color, Some(0xabcdef));
        assert_eq!(warnings[0].source.len(), 3);
    }

    #[test]
    fn unassigned_children_are_reported() {
        let map = OwnershipMap::build([(1, &[1][..])]);
        let warnings = check_unassigned(
            [(1, None), (2, None)],
            &map,
            EntityKind::State,
            EntityKind::SupplyArea,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].text, "State 2 is not in any supply area.");
    }

    #[test]
    fn sea_province_in_state_is_warned() {
        let provinces = sorted(vec![land_province(1, 0, 0), sea_province(2, 1, 0)]);
        let states = sorted(vec![state(1, &[1, 2])]);
        let warnings = check_sea_provinces_in_states(&states, &provinces);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].text.starts_with("Sea province 2"));
    }

    #[test]
    fn victory_point_outside_state_is_warned() {
        let mut s = state(1, &[1, 2]);
        s.victory_points.insert(2, 5.0);
        s.victory_points.insert(7, 1.0);
        let warnings = check_victory_points(&sorted(vec![s]));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].text.contains("province 7"));
    }

    #[test]
    fn undefined_tags_are_warned() {
        let mut s = state(1, &[1]);
        s.owner = Some("GER".into());
        s.cores = vec!["GER".into(), "XXX".into()];
        let tags: BTreeSet<String> = ["GER".to_string()].into();
        let warnings = check_country_tags(&sorted(vec![s]), &tags);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].text.contains("core tag XXX"));
    }

    #[test]
    fn unknown_naval_terrain_is_warned() {
        let mut a = strategic_region(1, &[1]);
        a.naval_terrain = Some("water_deep_ocean".into());
        let mut b = strategic_region(2, &[2]);
        b.naval_terrain = Some("lava".into());
        let terrains = vec!["plains".to_string(), "water_deep_ocean".to_string()];
        let warnings = check_naval_terrain(&sorted(vec![a, b]), &terrains);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].text.contains("lava"));
    }

    #[test]
    fn minority_provinces_get_one_warning_each() {
        let states = sorted(vec![state(1, &[1, 2, 3, 4])]);
        // Region 10 holds 1, 2; region 20 holds 3; region 30 holds 4.
        let regions = OwnershipMap::build([(10, &[1, 2][..]), (20, &[3][..]), (30, &[4][..])]);
        let warnings = check_state_region_consistency(&states, &regions, |_| None);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].text.starts_with("Province 3 of state 1"));
        assert!(warnings[0].text.ends_with("Provinces outside it: 3, 4."));
        assert!(warnings[1].text.starts_with("Province 4 of state 1"));
    }

    #[test]
    fn consistent_state_has_no_warnings() {
        let states = sorted(vec![state(1, &[1, 2, 3])]);
        let regions = OwnershipMap::build([(10, &[1, 2][..])]);
        assert!(check_state_region_consistency(&states, &regions, |_| None).is_empty());
    }

    fn province_owners(states: &SortedItems<State>) -> OwnershipMap {
        OwnershipMap::build(states.canonical().map(|s| (s.id, s.provinces.as_slice())))
    }

    #[test]
    fn split_supply_area_is_warned() {
        let states = sorted(vec![state(1, &[1]), state(2, &[2]), state(3, &[3])]);
        let provinces = province_owners(&states);
        let areas = sorted(vec![supply_area(1, &[1, 2, 3])]);
        let map = OwnershipMap::build(areas.canonical().map(|a| (a.id, a.states.as_slice())));

        let connected = ProvinceGraph::from_edges([
            (1, 2, AdjacencyKind::Land),
            (2, 3, AdjacencyKind::Land),
        ]);
        assert!(
            check_supply_area_contiguity(&areas, &states, &provinces, &map, &connected).is_empty()
        );

        let split = ProvinceGraph::from_edges([(2, 3, AdjacencyKind::Land)]);
        let warnings = check_supply_area_contiguity(&areas, &states, &provinces, &map, &split);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].text,
            "Supply area 1 is not contiguous: state 1 can't reach state 2."
        );
    }

    #[test]
    fn contiguity_ignores_provinces_owned_elsewhere() {
        // Province 2 belongs to state 2, so state 3's claim on it does not
        // connect state 3 to state 1.
        let states = sorted(vec![state(1, &[1]), state(2, &[2]), state(3, &[2, 5])]);
        let provinces = province_owners(&states);
        let areas = sorted(vec![supply_area(1, &[1, 3])]);
        let map = OwnershipMap::build(areas.canonical().map(|a| (a.id, a.states.as_slice())));
        let graph = ProvinceGraph::from_edges([(1, 2, AdjacencyKind::Land)]);

        let warnings = check_supply_area_contiguity(&areas, &states, &provinces, &map, &graph);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].text,
            "Supply area 1 is not contiguous: state 1 can't reach state 3."
        );
    }
}
