//! Entities made of other entities: states (of provinces), strategic regions
//! (of provinces) and supply areas (of states).
//!
//! [`resolve_composites`] runs the shared middle of every composite load:
//! member resolution, the ownership map and the derived geometry.

use std::collections::BTreeSet;

use crate::entity::{Identified, State, StrategicRegion, SupplyArea};
use crate::geometry::{Region, merge_regions};
use crate::id::{EntityId, EntityKind};
use crate::reconcile::SortedItems;
use crate::validation::{OwnershipMap, no_valid_members, resolve_members};
use crate::warning::Warning;

pub trait Composite: Identified {
    const MEMBER_KIND: EntityKind;

    /// Member ids in declaration order.
    fn members(&self) -> &[EntityId];
    fn set_region(&mut self, region: Region);
}

impl Composite for State {
    const MEMBER_KIND: EntityKind = EntityKind::Province;

    fn members(&self) -> &[EntityId] {
        &self.provinces
    }

    fn set_region(&mut self, region: Region) {
        self.region = region;
    }
}

impl Composite for StrategicRegion {
    const MEMBER_KIND: EntityKind = EntityKind::Province;

    fn members(&self) -> &[EntityId] {
        &self.provinces
    }

    fn set_region(&mut self, region: Region) {
        self.region = region;
    }
}

impl Composite for SupplyArea {
    const MEMBER_KIND: EntityKind = EntityKind::State;

    fn members(&self) -> &[EntityId] {
        &self.states
    }

    fn set_region(&mut self, region: Region) {
        self.region = region;
    }
}

/// Resolve members, build the ownership map and derive every canonical
/// parent's region.
///
/// - references for which `exists` is false produce a dangling-reference
///   warning and are dropped;
/// - a parent left without valid members gets the zero region, plus a "no
///   valid members" warning if it declared any;
/// - otherwise the region is the merge of the members it owns, each member
///   counted once. Members with an empty region do not contribute.
///
/// Bad-prefix parents are skipped entirely.
pub fn resolve_composites<P: Composite>(
    parents: &mut SortedItems<P>,
    exists: impl Fn(EntityId) -> bool,
    region_of: impl Fn(EntityId) -> Option<Region>,
    map_width: i32,
    warnings: &mut Vec<Warning>,
) -> OwnershipMap {
    let resolved: Vec<(EntityId, Vec<EntityId>)> = parents
        .canonical()
        .map(|p| {
            let valid = resolve_members(
                P::KIND,
                p.id(),
                p.file(),
                P::MEMBER_KIND,
                p.members(),
                &exists,
                warnings,
            );
            (p.id(), valid)
        })
        .collect();

    let ownership = OwnershipMap::build(resolved.iter().map(|(id, m)| (*id, m.as_slice())));

    for (id, valid) in &resolved {
        let Some(parent) = parents.get_mut(*id) else {
            continue;
        };
        if valid.is_empty() {
            if !parent.members().is_empty() {
                warnings.push(no_valid_members(P::KIND, *id, parent.file(), P::MEMBER_KIND));
            }
            parent.set_region(Region::default());
            continue;
        }

        let mut seen = BTreeSet::new();
        let regions: Vec<Region> = valid
            .iter()
            .copied()
            .filter(|&m| seen.insert(m) && ownership.is_owned_by(m, *id))
            .filter_map(&region_of)
            .filter(|r| !r.is_empty())
            .collect();
        parent.set_region(merge_regions(&regions, map_width));
    }

    ownership
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::reconcile::sort_items;
    use crate::test_utils::*;

    fn leaf(x: i32) -> Region {
        Region::leaf(BoundingBox::new(x, 0, 1, 1), 1)
    }

    fn states(items: Vec<State>) -> SortedItems<State> {
        let mut w = Vec::new();
        sort_items(items, 100, &mut w).unwrap()
    }

    #[test]
    fn region_merges_owned_members() {
        let mut s = states(vec![state(1, &[1, 2, 2])]);
        let mut warnings = Vec::new();
        resolve_composites(&mut s, |p| p <= 3, |p| Some(leaf(p * 10)), 100, &mut warnings);
        let region = s.get(1).unwrap().region;
        assert!(warnings.is_empty());
        assert_eq!(region.mass, 2);
        assert_eq!(region.bounding_box, BoundingBox::new(10, 0, 11, 1));
    }

    #[test]
    fn unresolved_members_give_zero_region_and_one_warning() {
        let mut s = states(vec![state(1, &[98, 99])]);
        let mut warnings = Vec::new();
        resolve_composites(&mut s, |_| false, |p| Some(leaf(p)), 100, &mut warnings);
        let region = s.get(1).unwrap().region;
        assert_eq!(region, Region::default());
        assert_eq!(region.mass, 0);
        let no_members: Vec<_> = warnings
            .iter()
            .filter(|w| w.text == "State 1 doesn't have any valid provinces.")
            .collect();
        assert_eq!(no_members.len(), 1);
        // Plus one dangling-reference warning per reference.
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn empty_declaration_is_silent() {
        let mut s = states(vec![state(1, &[])]);
        let mut warnings = Vec::new();
        resolve_composites(&mut s, |_| true, |p| Some(leaf(p)), 100, &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(s.get(1).unwrap().region, Region::default());
    }

    #[test]
    fn shared_member_counts_for_first_parent_only() {
        let mut s = states(vec![state(1, &[1, 2]), state(2, &[2, 3])]);
        let mut warnings = Vec::new();
        let ownership =
            resolve_composites(&mut s, |_| true, |p| Some(leaf(p * 10)), 1000, &mut warnings);
        assert_eq!(ownership.owner(2), Some(1));
        assert_eq!(s.get(1).unwrap().region.mass, 2);
        assert_eq!(s.get(2).unwrap().region.mass, 1);
        assert_eq!(s.get(2).unwrap().region.bounding_box.x, 30);
    }

    #[test]
    fn bad_prefix_parents_are_skipped() {
        let mut s = states(vec![state(0, &[99])]);
        let mut warnings = Vec::new();
        let ownership = resolve_composites(&mut s, |_| false, |_| None, 100, &mut warnings);
        assert!(warnings.is_empty());
        assert!(ownership.is_empty());
    }
}
