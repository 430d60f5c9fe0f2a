//! Id reconciliation: turns raw records from many files into a dense,
//! id-addressed slot array.
//!
//! Records that cannot keep the id they declared (missing/zero/negative id,
//! or an id already taken by an earlier record) get a synthetic negative id
//! and land in a "bad" prefix of the array. Slot `i` holds the record with
//! id `i - bad_count`, so ids `-bad_count..=-1` come first, then the unused
//! slot for id `0`, then every canonical id up to the largest one seen.

use serde::{Deserialize, Serialize};

use crate::entity::Identified;
use crate::id::{EntityId, EntityKind};
use crate::warning::Warning;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("{kind} id {max_id} exceeds the maximum id {limit}")]
    MaxIdExceeded {
        kind: EntityKind,
        max_id: EntityId,
        limit: EntityId,
    },
}

/// Reconciled records of one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedItems<T> {
    slots: Vec<Option<T>>,
    bad_count: usize,
}

impl<T> Default for SortedItems<T> {
    fn default() -> Self {
        Self {
            slots: vec![None],
            bad_count: 0,
        }
    }
}

impl<T> SortedItems<T> {
    /// Number of leading slots holding synthetic negative-id records.
    pub fn bad_count(&self) -> usize {
        self.bad_count
    }

    /// Total slot count, bad prefix and gaps included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Largest canonical id, `0` when there is none.
    pub fn max_id(&self) -> EntityId {
        (self.slots.len() - self.bad_count - 1) as EntityId
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        let index = i64::from(id) + self.bad_count as i64;
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.slots.len())
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.index_of(id).and_then(|i| self.slots[i].as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.index_of(id).and_then(|i| self.slots[i].as_mut())
    }

    /// Returns `true` if a canonical record with this id exists.
    pub fn contains(&self, id: EntityId) -> bool {
        id > 0 && self.get(id).is_some()
    }

    /// Every slot in index order.
    pub fn slots(&self) -> &[Option<T>] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<Option<T>> {
        self.slots
    }

    /// Records with canonical ids, ascending.
    pub fn canonical(&self) -> impl Iterator<Item = &T> {
        self.slots[self.bad_count..].iter().flatten()
    }

    pub fn canonical_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots[self.bad_count..].iter_mut().flatten()
    }

    /// Records in the bad prefix.
    pub fn bad(&self) -> impl Iterator<Item = &T> {
        self.slots[..self.bad_count].iter().flatten()
    }
}

/// Reconcile raw records into a [`SortedItems`].
///
/// Iteration order of `items` decides conflicts: the earlier record keeps
/// the contested id. Conflicts and id gaps are reported into `warnings`; an
/// id above `max_valid_id` aborts with [`ReconcileError::MaxIdExceeded`].
pub fn sort_items<T: Identified>(
    items: Vec<T>,
    max_valid_id: EntityId,
    warnings: &mut Vec<Warning>,
) -> Result<SortedItems<T>, ReconcileError> {
    let kind = T::KIND;
    let max_id = items.iter().map(|i| i.id()).max().unwrap_or(0).max(0);
    if max_id > max_valid_id {
        return Err(ReconcileError::MaxIdExceeded {
            kind,
            max_id,
            limit: max_valid_id,
        });
    }

    let mut dense: Vec<Option<T>> = Vec::new();
    dense.resize_with(max_id as usize + 1, || None);
    let mut bad: Vec<T> = Vec::new();
    let mut next_bad_id: EntityId = -1;

    for mut item in items {
        let id = item.id();
        if id <= 0 {
            item.set_id(next_bad_id);
            next_bad_id -= 1;
            bad.push(item);
            continue;
        }

        match &dense[id as usize] {
            Some(existing) => {
                warnings.push(
                    Warning::new(format!(
                        "{} id {} is defined in both {} and {}; the second definition is ignored.",
                        kind.label(),
                        id,
                        existing.file(),
                        item.file()
                    ))
                    .with_source(kind, id)
                    .with_source(kind, next_bad_id)
                    .with_file(existing.file())
                    .with_file(item.file()),
                );
                item.set_id(next_bad_id);
                next_bad_id -= 1;
                bad.push(item);
            }
            None => dense[id as usize] = Some(item),
        }
    }

    report_gaps(&dense, kind, warnings);

    let bad_count = bad.len();
    let mut slots: Vec<Option<T>> = Vec::with_capacity(bad_count + dense.len());
    // Ids were handed out as -1, -2, ...; slot 0 belongs to the lowest.
    slots.extend(bad.into_iter().rev().map(Some));
    slots.extend(dense);

    Ok(SortedItems { slots, bad_count })
}

fn report_gaps<T>(dense: &[Option<T>], kind: EntityKind, warnings: &mut Vec<Warning>) {
    let mut gap_start: Option<usize> = None;
    for id in 1..=dense.len() {
        let missing = dense.get(id).is_some_and(Option::is_none);
        match (missing, gap_start) {
            (true, None) => gap_start = Some(id),
            (false, Some(start)) => {
                warnings.push(gap_warning(kind, start, id - 1));
                gap_start = None;
            }
            _ => {}
        }
    }
}

fn gap_warning(kind: EntityKind, start: usize, end: usize) -> Warning {
    let text = if start == end {
        format!("{} with id {} doesn't exist.", kind.label(), start)
    } else {
        format!("{} with id {}-{} doesn't exist.", kind.label(), start, end)
    };
    Warning::new(text)
}

// ===========================================================================
// Tests
// ===========================================================================
