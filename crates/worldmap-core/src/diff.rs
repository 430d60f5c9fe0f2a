//! Snapshot diffing.
//!
//! Turns two snapshots of the same shape into the smallest set of renderer
//! messages that updates one into the other, or gives up when the result
//! would not be worth it.

use crate::message::{EntityList, OutboundMessage};
use crate::snapshot::WorldMapData;

/// Safety valves bounding message size and message count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLimits {
    /// A run of changed entries is flushed as its own message once it
    /// reaches this many entries.
    pub message_count_limit: usize,
    /// The diff is abandoned when it would produce more messages than this.
    pub change_messages_count_limit: usize,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self {
            message_count_limit: 300,
            change_messages_count_limit: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbandonReason {
    /// A dimension or list length differs, so indices no longer line up.
    ShapeChanged(&'static str),
    /// More messages than `change_messages_count_limit`.
    TooManyMessages(usize),
}

impl std::fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbandonReason::ShapeChanged(field) => write!(f, "{field} changed"),
            AbandonReason::TooManyMessages(n) => write!(f, "{n} change messages"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    /// Messages to send in order. Empty when nothing changed.
    Incremental(Vec<OutboundMessage>),
    /// Send a full summary instead.
    Abandoned(AbandonReason),
}

fn shape_change(old: &WorldMapData, new: &WorldMapData) -> Option<&'static str> {
    let fields = [
        ("width", old.width == new.width),
        ("height", old.height == new.height),
        ("provincesCount", old.provinces_count == new.provinces_count),
        ("statesCount", old.states_count == new.states_count),
        ("countriesCount", old.countries_count == new.countries_count),
        (
            "strategicRegionsCount",
            old.strategic_regions_count == new.strategic_regions_count,
        ),
        ("supplyAreasCount", old.supply_areas_count == new.supply_areas_count),
        (
            "badProvincesCount",
            old.bad_provinces_count == new.bad_provinces_count,
        ),
        ("badStatesCount", old.bad_states_count == new.bad_states_count),
        (
            "badStrategicRegionsCount",
            old.bad_strategic_regions_count == new.bad_strategic_regions_count,
        ),
        (
            "badSupplyAreasCount",
            old.bad_supply_areas_count == new.bad_supply_areas_count,
        ),
    ];
    fields
        .into_iter()
        .find_map(|(name, same)| (!same).then_some(name))
}

/// Maximal runs `[start, end)` of indices whose entries differ, each split
/// so that no run is longer than `run_limit`.
pub fn changed_runs<T: PartialEq>(old: &[T], new: &[T], run_limit: usize) -> Vec<(usize, usize)> {
    let run_limit = run_limit.max(1);
    let len = old.len().max(new.len());
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for i in 0..len {
        if old.get(i) != new.get(i) {
            let s = *start.get_or_insert(i);
            if i + 1 - s == run_limit {
                runs.push((s, i + 1));
                start = None;
            }
        } else if let Some(s) = start.take() {
            runs.push((s, i));
        }
    }
    if let Some(s) = start {
        runs.push((s, len));
    }
    runs
}

/// Diff `new` against `old`.
pub fn diff_snapshots(old: &WorldMapData, new: &WorldMapData, limits: &DiffLimits) -> DiffOutcome {
    if let Some(field) = shape_change(old, new) {
        return DiffOutcome::Abandoned(AbandonReason::ShapeChanged(field));
    }

    let mut messages = Vec::new();

    if old.warnings != new.warnings {
        messages.push(OutboundMessage::Warnings {
            data: new.warnings.clone(),
        });
    }
    if old.continents != new.continents {
        messages.push(OutboundMessage::Continents {
            data: new.continents.clone(),
        });
    }
    if old.terrains != new.terrains {
        messages.push(OutboundMessage::Terrains {
            data: new.terrains.clone(),
        });
    }

    for list in EntityList::ALL {
        let runs = match list {
            EntityList::Provinces => {
                changed_runs(&old.provinces, &new.provinces, limits.message_count_limit)
            }
            EntityList::States => changed_runs(&old.states, &new.states, limits.message_count_limit),
            EntityList::Countries => {
                changed_runs(&old.countries, &new.countries, limits.message_count_limit)
            }
            EntityList::StrategicRegions => changed_runs(
                &old.strategic_regions,
                &new.strategic_regions,
                limits.message_count_limit,
            ),
            EntityList::SupplyAreas => changed_runs(
                &old.supply_areas,
                &new.supply_areas,
                limits.message_count_limit,
            ),
        };

        for (start, end) in runs {
            messages.push(list.range(new, start, end));
            if messages.len() > limits.change_messages_count_limit {
                return DiffOutcome::Abandoned(AbandonReason::TooManyMessages(messages.len()));
            }
        }
    }

    if messages.len() > limits.change_messages_count_limit {
        return DiffOutcome::Abandoned(AbandonReason::TooManyMessages(messages.len()));
    }
    DiffOutcome::Incremental(messages)
}
