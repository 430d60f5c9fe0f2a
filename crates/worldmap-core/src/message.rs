//! Messages exchanged with the renderer.
//!
//! Both directions are JSON objects tagged by a `command` field.

use serde::{Deserialize, Serialize};

use crate::entity::{Country, Province, State, StrategicRegion, SupplyArea};
use crate::snapshot::WorldMapData;
use crate::warning::Warning;

/// A slice `[start, end)` of one of the snapshot's per-entity lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranged<T> {
    pub start: usize,
    pub end: usize,
    pub data: Vec<T>,
}

impl<T: Clone> Ranged<T> {
    /// Copy `items[start..end]`, clamped to the list.
    pub fn slice(items: &[T], start: usize, end: usize) -> Self {
        let end = end.min(items.len());
        let start = start.min(end);
        Self {
            start,
            end,
            data: items[start..end].to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// Full snapshot with the bulk arrays emptied.
    ProvinceMapSummary(Box<WorldMapData>),
    Provinces(Ranged<Option<Province>>),
    States(Ranged<Option<State>>),
    Countries(Ranged<Country>),
    StrategicRegions(Ranged<Option<StrategicRegion>>),
    SupplyAreas(Ranged<Option<SupplyArea>>),
    Warnings { data: Vec<Warning> },
    Continents { data: Vec<String> },
    Terrains { data: Vec<String> },
    Progress { data: String },
    Error { data: String },
}

/// The per-entity lists the renderer can page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityList {
    Provinces,
    States,
    Countries,
    StrategicRegions,
    SupplyAreas,
}

impl EntityList {
    pub const ALL: [EntityList; 5] = [
        EntityList::Provinces,
        EntityList::States,
        EntityList::Countries,
        EntityList::StrategicRegions,
        EntityList::SupplyAreas,
    ];

    pub fn len(self, data: &WorldMapData) -> usize {
        match self {
            EntityList::Provinces => data.provinces.len(),
            EntityList::States => data.states.len(),
            EntityList::Countries => data.countries.len(),
            EntityList::StrategicRegions => data.strategic_regions.len(),
            EntityList::SupplyAreas => data.supply_areas.len(),
        }
    }

    /// Ranged message for `[start, end)` of this list, clamped to the
    /// snapshot.
    pub fn range(self, data: &WorldMapData, start: usize, end: usize) -> OutboundMessage {
        match self {
            EntityList::Provinces => {
                OutboundMessage::Provinces(Ranged::slice(&data.provinces, start, end))
            }
            EntityList::States => OutboundMessage::States(Ranged::slice(&data.states, start, end)),
            EntityList::Countries => {
                OutboundMessage::Countries(Ranged::slice(&data.countries, start, end))
            }
            EntityList::StrategicRegions => OutboundMessage::StrategicRegions(Ranged::slice(
                &data.strategic_regions,
                start,
                end,
            )),
            EntityList::SupplyAreas => {
                OutboundMessage::SupplyAreas(Ranged::slice(&data.supply_areas, start, end))
            }
        }
    }
}

impl OutboundMessage {
    pub fn summary(data: &WorldMapData) -> Self {
        OutboundMessage::ProvinceMapSummary(Box::new(data.summary()))
    }

    pub fn progress(text: impl Into<String>) -> Self {
        OutboundMessage::Progress { data: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        OutboundMessage::Error { data: text.into() }
    }

    /// The `command` tag this message serializes with.
    pub fn command(&self) -> &'static str {
        match self {
            OutboundMessage::ProvinceMapSummary(_) => "provincemapsummary",
            OutboundMessage::Provinces(_) => "provinces",
            OutboundMessage::States(_) => "states",
            OutboundMessage::Countries(_) => "countries",
            OutboundMessage::StrategicRegions(_) => "strategicregions",
            OutboundMessage::SupplyAreas(_) => "supplyareas",
            OutboundMessage::Warnings { .. } => "warnings",
            OutboundMessage::Continents { .. } => "continents",
            OutboundMessage::Terrains { .. } => "terrains",
            OutboundMessage::Progress { .. } => "progress",
            OutboundMessage::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRequest {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum InboundMessage {
    RequestProvinces(RangeRequest),
    RequestStates(RangeRequest),
    RequestCountries(RangeRequest),
    RequestStrategicRegions(RangeRequest),
    RequestSupplyAreas(RangeRequest),
    Loaded {
        #[serde(default)]
        force: bool,
    },
    OpenState {
        file: String,
        #[serde(default)]
        start: Option<usize>,
        #[serde(default)]
        end: Option<usize>,
    },
}

impl InboundMessage {
    /// The list and range of a paging request.
    pub fn range_request(&self) -> Option<(EntityList, RangeRequest)> {
        match *self {
            InboundMessage::RequestProvinces(r) => Some((EntityList::Provinces, r)),
            InboundMessage::RequestStates(r) => Some((EntityList::States, r)),
            InboundMessage::RequestCountries(r) => Some((EntityList::Countries, r)),
            InboundMessage::RequestStrategicRegions(r) => Some((EntityList::StrategicRegions, r)),
            InboundMessage::RequestSupplyAreas(r) => Some((EntityList::SupplyAreas, r)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_world_map;

    #[test]
    fn outbound_is_tagged_by_command() {
        let msg = OutboundMessage::progress("Loading states");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["command"], "progress");
        assert_eq!(json["data"], "Loading states");
    }

    #[test]
    fn ranged_message_fields() {
        let data = sample_world_map();
        let msg = EntityList::States.range(&data, 1, 3);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["command"], "states");
        assert_eq!(json["start"], 1);
        assert_eq!(json["end"], 3);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(msg.command(), "states");
    }

    #[test]
    fn summary_message_flattens_snapshot() {
        let data = sample_world_map();
        let json = serde_json::to_value(OutboundMessage::summary(&data)).unwrap();
        assert_eq!(json["command"], "provincemapsummary");
        assert_eq!(json["width"], data.width);
        assert_eq!(json["provinces"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn range_is_clamped() {
        let items = vec![1, 2, 3];
        let r = Ranged::slice(&items, 2, 10);
        assert_eq!((r.start, r.end, r.data), (2, 3, vec![3]));
        let r = Ranged::slice(&items, 7, 10);
        assert_eq!((r.start, r.end), (3, 3));
        assert!(r.data.is_empty());
    }

    #[test]
    fn inbound_requests_parse() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"command":"requeststrategicregions","start":0,"end":5}"#)
                .unwrap();
        assert_eq!(
            msg.range_request(),
            Some((EntityList::StrategicRegions, RangeRequest { start: 0, end: 5 }))
        );

        let msg: InboundMessage = serde_json::from_str(r#"{"command":"loaded"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Loaded { force: false });

        let msg: InboundMessage =
            serde_json::from_str(r#"{"command":"openstate","file":"history/states/1.ron"}"#)
                .unwrap();
        assert_eq!(
            msg,
            InboundMessage::OpenState {
                file: "history/states/1.ron".into(),
                start: None,
                end: None
            }
        );
    }
}
