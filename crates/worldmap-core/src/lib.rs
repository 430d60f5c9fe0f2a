//! World map core -- the pure domain of the world map pipeline.
//!
//! This crate holds everything that does not touch files or tasks: entity
//! types, id reconciliation, region geometry on a cylindrical map, province
//! adjacency, cross-entity validation, the snapshot sent to the renderer and
//! the diff that keeps the renderer up to date.
//!
//! # Load pipeline
//!
//! For each entity type the loaders in `worldmap-data` run the same stages
//! over raw records:
//!
//! 1. **Reconcile** -- [`reconcile::sort_items`] assigns slots by id,
//!    demotes conflicting and id-less records to a negative-id prefix and
//!    reports gaps.
//! 2. **Resolve** -- child references are checked with
//!    [`validation::resolve_members`].
//! 3. **Own** -- an [`validation::OwnershipMap`] maps every child to the
//!    parents claiming it; the first claim wins.
//! 4. **Geometry** -- [`geometry::merge_regions`] folds owned children into a
//!    [`geometry::Region`].
//! 5. **Validate** -- the checks in [`validation`] turn inconsistencies into
//!    [`warning::Warning`]s. Nothing past reconciliation is fatal.
//!
//! # Key Types
//!
//! - [`snapshot::WorldMapData`] -- Complete loaded map, slot arrays by id.
//! - [`reconcile::SortedItems`] -- Reconciled records of one entity type.
//! - [`graph::ProvinceGraph`] -- Passable province adjacency.
//! - [`message::OutboundMessage`] -- Renderer messages, tagged by `command`.
//! - [`diff::diff_snapshots`] -- Incremental update or abandonment.

pub mod composite;
pub mod diff;
pub mod entity;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod message;
pub mod reconcile;
pub mod snapshot;
pub mod validation;
pub mod warning;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
