//! Loading world map definitions from a game directory.
//!
//! Every entity type has a loader that caches its result and knows when the
//! files (or upstream results) it was built from have changed. The
//! [`world_map::WorldMapLoader`] composes them into a
//! [`worldmap_core::snapshot::WorldMapData`].

pub mod config;
pub mod countries;
pub mod framework;
pub mod loader;
pub mod provinces;
pub mod schema;
pub mod source;
pub mod spans;
pub mod states;
pub mod strategic_regions;
pub mod supply_areas;
pub mod tracker;
pub mod world_map;

#[cfg(test)]
mod test_support;

pub use config::WorldMapConfig;
pub use framework::{LoadResult, Loader, Reloadable, matches_dependency};
pub use loader::DataLoadError;
pub use source::{FileSource, FsFileSource, MemoryFileSource, SourceError};
pub use world_map::WorldMapLoader;
