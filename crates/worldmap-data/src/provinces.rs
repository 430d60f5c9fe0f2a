//! Provinces and map dimensions, loaded from the default map descriptor.
//!
//! The descriptor names the province definitions file (required) and the
//! adjacencies file (optional). Both are resolved relative to the
//! descriptor, so their loaders are created lazily and replaced whenever the
//! descriptor points somewhere else.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use worldmap_core::entity::{Province, ProvinceEdge, pack_color};
use worldmap_core::geometry::{BoundingBox, Point, Region};
use worldmap_core::graph::ProvinceGraph;
use worldmap_core::id::EntityId;
use worldmap_core::reconcile::{SortedItems, sort_items};
use worldmap_core::warning::Warning;

use crate::framework::{FileLoader, LoadResult, Loader, Reloadable};
use crate::loader::{
    DataLoadError, parse_document, parse_records, parse_records_with_spans, sibling_path,
};
use crate::schema::{AdjacencyData, DefaultMapData, ProvinceData};
use crate::source::{FileSource, SourceError};

/// Loaded provinces with everything derived from them once per load.
#[derive(Debug, Clone, Default)]
pub struct ProvinceMap {
    pub width: i32,
    pub height: i32,
    pub provinces: SortedItems<Province>,
    pub continents: Vec<String>,
    /// Sorted distinct terrain names of canonical provinces.
    pub terrains: Vec<String>,
    pub graph: ProvinceGraph,
}

impl ProvinceMap {
    pub fn contains(&self, id: EntityId) -> bool {
        self.provinces.contains(id)
    }

    pub fn color_of(&self, id: EntityId) -> Option<u32> {
        self.provinces.get(id).filter(|_| id > 0).map(|p| p.color)
    }

    pub fn region_of(&self, id: EntityId) -> Option<Region> {
        self.provinces.get(id).filter(|_| id > 0).map(|p| p.region)
    }
}

// ===========================================================================
// Parsing
// ===========================================================================

fn parse_default_map(path: &str, text: &str) -> Result<Vec<DefaultMapData>, DataLoadError> {
    parse_document(path, text).map(|map| vec![map])
}

fn parse_provinces(path: &str, text: &str) -> Result<Vec<Province>, DataLoadError> {
    let records = parse_records_with_spans::<ProvinceData>(path, text, "provinces")?;
    Ok(records
        .into_iter()
        .map(|(p, span)| {
            let bounding_box = BoundingBox::new(p.bounds.x, p.bounds.y, p.bounds.w, p.bounds.h);
            let mut region = Region::leaf(bounding_box, p.mass.unwrap_or(1));
            if let Some((x, y)) = p.center {
                region.center_of_mass = Point::new(x, y);
            }
            Province {
                id: p.id,
                color: pack_color(p.color),
                kind: p.kind,
                coastal: p.coastal,
                terrain: p.terrain,
                continent: p.continent,
                edges: Vec::new(),
                region,
                file: path.to_string(),
                span,
            }
        })
        .collect())
}

fn parse_adjacencies(path: &str, text: &str) -> Result<Vec<AdjacencyData>, DataLoadError> {
    parse_records(path, text, "adjacencies")
}

// ===========================================================================
// Assembly
// ===========================================================================

/// Reconcile provinces, attach adjacencies and derive terrains and the
/// adjacency graph.
pub fn build_province_map(
    map: &DefaultMapData,
    provinces: Vec<Province>,
    adjacencies: &[AdjacencyData],
    adjacencies_file: &str,
    max_id: EntityId,
    warnings: &mut Vec<Warning>,
) -> Result<ProvinceMap, DataLoadError> {
    let mut provinces = sort_items(provinces, max_id, warnings)?;

    for province in provinces.canonical() {
        if province.continent as usize > map.continents.len() {
            warnings.push(
                Warning::new(format!(
                    "Province {} has continent {}, but only {} continents are declared.",
                    province.id,
                    province.continent,
                    map.continents.len()
                ))
                .with_province(province.id, Some(province.color))
                .with_file(&province.file),
            );
        }
    }

    for adjacency in adjacencies {
        let missing = [adjacency.from, adjacency.to]
            .into_iter()
            .find(|&id| !provinces.contains(id));
        if let Some(id) = missing {
            warnings.push(
                Warning::new(format!(
                    "Adjacency from province {} to province {} references province {}, which doesn't exist.",
                    adjacency.from, adjacency.to, id
                ))
                .with_file(adjacencies_file),
            );
            continue;
        }
        for (from, to) in [(adjacency.from, adjacency.to), (adjacency.to, adjacency.from)] {
            if let Some(p) = provinces.get_mut(from) {
                let edge = ProvinceEdge {
                    to,
                    kind: adjacency.kind,
                };
                if !p.edges.contains(&edge) {
                    p.edges.push(edge);
                }
            }
        }
    }

    let terrains: BTreeSet<String> = provinces
        .canonical()
        .filter(|p| !p.terrain.is_empty())
        .map(|p| p.terrain.clone())
        .collect();
    let graph = ProvinceGraph::from_provinces(provinces.canonical());

    Ok(ProvinceMap {
        width: map.width,
        height: map.height,
        provinces,
        continents: map.continents.clone(),
        terrains: terrains.into_iter().collect(),
        graph,
    })
}

// ===========================================================================
// Loader
// ===========================================================================

#[derive(Default)]
struct DefaultMapState {
    definitions: Option<Arc<FileLoader<Province>>>,
    adjacencies: Option<Arc<FileLoader<AdjacencyData>>>,
    cached: Option<LoadResult<ProvinceMap>>,
}

/// Loads [`ProvinceMap`] from the default map descriptor.
pub struct DefaultMapLoader {
    source: Arc<dyn FileSource>,
    max_id: EntityId,
    default_map: FileLoader<DefaultMapData>,
    state: Mutex<DefaultMapState>,
    generation: AtomicU64,
}

impl DefaultMapLoader {
    pub fn new(path: impl Into<String>, source: Arc<dyn FileSource>, max_id: EntityId) -> Self {
        Self {
            default_map: FileLoader::new(path, parse_default_map, Arc::clone(&source)).required(),
            source,
            max_id,
            state: Mutex::new(DefaultMapState::default()),
            generation: AtomicU64::new(0),
        }
    }

    async fn needs_reload(&self, state: &DefaultMapState) -> bool {
        if state.cached.is_none() || self.default_map.should_reload().await {
            return true;
        }
        if let Some(definitions) = &state.definitions {
            if definitions.should_reload().await {
                return true;
            }
        }
        if let Some(adjacencies) = &state.adjacencies {
            if adjacencies.should_reload().await {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl Reloadable for DefaultMapLoader {
    fn name(&self) -> &str {
        "provinces"
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    async fn should_reload(&self) -> bool {
        let state = self.state.lock().await;
        self.needs_reload(&state).await
    }
}

#[async_trait]
impl Loader for DefaultMapLoader {
    type Output = ProvinceMap;

    async fn load(&self, force: bool) -> Result<LoadResult<ProvinceMap>, DataLoadError> {
        let mut state = self.state.lock().await;
        if !force && !self.needs_reload(&state).await {
            if let Some(cached) = &state.cached {
                tracing::debug!(loader = "provinces", "default map cache hit");
                return Ok(cached.clone());
            }
        }

        let descriptor = self.default_map.load(force).await?;
        let map_path = self.default_map.path();
        let Some(map) = descriptor.result.first() else {
            return Err(DataLoadError::Parse {
                file: map_path.to_string(),
                detail: "empty default map".to_string(),
            });
        };

        let definitions_path = sibling_path(map_path, &map.definitions);
        if state.definitions.as_ref().is_none_or(|l| l.path() != definitions_path) {
            let loader = FileLoader::new(definitions_path.clone(), parse_provinces, Arc::clone(&self.source));
            state.definitions = Some(Arc::new(loader.required()));
        }
        let adjacencies_path = map.adjacencies.as_ref().map(|a| sibling_path(map_path, a));
        match &adjacencies_path {
            Some(path) if state.adjacencies.as_ref().is_none_or(|l| l.path() != path.as_str()) => {
                let loader = FileLoader::new(path.clone(), parse_adjacencies, Arc::clone(&self.source));
                state.adjacencies = Some(Arc::new(loader));
            }
            Some(_) => {}
            None => state.adjacencies = None,
        }

        let mut dependencies = vec![map_path.to_string()];
        let mut warnings = descriptor.warnings.clone();

        let definitions = match &state.definitions {
            Some(loader) => loader.load(force).await.map_err(|e| match e {
                DataLoadError::Source(SourceError::NotFound { path }) => {
                    DataLoadError::MissingDefinitions { file: path }
                }
                other => other,
            })?,
            None => {
                return Err(DataLoadError::MissingDefinitions {
                    file: definitions_path,
                });
            }
        };
        dependencies.push(definitions_path);
        warnings.extend(definitions.warnings.iter().cloned());

        let adjacencies = match &state.adjacencies {
            Some(loader) => {
                let result = loader.load(force).await?;
                dependencies.push(loader.path().to_string());
                warnings.extend(result.warnings.iter().cloned());
                result.result
            }
            None => Arc::new(Vec::new()),
        };

        let province_map = build_province_map(
            map,
            definitions.result.as_ref().clone(),
            &adjacencies,
            adjacencies_path.as_deref().unwrap_or_default(),
            self.max_id,
            &mut warnings,
        )?;

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            loader = "provinces",
            provinces = province_map.provinces.canonical().count(),
            bad = province_map.provinces.bad_count(),
            edges = province_map.graph.edge_count(),
            warnings = warnings.len(),
            generation,
            "default map loaded"
        );

        let result = LoadResult {
            result: Arc::new(province_map),
            dependencies,
            warnings,
            generation,
        };
        state.cached = Some(result.clone());
        Ok(result)
    }
}
