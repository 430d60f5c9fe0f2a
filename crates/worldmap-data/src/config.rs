//! Workspace configuration.
//!
//! Read from an optional file in the game directory (RON, TOML or JSON, by
//! extension). Every field has a default, so an empty file or no file at all
//! gives the standard game layout.

use serde::Deserialize;

use worldmap_core::diff::DiffLimits;
use worldmap_core::id::EntityId;

use crate::loader::{DataLoadError, parse_document};
use crate::source::{FileSource, SourceError};

fn default_map() -> String {
    "map/default_map.ron".to_string()
}

fn default_states() -> String {
    "history/states".to_string()
}

fn default_strategic_regions() -> String {
    "map/strategicregions".to_string()
}

fn default_supply_areas() -> String {
    "map/supplyareas".to_string()
}

fn default_countries() -> String {
    "common/countries".to_string()
}

fn default_max_id() -> EntityId {
    10_000
}

fn default_message_count_limit() -> usize {
    300
}

fn default_change_messages_count_limit() -> usize {
    30
}

fn default_debounce_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldMapConfig {
    /// The default map descriptor, relative to the game directory.
    #[serde(default = "default_map")]
    pub default_map: String,
    #[serde(default = "default_states")]
    pub states: String,
    #[serde(default = "default_strategic_regions")]
    pub strategic_regions: String,
    #[serde(default = "default_supply_areas")]
    pub supply_areas: String,
    #[serde(default = "default_countries")]
    pub countries: String,
    /// Largest id any entity type may use. Above it a load fails.
    #[serde(default = "default_max_id")]
    pub max_id: EntityId,
    #[serde(default = "default_message_count_limit")]
    pub message_count_limit: usize,
    #[serde(default = "default_change_messages_count_limit")]
    pub change_messages_count_limit: usize,
    /// Quiet period before file changes trigger a refresh.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WorldMapConfig {
    fn default() -> Self {
        Self {
            default_map: default_map(),
            states: default_states(),
            strategic_regions: default_strategic_regions(),
            supply_areas: default_supply_areas(),
            countries: default_countries(),
            max_id: default_max_id(),
            message_count_limit: default_message_count_limit(),
            change_messages_count_limit: default_change_messages_count_limit(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WorldMapConfig {
    /// Parse a configuration document. `path` only selects the format and
    /// names the file in errors.
    pub fn parse(path: &str, text: &str) -> Result<Self, DataLoadError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = parse_document(path, text).map_err(|e| match e {
            DataLoadError::Parse { file, detail } => DataLoadError::Config { file, detail },
            other => other,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Read the configuration at `path` from `source`. A missing file gives
    /// the defaults.
    pub async fn load(source: &dyn FileSource, path: &str) -> Result<Self, DataLoadError> {
        match source.read_to_string(path).await {
            Ok(text) => Self::parse(path, &text),
            Err(SourceError::NotFound { .. }) => {
                tracing::debug!(path, "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn diff_limits(&self) -> DiffLimits {
        DiffLimits {
            message_count_limit: self.message_count_limit,
            change_messages_count_limit: self.change_messages_count_limit,
        }
    }

    fn validate(&self, path: &str) -> Result<(), DataLoadError> {
        let invalid = |detail: &str| DataLoadError::Config {
            file: path.to_string(),
            detail: detail.to_string(),
        };
        if self.max_id < 1 {
            return Err(invalid("max_id must be at least 1"));
        }
        if self.message_count_limit == 0 {
            return Err(invalid("message_count_limit must be at least 1"));
        }
        Ok(())
    }
}
