use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::text::DEFAULT_MAX_DEPTH;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub segment: SegmentConfig,
    pub text: TextConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmentConfig {
    pub items_per_part: usize,
    pub min_list_items: usize,
    pub min_thirds_nodes: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            items_per_part: 5,
            min_list_items: 10,
            min_thirds_nodes: 6,
        }
    }
}

impl SegmentConfig {
    /// List items per golden-layout part, never below one.
    pub fn items_per_part(&self) -> usize {
        self.items_per_part.max(1)
    }

    /// List items needed for the golden layout. Always enough to fill both parts.
    pub fn golden_threshold(&self) -> usize {
        self.min_list_items.max(2 * self.items_per_part())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    pub max_depth: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// The defaults shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        // build.rs has already checked that the file parses
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, reporting read and parse failures.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
