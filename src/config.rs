//! Configuration module for relation extraction.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCREL_` and use double underscores
//! to separate nested levels:
//! - `DOCREL_EXTRACTION__MAX_RELATIONS_PER_DOCUMENT=5` sets `extraction.max_relations_per_document`
//! - `DOCREL_INDEX__METRIC=cosine` sets `index.metric`
//! - `DOCREL_DATASET__SECTIONS=8` sets `dataset.sections`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vector::Metric;

/// Directory holding the settings file and default caches.
pub const CONFIG_DIR: &str = ".docrel";

const SETTINGS_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "DOCREL_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Similarity index construction and search
    #[serde(default)]
    pub index: IndexConfig,

    /// Document relation extraction
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Section relation extraction
    #[serde(default)]
    pub sections: SectionsConfig,

    /// Section training datasets
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Corpus directory layout
    #[serde(default)]
    pub corpus: CorpusConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    /// Distance metric used by the index
    #[serde(default)]
    pub metric: Metric,

    /// Number of inverted lists; derived from the corpus size when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<usize>,

    /// Minimum number of lists scanned per query
    #[serde(default = "default_min_probe")]
    pub min_probe: usize,

    /// Over-fetch factor applied to `k + 1` when querying
    #[serde(default = "default_search_k_multiplier")]
    pub search_k_multiplier: usize,

    /// Seed for index construction
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Minimum similarity in percent (0-100)
    #[serde(default = "default_similarity_percent")]
    pub similarity_threshold: u32,

    /// Maximum number of relations kept per source document
    #[serde(default = "default_max_relations")]
    pub max_relations_per_document: usize,

    /// Query source documents in parallel
    #[serde(default = "default_false")]
    pub parallel: bool,

    /// Number of worker threads for parallel extraction
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SectionsConfig {
    /// Minimum section similarity in percent (0-100)
    #[serde(default = "default_similarity_percent")]
    pub similarity_threshold: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Sections per document in a feature matrix (N)
    #[serde(default = "default_sections")]
    pub sections: usize,

    /// Oversized row reduction: "truncate" or "avg"
    #[serde(default = "default_transformation")]
    pub transformation: String,

    /// Append a real/padding indicator to every feature row
    #[serde(default = "default_false")]
    pub row_mask: bool,

    /// Directory for cached datasets
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CorpusConfig {
    /// Extension of document files, without the dot
    #[serde(default = "default_document_extension")]
    pub document_extension: String,

    /// File listing labelled document pairs
    #[serde(default = "default_pairs_file")]
    pub pairs_file: String,
}

fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_min_probe() -> usize {
    1
}
fn default_search_k_multiplier() -> usize {
    2
}
fn default_seed() -> u64 {
    42
}
fn default_similarity_percent() -> u32 {
    50
}
fn default_max_relations() -> usize {
    20
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_sections() -> usize {
    12
}
fn default_transformation() -> String {
    "avg".to_string()
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("cache")
}
fn default_document_extension() -> String {
    "xml".to_string()
}
fn default_pairs_file() -> String {
    "similarities.xml".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            index: IndexConfig::default(),
            extraction: ExtractionConfig::default(),
            sections: SectionsConfig::default(),
            dataset: DatasetConfig::default(),
            corpus: CorpusConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            clusters: None,
            min_probe: default_min_probe(),
            search_k_multiplier: default_search_k_multiplier(),
            seed: default_seed(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_percent(),
            max_relations_per_document: default_max_relations(),
            parallel: false,
            parallel_threads: default_parallel_threads(),
        }
    }
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_percent(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            transformation: default_transformation(),
            row_mask: false,
            cache_dir: default_cache_dir(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            document_extension: default_document_extension(),
            pairs_file: default_pairs_file(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscores stay in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for `.docrel` from the current directory upwards
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(SETTINGS_FILE))
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Cannot read configuration file: {e}"))?;
        toml::from_str::<Settings>(&content).map_err(|e| {
            format!("Configuration file is corrupted: {e}\nRun 'docrel init --force' to regenerate.")
        })?;

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let toml_string = toml::to_string_pretty(self)?;
        crate::io::write_atomic(path.as_ref(), toml_string.as_bytes())?;
        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create a default settings file with helpful comments under `root/.docrel`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let template = format!(
            r#"# docrel configuration file

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[index]
# Distance metric: "angular" (sqrt(2 - 2cos)) or "cosine" (1 - cos)
metric = "angular"

# Number of inverted lists (defaults to the square root of the corpus size)
# clusters = 64

# Minimum number of lists scanned per query
min_probe = 1

# Candidates examined per query = search_k_multiplier * (k + 1)
search_k_multiplier = 2

# Seed for index construction; equal seeds give identical indexes
seed = 42

[extraction]
# Minimum similarity in percent (0-100)
similarity_threshold = 50

# Maximum number of relations kept per source document
max_relations_per_document = 20

# Query source documents in parallel
parallel = false

# Worker threads for parallel extraction (defaults to CPU count)
parallel_threads = {}

[sections]
# Minimum section similarity in percent (0-100)
similarity_threshold = 50

[dataset]
# Sections per document in a feature matrix
sections = 12

# Oversized row reduction: "truncate" or "avg"
transformation = "avg"

# Append a real/padding indicator to every feature row
row_mask = false

# Directory for cached datasets
cache_dir = ".docrel/cache"

[corpus]
# Extension of document files
document_extension = "xml"

# File listing labelled document pairs
pairs_file = "similarities.xml"
"#,
            num_cpus::get()
        );

        crate::io::write_atomic(&config_path, template.as_bytes())?;
        Ok(config_path)
    }
}
