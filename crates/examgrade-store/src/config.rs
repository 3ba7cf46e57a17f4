//! examgrade configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examgrade_core::engine::GradingEngineConfig;
use examgrade_core::model::GradingThresholds;
use examgrade_core::traits::{AttemptStore, ExamStore};

use crate::json_dir::JsonDirStore;
use crate::memory::MemoryStore;

/// Which storage backend to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// One JSON file per document under `path`.
    JsonDir {
        #[serde(default = "default_store_dir")]
        path: PathBuf,
    },
    /// Empty in-memory store for library use and tests. Nothing survives the
    /// process, so the CLI refuses it.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::JsonDir {
            path: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./examgrade-data")
}

/// Top-level examgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamgradeConfig {
    /// Storage backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Max attempts graded concurrently during a regrade.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Thresholds for exams that define none.
    #[serde(default)]
    pub default_grading: GradingThresholds,
    /// Output directory for regrade reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// `tracing` filter directive, e.g. "examgrade=debug".
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examgrade-reports")
}

impl Default for ExamgradeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            parallelism: default_parallelism(),
            default_grading: GradingThresholds::default(),
            output_dir: default_output_dir(),
            log_filter: None,
        }
    }
}

impl ExamgradeConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> GradingEngineConfig {
        GradingEngineConfig {
            parallelism: self.parallelism.max(1),
            default_grading: self.default_grading,
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examgrade.toml` in the current directory
/// 2. `~/.config/examgrade/config.toml`
///
/// Environment variable override: `EXAMGRADE_STORE_DIR` selects a JSON
/// directory store at the given path.
pub fn load_config() -> Result<ExamgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamgradeConfig::default(),
    };

    if let Ok(dir) = std::env::var("EXAMGRADE_STORE_DIR") {
        config.store = StoreConfig::JsonDir {
            path: PathBuf::from(dir),
        };
    }

    Ok(config)
}

/// Parse a TOML configuration string.
pub fn parse_config(content: &str) -> Result<ExamgradeConfig> {
    let config: ExamgradeConfig = toml::from_str(content)?;
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");
    if !config.default_grading.is_descending() {
        tracing::warn!(
            "default_grading thresholds are not in descending order: {:?}",
            config.default_grading
        );
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examgrade"))
}

/// Handles to one backend seen through both store traits.
#[derive(Clone)]
pub struct Stores {
    pub attempts: Arc<dyn AttemptStore>,
    pub exams: Arc<dyn ExamStore>,
}

/// Create the configured store.
pub fn create_store(config: &StoreConfig) -> Result<Stores> {
    match config {
        StoreConfig::JsonDir { path } => {
            anyhow::ensure!(
                path.is_dir(),
                "store directory not found: {} (run `examgrade init` to create one)",
                path.display()
            );
            let store = Arc::new(JsonDirStore::new(path));
            Ok(Stores {
                attempts: store.clone(),
                exams: store,
            })
        }
        StoreConfig::Memory => {
            let store = Arc::new(MemoryStore::new());
            Ok(Stores {
                attempts: store.clone(),
                exams: store,
            })
        }
    }
}
