//! Configuration for lexuse.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (LEXUSE_HOME, LEXUSE_DATA)
//! 2. Config file (.lexuse/config.yaml)
//! 3. Defaults (~/.lexuse, ~/.lexuse/data)
//!
//! Config file discovery:
//! - Searches current directory and parents for .lexuse/config.yaml
//! - `paths.home` is relative to the .lexuse/ directory, `paths.data` to
//!   the project root (the parent of .lexuse/)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{AggregationSettings, DECISIONS_FILE};
use crate::extract::ExtractionSettings;
use crate::sources::{default_sources, SourceConfig};

const CONFIG_DIR: &str = ".lexuse";
const CONFIG_FILE: &str = "config.yaml";
const EXPORTS_FILE: &str = "usage_examples.jsonl";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub aggregation: AggregationSettings,
    /// Ordered source list; the built-in list when absent
    #[serde(default)]
    pub sources: Option<Vec<SourceConfig>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory holding the decision log (relative to .lexuse/)
    pub home: Option<String>,
    /// Directory of corpus tables (relative to the project root)
    pub data: Option<String>,
    /// Export file for accepted examples (relative to the project root)
    pub exports: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// State directory (decision log, default exports)
    pub home: PathBuf,
    /// Directory of corpus tables
    pub data: PathBuf,
    /// Export file for accepted examples
    pub exports: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub extraction: ExtractionSettings,
    pub aggregation: AggregationSettings,
    pub sources: Vec<SourceConfig>,
}

/// Environment overrides, captured once so resolution stays testable
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<String>,
    data: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("LEXUSE_HOME").ok(),
            data: std::env::var("LEXUSE_DATA").ok(),
        }
    }
}

impl ResolvedConfig {
    /// Path of the decision log
    pub fn decisions_path(&self) -> PathBuf {
        self.home.join(DECISIONS_FILE)
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Combine the config file (if any), env overrides and defaults
fn resolve(
    config_file: Option<(PathBuf, ConfigFile)>,
    env: EnvOverrides,
    default_home: PathBuf,
) -> ResolvedConfig {
    let Some((config_path, config)) = config_file else {
        let home = env.home.map(PathBuf::from).unwrap_or(default_home);
        let data = env
            .data
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("data"));
        let exports = home.join("exports").join(EXPORTS_FILE);

        return ResolvedConfig {
            home,
            data,
            exports,
            config_file: None,
            extraction: ExtractionSettings::default(),
            aggregation: AggregationSettings::default(),
            sources: default_sources(),
        };
    };

    // .lexuse/ and the project root above it
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let base_dir = config_dir.parent().unwrap_or(Path::new("."));

    let home = if let Some(env_home) = env.home {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = config.paths.home {
        resolve_path(config_dir, home_path)
    } else {
        default_home
    };

    let data = if let Some(env_data) = env.data {
        PathBuf::from(env_data)
    } else if let Some(ref data_path) = config.paths.data {
        resolve_path(base_dir, data_path)
    } else {
        home.join("data")
    };

    let exports = match config.paths.exports {
        Some(ref exports_path) => resolve_path(base_dir, exports_path),
        None => home.join("exports").join(EXPORTS_FILE),
    };

    ResolvedConfig {
        home,
        data,
        exports,
        config_file: Some(config_path),
        extraction: config.extraction,
        aggregation: config.aggregation,
        sources: config.sources.unwrap_or_else(default_sources),
    }
}

/// Load configuration from all sources, starting discovery at the
/// current directory
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd)
}

/// Load configuration, starting config file discovery at `start`
pub fn load_config_from(start: &Path) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = match find_config_file(start) {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve(config_file, EnvOverrides::from_env(), default_home))
}
