//! Example sources.
//!
//! A source turns a form into candidate sentences. Sources are registered
//! with the aggregator in priority order; local tables come first, network
//! sources last.

pub mod corpus;
pub mod wikisource;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::corpus::{CorpusError, CorpusTable};
use crate::domain::{Candidate, Form, LanguageCode};
use crate::extract::ExtractionSettings;

// Re-export the bundled sources
pub use corpus::CorpusSource;
pub use wikisource::WikisourceSource;

/// Errors a source can report; the aggregator treats any of them as
/// "zero results from this source"
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// A capability that finds candidate sentences for a form
#[async_trait]
pub trait ExampleSource: Send + Sync {
    /// Stable name used in provenance, logs and cap configuration
    fn name(&self) -> &str;

    /// Candidates for `form`, already cleaned, filtered and matched.
    /// Returns at most `limit`; a source stops working once it has them.
    async fn find(&self, form: &Form, limit: usize) -> Result<Vec<Candidate>, SourceError>;
}

/// One entry of the `sources` config list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A local SQLite corpus table
    Corpus {
        name: String,
        /// Table file, relative to the data directory
        table: PathBuf,
        language: LanguageCode,
        #[serde(default)]
        max_rows: Option<usize>,
    },

    /// Wikisource full-text search
    Wikisource {
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        cache_capacity: Option<usize>,
    },
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Corpus { name, .. } => name,
            SourceConfig::Wikisource { .. } => wikisource::SOURCE_NAME,
        }
    }
}

/// Job ads, then parliament records, then the network
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::Corpus {
            name: "historical_job_ads".to_string(),
            table: PathBuf::from("historical_job_ads.db"),
            language: LanguageCode::new("sv"),
            max_rows: None,
        },
        SourceConfig::Corpus {
            name: "riksdagen".to_string(),
            table: PathBuf::from("riksdagen.db"),
            language: LanguageCode::new("sv"),
            max_rows: None,
        },
        SourceConfig::Wikisource {
            endpoint: None,
            cache_capacity: None,
        },
    ]
}

/// Instantiate configured sources in order.
///
/// A source that cannot be set up (e.g. a missing table) is left out with a
/// warning; the others still run.
pub fn build_sources(
    configs: &[SourceConfig],
    data_dir: &Path,
    settings: &ExtractionSettings,
) -> Vec<Arc<dyn ExampleSource>> {
    let mut sources: Vec<Arc<dyn ExampleSource>> = Vec::new();

    for config in configs {
        match build_source(config, data_dir, settings) {
            Ok(source) => {
                info!(source = config.name(), "Registered source");
                sources.push(source);
            }
            Err(e) => warn!(source = config.name(), error = %e, "Skipping source"),
        }
    }

    sources
}

fn build_source(
    config: &SourceConfig,
    data_dir: &Path,
    settings: &ExtractionSettings,
) -> Result<Arc<dyn ExampleSource>, SourceError> {
    match config {
        SourceConfig::Corpus {
            name,
            table,
            language,
            max_rows,
        } => {
            let path = if table.is_absolute() {
                table.clone()
            } else {
                data_dir.join(table)
            };
            let mut source =
                CorpusSource::new(name.clone(), language.clone(), CorpusTable::open(path)?, settings);
            if let Some(max_rows) = max_rows {
                source = source.with_max_rows(*max_rows);
            }
            Ok(Arc::new(source))
        }
        SourceConfig::Wikisource {
            endpoint,
            cache_capacity,
        } => {
            let mut source = WikisourceSource::new(settings.clone())?;
            if let Some(endpoint) = endpoint {
                source = source.with_endpoint(endpoint.clone());
            }
            if let Some(capacity) = cache_capacity {
                source = source.with_cache_capacity(*capacity);
            }
            Ok(Arc::new(source))
        }
    }
}
