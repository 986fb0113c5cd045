//! Multi-source candidate aggregation.
//!
//! Sources are queried one after another in registration order. Each
//! source is asked for at most its cap. Results are merged with
//! deduplication on exact text until the sufficiency threshold is reached.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Candidate, Form};
use crate::sources::ExampleSource;

/// Aggregation settings (the `aggregation` config section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSettings {
    /// Stop querying further sources once this many candidates are collected
    #[serde(default = "default_sufficiency_threshold")]
    pub sufficiency_threshold: usize,

    /// Cap for sources without an explicit entry in `caps`
    #[serde(default = "default_cap")]
    pub default_cap: usize,

    /// Per-source result caps, keyed by source name
    #[serde(default)]
    pub caps: HashMap<String, usize>,
}

fn default_sufficiency_threshold() -> usize {
    50
}

fn default_cap() -> usize {
    500
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            sufficiency_threshold: default_sufficiency_threshold(),
            default_cap: default_cap(),
            caps: HashMap::new(),
        }
    }
}

impl AggregationSettings {
    pub fn cap_for(&self, source: &str) -> usize {
        self.caps.get(source).copied().unwrap_or(self.default_cap)
    }
}

/// What happened to one source during a `collect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// Queried; number of candidates kept after capping
    Found(usize),

    /// Queried and failed; treated as zero results
    Failed(String),

    /// Skipped because the threshold was already reached
    NotQueried,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub status: SourceStatus,
}

impl fmt::Display for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SourceStatus::Found(n) => write!(f, "{}: {} found", self.name, n),
            SourceStatus::Failed(e) => write!(f, "{}: failed ({})", self.name, e),
            SourceStatus::NotQueried => write!(f, "{}: not queried", self.name),
        }
    }
}

/// Merged candidates plus per-source reports
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Deduplicated candidates in source priority order
    pub candidates: Vec<Candidate>,

    pub reports: Vec<SourceReport>,

    /// Duplicates dropped during the merge
    pub duplicates: usize,

    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("No sources registered")]
    NoSources,

    #[error("All sources unavailable: {}", .0.join("; "))]
    AllSourcesUnavailable(Vec<String>),
}

/// Ordered registry of example sources
pub struct SourceAggregator {
    sources: Vec<Arc<dyn ExampleSource>>,
    settings: AggregationSettings,
}

impl SourceAggregator {
    pub fn new(settings: AggregationSettings) -> Self {
        Self {
            sources: Vec::new(),
            settings,
        }
    }

    /// Register a source after all previously registered ones
    pub fn register(&mut self, source: Arc<dyn ExampleSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn ExampleSource>) -> Self {
        self.register(source);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn settings(&self) -> &AggregationSettings {
        &self.settings
    }

    /// Collect deduplicated candidates for a form.
    ///
    /// A failing source counts as zero results. Only when every queried
    /// source fails is the whole collection an error.
    #[instrument(skip(self, form), fields(form = %form.id))]
    pub async fn collect(&self, form: &Form) -> Result<Aggregation, AggregateError> {
        if self.sources.is_empty() {
            return Err(AggregateError::NoSources);
        }

        let started = Instant::now();
        let threshold = self.settings.sufficiency_threshold;
        let mut aggregation = Aggregation::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut failures = Vec::new();

        for source in &self.sources {
            let name = source.name().to_string();

            if aggregation.candidates.len() >= threshold {
                debug!(source = %name, "Threshold reached, skipping source");
                aggregation.reports.push(SourceReport {
                    name,
                    status: SourceStatus::NotQueried,
                });
                continue;
            }

            let cap = self.settings.cap_for(&name);
            let status = match source.find(form, cap).await {
                Ok(mut found) => {
                    // Sources stop at the cap themselves; this guards the rest
                    found.truncate(cap);
                    let kept = found.len();
                    for candidate in found {
                        if seen.insert(candidate.text.clone()) {
                            aggregation.candidates.push(candidate);
                        } else {
                            aggregation.duplicates += 1;
                        }
                    }
                    SourceStatus::Found(kept)
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "Source failed, treating as empty");
                    failures.push(format!("{}: {}", name, e));
                    SourceStatus::Failed(e.to_string())
                }
            };
            aggregation.reports.push(SourceReport { name, status });
        }

        let queried = aggregation
            .reports
            .iter()
            .filter(|r| r.status != SourceStatus::NotQueried)
            .count();
        if queried > 0 && failures.len() == queried {
            return Err(AggregateError::AllSourcesUnavailable(failures));
        }

        aggregation.elapsed = started.elapsed();
        info!(
            candidates = aggregation.candidates.len(),
            duplicates = aggregation.duplicates,
            elapsed_ms = aggregation.elapsed.as_millis() as u64,
            "Collected candidates"
        );

        Ok(aggregation)
    }
}
