//! Wikisource full-text search as an example source.
//!
//! Uses the MediaWiki search API of `{lang}.wikisource.org` and runs the
//! extraction pipeline over each result snippet. Responses are memoized per
//! (language, representation).

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, info};

use super::{ExampleSource, SourceError};
use crate::core::BoundedCache;
use crate::domain::{Candidate, CorpusRecord, Form, LanguageCode, Provenance};
use crate::extract::{ExtractionSettings, Extractor};

pub const SOURCE_NAME: &str = "wikisource";

/// Search limit for languages with a fast sentence detector
pub const FAST_LANGUAGE_LIMIT: usize = 50;

/// Search limit for every other language
pub const SLOW_LANGUAGE_LIMIT: usize = 20;

const DEFAULT_ENDPOINT: &str = "https://{lang}.wikisource.org/w/api.php";
const DEFAULT_CACHE_CAPACITY: usize = 128;

/// One search result: page title plus a plain-text snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

type CacheKey = (LanguageCode, String);

/// Wikisource search source
pub struct WikisourceSource {
    client: reqwest::Client,
    endpoint: String,
    settings: ExtractionSettings,
    cache: Mutex<BoundedCache<CacheKey, Vec<SearchHit>>>,
}

impl WikisourceSource {
    pub fn new(settings: ExtractionSettings) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("lexuse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            settings,
            cache: Mutex::new(BoundedCache::new(DEFAULT_CACHE_CAPACITY)),
        })
    }

    /// Override the API endpoint; `{lang}` is replaced by the language code
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = Mutex::new(BoundedCache::new(capacity));
        self
    }

    /// Result limit for a language
    pub fn limit_for(language: &LanguageCode) -> usize {
        if language.has_fast_detector() {
            FAST_LANGUAGE_LIMIT
        } else {
            SLOW_LANGUAGE_LIMIT
        }
    }

    async fn search(&self, form: &Form) -> Result<Vec<SearchHit>, SourceError> {
        let key = (form.language.clone(), form.representation.clone());
        if let Some(hits) = self.cached(&key) {
            debug!(form = %form.id, "Wikisource search served from cache");
            return Ok(hits);
        }

        let url = self.endpoint.replace("{lang}", form.language.as_str());
        let limit = Self::limit_for(&form.language).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", form.representation.as_str()),
                ("srlimit", limit.as_str()),
                ("srprop", "snippet"),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let body = response.text().await?;
        let hits = parse_search_response(&body)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, hits.clone());
        }
        Ok(hits)
    }

    fn cached(&self, key: &CacheKey) -> Option<Vec<SearchHit>> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn page_url(language: &LanguageCode, title: &str) -> String {
        format!(
            "https://{}.wikisource.org/wiki/{}",
            language,
            title.replace(' ', "_")
        )
    }
}

#[async_trait]
impl ExampleSource for WikisourceSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn find(&self, form: &Form, limit: usize) -> Result<Vec<Candidate>, SourceError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let hits = self.search(form).await?;
        let extractor = Extractor::for_language(&self.settings, &form.language);

        let mut candidates = Vec::new();
        for hit in &hits {
            if candidates.len() >= limit {
                break;
            }
            let record = CorpusRecord::new(hit.title.clone(), hit.snippet.clone());
            let extraction = extractor.extract_with(&record, form, || {
                Provenance::from_record(SOURCE_NAME, &record)
                    .with_title(hit.title.clone())
                    .with_url(Self::page_url(&form.language, &hit.title))
            });
            candidates.extend(extraction.candidates);
        }
        candidates.truncate(limit);

        info!(
            form = %form.id,
            hits = hits.len(),
            found = candidates.len(),
            "Searched Wikisource"
        );
        Ok(candidates)
    }
}

/// Decode a MediaWiki `list=search` response into plain-text hits
pub fn parse_search_response(body: &str) -> Result<Vec<SearchHit>, SourceError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(SourceError::Unavailable(format!(
            "API error {}: {}",
            error.code, error.info
        )));
    }

    let hits = response
        .query
        .map(|q| q.search)
        .unwrap_or_default()
        .into_iter()
        .map(|raw| SearchHit {
            title: raw.title,
            snippet: clean_snippet(&raw.snippet),
        })
        .collect();

    Ok(hits)
}

/// Plain text of a result snippet: highlighting and other markup dropped,
/// entities decoded
fn clean_snippet(snippet: &str) -> String {
    Html::parse_fragment(snippet)
        .root_element()
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}
