//! Source backed by a local corpus table.

use std::ops::ControlFlow;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{ExampleSource, SourceError};
use crate::corpus::{CorpusError, CorpusTable, ScanStats};
use crate::domain::{Candidate, Form, LanguageCode};
use crate::extract::{ExtractionSettings, Extractor, FilterStats};

/// Runs the extraction pipeline over rows of one corpus table.
///
/// A table holds text in a single language; forms in other languages get
/// no candidates.
pub struct CorpusSource {
    name: String,
    language: LanguageCode,
    table: CorpusTable,
    extractor: Extractor,
    max_rows: Option<usize>,
}

impl CorpusSource {
    pub fn new(
        name: impl Into<String>,
        language: LanguageCode,
        table: CorpusTable,
        settings: &ExtractionSettings,
    ) -> Self {
        let extractor = Extractor::for_language(settings, &language);
        Self {
            name: name.into(),
            language,
            table,
            extractor,
            max_rows: None,
        }
    }

    /// Stop reading the table after this many matching rows
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    /// Extract candidates row by row, stopping once `limit` are found.
    /// Rows past that point are never read.
    pub async fn scan(&self, form: &Form, limit: usize) -> Result<CorpusScan, SourceError> {
        if form.language != self.language || limit == 0 {
            debug!(
                source = %self.name,
                form_language = %form.language,
                limit,
                "Skipping corpus scan"
            );
            return Ok(CorpusScan::default());
        }

        let table = self.table.clone();
        let extractor = self.extractor.clone();
        let form = form.clone();
        let name = self.name.clone();
        let max_rows = self.max_rows;

        let scan = tokio::task::spawn_blocking(move || {
            let mut scan = CorpusScan::default();
            let table_stats = table.scan_blocking(&form.representation, max_rows, |record| {
                let extraction = extractor.extract(&record, &form, &name);
                scan.filter.merge(&extraction.stats);
                scan.candidates.extend(extraction.candidates);
                if scan.candidates.len() >= limit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })?;
            scan.table = table_stats;
            scan.candidates.truncate(limit);
            Ok::<_, CorpusError>(scan)
        })
        .await
        .map_err(|e| CorpusError::Unavailable(format!("Task join error: {}", e)))??;

        Ok(scan)
    }
}

/// Outcome of one `CorpusSource::scan`
#[derive(Debug, Clone, Default)]
pub struct CorpusScan {
    pub candidates: Vec<Candidate>,
    pub table: ScanStats,
    pub filter: FilterStats,
}

#[async_trait]
impl ExampleSource for CorpusSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, form: &Form, limit: usize) -> Result<Vec<Candidate>, SourceError> {
        let scan = self.scan(form, limit).await?;

        info!(
            source = %self.name,
            form = %form.id,
            rows = scan.table.rows,
            malformed = scan.table.malformed,
            capped = scan.table.stopped,
            rejected = scan.filter.total_rejected(),
            found = scan.candidates.len(),
            "Searched corpus table"
        );

        Ok(scan.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CorpusRecord;
    use tempfile::TempDir;

    fn source_with(rows: &[(&str, &str)]) -> (CorpusSource, TempDir) {
        let temp = TempDir::new().unwrap();
        let table = CorpusTable::create(temp.path().join("riksdagen.db")).unwrap();
        for (id, text) in rows {
            table.insert(&CorpusRecord::new(*id, *text)).unwrap();
        }
        let source = CorpusSource::new(
            "riksdagen",
            LanguageCode::new("sv"),
            table,
            &ExtractionSettings::default(),
        );
        (source, temp)
    }

    #[tokio::test]
    async fn test_find_runs_pipeline() {
        let (source, _temp) = source_with(&[
            ("H1", "Hon skrev en lång rapport om klimatet idag."),
            ("H2", "Kort rapport."),
            ("H3", "Utskottet läste rapporten under hela dagen igår."),
        ]);
        let form = Form::new("L1-F1", "rapport", "sv").unwrap();

        let candidates = source.find(&form, 500).await.unwrap();

        // "rapporten" passes the substring prefilter but is a different token
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "Hon skrev en lång rapport om klimatet idag.");
        assert_eq!(candidates[0].provenance.source, "riksdagen");
        assert_eq!(candidates[0].provenance.record_id, "H1");
    }

    #[tokio::test]
    async fn test_other_language_yields_nothing() {
        let (source, _temp) = source_with(&[("H1", "Hon skrev en lång rapport om klimatet idag.")]);
        let form = Form::new("L9-F1", "rapport", "en").unwrap();

        assert!(source.find(&form, 500).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_stops_at_limit() {
        let rows: Vec<(String, &str)> = (0..10)
            .map(|i| (format!("H{}", i), "Hon skrev en lång rapport om klimatet idag."))
            .collect();
        let rows: Vec<(&str, &str)> = rows.iter().map(|(id, text)| (id.as_str(), *text)).collect();
        let (source, _temp) = source_with(&rows);
        let form = Form::new("L1-F1", "rapport", "sv").unwrap();

        let scan = source.scan(&form, 2).await.unwrap();

        assert_eq!(scan.candidates.len(), 2);
        assert_eq!(scan.table.rows, 2);
        assert!(scan.table.stopped);
    }

    #[tokio::test]
    async fn test_mixed_case_occurrence_is_found() {
        let (source, _temp) = source_with(&[(
            "H1",
            "Ett DNA-test visade att han var far till barnet.",
        )]);
        let form = Form::new("L5-F1", "dna-test", "sv").unwrap();

        let candidates = source.find(&form, 500).await.unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_row_keeps_source_alive() {
        let (source, temp) = source_with(&[("H1", "Hon skrev en lång rapport om klimatet idag.")]);
        rusqlite::Connection::open(temp.path().join("riksdagen.db"))
            .unwrap()
            .execute(
                "INSERT INTO sentences (id, sentence)
                 VALUES ('H2', CAST(X'7261707070FF20726170706F7274' AS TEXT))",
                [],
            )
            .unwrap();
        let form = Form::new("L1-F1", "rapport", "sv").unwrap();

        let scan = source.scan(&form, 500).await.unwrap();
        assert_eq!(scan.candidates.len(), 1);
        assert_eq!(scan.table.malformed, 1);
    }
}
