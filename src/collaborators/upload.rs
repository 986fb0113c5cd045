//! Usage-example uploaders: what happens to an accepted candidate.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::domain::{Candidate, Form, Provenance};

/// Outcome of a successful upload call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The example was attached to the lexeme
    Uploaded,

    /// No sense of the lexeme fitted the example; nothing was written
    NoFittingSense,
}

/// Upload failures. Always retryable from the session's point of view.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// Performs the sense choice and knowledge-base write for an accepted example
#[async_trait]
pub trait UsageExampleUploader: Send + Sync {
    async fn upload(&self, form: &Form, candidate: &Candidate)
        -> Result<UploadOutcome, UploadError>;
}

/// One exported usage example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedExample {
    pub form_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexeme_id: Option<String>,

    pub representation: String,
    pub language: String,
    pub text: String,
    pub content_id: String,
    pub provenance: Provenance,
    pub exported_at: DateTime<Utc>,
}

/// Appends accepted examples to a JSONL file for a later batch upload
pub struct ExportUploader {
    path: PathBuf,
}

impl ExportUploader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UsageExampleUploader for ExportUploader {
    async fn upload(
        &self,
        form: &Form,
        candidate: &Candidate,
    ) -> Result<UploadOutcome, UploadError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let exported = ExportedExample {
            form_id: form.id.clone(),
            lexeme_id: form.lexeme_id.clone(),
            representation: form.representation.clone(),
            language: form.language.to_string(),
            text: candidate.text.clone(),
            content_id: candidate.content_id(),
            provenance: candidate.provenance.clone(),
            exported_at: Utc::now(),
        };
        let json = serde_json::to_string(&exported)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", json).as_bytes()).await?;
        file.flush().await?;

        info!(form = %form.id, example = %exported.content_id, "Exported usage example");
        Ok(UploadOutcome::Uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CorpusRecord;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_appends_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("exports").join("examples.jsonl");
        let uploader = ExportUploader::new(&path);

        let form = Form::new("L1-F1", "rapport", "sv").unwrap().with_lexeme("L1");
        let provenance = Provenance::from_record("riksdagen", &CorpusRecord::new("H801", ""));
        let first = Candidate::new("Hon skrev en lång rapport om klimatet idag.", "L1-F1", provenance.clone());
        let second = Candidate::new("En annan rapport kom fram till samma sak.", "L1-F1", provenance);

        assert_eq!(uploader.upload(&form, &first).await.unwrap(), UploadOutcome::Uploaded);
        assert_eq!(uploader.upload(&form, &second).await.unwrap(), UploadOutcome::Uploaded);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<ExportedExample> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].lexeme_id.as_deref(), Some("L1"));
        assert_eq!(lines[0].text, first.text);
        assert_eq!(lines[0].content_id, first.content_id());
        assert_eq!(lines[1].provenance.record_id, "H801");
    }
}
