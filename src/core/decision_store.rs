//! Persistent memory of forms already handled.
//!
//! Append-only JSONL: one `DecisionRecord` per line, state rebuilt by
//! replaying the file. The first record for a form wins; later inserts for
//! the same form are no-ops, so a decision is never overwritten.
//!
//! A session holds an exclusive advisory lock on `<file>.lock` so two
//! sessions cannot write the same store.

use std::collections::HashMap;
use std::fs::File as StdFile;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::domain::{DecisionRecord, Outcome};

pub const DECISIONS_FILE: &str = "decisions.jsonl";

#[derive(Debug, Error)]
pub enum DecisionStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decision store is locked by another session: {0}")]
    Locked(PathBuf),
}

/// Result of recording a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordResult {
    /// Written to disk
    Recorded(Outcome),

    /// The form already had a decision; nothing written
    AlreadyDecided(Outcome),
}

/// Counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionSummary {
    pub finished: usize,
    pub declined: usize,
}

impl DecisionSummary {
    pub fn total(&self) -> usize {
        self.finished + self.declined
    }
}

/// Decision log with its replayed state
#[derive(Debug)]
pub struct DecisionStore {
    path: PathBuf,
    decisions: HashMap<String, DecisionRecord>,
    /// Held for the lifetime of a writable store; dropping it unlocks
    lock: Option<StdFile>,
}

impl DecisionStore {
    /// Open for writing: create the parent directory, take the lock, replay
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DecisionStoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let lock = acquire_lock(&path)?;
        terminate_partial_line(&path).await?;
        let decisions = replay(&path).await?;
        debug!(path = %path.display(), decisions = decisions.len(), "Opened decision store");

        Ok(Self {
            path,
            decisions,
            lock: Some(lock),
        })
    }

    /// Read-only snapshot; takes no lock and refuses to record
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, DecisionStoreError> {
        let path = path.into();
        let decisions = replay(&path).await?;
        Ok(Self {
            path,
            decisions,
            lock: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, form_id: &str) -> bool {
        self.decisions.contains_key(form_id)
    }

    pub fn get(&self, form_id: &str) -> Option<&DecisionRecord> {
        self.decisions.get(form_id)
    }

    pub fn outcome(&self, form_id: &str) -> Option<Outcome> {
        self.decisions.get(form_id).map(|r| r.outcome)
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Record a terminal decision.
    ///
    /// The line is flushed and synced before returning. A form that already
    /// has a decision keeps it.
    pub async fn record(
        &mut self,
        form_id: &str,
        outcome: Outcome,
    ) -> Result<RecordResult, DecisionStoreError> {
        if let Some(existing) = self.decisions.get(form_id) {
            debug!(form = form_id, existing = existing.outcome.as_str(), "Form already decided");
            return Ok(RecordResult::AlreadyDecided(existing.outcome));
        }

        if self.lock.is_none() {
            return Err(DecisionStoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "decision store opened read-only",
            )));
        }

        let record = DecisionRecord::new(form_id, outcome);
        let json = serde_json::to_string(&record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", json).as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;

        self.decisions.insert(form_id.to_string(), record);
        Ok(RecordResult::Recorded(outcome))
    }

    pub fn summary(&self) -> DecisionSummary {
        let mut summary = DecisionSummary::default();
        for record in self.decisions.values() {
            match record.outcome {
                Outcome::Finished => summary.finished += 1,
                Outcome::Declined => summary.declined += 1,
            }
        }
        summary
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<&DecisionRecord> {
        let mut records: Vec<&DecisionRecord> = self.decisions.values().collect();
        records.sort_by(|a, b| a.decided_at.cmp(&b.decided_at));
        records
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn acquire_lock(path: &Path) -> Result<StdFile, DecisionStoreError> {
    let lock_path = lock_path(path);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)?;

    file.try_lock_exclusive()
        .map_err(|_| DecisionStoreError::Locked(lock_path))?;
    Ok(file)
}

/// Make sure the next append starts on a fresh line
async fn terminate_partial_line(path: &Path) -> Result<(), DecisionStoreError> {
    if !path.exists() {
        return Ok(());
    }
    let content = fs::read(path).await?;
    if content.is_empty() || content.ends_with(b"\n") {
        return Ok(());
    }

    let mut file = OpenOptions::new().append(true).open(path).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;
    Ok(())
}

/// Rebuild state from the log. Blank and unreadable lines are skipped; an
/// interrupted write can leave a partial last line.
async fn replay(path: &Path) -> Result<HashMap<String, DecisionRecord>, DecisionStoreError> {
    let mut decisions = HashMap::new();

    if !path.exists() {
        return Ok(decisions);
    }

    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut skipped = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<DecisionRecord>(&line) {
            Ok(record) => {
                decisions.entry(record.form_id.clone()).or_insert(record);
            }
            Err(e) => {
                debug!(error = %e, "Unreadable decision line");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "Skipped unreadable decision lines");
    }

    Ok(decisions)
}
