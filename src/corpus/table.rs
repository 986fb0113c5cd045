//! SQLite-backed corpus table: one row per pre-segmented sentence.
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE sentences (
//!     id          TEXT NOT NULL,
//!     date        TEXT,
//!     external_id TEXT,
//!     filename    TEXT,
//!     sentence    TEXT NOT NULL
//! );
//! ```
//!
//! Tables are produced by the ingestion tooling; at runtime they are only
//! read. `create` and `insert` exist for fixtures and for converters.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Row};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{parse_record_date, CorpusRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sentences (
    id          TEXT NOT NULL,
    date        TEXT,
    external_id TEXT,
    filename    TEXT,
    sentence    TEXT NOT NULL
);
";

/// Column order of every `SELECT` on `sentences`
const COLUMNS: [&str; 5] = ["id", "date", "external_id", "filename", "sentence"];

/// Case-insensitive substring test registered on every connection
const CONTAINS_FN: &str = "folded_contains";

/// Errors that can occur reading a corpus table
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The table file (or its `sentences` table) does not exist
    #[error("Corpus data not found: {0}")]
    DataNotFound(PathBuf),

    /// A row could not be decoded
    #[error("Malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection mutex was poisoned or the blocking task died
    #[error("Corpus table unavailable: {0}")]
    Unavailable(String),
}

/// Rows returned by a search, plus the rows that had to be skipped
#[derive(Debug, Clone, Default)]
pub struct TableSearch {
    pub records: Vec<CorpusRecord>,
    pub malformed: usize,
}

/// Counters for one `scan_blocking` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Rows read, including malformed ones
    pub rows: usize,
    pub malformed: usize,
    /// The visitor asked to stop before the rows ran out
    pub stopped: bool,
}

/// A queryable corpus table. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct CorpusTable {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for CorpusTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusTable").field("path", &self.path).finish()
    }
}

impl CorpusTable {
    /// Open an existing table read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(CorpusError::DataNotFound(path));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let has_table: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sentences'",
            [],
            |row| row.get(0),
        )?;
        if has_table == 0 {
            return Err(CorpusError::DataNotFound(path));
        }
        register_functions(&conn)?;

        debug!(path = %path.display(), "Opened corpus table");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create (or open for writing) a table at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;
        register_functions(&conn)?;
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record as one row
    pub fn insert(&self, record: &CorpusRecord) -> Result<(), CorpusError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sentences (id, date, external_id, filename, sentence)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.date.map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()),
                record.external_id,
                record.filename,
                record.text,
            ],
        )?;
        Ok(())
    }

    /// Number of rows in the table
    pub fn len(&self) -> Result<usize, CorpusError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sentences", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CorpusError> {
        Ok(self.len()? == 0)
    }

    /// Rows whose sentence contains `representation`, ignoring case, in
    /// table order. `limit` caps the rows read.
    ///
    /// This is a coarse substring prefilter; whole-token matching happens
    /// in the extraction pipeline.
    pub async fn search(
        &self,
        representation: &str,
        limit: Option<usize>,
    ) -> Result<TableSearch, CorpusError> {
        let table = self.clone();
        let representation = representation.to_string();
        tokio::task::spawn_blocking(move || table.search_blocking(&representation, limit))
            .await
            .map_err(|e| CorpusError::Unavailable(format!("Task join error: {}", e)))?
    }

    /// Blocking variant of `search`
    pub fn search_blocking(
        &self,
        representation: &str,
        limit: Option<usize>,
    ) -> Result<TableSearch, CorpusError> {
        let mut records = Vec::new();
        let stats = self.scan_blocking(representation, limit, |record| {
            records.push(record);
            ControlFlow::Continue(())
        })?;

        Ok(TableSearch {
            records,
            malformed: stats.malformed,
        })
    }

    /// Feed matching rows to `visit` one at a time until it breaks or the
    /// rows run out. Rows after a break are never read.
    pub fn scan_blocking<F>(
        &self,
        representation: &str,
        limit: Option<usize>,
        mut visit: F,
    ) -> Result<ScanStats, CorpusError>
    where
        F: FnMut(CorpusRecord) -> ControlFlow<()>,
    {
        let needle = representation.to_lowercase();
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, date, external_id, filename, sentence FROM sentences
             WHERE {}(sentence, ?1)
             ORDER BY rowid
             LIMIT ?2",
            CONTAINS_FN
        ))?;
        let mut rows = stmt.query(params![needle, limit])?;

        let mut stats = ScanStats::default();
        while let Some(row) = rows.next()? {
            stats.rows += 1;
            match decode_row(row)? {
                Ok(record) => {
                    if visit(record).is_break() {
                        stats.stopped = true;
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Skipping malformed row");
                    stats.malformed += 1;
                }
            }
        }

        if stats.malformed > 0 {
            warn!(
                table = %self.path.display(),
                malformed = stats.malformed,
                "Skipped malformed rows"
            );
        }

        Ok(stats)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CorpusError> {
        self.conn
            .lock()
            .map_err(|_| CorpusError::Unavailable("connection lock poisoned".to_string()))
    }
}

/// `folded_contains(text, needle)`: true when the lowercased text contains
/// `needle`, which must already be lowercase. Invalid UTF-8 is decoded
/// lossily so the row still reaches `decode_row` and is counted there.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CONTAINS_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack = match ctx.get_raw(0) {
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes),
                _ => return Ok(false),
            };
            let needle: String = ctx.get(1)?;
            Ok(haystack.to_lowercase().contains(&needle))
        },
    )
}

/// Decode one row; row-level problems become `MalformedRecord` instead of
/// failing the whole query
fn decode_row(row: &Row<'_>) -> rusqlite::Result<Result<CorpusRecord, CorpusError>> {
    let mut columns: [Option<String>; 5] = Default::default();
    for (i, slot) in columns.iter_mut().enumerate() {
        match row.get_ref(i)?.as_str_or_null() {
            Ok(value) => *slot = value.map(str::to_string),
            Err(e) => {
                let id = row
                    .get_ref(0)?
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_default();
                return Ok(Err(CorpusError::MalformedRecord {
                    id,
                    reason: format!("unreadable {}: {}", COLUMNS[i], e),
                }));
            }
        }
    }
    let [id, date, external_id, filename, sentence] = columns;

    let id = id.unwrap_or_default();
    let text = match sentence {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return Ok(Err(CorpusError::MalformedRecord {
                id,
                reason: "empty sentence".to_string(),
            }))
        }
    };

    let mut record = CorpusRecord::new(id.clone(), text);
    record.external_id = external_id.filter(|e| !e.is_empty());
    record.filename = filename.filter(|f| !f.is_empty());

    if let Some(raw) = date.filter(|d| !d.trim().is_empty()) {
        match parse_record_date(&raw) {
            Some(parsed) => record.date = Some(parsed),
            None => {
                return Ok(Err(CorpusError::MalformedRecord {
                    id,
                    reason: format!("bad date '{}'", raw),
                }))
            }
        }
    }

    Ok(Ok(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_table() -> (CorpusTable, TempDir) {
        let temp = TempDir::new().unwrap();
        let table = CorpusTable::create(temp.path().join("riksdagen.db")).unwrap();
        (table, temp)
    }

    #[test]
    fn test_open_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = CorpusTable::open(temp.path().join("missing.db"));
        assert!(matches!(result, Err(CorpusError::DataNotFound(_))));
    }

    #[test]
    fn test_open_without_sentences_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x TEXT);")
            .unwrap();

        assert!(matches!(
            CorpusTable::open(&path),
            Err(CorpusError::DataNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_case_variants() {
        let (table, _temp) = create_test_table();
        table
            .insert(&CorpusRecord::new("a", "Rapport om klimatet lämnades in."))
            .unwrap();
        table
            .insert(&CorpusRecord::new("b", "Hon skrev en lång rapport."))
            .unwrap();
        table
            .insert(&CorpusRecord::new("c", "RAPPORT ÖVER VERKSAMHETEN."))
            .unwrap();
        table
            .insert(&CorpusRecord::new("d", "Ingenting relevant här."))
            .unwrap();

        let search = table.search("rapport", None).await.unwrap();
        let ids: Vec<&str> = search.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(search.malformed, 0);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let (table, _temp) = create_test_table();
        for i in 0..5 {
            table
                .insert(&CorpusRecord::new(format!("r{}", i), "En rapport till."))
                .unwrap();
        }

        let search = table.search("rapport", Some(2)).await.unwrap();
        assert_eq!(search.records.len(), 2);
        assert_eq!(table.len().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_dates_and_optional_columns() {
        let (table, _temp) = create_test_table();
        let date = NaiveDate::from_ymd_opt(2019, 5, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        table
            .insert(
                &CorpusRecord::new("H601", "Utskottet lämnade en rapport.")
                    .with_date(date)
                    .with_external_id("GZ01")
                    .with_filename("dump-2019.zip"),
            )
            .unwrap();

        let search = table.search("rapport", None).await.unwrap();
        let record = &search.records[0];
        assert_eq!(record.date, Some(date));
        assert_eq!(record.external_id.as_deref(), Some("GZ01"));
        assert_eq!(record.filename.as_deref(), Some("dump-2019.zip"));
    }

    #[tokio::test]
    async fn test_malformed_rows_counted_and_skipped() {
        let (table, temp) = create_test_table();
        table
            .insert(&CorpusRecord::new("ok", "Hon skrev en rapport."))
            .unwrap();
        {
            let conn = Connection::open(temp.path().join("riksdagen.db")).unwrap();
            conn.execute(
                "INSERT INTO sentences (id, date, sentence) VALUES ('bad', 'last tuesday', 'En rapport.')",
                [],
            )
            .unwrap();
        }

        let search = table.search("rapport", None).await.unwrap();
        assert_eq!(search.records.len(), 1);
        assert_eq!(search.records[0].id, "ok");
        assert_eq!(search.malformed, 1);
    }

    #[tokio::test]
    async fn test_undecodable_row_does_not_fail_search() {
        let (table, temp) = create_test_table();
        table
            .insert(&CorpusRecord::new("ok", "Hon skrev en rapport."))
            .unwrap();
        {
            let conn = Connection::open(temp.path().join("riksdagen.db")).unwrap();
            conn.execute(
                "INSERT INTO sentences (id, sentence)
                 VALUES ('latin1', CAST(X'7261707070FF20726170706F7274' AS TEXT))",
                [],
            )
            .unwrap();
        }

        let search = table.search("rapport", None).await.unwrap();
        assert_eq!(search.records.len(), 1);
        assert_eq!(search.records[0].id, "ok");
        assert_eq!(search.malformed, 1);
    }

    #[tokio::test]
    async fn test_search_ignores_mixed_case() {
        let (table, _temp) = create_test_table();
        table
            .insert(&CorpusRecord::new(
                "a",
                "Ett DNA-test visade att han var far till barnet.",
            ))
            .unwrap();
        table
            .insert(&CorpusRecord::new("b", "Ärendet gällde ett Dna-Test."))
            .unwrap();

        let search = table.search("dna-test", None).await.unwrap();
        let ids: Vec<&str> = search.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let search = table.search("ÄRENDET", None).await.unwrap();
        assert_eq!(search.records.len(), 1);
    }

    #[test]
    fn test_scan_stops_when_visitor_breaks() {
        let (table, _temp) = create_test_table();
        for i in 0..10 {
            table
                .insert(&CorpusRecord::new(format!("r{}", i), "En rapport till."))
                .unwrap();
        }

        let mut seen = Vec::new();
        let stats = table
            .scan_blocking("rapport", None, |record| {
                seen.push(record.id);
                if seen.len() == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert_eq!(seen, vec!["r0", "r1", "r2"]);
        assert_eq!(stats.rows, 3);
        assert!(stats.stopped);
    }

    #[tokio::test]
    async fn test_open_reads_existing_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ads.db");
        {
            let table = CorpusTable::create(&path).unwrap();
            table
                .insert(&CorpusRecord::new("ad-1", "Vi söker en kock."))
                .unwrap();
        }

        let table = CorpusTable::open(&path).unwrap();
        assert_eq!(table.len().unwrap(), 1);
        assert!(table.insert(&CorpusRecord::new("ad-2", "Nej.")).is_err());
    }
}
