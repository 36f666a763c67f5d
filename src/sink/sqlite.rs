//! SQLite-backed import sink.
//!
//! `url_id` (the dedup key) carries a UNIQUE constraint and rows go in with
//! `INSERT OR IGNORE`, so re-running a crawl over the same entries leaves one
//! row per (project, link). Blocking database work runs on tokio's blocking
//! pool so the crawl's async tasks are never stalled.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::SinkError;
use crate::ingest::types::FeedbackRecord;
use crate::sink::{ImportSink, ImportSummary};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS feedbacks (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id   INTEGER NOT NULL,
    created_at   TEXT    NOT NULL,
    title        TEXT    NOT NULL,
    description  TEXT    NOT NULL,
    url          TEXT    NOT NULL,
    polarity     REAL    NOT NULL,
    author_image TEXT,
    author_name  TEXT    NOT NULL,
    author_url   TEXT    NOT NULL,
    source       TEXT    NOT NULL,
    url_id       TEXT    NOT NULL UNIQUE
);
CREATE INDEX IF NOT EXISTS feedbacks_project_id ON feedbacks (project_id);
";

const INSERT: &str = "
INSERT OR IGNORE INTO feedbacks
    (project_id, created_at, title, description, url, polarity,
     author_image, author_name, author_url, source, url_id)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
";

#[derive(Clone)]
pub struct SqliteSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SinkError::Worker(format!("creating {}: {e}", parent.display())))?;
        }
        info!(target: "crawler", db = %path.display(), "opening sqlite sink");
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Number of stored rows, optionally for one project.
    pub async fn count(&self, project_id: Option<i64>) -> Result<usize, SinkError> {
        self.with_conn(move |conn| {
            let n: i64 = match project_id {
                Some(id) => conn.query_row(
                    "SELECT COUNT(*) FROM feedbacks WHERE project_id = ?1",
                    params![id],
                    |r| r.get(0),
                )?,
                None => conn.query_row("SELECT COUNT(*) FROM feedbacks", [], |r| r.get(0))?,
            };
            Ok(usize::try_from(n).unwrap_or_default())
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, SinkError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SinkError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| SinkError::Worker("connection mutex poisoned".into()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| SinkError::Worker(e.to_string()))?
    }
}

fn insert_batch(
    conn: &mut Connection,
    records: &[FeedbackRecord],
) -> Result<ImportSummary, SinkError> {
    let tx = conn.transaction()?;
    let mut summary = ImportSummary::default();
    {
        let mut stmt = tx.prepare_cached(INSERT)?;
        for rec in records {
            let changed = stmt.execute(params![
                rec.project_id(),
                rec.created_at().to_rfc3339(),
                rec.title(),
                rec.description(),
                rec.url(),
                f64::from(rec.polarity()),
                rec.author_image(),
                rec.author_name(),
                rec.author_url(),
                rec.source().as_str(),
                rec.dedup_key(),
            ])?;
            if changed == 0 {
                summary.ignored += 1;
            } else {
                summary.inserted += 1;
            }
        }
    }
    tx.commit()?;
    Ok(summary)
}

#[async_trait]
impl ImportSink for SqliteSink {
    async fn import_batch(&self, records: Vec<FeedbackRecord>) -> Result<ImportSummary, SinkError> {
        let summary = self
            .with_conn(move |conn| insert_batch(conn, &records))
            .await?;
        debug!(
            target: "crawler",
            inserted = summary.inserted,
            ignored = summary.ignored,
            "sqlite batch committed"
        );
        Ok(summary)
    }
}
