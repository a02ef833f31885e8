//! SQLite result consumer
//!
//! Stores every result as a JSON payload alongside the URL that produced it.

use crate::crawler::Request;
use crate::output::traits::{ConsumerResult, ResultConsumer};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    referer TEXT,
    depth INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_results_url ON results(url);
"#;

/// Result consumer that inserts one row per result
pub struct SqliteConsumer {
    conn: Mutex<Connection>,
}

impl SqliteConsumer {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteConsumer)` - Database opened and schema in place
    /// * `Err(ConsumerError)` - Failed to open database
    pub fn new(path: impl AsRef<Path>) -> ConsumerResult<Self> {
        let conn = Connection::open(path.as_ref())?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Self::with_connection(conn)
    }

    /// Creates an in-memory database
    pub fn in_memory() -> ConsumerResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ConsumerResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored results
    pub fn count(&self) -> ConsumerResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Stored `(url, payload)` pairs in insertion order
    pub fn rows(&self) -> ConsumerResult<Vec<(String, String)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT url, payload FROM results ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl<T: Serialize> ResultConsumer<T> for SqliteConsumer {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn handle(&self, request: &Request, item: &T) -> ConsumerResult<()> {
        let payload = serde_json::to_string(item)?;
        self.conn().execute(
            "INSERT INTO results (url, referer, depth, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.url().as_str(),
                request.referer().map(|r| r.as_str()),
                request.depth(),
                payload,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
