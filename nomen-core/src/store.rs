//! Durable voice store over SQLite.
//!
//! Each enrolled identity is one row: `voice_id` primary key plus the
//! embedding serialized as a JSON float array. Inserts are single-statement
//! transactions, which is all the concurrency control the service needs:
//! concurrent enrolls serialise inside SQLite, and a match scan sees every
//! insert committed before it began.
//!
//! `all()` is a full-table scan in insertion order. That is an accepted
//! limit at the expected enrollment population; swapping in an index would
//! not change this module's surface.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::embedding::Embedding;
use crate::error::{NomenError, Result};

/// One enrolled identity.
#[derive(Debug, Clone)]
pub struct VoiceRecord {
    pub voice_id: String,
    pub embedding: Embedding,
}

#[derive(Debug, Clone)]
pub struct VoiceStore {
    db_path: PathBuf,
}

impl VoiceStore {
    pub fn default_db_path() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Lattice Labs")
                .join("Nomen")
                .join("voices.db")
        }
        #[cfg(not(target_os = "windows"))]
        {
            std::env::var_os("XDG_DATA_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    std::env::var_os("HOME")
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from("/tmp"))
                        .join(".local")
                        .join("share")
                })
                .join("nomen")
                .join("voices.db")
        }
    }

    /// Open the store at `db_path`, creating the file and schema if needed.
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self { db_path };
        store.init_schema()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path).map_err(|e| NomenError::Store(e.to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS voices (
              voice_id TEXT PRIMARY KEY,
              embedding TEXT NOT NULL,
              created_at INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| NomenError::Store(e.to_string()))?;
        Ok(())
    }

    /// Persist an embedding under a fresh identity and return the identity.
    ///
    /// Always a plain `INSERT` — an existing record is never overwritten or
    /// merged. The identity is returned only after the statement has
    /// committed, so a storage failure never reports a fabricated identity.
    pub fn insert(&self, embedding: &Embedding) -> Result<String> {
        let voice_id = new_id("voice");
        let payload = serde_json::to_string(embedding.as_slice())
            .map_err(|e| NomenError::Store(e.to_string()))?;
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO voices (voice_id, embedding, created_at) VALUES (?1, ?2, ?3)",
            params![voice_id, payload, Utc::now().timestamp()],
        )
        .map_err(|e| NomenError::Store(e.to_string()))?;
        debug!(voice_id = %voice_id, dim = embedding.len(), "enrolled voice");
        Ok(voice_id)
    }

    /// Every persisted record, in insertion order.
    ///
    /// Insertion order is part of the matcher's observable contract: on a
    /// tied score, the earliest-enrolled identity wins.
    pub fn all(&self) -> Result<Vec<VoiceRecord>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT voice_id, embedding FROM voices ORDER BY rowid ASC")
            .map_err(|e| NomenError::Store(e.to_string()))?;
        let mut rows = stmt.query([]).map_err(|e| NomenError::Store(e.to_string()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| NomenError::Store(e.to_string()))? {
            let voice_id: String = row.get(0).map_err(|e| NomenError::Store(e.to_string()))?;
            let payload: String = row.get(1).map_err(|e| NomenError::Store(e.to_string()))?;
            let values: Vec<f32> = serde_json::from_str(&payload)
                .map_err(|e| NomenError::Store(format!("corrupt embedding for {voice_id}: {e}")))?;
            // Re-validate on the way out: a corrupted row surfaces as an
            // error here instead of as a NaN score during matching.
            let dim = values.len();
            let embedding = Embedding::from_raw(values, dim)?;
            out.push(VoiceRecord {
                voice_id,
                embedding,
            });
        }
        Ok(out)
    }

    /// Number of enrolled identities, for health reporting.
    pub fn count(&self) -> Result<usize> {
        let conn = self.open()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM voices", [], |row| row.get(0))
            .map_err(|e| NomenError::Store(e.to_string()))?;
        Ok(count as usize)
    }
}

fn new_id(prefix: &str) -> String {
    format!(
        "{prefix}-{}-{:08x}",
        Utc::now().timestamp_micros(),
        rand::random::<u32>()
    )
}
