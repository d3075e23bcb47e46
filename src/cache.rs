// SQLite persistence for the daily prop cache.
//
// One ranked prop set is stored per (league, Pacific calendar day) under a
// namespaced key-value row. Entries are never explicitly invalidated: a new
// day simply produces a new key, so same-day reads skip the external AI
// call entirely and stale days stop being looked up.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::America::Los_Angeles;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::props::NormalizedProp;

/// Key namespace, kept stable for compatibility with existing caches.
const KEY_NAMESPACE: &str = "pickvision";

// ---------------------------------------------------------------------------
// Pacific calendar day
// ---------------------------------------------------------------------------

/// Today's calendar date in America/Los_Angeles as `YYYY-MM-DD`.
///
/// The prop feed refreshes on the Pacific morning, so the cache day rolls
/// over at Pacific midnight, not UTC midnight.
pub fn pacific_today() -> String {
    pacific_date_for(Utc::now())
}

/// The America/Los_Angeles calendar date of an arbitrary instant.
pub fn pacific_date_for(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Los_Angeles)
        .format("%Y-%m-%d")
        .to_string()
}

// ---------------------------------------------------------------------------
// Cache entry
// ---------------------------------------------------------------------------

/// The JSON value stored under a daily-props key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub props: Vec<NormalizedProp>,
    /// ISO-8601 write time, informational only; the key's date governs
    /// freshness.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// PropCache
// ---------------------------------------------------------------------------

/// SQLite-backed key-value cache for ranked daily prop sets.
pub struct PropCache {
    conn: Mutex<Connection>,
}

impl PropCache {
    /// Open (or create) the cache database at `path`. Pass `":memory:"` for
    /// an ephemeral database in tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cache database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set cache database pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_props (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to create cache schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("cache mutex poisoned")
    }

    /// The storage key for a league's props on a given calendar date.
    pub fn daily_key(league_id: &str, date: &str) -> String {
        format!("{KEY_NAMESPACE}:daily-props:{league_id}:{date}")
    }

    /// Read the cached prop set for `(league_id, date)`. Returns `None` when
    /// no entry exists or the stored JSON no longer deserializes (a corrupt
    /// row is treated as a miss, not an error).
    pub fn read_daily(&self, league_id: &str, date: &str) -> Result<Option<CacheEntry>> {
        let key = Self::daily_key(league_id, date);
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM daily_props WHERE key = ?1")
            .context("failed to prepare cache read")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query cache")?;

        match rows.next() {
            Some(row) => {
                let json = row.context("failed to read cache row")?;
                Ok(serde_json::from_str(&json).ok())
            }
            None => Ok(None),
        }
    }

    /// Store a ranked prop set for `(league_id, date)`, overwriting any
    /// same-day entry.
    pub fn write_daily(
        &self,
        league_id: &str,
        date: &str,
        props: &[NormalizedProp],
    ) -> Result<()> {
        let entry = CacheEntry {
            props: props.to_vec(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&entry).context("failed to serialize cache entry")?;
        let key = Self::daily_key(league_id, date);

        self.conn()
            .execute(
                "INSERT OR REPLACE INTO daily_props (key, value) VALUES (?1, ?2)",
                params![key, json],
            )
            .context("failed to write cache entry")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
