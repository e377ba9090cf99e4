//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - The last durations picked by the user (key-value table)
//! - Completed sessions and a small summary over them

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::ports::DurationStore;
use crate::timer::SessionConfig;

const MEDITATE_KEY: &str = "meditationTime";
const REST_KEY: &str = "restTime";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub meditate_seconds: u64,
    pub rest_seconds: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_meditate_min: u64,
    pub total_rest_min: u64,
    pub today_sessions: u64,
    /// Distinct days with at least one completed session in the last 7 days.
    pub active_days_this_week: u64,
}

/// SQLite database for durations and completed sessions.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/meditation-timer/meditation.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("meditation.db");
        Self::open_at(&path)
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and dry runs).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                meditate_seconds INTEGER NOT NULL,
                rest_seconds     INTEGER NOT NULL,
                completed_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )?;
        Ok(())
    }

    /// Record a completed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, config: SessionConfig, completed_at: DateTime<Utc>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (meditate_seconds, rest_seconds, completed_at)
             VALUES (?1, ?2, ?3)",
            params![
                config.meditate_seconds,
                config.rest_seconds,
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, meditate_seconds, rest_seconds, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, meditate_seconds, rest_seconds, completed_at) = row?;
            let completed_at = parse_timestamp(&completed_at)?;
            records.push(SessionRecord {
                id,
                meditate_seconds,
                rest_seconds,
                completed_at,
            });
        }
        Ok(records)
    }

    /// Summary of all completed sessions, relative to `now`.
    ///
    /// Days are calendar days in the time zone of `now`.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub fn stats<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<Stats> {
        let (total_sessions, meditate_secs, rest_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(meditate_seconds), 0), COALESCE(SUM(rest_seconds), 0)
             FROM sessions",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?, row.get::<_, u64>(2)?)),
        )?;

        let zone = now.timezone();
        let today = now.date_naive();
        let week_start = today - Duration::days(6);

        // Coarse UTC cut-off; exact day bucketing happens below.
        let since = (now.with_timezone(&Utc) - Duration::days(8)).to_rfc3339();
        let mut stmt = self
            .conn
            .prepare("SELECT completed_at FROM sessions WHERE completed_at >= ?1")?;
        let rows = stmt.query_map(params![since], |row| row.get::<_, String>(0))?;

        let mut today_sessions = 0;
        let mut active_days = BTreeSet::new();
        for row in rows {
            let day = parse_timestamp(&row?)?.with_timezone(&zone).date_naive();
            if day == today {
                today_sessions += 1;
            }
            if (week_start..=today).contains(&day) {
                active_days.insert(day);
            }
        }

        Ok(Stats {
            total_sessions,
            total_meditate_min: meditate_secs / 60,
            total_rest_min: rest_secs / 60,
            today_sessions,
            active_days_this_week: active_days.len() as u64,
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Unparseable values are treated as absent.
    fn kv_get_minutes(&self, key: &str) -> Result<Option<u64>> {
        let Some(raw) = self.kv_get(key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<u64>() {
            Ok(minutes) => Ok(Some(minutes)),
            Err(_) => {
                warn!(key, value = %raw, "ignoring unparseable stored duration");
                Ok(None)
            }
        }
    }
}

impl DurationStore for Database {
    fn load_meditate_minutes(&self) -> Result<Option<u64>> {
        self.kv_get_minutes(MEDITATE_KEY)
    }

    fn load_rest_minutes(&self) -> Result<Option<u64>> {
        self.kv_get_minutes(REST_KEY)
    }

    fn save_meditate_minutes(&mut self, minutes: u64) -> Result<()> {
        self.kv_set(MEDITATE_KEY, &minutes.to_string())?;
        Ok(())
    }

    fn save_rest_minutes(&mut self, minutes: u64) -> Result<()> {
        self.kv_set(REST_KEY, &minutes.to_string())?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp {raw:?}: {e}")))?;
    Ok(parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn durations_roundtrip_through_kv() {
        let mut db = Database::open_memory().unwrap();
        assert_eq!(db.load_meditate_minutes().unwrap(), None);
        db.save_meditate_minutes(10).unwrap();
        db.save_rest_minutes(0).unwrap();
        assert_eq!(db.load_meditate_minutes().unwrap(), Some(10));
        assert_eq!(db.load_rest_minutes().unwrap(), Some(0));
    }

    #[test]
    fn garbage_duration_reads_as_absent() {
        let db = Database::open_memory().unwrap();
        db.kv_set(REST_KEY, "lots").unwrap();
        assert_eq!(db.load_rest_minutes().unwrap(), None);
    }

    #[test]
    fn record_and_summarize() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(SessionConfig::from_minutes(10, 2), now).unwrap();
        db.record_session(SessionConfig::from_minutes(5, 0), now - Duration::days(2))
            .unwrap();
        db.record_session(SessionConfig::from_minutes(5, 0), now - Duration::days(30))
            .unwrap();

        let stats = db.stats(now).unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_meditate_min, 20);
        assert_eq!(stats.total_rest_min, 2);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.active_days_this_week, 2);

        let recent = db.recent_sessions(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].meditate_seconds, 600);
    }

    #[test]
    fn stats_bucket_days_in_callers_zone() {
        let db = Database::open_memory().unwrap();
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let last_night = zone.with_ymd_and_hms(2026, 3, 9, 22, 0, 0).unwrap();
        db.record_session(SessionConfig::from_minutes(5, 0), now.with_timezone(&Utc))
            .unwrap();
        db.record_session(SessionConfig::from_minutes(5, 0), last_night.with_timezone(&Utc))
            .unwrap();

        let local = db.stats(now).unwrap();
        assert_eq!(local.today_sessions, 1);
        assert_eq!(local.active_days_this_week, 2);

        // Both land on 2026-03-10 in UTC.
        let utc = db.stats(now.with_timezone(&Utc)).unwrap();
        assert_eq!(utc.today_sessions, 2);
        assert_eq!(utc.active_days_this_week, 1);
    }
}
