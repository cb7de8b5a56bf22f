use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::app_dirs::AppDirs;
use crate::error::{Result, StoreError};

/// Key the best score is stored under
pub const HIGH_SCORE_KEY: &str = "HighScore";

/// Get/set capability for the single persisted high score.
/// Implementations swallow their own storage failures.
pub trait HighScoreStore {
    fn high_score(&self) -> u32;
    fn set_high_score(&mut self, score: u32);

    /// When the current best was set, if the store tracks it
    fn achieved_at(&self) -> Option<DateTime<Local>> {
        None
    }
}

impl<T: HighScoreStore + ?Sized> HighScoreStore for Box<T> {
    fn high_score(&self) -> u32 {
        (**self).high_score()
    }

    fn set_high_score(&mut self, score: u32) {
        (**self).set_high_score(score)
    }

    fn achieved_at(&self) -> Option<DateTime<Local>> {
        (**self).achieved_at()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighScoreRecord {
    pub score: u32,
    pub achieved_at: DateTime<Local>,
}

/// Volatile store, used by tests and when the database is unavailable
#[derive(Debug, Default, Clone)]
pub struct MemoryHighScoreStore {
    record: Option<HighScoreRecord>,
}

impl MemoryHighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u32) -> Self {
        Self {
            record: Some(HighScoreRecord {
                score,
                achieved_at: Local::now(),
            }),
        }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn high_score(&self) -> u32 {
        self.record.map(|r| r.score).unwrap_or(0)
    }

    fn set_high_score(&mut self, score: u32) {
        self.record = Some(HighScoreRecord {
            score,
            achieved_at: Local::now(),
        });
    }

    fn achieved_at(&self) -> Option<DateTime<Local>> {
        self.record.map(|r| r.achieved_at)
    }
}

/// High score kept in a small SQLite key/value table
#[derive(Debug)]
pub struct SqliteHighScoreStore {
    conn: Connection,
    cached: Option<HighScoreRecord>,
}

impl SqliteHighScoreStore {
    /// Open the database under the application state directory
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().ok_or(StoreError::NoStateDir("scores.db"))?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS high_scores (
                key TEXT PRIMARY KEY,
                score INTEGER NOT NULL,
                achieved_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        let mut store = Self { conn, cached: None };
        store.cached = store.load()?;
        Ok(store)
    }

    /// Read the stored record straight from the database
    pub fn load(&self) -> Result<Option<HighScoreRecord>> {
        let row: Option<(u32, String)> = self
            .conn
            .query_row(
                "SELECT score, achieved_at FROM high_scores WHERE key = ?1",
                [HIGH_SCORE_KEY],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(score, ts)| HighScoreRecord {
            score,
            // a mangled timestamp should not cost the player their score
            achieved_at: DateTime::parse_from_rfc3339(&ts)
                .map(|t| t.with_timezone(&Local))
                .unwrap_or_else(|_| Local::now()),
        }))
    }

    pub fn save(&mut self, score: u32) -> Result<()> {
        let record = HighScoreRecord {
            score,
            achieved_at: Local::now(),
        };
        self.conn.execute(
            r#"
            INSERT INTO high_scores (key, score, achieved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                score = excluded.score,
                achieved_at = excluded.achieved_at
            "#,
            params![HIGH_SCORE_KEY, record.score, record.achieved_at.to_rfc3339()],
        )?;
        self.cached = Some(record);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM high_scores WHERE key = ?1",
            [HIGH_SCORE_KEY],
        )?;
        self.cached = None;
        Ok(())
    }
}

impl HighScoreStore for SqliteHighScoreStore {
    fn high_score(&self) -> u32 {
        self.cached.map(|r| r.score).unwrap_or(0)
    }

    fn set_high_score(&mut self, score: u32) {
        if let Err(e) = self.save(score) {
            log::warn!("could not persist high score {score}: {e}");
            // keep the in-process value so the banner stays truthful
            self.cached = Some(HighScoreRecord {
                score,
                achieved_at: Local::now(),
            });
        }
    }

    fn achieved_at(&self) -> Option<DateTime<Local>> {
        self.cached.map(|r| r.achieved_at)
    }
}
