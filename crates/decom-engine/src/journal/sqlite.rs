//! SQLite-backed journal store

use super::JournalStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use decom_common::{AttemptKey, AttemptStatus, DestructionAttempt, ResourceKind};
use directories::ProjectDirs;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Journal store persisting attempts to a SQLite database
///
/// One row per `(account, kind, resource, region)`; re-recording a
/// resource updates the row in place, so a resumed run sees exactly one
/// latest attempt per resource.
pub struct SqliteJournalStore {
    pool: SqlitePool,
}

/// Default journal path under the user's local data directory
fn default_db_path() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("", "", "decom").context("Failed to get project directories")?;

    let state_dir = proj_dirs.data_local_dir();
    fs::create_dir_all(state_dir).context("Failed to create state directory")?;

    Ok(state_dir.join("journal.db"))
}

impl SqliteJournalStore {
    /// Open (or create) the journal database at the default location
    pub async fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(&format!("sqlite://{}?mode=rwc", path.display())).await
    }

    /// Open a journal database at an explicit URL
    pub async fn open(db_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to open journal database")?;

        let store = Self { pool };
        store.setup_schema().await?;
        Ok(store)
    }

    /// In-memory journal for tests
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // A single connection keeps every query on the same in-memory db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open in-memory journal")?;

        let store = Self { pool };
        store.setup_schema().await?;
        Ok(store)
    }

    async fn setup_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                id INTEGER PRIMARY KEY,
                run_id TEXT NOT NULL,
                account_id TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                resource_id TEXT NOT NULL,
                region TEXT NOT NULL,
                phase INTEGER NOT NULL,
                status TEXT NOT NULL,
                reason TEXT,
                error TEXT,
                attempt_number INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                UNIQUE(account_id, resource_type, resource_id, region)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_attempts_run ON attempts(run_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_attempts_account ON attempts(account_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl JournalStore for SqliteJournalStore {
    async fn append(
        &self,
        run_id: &str,
        account_id: &str,
        attempt: &DestructionAttempt,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attempts (
                run_id, account_id, resource_type, resource_id, region,
                phase, status, reason, error, attempt_number, started_at, ended_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(account_id, resource_type, resource_id, region) DO UPDATE SET
                run_id = excluded.run_id,
                phase = excluded.phase,
                status = excluded.status,
                reason = excluded.reason,
                error = excluded.error,
                attempt_number = excluded.attempt_number,
                started_at = excluded.started_at,
                ended_at = excluded.ended_at
            "#,
        )
        .bind(run_id)
        .bind(account_id)
        .bind(attempt.key.kind.as_str())
        .bind(&attempt.key.resource_id)
        .bind(&attempt.key.region)
        .bind(attempt.phase as i64)
        .bind(attempt.status.as_str())
        .bind(&attempt.reason)
        .bind(&attempt.error)
        .bind(attempt.attempt_number as i64)
        .bind(attempt.started_at.to_rfc3339())
        .bind(attempt.ended_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_prior(&self, account_id: &str) -> Result<Vec<DestructionAttempt>> {
        let rows = sqlx::query(
            "SELECT resource_type, resource_id, region, phase, status, reason, error,
                    attempt_number, started_at, ended_at
             FROM attempts WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let mut attempts = Vec::with_capacity(rows.len());
        for row in rows {
            let kind_str: String = row.get("resource_type");
            let status_str: String = row.get("status");

            // Rows written by a newer schema revision are skipped rather
            // than failing the resume.
            let (Some(kind), Some(status)) = (
                ResourceKind::parse(&kind_str),
                AttemptStatus::parse(&status_str),
            ) else {
                continue;
            };

            let started_at: String = row.get("started_at");
            let ended_at: Option<String> = row.get("ended_at");

            attempts.push(DestructionAttempt {
                key: AttemptKey {
                    kind,
                    resource_id: row.get("resource_id"),
                    region: row.get("region"),
                },
                phase: row.get::<i64, _>("phase") as u8,
                status,
                reason: row.get("reason"),
                error: row.get("error"),
                attempt_number: row.get::<i64, _>("attempt_number") as u32,
                started_at: parse_timestamp(&started_at),
                ended_at: ended_at.as_deref().map(parse_timestamp),
            });
        }

        Ok(attempts)
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
