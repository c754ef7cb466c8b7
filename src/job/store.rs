/*!
 * Job persistence.
 *
 * The `JobStore` trait is the seam between the pipeline and its document
 * store; `SqliteJobStore` is the bundled implementation. All writes that
 * the execution loop performs go through `patch`, which refuses to touch
 * a job that has already reached a terminal state.
 */

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::database::DatabaseConnection;
use crate::errors::JobError;
use crate::subtitle_processor::SubtitleLine;

use super::models::{JobPatch, JobStatus, SubtitleIdentity, TranslationJob};

/// Persistence seam for translation jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a freshly created job record
    async fn create(&self, job: &TranslationJob) -> Result<()>;

    /// Fetch a job by id
    async fn get(&self, id: &str) -> Result<Option<TranslationJob>>;

    /// Fetch the latest job for an identity, if any
    async fn find_by_identity(&self, identity: &SubtitleIdentity) -> Result<Option<TranslationJob>>;

    /// Apply a partial update to a job
    ///
    /// A patch aimed at a terminal job is dropped silently; terminal
    /// records are immutable.
    async fn patch(&self, id: &str, patch: JobPatch) -> Result<()>;

    /// Replace a job's line set (manual editing)
    ///
    /// Allowed on any job that is not currently being translated.
    async fn update_lines(&self, id: &str, lines: Vec<SubtitleLine>) -> Result<()>;

    /// Delete a job record
    async fn delete(&self, id: &str) -> Result<()>;

    /// List the most recently created jobs
    async fn list_recent(&self, limit: usize) -> Result<Vec<TranslationJob>>;
}

/// SQLite-backed job store
#[derive(Clone)]
pub struct SqliteJobStore {
    /// Database connection
    db: DatabaseConnection,
}

impl SqliteJobStore {
    /// Open a store at the given database path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(DatabaseConnection::new(path)?)
    }

    /// Open a store at the default database location
    pub fn open_default() -> Result<Self> {
        Self::from_connection(DatabaseConnection::new_default()?)
    }

    /// Create a store backed by an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Self::from_connection(DatabaseConnection::new_in_memory()?)
    }

    /// Wrap an existing connection, reconciling any jobs orphaned by a
    /// previous process
    pub fn from_connection(db: DatabaseConnection) -> Result<Self> {
        let store = Self { db };
        store.reconcile_orphans()?;
        Ok(store)
    }

    /// Mark jobs left in `processing` by a dead process as failed
    ///
    /// Runs before the store serves requests, so it cannot race a live
    /// execution loop: any loop that owned these rows died with the
    /// previous process.
    fn reconcile_orphans(&self) -> Result<()> {
        self.db.execute(|conn| {
            let reconciled = conn.execute(
                "UPDATE jobs SET status = 'failed', updated_at = ?1 WHERE status = 'processing'",
                params![Utc::now().to_rfc3339()],
            )?;

            if reconciled > 0 {
                warn!(
                    "Marked {} orphaned processing job(s) as failed on startup",
                    reconciled
                );
            }

            Ok(())
        })
    }

    /// Read a job row by id (synchronous, usable inside transactions)
    fn get_job_sync(conn: &Connection, id: &str) -> Result<Option<TranslationJob>> {
        let result = conn
            .query_row(
                r#"
                SELECT id, movie_title, imdb_id, status, total_batches,
                       completed_batches, current_batch, lines, batches,
                       created_at, updated_at
                FROM jobs WHERE id = ?1
                "#,
                [id],
                Self::map_job_row,
            )
            .optional()?;

        Ok(result)
    }

    /// Map a jobs row to a `TranslationJob`
    ///
    /// Records predating progress tracking get defensive defaults: a
    /// missing or unknown status reads as `complete`, counters as zero,
    /// arrays as empty.
    fn map_job_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranslationJob> {
        let lines_json: String = row.get(7)?;
        let batches_json: String = row.get(8)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;

        Ok(TranslationJob {
            id: row.get(0)?,
            identity: SubtitleIdentity {
                movie_title: row.get(1)?,
                imdb_id: row.get(2)?,
            },
            status: row
                .get::<_, String>(3)?
                .parse()
                .unwrap_or(JobStatus::Complete),
            total_batches: row.get::<_, i64>(4).unwrap_or(0) as usize,
            completed_batches: row.get::<_, i64>(5).unwrap_or(0) as usize,
            current_batch: row.get::<_, i64>(6).unwrap_or(0) as usize,
            lines: serde_json::from_str(&lines_json).unwrap_or_default(),
            batches: serde_json::from_str(&batches_json).unwrap_or_default(),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

/// Parse a stored RFC 3339 timestamp, tolerating legacy junk
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create(&self, job: &TranslationJob) -> Result<()> {
        let job = job.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO jobs (
                        id, identity_key, movie_title, imdb_id, status,
                        total_batches, completed_batches, current_batch,
                        lines, batches, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    "#,
                    params![
                        job.id,
                        job.identity.cache_key(),
                        job.identity.movie_title,
                        job.identity.imdb_id,
                        job.status.to_string(),
                        job.total_batches as i64,
                        job.completed_batches as i64,
                        job.current_batch as i64,
                        serde_json::to_string(&job.lines)?,
                        serde_json::to_string(&job.batches)?,
                        job.created_at.to_rfc3339(),
                        job.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<TranslationJob>> {
        let id = id.to_string();

        self.db
            .execute_async(move |conn| Self::get_job_sync(conn, &id))
            .await
    }

    async fn find_by_identity(&self, identity: &SubtitleIdentity) -> Result<Option<TranslationJob>> {
        let identity_key = identity.cache_key();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        r#"
                        SELECT id, movie_title, imdb_id, status, total_batches,
                               completed_batches, current_batch, lines, batches,
                               created_at, updated_at
                        FROM jobs WHERE identity_key = ?1
                        ORDER BY created_at DESC LIMIT 1
                        "#,
                        [identity_key],
                        Self::map_job_row,
                    )
                    .optional()?;

                Ok(result)
            })
            .await
    }

    async fn patch(&self, id: &str, patch: JobPatch) -> Result<()> {
        let id = id.to_string();

        self.db
            .transaction_async(move |tx| {
                let Some(mut job) = Self::get_job_sync(tx, &id)? else {
                    // The record was discarded under the loop; nothing to do
                    debug!("Patch for missing job {} dropped", id);
                    return Ok(());
                };

                if job.status.is_terminal() {
                    debug!("Patch for terminal job {} ({}) dropped", id, job.status);
                    return Ok(());
                }

                if let Some(status) = patch.status {
                    job.status = status;
                }
                if let Some(current_batch) = patch.current_batch {
                    job.current_batch = current_batch;
                }
                if let Some(completed_batches) = patch.completed_batches {
                    job.completed_batches = completed_batches;
                }
                if let Some(batches) = patch.batches {
                    job.batches = batches;
                }
                if let Some(lines) = patch.lines {
                    job.lines = lines;
                }

                tx.execute(
                    r#"
                    UPDATE jobs
                    SET status = ?2, total_batches = ?3, completed_batches = ?4,
                        current_batch = ?5, lines = ?6, batches = ?7, updated_at = ?8
                    WHERE id = ?1
                    "#,
                    params![
                        id,
                        job.status.to_string(),
                        job.total_batches as i64,
                        job.completed_batches as i64,
                        job.current_batch as i64,
                        serde_json::to_string(&job.lines)?,
                        serde_json::to_string(&job.batches)?,
                        Utc::now().to_rfc3339(),
                    ],
                )?;

                Ok(())
            })
            .await
    }

    async fn update_lines(&self, id: &str, lines: Vec<SubtitleLine>) -> Result<()> {
        let id = id.to_string();

        self.db
            .transaction_async(move |tx| {
                let Some(job) = Self::get_job_sync(tx, &id)? else {
                    return Err(JobError::NotFound(id).into());
                };

                if job.status == JobStatus::Processing {
                    return Err(JobError::InFlight(id).into());
                }

                tx.execute(
                    "UPDATE jobs SET lines = ?2, updated_at = ?3 WHERE id = ?1",
                    params![
                        id,
                        serde_json::to_string(&lines)?,
                        Utc::now().to_rfc3339(),
                    ],
                )?;

                Ok(())
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM jobs WHERE id = ?1", [&id])?;
                if deleted > 0 {
                    info!("Deleted job {}", id);
                }
                Ok(())
            })
            .await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<TranslationJob>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, movie_title, imdb_id, status, total_batches,
                           completed_batches, current_batch, lines, batches,
                           created_at, updated_at
                    FROM jobs ORDER BY created_at DESC LIMIT ?1
                    "#,
                )?;

                let jobs = stmt
                    .query_map([limit as i64], Self::map_job_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(jobs)
            })
            .await
    }
}
