/*!
 * Job document models.
 *
 * These structures map to the persisted job record that coordinates the
 * background execution loop with any number of status pollers.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::subtitle_processor::SubtitleLine;

/// Job status enumeration
///
/// `Processing` is the only non-terminal state. Transitions are monotonic
/// except `Processing -> Cancelled`, which a client triggers directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The execution loop is working through batches
    Processing,
    /// All batches visited; the record is now an immutable cache entry
    Complete,
    /// A client requested cancellation
    Cancelled,
    /// The execution loop hit an unrecoverable error
    Failed,
}

impl JobStatus {
    /// Whether this status permits no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Cancelled => write!(f, "cancelled"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(JobStatus::Processing),
            "complete" => Ok(JobStatus::Complete),
            "cancelled" => Ok(JobStatus::Cancelled),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Status of an individual batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Batch awaiting translation
    Queued,
    /// Batch currently being translated
    Processing,
    /// Batch translated and merged
    Complete,
    /// Batch hit a hard failure; its lines stay untranslated
    Failed,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Queued => write!(f, "queued"),
            BatchStatus::Processing => write!(f, "processing"),
            BatchStatus::Complete => write!(f, "complete"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One planned batch: a contiguous slice of lines translated together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// 0-based batch index
    pub index: usize,

    /// First line offset covered by this batch (0-based, inclusive)
    pub start_line: usize,

    /// One past the last line offset covered (exclusive)
    pub end_line: usize,

    /// Number of lines in this batch
    pub line_count: usize,

    /// Current status; the only field that mutates after planning
    pub status: BatchStatus,
}

/// The (title, catalog id) pair used to detect a previously completed translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleIdentity {
    /// Movie title
    pub movie_title: String,

    /// External catalog identifier, e.g. an IMDb id
    pub imdb_id: String,
}

impl SubtitleIdentity {
    /// Create a new identity
    pub fn new(movie_title: impl Into<String>, imdb_id: impl Into<String>) -> Self {
        Self {
            movie_title: movie_title.into(),
            imdb_id: imdb_id.into(),
        }
    }

    /// Stable cache key for dedupe lookups
    ///
    /// Hashed so the store can index a single opaque column regardless of
    /// what characters the title contains.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.movie_title.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.imdb_id.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Display for SubtitleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.movie_title, self.imdb_id)
    }
}

/// One persisted translation job document
///
/// The single coordination point between the background execution loop
/// (sole writer of progress and content fields) and any number of pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    /// Opaque unique identifier, assigned at creation, immutable
    pub id: String,

    /// Cache/dedupe identity
    pub identity: SubtitleIdentity,

    /// All subtitle lines; length fixed at creation, only
    /// `translated_text` mutates afterwards
    pub lines: Vec<SubtitleLine>,

    /// Overall job status
    pub status: JobStatus,

    /// Total number of planned batches
    pub total_batches: usize,

    /// Number of batches resolved so far (complete or failed); non-decreasing
    pub completed_batches: usize,

    /// The batch presently in flight or about to start
    pub current_batch: usize,

    /// Fixed-length batch plan; only batch statuses mutate
    pub batches: Vec<BatchRecord>,

    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl TranslationJob {
    /// Create a fresh job in `processing` state from a batch plan
    pub fn new(identity: SubtitleIdentity, lines: Vec<SubtitleLine>, batches: Vec<BatchRecord>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            identity,
            lines,
            status: JobStatus::Processing,
            total_batches: batches.len(),
            completed_batches: 0,
            current_batch: 0,
            batches,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to a job record
///
/// Mirrors a document-store patch: only the populated fields change.
/// Built with the chained setters below.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    /// New overall status
    pub status: Option<JobStatus>,

    /// New in-flight batch index
    pub current_batch: Option<usize>,

    /// New resolved-batch count
    pub completed_batches: Option<usize>,

    /// Replacement batch array
    pub batches: Option<Vec<BatchRecord>>,

    /// Replacement line array
    pub lines: Option<Vec<SubtitleLine>>,
}

impl JobPatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall status
    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the in-flight batch index
    pub fn current_batch(mut self, current_batch: usize) -> Self {
        self.current_batch = Some(current_batch);
        self
    }

    /// Set the resolved-batch count
    pub fn completed_batches(mut self, completed_batches: usize) -> Self {
        self.completed_batches = Some(completed_batches);
        self
    }

    /// Replace the batch array
    pub fn batches(mut self, batches: Vec<BatchRecord>) -> Self {
        self.batches = Some(batches);
        self
    }

    /// Replace the line array
    pub fn lines(mut self, lines: Vec<SubtitleLine>) -> Self {
        self.lines = Some(lines);
        self
    }
}

/// What the entry operation hands back to its caller, before any
/// translation work has happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSummary {
    /// Identifier of the job doing (or having done) the work
    pub job_id: String,

    /// Number of planned batches
    pub total_batches: usize,

    /// Number of lines in the job, including any beyond the
    /// auto-translate ceiling
    pub total_lines: usize,

    /// True when an already-complete job was returned instead of
    /// starting new work
    pub cache_hit: bool,
}

/// Read-only progress projection served to pollers
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Overall job status
    pub status: JobStatus,

    /// Total number of planned batches
    pub total_batches: usize,

    /// Number of batches resolved so far
    pub completed_batches: usize,

    /// The batch presently in flight
    pub current_batch: usize,

    /// Per-batch detail
    pub batches: Vec<BatchRecord>,

    /// The identity the job was started for
    pub identity: SubtitleIdentity,
}

impl StatusSnapshot {
    /// Project a job record into its polling view
    pub fn from_job(job: &TranslationJob) -> Self {
        Self {
            status: job.status,
            total_batches: job.total_batches,
            completed_batches: job.completed_batches,
            current_batch: job.current_batch,
            batches: job.batches.clone(),
            identity: job.identity.clone(),
        }
    }
}
