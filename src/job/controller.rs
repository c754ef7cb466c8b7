/*!
 * Job controller: the batch translation state machine.
 *
 * Orchestrates dedupe lookup, job creation, the detached execution loop,
 * per-batch status transitions, cancellation, and terminal resolution.
 * The persisted job record is the only channel between the loop and any
 * number of status pollers; the caller of `start_or_resume` gets a job id
 * back immediately and everything translation-related happens after that.
 */

use anyhow::Result;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::JobError;
use crate::subtitle_processor::SubtitleLine;
use crate::translation::BatchTranslator;

use super::models::{
    BatchStatus, JobPatch, JobStatus, StartSummary, StatusSnapshot, SubtitleIdentity,
    TranslationJob,
};
use super::planner::plan_batches;
use super::store::JobStore;

/// How the execution loop ended
enum LoopOutcome {
    /// All batches were visited
    Finished,
    /// The job was cancelled or its record disappeared mid-flight
    Halted,
}

/// Controller for translation job lifecycle
pub struct JobController {
    /// Job persistence
    store: Arc<dyn JobStore>,

    /// Batch translation gateway
    translator: Arc<dyn BatchTranslator>,

    /// Lines per batch
    batch_size: usize,

    /// Ceiling on automatically translated lines
    max_auto_translate: usize,

    /// Ids of jobs with a live execution loop in this process.
    /// One loop per job id at a time; this is what upholds the
    /// single-writer invariant on content fields.
    active: Arc<Mutex<HashSet<String>>>,
}

impl JobController {
    /// Create a new controller
    pub fn new(
        store: Arc<dyn JobStore>,
        translator: Arc<dyn BatchTranslator>,
        batch_size: usize,
        max_auto_translate: usize,
    ) -> Self {
        Self {
            store,
            translator,
            batch_size,
            max_auto_translate,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Start translation for an identity, or return the finished job
    ///
    /// The only synchronous work here is the cache lookup, planning, and
    /// the initial record write. The returned summary is available before
    /// any translation has happened; progress arrives via `status`.
    pub async fn start_or_resume(
        &self,
        identity: SubtitleIdentity,
        source_lines: Vec<SubtitleLine>,
    ) -> Result<StartSummary> {
        if identity.movie_title.trim().is_empty() {
            return Err(JobError::MissingField("movie_title").into());
        }
        if identity.imdb_id.trim().is_empty() {
            return Err(JobError::MissingField("imdb_id").into());
        }

        // Cache check: a complete job for this identity is reused as-is
        if let Some(summary) = self.find_cached(&identity).await? {
            return Ok(summary);
        }

        if let Some(existing) = self.store.find_by_identity(&identity).await? {

            // A stale incomplete attempt is discarded, not resumed. If its
            // loop is somehow still alive it will see the missing record at
            // the next batch boundary and halt.
            warn!(
                "Discarding stale {} job {} for {}",
                existing.status, existing.id, identity
            );
            self.store.delete(&existing.id).await?;
        }

        let plan = plan_batches(source_lines.len(), self.batch_size, self.max_auto_translate);
        let job = TranslationJob::new(identity.clone(), source_lines, plan.batches);

        let summary = StartSummary {
            job_id: job.id.clone(),
            total_batches: job.total_batches,
            total_lines: job.lines.len(),
            cache_hit: false,
        };

        self.store.create(&job).await?;

        info!(
            "Created job {} for {} ({} lines, {} batches)",
            job.id,
            identity,
            job.lines.len(),
            job.total_batches
        );

        self.spawn_execution_loop(job);

        Ok(summary)
    }

    /// Look up an already-complete job for an identity
    ///
    /// Lets callers skip expensive preparation (like re-downloading the
    /// subtitle file) when the work was already done.
    pub async fn find_cached(&self, identity: &SubtitleIdentity) -> Result<Option<StartSummary>> {
        let Some(existing) = self.store.find_by_identity(identity).await? else {
            return Ok(None);
        };

        if existing.status != JobStatus::Complete {
            return Ok(None);
        }

        info!("Cache hit for {}, job {}", identity, existing.id);
        Ok(Some(StartSummary {
            job_id: existing.id,
            total_batches: existing.total_batches,
            total_lines: existing.lines.len(),
            cache_hit: true,
        }))
    }

    /// List recently created jobs
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<TranslationJob>> {
        self.store.list_recent(limit).await
    }

    /// Launch the detached execution loop for a freshly created job
    fn spawn_execution_loop(&self, job: TranslationJob) {
        self.active.lock().insert(job.id.clone());

        let store = self.store.clone();
        let translator = self.translator.clone();
        let active = self.active.clone();

        tokio::spawn(async move {
            let job_id = job.id.clone();

            match Self::run_batches(&*store, &*translator, &job).await {
                Ok(LoopOutcome::Finished) => {
                    // The patch guard keeps this from overwriting a
                    // cancellation that landed during the last batch
                    if let Err(e) = store
                        .patch(&job_id, JobPatch::new().status(JobStatus::Complete))
                        .await
                    {
                        error!("Failed to mark job {} complete: {}", job_id, e);
                    } else {
                        info!("Job {} complete", job_id);
                    }
                }
                Ok(LoopOutcome::Halted) => {
                    info!("Job {} halted before completion", job_id);
                }
                Err(e) => {
                    error!("Job {} failed: {}", job_id, e);
                    // Best effort: a failed terminal write leaves the job
                    // processing until the startup sweep reconciles it
                    let _ = store
                        .patch(&job_id, JobPatch::new().status(JobStatus::Failed))
                        .await;
                }
            }

            active.lock().remove(&job_id);
        });
    }

    /// The per-job execution loop body
    ///
    /// Visits batches in strict order. A single batch's hard failure does
    /// not abort the job; its lines simply stay untranslated. Errors that
    /// escape this function mark the whole job failed.
    async fn run_batches(
        store: &dyn JobStore,
        translator: &dyn BatchTranslator,
        job: &TranslationJob,
    ) -> Result<LoopOutcome> {
        for batch_index in 0..job.total_batches {
            // Re-read the record: cancellation and stale-discard both
            // surface here, at the batch boundary
            let Some(mut current) = store.get(&job.id).await? else {
                debug!("Job {} record disappeared, stopping", job.id);
                return Ok(LoopOutcome::Halted);
            };

            if current.status == JobStatus::Cancelled {
                debug!("Job {} cancelled, stopping before batch {}", job.id, batch_index);
                return Ok(LoopOutcome::Halted);
            }

            let batch = current.batches[batch_index].clone();

            current.batches[batch_index].status = BatchStatus::Processing;
            store
                .patch(
                    &job.id,
                    JobPatch::new()
                        .current_batch(batch_index)
                        .batches(current.batches.clone()),
                )
                .await?;

            let texts: Vec<String> = current.lines[batch.start_line..batch.end_line]
                .iter()
                .map(|line| line.source_text.clone())
                .collect();

            debug!(
                "Job {} translating batch {}/{} ({} lines)",
                job.id,
                batch_index + 1,
                job.total_batches,
                texts.len()
            );

            match translator.translate_batch(&texts).await {
                Ok(translations) => {
                    for (offset, translated) in translations.into_iter().enumerate() {
                        if let Some(line) = current.lines.get_mut(batch.start_line + offset) {
                            line.translated_text = translated;
                        }
                    }

                    current.batches[batch_index].status = BatchStatus::Complete;
                    store
                        .patch(
                            &job.id,
                            JobPatch::new()
                                .lines(current.lines)
                                .completed_batches(batch_index + 1)
                                .batches(current.batches),
                        )
                        .await?;
                }
                Err(e) => {
                    warn!(
                        "Job {} batch {} failed, continuing with next batch: {}",
                        job.id, batch_index, e
                    );

                    current.batches[batch_index].status = BatchStatus::Failed;
                    store
                        .patch(
                            &job.id,
                            JobPatch::new()
                                .completed_batches(batch_index + 1)
                                .batches(current.batches),
                        )
                        .await?;
                }
            }
        }

        Ok(LoopOutcome::Finished)
    }

    /// Cancel a job
    ///
    /// Flips the persisted status; the execution loop notices at its next
    /// batch boundary, so at most one more batch of translation work runs
    /// after this returns. Cancelling an already-terminal job is a no-op.
    pub async fn cancel(&self, job_id: &str) -> Result<JobStatus> {
        let Some(job) = self.store.get(job_id).await? else {
            return Err(JobError::NotFound(job_id.to_string()).into());
        };

        if job.status != JobStatus::Processing {
            debug!("Cancel of job {} ignored, already {}", job_id, job.status);
            return Ok(job.status);
        }

        self.store
            .patch(job_id, JobPatch::new().status(JobStatus::Cancelled))
            .await?;

        info!("Job {} cancelled", job_id);
        Ok(JobStatus::Cancelled)
    }

    /// Read-only progress snapshot for pollers
    pub async fn status(&self, job_id: &str) -> Result<StatusSnapshot> {
        let Some(job) = self.store.get(job_id).await? else {
            return Err(JobError::NotFound(job_id.to_string()).into());
        };

        Ok(StatusSnapshot::from_job(&job))
    }

    /// Fetch the full job record
    pub async fn job(&self, job_id: &str) -> Result<TranslationJob> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| JobError::NotFound(job_id.to_string()).into())
    }

    /// Replace a job's lines after manual editing
    pub async fn update_lines(&self, job_id: &str, lines: Vec<SubtitleLine>) -> Result<()> {
        self.store.update_lines(job_id, lines).await
    }

    /// Whether a job's execution loop is live in this process
    pub fn is_active(&self, job_id: &str) -> bool {
        self.active.lock().contains(job_id)
    }
}
