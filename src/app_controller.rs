use anyhow::{anyhow, Result};
use log::info;
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::JobError;
use crate::job::{
    JobController, JobStore, SqliteJobStore, StartSummary, StatusSnapshot, SubtitleIdentity,
    TranslationJob,
};
use crate::opensubtitles::{OpenSubtitles, SubtitleSearchResult};
use crate::providers::gemini::Gemini;
use crate::subtitle_processor::{self, SubtitleLine};
use crate::translation::{BatchTranslator, TranslationGateway};

// @module: Application controller wiring search, translation jobs, and export

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Subtitle catalog client
    catalog: OpenSubtitles,

    // @field: Translation job controller
    jobs: JobController,
}

impl Controller {
    // @method: Create a controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let store: Arc<dyn JobStore> = match &config.job.database_path {
            Some(path) => Arc::new(SqliteJobStore::open(path)?),
            None => Arc::new(SqliteJobStore::open_default()?),
        };

        let gemini = Arc::new(Gemini::new(&config.translation));
        let gateway = Arc::new(TranslationGateway::new(gemini, &config.translation));

        Ok(Self::with_collaborators(config, store, gateway))
    }

    /// Create a controller over explicit collaborators (used by tests to
    /// substitute an in-memory store and a mock translator)
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn JobStore>,
        translator: Arc<dyn BatchTranslator>,
    ) -> Self {
        let catalog = OpenSubtitles::new(&config.opensubtitles);
        let jobs = JobController::new(
            store,
            translator,
            config.job.batch_size,
            config.job.max_auto_translate,
        );

        Self {
            config,
            catalog,
            jobs,
        }
    }

    /// Access the job controller directly
    pub fn jobs(&self) -> &JobController {
        &self.jobs
    }

    /// Search the subtitle catalog
    pub async fn search(&self, query: &str) -> Result<Vec<SubtitleSearchResult>> {
        if query.trim().is_empty() {
            return Err(anyhow!("Missing search query"));
        }

        Ok(self.catalog.search(query).await?)
    }

    /// Start (or reuse) a translation for a catalog file
    ///
    /// Validates input, checks the cache before spending a download, then
    /// fetches and parses the subtitle and hands it to the job controller.
    /// Returns as soon as the job record exists; translation continues in
    /// the background.
    pub async fn start_translation(
        &self,
        file_id: i64,
        movie_title: &str,
        imdb_id: &str,
    ) -> Result<StartSummary> {
        if movie_title.trim().is_empty() {
            return Err(JobError::MissingField("movie_title").into());
        }
        if imdb_id.trim().is_empty() {
            return Err(JobError::MissingField("imdb_id").into());
        }

        let identity = SubtitleIdentity::new(movie_title, imdb_id);

        // A finished job makes the download unnecessary
        if let Some(summary) = self.jobs.find_cached(&identity).await? {
            return Ok(summary);
        }

        info!("Downloading subtitle file {} for {}", file_id, identity);

        let raw_content = self.catalog.download(file_id).await?;
        let lines = subtitle_processor::parse_srt(&raw_content)?;

        self.jobs.start_or_resume(identity, lines).await
    }

    /// Poll a job's progress
    pub async fn status(&self, job_id: &str) -> Result<StatusSnapshot> {
        self.jobs.status(job_id).await
    }

    /// Cancel a running job
    pub async fn cancel(&self, job_id: &str) -> Result<crate::job::JobStatus> {
        self.jobs.cancel(job_id).await
    }

    /// Fetch a job with its full line set
    pub async fn job(&self, job_id: &str) -> Result<TranslationJob> {
        self.jobs.job(job_id).await
    }

    /// Replace a job's lines after manual editing
    pub async fn update_lines(&self, job_id: &str, lines: Vec<SubtitleLine>) -> Result<()> {
        self.jobs.update_lines(job_id, lines).await
    }

    /// Export a job as an SRT file body plus a download filename
    ///
    /// Works on any job, translated or not; untranslated lines fall back
    /// to their source text.
    pub async fn export(&self, job_id: &str) -> Result<(String, String)> {
        let job = self.jobs.job(job_id).await?;
        let filename = subtitle_processor::export_filename(&job.identity.movie_title);
        let content = subtitle_processor::serialize_srt(&job.lines);
        Ok((filename, content))
    }

    /// List recently created jobs
    pub async fn list_jobs(&self, limit: usize) -> Result<Vec<TranslationJob>> {
        self.jobs.list_recent(limit).await
    }

    /// The loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
