// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use myansub::app_config::{self, Config};
use myansub::app_controller::Controller;
use myansub::job::JobStatus;
use myansub::subtitle_processor;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the OpenSubtitles catalog for English subtitles
    Search {
        /// Movie title to search for
        query: String,
    },

    /// Download a subtitle and translate it to Burmese in batches
    Translate {
        /// OpenSubtitles file id of the subtitle to download
        #[arg(long)]
        file_id: i64,

        /// Movie title, part of the job identity
        #[arg(long)]
        title: String,

        /// IMDb id, part of the job identity
        #[arg(long)]
        imdb_id: String,

        /// Return after starting the job instead of waiting for it
        #[arg(long)]
        no_wait: bool,
    },

    /// Show the progress of a translation job
    Status {
        /// Job id
        job_id: String,
    },

    /// Cancel a running translation job
    Cancel {
        /// Job id
        job_id: String,
    },

    /// Export a job as an SRT file
    Export {
        /// Job id
        job_id: String,

        /// Output file path; defaults to a name derived from the movie title
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace a job's lines with an edited SRT file
    Edit {
        /// Job id
        job_id: String,

        /// Edited SRT file with Burmese text
        input: PathBuf,
    },

    /// List recent translation jobs
    Jobs {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

/// myansub - Burmese movie subtitle translation
///
/// Searches OpenSubtitles for English movie subtitles and translates them
/// into Burmese with the Gemini API, in resumable background batches.
#[derive(Parser, Debug)]
#[command(name = "myansub")]
#[command(version = "0.3.0")]
#[command(about = "Burmese movie subtitle translation tool")]
#[command(long_about = "myansub downloads English subtitles from OpenSubtitles and translates them to Burmese.

EXAMPLES:
    myansub search \"The Matrix\"                         # Find subtitles for a movie
    myansub translate --file-id 123 --title \"The Matrix\" --imdb-id tt0133093
    myansub status <job-id>                             # Poll a running job
    myansub cancel <job-id>                             # Stop at the next batch boundary
    myansub export <job-id> -o matrix.srt               # Write the (partial) result
    myansub jobs                                        # List recent jobs

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. API keys can also come from the GEMINI_API_KEY
    and OPENSUBTITLES_API_KEY environment variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let mut config = Config::load_or_create(&cli.config_path)
        .with_context(|| format!("Failed to load config: {}", cli.config_path))?;

    // Update log level in config if specified via command line
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    // API keys are only required by the commands that call the respective
    // services; local job commands work against the database alone
    config
        .validate_job()
        .context("Configuration validation failed")?;
    match &cli.command {
        Commands::Search { .. } => config.validate_opensubtitles()?,
        Commands::Translate { .. } => {
            config.validate_opensubtitles()?;
            config.validate_translation()?;
        }
        _ => {}
    }

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Search { query } => run_search(&controller, &query).await,
        Commands::Translate {
            file_id,
            title,
            imdb_id,
            no_wait,
        } => run_translate(&controller, file_id, &title, &imdb_id, no_wait).await,
        Commands::Status { job_id } => run_status(&controller, &job_id).await,
        Commands::Cancel { job_id } => run_cancel(&controller, &job_id).await,
        Commands::Export { job_id, output } => run_export(&controller, &job_id, output).await,
        Commands::Edit { job_id, input } => run_edit(&controller, &job_id, &input).await,
        Commands::Jobs { limit } => run_jobs(&controller, limit).await,
    }
}

async fn run_search(controller: &Controller, query: &str) -> Result<()> {
    let results = controller.search(query).await?;

    if results.is_empty() {
        warn!("No subtitles found for '{}'", query);
        return Ok(());
    }

    println!("{:>10}  {:>10}  TITLE / FILE", "FILE ID", "IMDB");
    for result in &results {
        let title = result
            .attributes
            .feature_details
            .as_ref()
            .and_then(|f| f.title.clone())
            .unwrap_or_else(|| result.attributes.release.clone());
        let imdb = result
            .attributes
            .feature_details
            .as_ref()
            .and_then(|f| f.imdb_id)
            .map(|id| format!("tt{}", id))
            .unwrap_or_else(|| "-".to_string());

        for file in &result.attributes.files {
            println!(
                "{:>10}  {:>10}  {} ({})",
                file.file_id,
                imdb,
                title,
                file.file_name.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}

async fn run_translate(
    controller: &Controller,
    file_id: i64,
    title: &str,
    imdb_id: &str,
    no_wait: bool,
) -> Result<()> {
    let summary = controller.start_translation(file_id, title, imdb_id).await?;

    if summary.cache_hit {
        info!(
            "Already translated: job {} ({} lines)",
            summary.job_id, summary.total_lines
        );
        return Ok(());
    }

    info!(
        "Started job {} ({} lines, {} batches)",
        summary.job_id, summary.total_lines, summary.total_batches
    );

    if no_wait {
        println!("{}", summary.job_id);
        return Ok(());
    }

    // Poll the job record until it reaches a terminal state
    let progress_bar = ProgressBar::new(summary.total_batches as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta})")?
            .progress_chars("#>-"),
    );

    loop {
        let snapshot = controller.status(&summary.job_id).await?;
        progress_bar.set_position(snapshot.completed_batches as u64);

        if snapshot.status.is_terminal() {
            progress_bar.finish_and_clear();
            match snapshot.status {
                JobStatus::Complete => info!("Job {} complete", summary.job_id),
                status => warn!("Job {} ended as {}", summary.job_id, status),
            }
            println!("{}", summary.job_id);
            return Ok(());
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

async fn run_status(controller: &Controller, job_id: &str) -> Result<()> {
    let snapshot = controller.status(job_id).await?;

    println!("Job:      {}", job_id);
    println!("Movie:    {}", snapshot.identity);
    println!("Status:   {}", snapshot.status);
    println!(
        "Progress: {}/{} batches (current: {})",
        snapshot.completed_batches, snapshot.total_batches, snapshot.current_batch
    );

    for batch in &snapshot.batches {
        println!(
            "  batch {:>3}  lines {:>4}-{:<4}  {}",
            batch.index, batch.start_line, batch.end_line, batch.status
        );
    }

    Ok(())
}

async fn run_cancel(controller: &Controller, job_id: &str) -> Result<()> {
    let status = controller.cancel(job_id).await?;
    println!("Job {} is now {}", job_id, status);
    Ok(())
}

async fn run_export(controller: &Controller, job_id: &str, output: Option<PathBuf>) -> Result<()> {
    let (default_name, content) = controller.export(job_id).await?;
    let output = output.unwrap_or_else(|| PathBuf::from(default_name));

    std::fs::write(&output, content)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    info!("Exported job {} to {}", job_id, output.display());
    Ok(())
}

async fn run_edit(controller: &Controller, job_id: &str, input: &PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let edited = subtitle_processor::parse_srt(&content)?;

    // The edited file carries Burmese text in the text position; fold it
    // back into the job's lines as translations, keeping the original
    // English source text
    let mut job = controller.job(job_id).await?;
    if edited.len() != job.lines.len() {
        return Err(anyhow!(
            "Edited file has {} lines but the job has {}",
            edited.len(),
            job.lines.len()
        ));
    }

    for (line, edit) in job.lines.iter_mut().zip(edited) {
        line.translated_text = edit.source_text;
    }

    controller.update_lines(job_id, job.lines).await?;
    info!("Updated lines for job {}", job_id);
    Ok(())
}

async fn run_jobs(controller: &Controller, limit: usize) -> Result<()> {
    let jobs = controller.list_jobs(limit).await?;

    if jobs.is_empty() {
        println!("No jobs yet");
        return Ok(());
    }

    println!(
        "{:<36}  {:<10}  {:>9}  CREATED               TITLE",
        "JOB ID", "STATUS", "BATCHES"
    );
    for job in &jobs {
        println!(
            "{:<36}  {:<10}  {:>4}/{:<4}  {}  {}",
            job.id,
            job.status.to_string(),
            job.completed_batches,
            job.total_batches,
            job.created_at.format("%Y-%m-%d %H:%M:%S"),
            job.identity.movie_title
        );
    }

    Ok(())
}
