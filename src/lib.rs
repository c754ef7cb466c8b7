/*!
 * # myansub - Burmese movie subtitle translation
 *
 * A Rust library for searching English movie subtitles and machine-translating
 * them into Burmese in the background.
 *
 * ## Features
 *
 * - Search and download subtitles from the OpenSubtitles catalog
 * - Batch-translate subtitle lines with the Gemini API
 * - Resumable, pollable background translation jobs with cancellation
 * - Idempotent caching keyed by (movie title, IMDb id)
 * - Edit translated lines and export partially translated jobs as SRT
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing and serialization
 * - `opensubtitles`: Subtitle catalog client
 * - `providers`: Model client implementations:
 *   - `providers::gemini`: Gemini API client
 * - `translation`: The batch translation gateway:
 *   - `translation::gateway`: retry, payload repair, and padding
 * - `job`: Translation job pipeline:
 *   - `job::planner`: batch partitioning
 *   - `job::store`: job persistence
 *   - `job::controller`: lifecycle, execution loop, cancellation
 * - `database`: SQLite connection and schema management
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod job;
pub mod opensubtitles;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use job::{JobController, JobStatus, StatusSnapshot, SubtitleIdentity, TranslationJob};
pub use subtitle_processor::SubtitleLine;
pub use translation::TranslationGateway;
pub use errors::{AppError, JobError, ProviderError, SubtitleError};
