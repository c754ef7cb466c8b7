/*!
 * Translation job management.
 *
 * This module contains the batch translation pipeline:
 * - `models`: the persisted job document and its state machines
 * - `planner`: pure batch partitioning
 * - `store`: the persistence seam and its SQLite implementation
 * - `controller`: job lifecycle, the background execution loop, and cancellation
 */

// Re-export main types
pub use controller::JobController;
pub use models::{
    BatchRecord, BatchStatus, JobPatch, JobStatus, StartSummary, StatusSnapshot, SubtitleIdentity,
    TranslationJob,
};
pub use planner::{plan_batches, BatchPlan};
pub use store::{JobStore, SqliteJobStore};

pub mod controller;
pub mod models;
pub mod planner;
pub mod store;
