/*!
 * Database module for persistent storage of translation jobs.
 *
 * This module provides SQLite-based persistence for the job documents
 * that coordinate the background translation loop with status pollers.
 */

// Allow dead code - database types are for library consumers
#![allow(dead_code)]

pub mod schema;
pub mod connection;

// Re-export main types
pub use connection::DatabaseConnection;
