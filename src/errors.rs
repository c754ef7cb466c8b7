/*!
 * Error types for the myansub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with external APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur during subtitle parsing and serialization
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// No usable entries found in the SRT content
    #[error("No valid subtitle lines found in content")]
    EmptyContent,

    /// A timestamp line could not be understood
    #[error("Invalid timestamp at line {line}: {text}")]
    InvalidTimestamp {
        /// 1-based line number in the raw content
        line: usize,
        /// The offending text
        text: String
    },
}

/// Errors that can occur while managing translation jobs
#[derive(Error, Debug)]
pub enum JobError {
    /// No job exists with the given id
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A mutation was attempted on a job in a terminal state
    #[error("Job {id} is {status} and can no longer change")]
    Terminal {
        /// Job identifier
        id: String,
        /// The terminal status the job is in
        status: String,
    },

    /// A mutation was attempted while the execution loop still owns the job
    #[error("Job {0} is still translating")]
    InFlight(String),

    /// A required request field was missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from an external API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from job management
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
