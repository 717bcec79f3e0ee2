/*!
 * Error types for the doctrans engine.
 *
 * This module contains custom error types for different parts of the engine,
 * using the thiserror crate for ergonomic error definitions. Per-unit and
 * per-container failures are recovered locally by the orchestrator; only the
 * variants on `JobError` abort a whole job.
 */

use thiserror::Error;

/// Errors raised by the translation backend client
#[derive(Error, Debug)]
pub enum BackendError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails, even after a repair round-trip
    #[error("Failed to parse backend response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection (transient class)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// All retry attempts for one request were used up
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made, including the first
        attempts: u32,
        /// Message of the last failure
        last_error: String,
    },
}

impl BackendError {
    /// Whether this error is a transient network failure worth a diagnostic probe
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}

/// Errors raised at the document-model boundary
#[derive(Error, Debug)]
pub enum DocumentError {
    /// A container could not be read; the orchestrator skips it
    #[error("Container {0} is unreadable")]
    ContainerUnreadable(usize),

    /// A unit location no longer resolves inside the document
    #[error("Unit location out of range: {0}")]
    LocationOutOfRange(String),

    /// The document file could not be opened or parsed
    #[error("Failed to open document {path}: {reason}")]
    OpenFailed {
        /// Path of the document file
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// A write into the document failed
    #[error("Write failed at {location}: {reason}")]
    WriteFailed {
        /// Formatted unit location
        location: String,
        /// Underlying reason
        reason: String,
    },
}

/// Errors raised by the batch encoder
#[derive(Error, Debug)]
pub enum EncodingError {
    /// The container produced no translatable units; callers treat this as a no-op
    #[error("Container {0} has no translatable units")]
    NoTranslatableUnits(usize),
}

/// Errors raised by the external renderer resource
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer binary is missing or failed its health check
    #[error("Renderer unavailable: {0}")]
    Unavailable(String),

    /// The render invocation exceeded its timeout
    #[error("Render timed out after {0}s")]
    Timeout(u64),

    /// The renderer exited with a non-zero status
    #[error("Renderer exited with status {0}")]
    ExitStatus(i32),
}

/// Job-level errors; all of these are terminal for the job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The input document could not be opened at all
    #[error("Document unreadable: {0}")]
    DocumentUnreadable(String),

    /// The backend was unreachable for every container in the job
    #[error("Backend unreachable for all {0} containers")]
    BackendUnreachable(usize),

    /// The job was cancelled between containers
    #[error("Job cancelled after {completed} of {total} containers")]
    Cancelled {
        /// Containers fully applied before cancellation
        completed: usize,
        /// Total containers in the job
        total: usize,
    },

    /// The admission gate was closed before a permit was granted
    #[error("Admission gate closed")]
    AdmissionClosed,
}

impl From<std::io::Error> for JobError {
    fn from(error: std::io::Error) -> Self {
        Self::DocumentUnreadable(error.to_string())
    }
}
