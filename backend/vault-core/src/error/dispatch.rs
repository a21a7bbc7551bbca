use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Errors a caller can receive as the resolution of a submitted task.
///
/// Every submitted task that reaches the caller resolves with either `Ok(())`
/// or one of these variants; nothing is ever thrown across the thread
/// boundary.
#[derive(Debug, ThisError)]
pub enum DispatchError {
    /// Native library or worker thread could not be brought up, or the worker
    /// failed to signal readiness. Fatal to the current submit only; the next
    /// submit retries initialization.
    #[error("Initialization Error: {message} {location}")]
    Initialization {
        message: String,
        location: ErrorLocation,
    },

    /// Worker thread terminated abnormally. Future submits trigger a fresh
    /// restart attempt.
    #[error("Worker Crashed: {message} {location}")]
    WorkerCrashed {
        message: String,
        location: ErrorLocation,
    },

    /// Native call returned a non-zero status; carries the library's own
    /// error message or a fallback encoding the status code.
    #[error("Native Decrypt Error: {message} {location}")]
    NativeDecrypt {
        message: String,
        location: ErrorLocation,
    },

    /// Bridge plumbing failure (actor or reply channel gone). Should not
    /// occur during normal operation.
    #[error("Channel Closed: {message} {location}")]
    ChannelClosed {
        message: String,
        location: ErrorLocation,
    },
}
