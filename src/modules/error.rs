//! Module errors.

use thiserror::Error;

use crate::store::StoreError;

/// Errors a module can report from `accept` or `handle`.
///
/// None of these abort a dispatch: an `accept` error counts as a decline,
/// a `handle` error is a broken promise and the kernel moves on to the next
/// candidate.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// `accept` could not evaluate the request.
    #[error("Accept failed: {0}")]
    Accept(String),

    /// `handle` failed after the module accepted.
    #[error("Handle failed: {0}")]
    HandleFailed(String),

    /// Positional arguments are missing or of the wrong shape.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Nothing cached under the derived key. Expected decline behavior, not
    /// a system fault.
    #[error("Cache miss: {0}")]
    CacheMiss(String),

    /// Byte store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
