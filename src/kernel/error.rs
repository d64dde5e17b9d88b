//! Kernel dispatch errors.

use std::fmt;

use thiserror::Error;

use crate::promise::CodecError;

/// Dispatch phase in which a deadline expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Asking candidates whether they will handle the request.
    Negotiating,
    /// Calling `handle` on modules that promised.
    Committing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Negotiating => f.write_str("negotiating"),
            Phase::Committing => f.write_str("committing"),
        }
    }
}

/// Errors returned to a dispatch caller.
///
/// Module failures never surface here: a failed `accept` is a decline and a
/// failed `handle` is a broken promise. Only exhaustion of every candidate
/// becomes [`KernelError::NoHandler`].
#[derive(Debug, Error)]
pub enum KernelError {
    /// The raw request could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// No candidate accepted, or every module that accepted failed.
    #[error("No module could handle the request (path: {path:?})")]
    NoHandler { path: String },

    /// The caller's deadline expired before a module produced a result.
    #[error("Dispatch deadline exceeded while {phase}")]
    Timeout { phase: Phase },
}
