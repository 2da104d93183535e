//! Error types for the reporting core.
//!
//! The taxonomy mirrors how failures behave, not where they occur:
//! admission and validation problems are caught before anything leaves the
//! device, transmission problems carry the backend's reason when it gave
//! one, and the mutation-guard variants are local refusals that never turn
//! into a network call. Scrubber failures are deliberately *not* here:
//! they fall back to the original file and surface as warnings instead.

use std::result::Result as StdResult;

use thiserror::Error;

use crate::types::ReportId;

/// Custom result type for reporting-core operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type for reporting-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("admission error: {0}")]
    Admission(#[from] AdmissionError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("transmission error: {0}")]
    Transmission(#[from] TransmissionError),

    #[error("a mutation for report {0} is already in flight")]
    MutationInFlight(ReportId),

    #[error("no delete is pending confirmation")]
    NoPendingDelete,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transmission(TransmissionError::Network(err))
    }
}

/// Per-file rejection reasons from the admission filter. Reported to the
/// caller alongside the accepted files, never silently dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("'{name}' is {size} bytes, over the {limit} byte per-file limit")]
    Oversize { name: String, size: u64, limit: u64 },

    #[error("'{name}' rejected: at most {limit} attachments per report")]
    LimitExceeded { name: String, limit: usize },
}

/// Draft invariant violations. These block submission locally; a draft that
/// fails validation is never transmitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("description must not be empty")]
    EmptyDescription,

    #[error("the \"other\" zone requires a custom zone label")]
    MissingCustomZone,

    #[error("at most {limit} attachments per report, draft has {count}")]
    TooManyAttachments { count: usize, limit: usize },

    #[error("attachment '{name}' is {size} bytes, over the {limit} byte limit")]
    OversizeAttachment { name: String, size: u64, limit: u64 },
}

/// Failures at the backend boundary: network trouble, a non-success
/// envelope, or a response the client could not make sense of.
#[derive(Error, Debug)]
pub enum TransmissionError {
    /// The backend rejected the call; the payload is its reported reason,
    /// passed through verbatim when available.
    #[error("{0}")]
    Backend(String),

    /// 401-class response. Treated as an ordinary terminal failure here;
    /// the re-authentication flow lives outside this core.
    #[error("authentication required")]
    Unauthorized,

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}
