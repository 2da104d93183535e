//! Anonymous incident reporting core.
//!
//! Two pipelines share one report identifier space. On the submission side,
//! evidence files pass an admission filter, get their embedded metadata
//! scrubbed by re-encode, and leave the device exactly once as a multipart
//! submission whose stored content can later be re-verified against the
//! hash anchored at creation time. On the operator side, a triage view
//! reconciles a periodically repolled collection with filters, pagination,
//! and guarded resolve/delete mutations.

// Boundary to the reporting backend
pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Shared hashing helpers
pub mod hash_utils;

// Submission side: admission → scrubbing → assembly, then verification
pub mod sanitize;
pub mod submit;
pub mod verify;

// Operator side: polled reconciliation and guarded mutations
pub mod triage;

// Re-exports for crate consumers
pub use client::{ApiClient, ReportsBackend};
pub use config::{AdmissionLimits, ClientConfig, ScrubLimits, TriageConfig};
pub use error::{AdmissionError, Error, Result, TransmissionError, ValidationError};
pub use sanitize::{
    admit_files, scrub_all, scrub_file, Admission, CandidateFile, RejectedFile, SanitizedFile,
    ScrubOutcome, ScrubWarning,
};
pub use submit::{submit_draft, validate_draft};
pub use triage::{
    MutationGuard, PollScheduler, StatusFilter, TriageFilters, TriageReconciler, TriageStats,
    TriageView, ViewState,
};
pub use types::{
    ReportDetail, ReportDraft, ReportId, ReportRecord, Severity, VerifyResponse, Zone, ZONE_OTHER,
};
pub use verify::{verify_report, VerificationOutcome};
