//! Operator triage: polled list reconciliation, poll scheduling, and
//! guarded mutations.
//!
//! The triage view is the single piece of mutable shared state in the core.
//! It is owned by the reconciler and written only by poll completion and by
//! caller-initiated filter/page changes; the mutation guard touches it only
//! to mark it stale after a successful resolve or delete.

pub mod guard;
pub mod reconciler;
pub mod scheduler;

pub use guard::MutationGuard;
pub use reconciler::{
    PollTicket, StatusFilter, TriageFilters, TriageReconciler, TriageStats, TriageView, ViewState,
};
pub use scheduler::PollScheduler;
