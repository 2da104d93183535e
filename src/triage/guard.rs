//! Mutation guard: per-identifier mutual exclusion for resolve and delete,
//! plus the two-phase delete confirmation.
//!
//! Mutual exclusion by key, not a lock manager: an identifier enters the
//! in-flight set before its call is issued and leaves on completion,
//! success or failure. A second operation on an identifier already in the
//! set is rejected before any network traffic.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::client::ReportsBackend;
use crate::error::{Error, Result};
use crate::types::{DeleteReceipt, ReportId, ResolveReceipt};

use super::reconciler::TriageView;

pub struct MutationGuard<B> {
    backend: Arc<B>,
    view: Arc<Mutex<TriageView>>,
    wake: Arc<Notify>,
    in_flight: Mutex<HashSet<ReportId>>,
    pending_delete: Mutex<Option<ReportId>>,
}

impl<B: ReportsBackend> MutationGuard<B> {
    pub fn new(backend: Arc<B>, view: Arc<Mutex<TriageView>>, wake: Arc<Notify>) -> Self {
        Self {
            backend,
            view,
            wake,
            in_flight: Mutex::new(HashSet::new()),
            pending_delete: Mutex::new(None),
        }
    }

    pub fn is_mutating(&self, id: ReportId) -> bool {
        self.in_flight.lock().contains(&id)
    }

    fn claim(&self, id: ReportId) -> Result<()> {
        if !self.in_flight.lock().insert(id) {
            return Err(Error::MutationInFlight(id));
        }
        Ok(())
    }

    fn release(&self, id: ReportId) {
        self.in_flight.lock().remove(&id);
    }

    /// Marks the shared view stale and wakes the scheduler so the next
    /// read refetches instead of waiting for the timer.
    fn reconcile(&self) {
        self.view.lock().invalidate();
        self.wake.notify_one();
    }

    /// Marks a report resolved. One call per identifier at a time; on
    /// failure the list is left untouched and the backend's reason
    /// propagates.
    pub async fn resolve(&self, id: ReportId) -> Result<ResolveReceipt> {
        self.claim(id)?;
        let result = self.backend.resolve_report(id).await;
        self.release(id);
        match result {
            Ok(receipt) => {
                info!(id, "report resolved");
                self.reconcile();
                Ok(receipt)
            }
            Err(err) => {
                warn!(id, %err, "resolve failed");
                Err(err)
            }
        }
    }

    /// First phase of a delete: records the target. Nothing is sent until
    /// the separate confirmation, so one accidental activation cannot
    /// destroy a record.
    pub fn request_delete(&self, id: ReportId) {
        *self.pending_delete.lock() = Some(id);
    }

    pub fn pending_delete(&self) -> Option<ReportId> {
        *self.pending_delete.lock()
    }

    pub fn cancel_delete(&self) {
        *self.pending_delete.lock() = None;
    }

    /// Second phase: performs the delete for the pending target. The
    /// pending slot is cleared only on success, so a failed confirmation
    /// can be retried.
    pub async fn confirm_delete(&self) -> Result<DeleteReceipt> {
        let pending = *self.pending_delete.lock();
        let id = pending.ok_or(Error::NoPendingDelete)?;
        self.claim(id)?;
        let result = self.backend.delete_report(id).await;
        self.release(id);
        match result {
            Ok(receipt) => {
                *self.pending_delete.lock() = None;
                info!(id, "report deleted");
                self.reconcile();
                Ok(receipt)
            }
            Err(err) => {
                warn!(id, %err, "delete failed");
                Err(err)
            }
        }
    }
}
