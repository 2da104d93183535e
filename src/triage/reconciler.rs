//! Reconciliation of the polled report collection with the operator's
//! filtered, paginated view.
//!
//! [`TriageView`] is a plain state machine (`Loading → Ready ⇄ Refreshing`)
//! driven by `begin_poll`/`complete_poll` pairs, so every transition can
//! be exercised deterministically without a runtime. [`TriageReconciler`]
//! is the thin async driver that glues a poll cycle to the backend.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::client::ReportsBackend;
use crate::config::TriageConfig;
use crate::error::Error;
use crate::types::{ReportRecord, Severity};

/// Lifecycle of the collection view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// No data has ever arrived.
    Loading,
    /// Data present, nothing in flight.
    Ready,
    /// A poll is in flight while prior data stays visible.
    Refreshing,
}

/// Resolution-state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Unresolved,
    Resolved,
}

/// The operator's current filter set. Applied in order: status, severity,
/// category, free-text query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriageFilters {
    pub status: StatusFilter,
    pub severity: Option<Severity>,
    pub category: Option<String>,
    pub query: String,
}

impl TriageFilters {
    fn matches(&self, report: &ReportRecord) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Unresolved => !report.is_resolved(),
            StatusFilter::Resolved => report.is_resolved(),
        };
        if !status_ok {
            return false;
        }
        if let Some(severity) = self.severity {
            if report.severity != severity {
                return false;
            }
        }
        if let Some(category) = self.category.as_deref() {
            if report.category != category {
                return false;
            }
        }
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        report.id.to_string().contains(&query)
            || report.zone.to_lowercase().contains(&query)
            || report
                .custom_zone
                .as_deref()
                .map_or(false, |zone| zone.to_lowercase().contains(&query))
            || report.anonymized_content.to_lowercase().contains(&query)
            || report.category.to_lowercase().contains(&query)
    }
}

/// Counts recomputed from the unfiltered collection on every successful
/// poll, never from the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriageStats {
    pub total: usize,
    pub unresolved: usize,
    pub resolved: usize,
    pub high: usize,
    pub critical: usize,
}

/// Claim on the single in-flight poll slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    seq: u64,
}

/// The triage collection view. Single-writer: poll completions and
/// caller-initiated filter/page changes.
#[derive(Debug)]
pub struct TriageView {
    state: ViewState,
    reports: Vec<ReportRecord>,
    filters: TriageFilters,
    page: usize,
    page_size: usize,
    next_seq: u64,
    applied_seq: u64,
    in_flight: Option<u64>,
    stale: bool,
    last_error: Option<String>,
}

impl TriageView {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: ViewState::Loading,
            reports: Vec::new(),
            filters: TriageFilters::default(),
            page: 1,
            page_size: page_size.max(1),
            next_seq: 1,
            applied_seq: 0,
            in_flight: None,
            stale: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn filters(&self) -> &TriageFilters {
        &self.filters
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True after a mutation invalidated the collection and before the next
    /// successful poll landed.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Claims the poll slot. Returns `None` when a poll is already in
    /// flight: ticks are skipped, never queued, and retried at the next one.
    pub fn begin_poll(&mut self) -> Option<PollTicket> {
        if self.in_flight.is_some() {
            debug!("poll already in flight, tick skipped");
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);
        if self.state == ViewState::Ready {
            self.state = ViewState::Refreshing;
        }
        Some(PollTicket { seq })
    }

    /// Applies a finished poll. A response older than the newest applied
    /// one is discarded; the last successful poll wins for display. A
    /// failure keeps the previous data visible: stale-but-available beats
    /// empty.
    pub fn complete_poll(
        &mut self,
        ticket: PollTicket,
        result: Result<Vec<ReportRecord>, Error>,
    ) {
        if self.in_flight == Some(ticket.seq) {
            self.in_flight = None;
        }
        if ticket.seq <= self.applied_seq {
            debug!(seq = ticket.seq, "discarding superseded poll response");
            return;
        }
        match result {
            Ok(reports) => {
                debug!(count = reports.len(), "poll applied");
                self.reports = reports;
                self.applied_seq = ticket.seq;
                self.stale = false;
                self.last_error = None;
                self.state = ViewState::Ready;
                self.clamp_page();
            }
            Err(err) => {
                warn!(%err, "poll failed, keeping last known reports");
                self.last_error = Some(err.to_string());
                if self.state == ViewState::Refreshing {
                    self.state = ViewState::Ready;
                }
            }
        }
    }

    /// Marks the collection stale so the next poll happens immediately
    /// instead of waiting out the timer. Called after successful mutations.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filters.status = status;
        self.page = 1;
    }

    pub fn set_severity_filter(&mut self, severity: Option<Severity>) {
        self.filters.severity = severity;
        self.page = 1;
    }

    pub fn set_category_filter(&mut self, category: Option<String>) {
        self.filters.category = category;
        self.page = 1;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filters.query = query.into();
        self.page = 1;
    }

    pub fn reset_filters(&mut self) {
        self.filters = TriageFilters::default();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
        self.clamp_page();
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size).max(1)
    }

    fn clamp_page(&mut self) {
        let max = self.total_pages();
        if self.page > max {
            self.page = max;
        }
    }

    /// The whole collection with the current filters applied.
    pub fn filtered(&self) -> Vec<&ReportRecord> {
        self.reports
            .iter()
            .filter(|report| self.filters.matches(report))
            .collect()
    }

    /// The visible page of the filtered collection.
    pub fn current_page(&self) -> Vec<&ReportRecord> {
        self.filtered()
            .into_iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// Derived statistics over the unfiltered collection.
    pub fn stats(&self) -> TriageStats {
        let mut stats = TriageStats {
            total: self.reports.len(),
            ..TriageStats::default()
        };
        for report in &self.reports {
            if report.is_resolved() {
                stats.resolved += 1;
            } else {
                stats.unresolved += 1;
            }
            match report.severity {
                Severity::High => stats.high += 1,
                Severity::Critical => stats.critical += 1,
                _ => {}
            }
        }
        stats
    }

    /// Distinct categories in first-seen order, from the unfiltered
    /// collection.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for report in &self.reports {
            if !seen.contains(&report.category) {
                seen.push(report.category.clone());
            }
        }
        seen
    }

    pub fn reports(&self) -> &[ReportRecord] {
        &self.reports
    }
}

/// Async driver: one poll cycle per call, skipping when one is in flight.
pub struct TriageReconciler<B> {
    backend: Arc<B>,
    view: Arc<Mutex<TriageView>>,
}

impl<B> Clone for TriageReconciler<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            view: Arc::clone(&self.view),
        }
    }
}

impl<B: ReportsBackend> TriageReconciler<B> {
    pub fn new(backend: Arc<B>, config: &TriageConfig) -> Self {
        Self {
            backend,
            view: Arc::new(Mutex::new(TriageView::new(config.page_size))),
        }
    }

    /// Shared handle to the view. The lock is never held across an await.
    pub fn view(&self) -> Arc<Mutex<TriageView>> {
        Arc::clone(&self.view)
    }

    pub async fn poll_once(&self) {
        let ticket = self.view.lock().begin_poll();
        let Some(ticket) = ticket else { return };
        let result = self.backend.list_reports().await;
        self.view.lock().complete_poll(ticket, result);
    }
}
