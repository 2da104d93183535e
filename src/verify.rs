//! Integrity verification against the hash anchored at submission time.
//!
//! A pure read: nothing is cached here and nothing is mutated, so the call
//! is safely repeatable. `valid == false` is a normal, reportable outcome;
//! only a failed verification *request* surfaces as an error, and callers
//! must present the two cases differently.

use tracing::{debug, instrument};

use crate::client::ReportsBackend;
use crate::error::Result;
use crate::hash_utils::hashes_match;
use crate::types::{ReportId, VerifyResponse};

/// Outcome of an integrity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub report_id: ReportId,
    pub valid: bool,
    pub stored_hash: String,
    pub calculated_hash: String,
    pub anchor: Option<String>,
    pub explorer_url: Option<String>,
}

impl VerificationOutcome {
    /// Re-derives validity from the raw payload. The backend ships its own
    /// `integrityValid` flag, but the verdict here depends only on the two
    /// hashes being byte-for-byte equal and an anchor being present. A
    /// missing anchor is invalid, never silently valid.
    pub fn from_response(response: VerifyResponse) -> Self {
        let anchored = response
            .blockchain_tx_hash
            .as_deref()
            .map_or(false, |hash| !hash.is_empty());
        let valid = anchored && hashes_match(&response.stored_hash, &response.calculated_hash);
        Self {
            report_id: response.report_id,
            valid,
            stored_hash: response.stored_hash,
            calculated_hash: response.calculated_hash,
            anchor: response.blockchain_tx_hash,
            explorer_url: response.explorer_url,
        }
    }
}

/// Fetches the anchored and recomputed hashes for a report and compares
/// them. Computes fresh on every call; any caching is the caller's concern.
#[instrument(skip(backend))]
pub async fn verify_report<B: ReportsBackend + ?Sized>(
    backend: &B,
    id: ReportId,
) -> Result<VerificationOutcome> {
    let response = backend.verify_report(id).await?;
    let outcome = VerificationOutcome::from_response(response);
    debug!(id, valid = outcome.valid, "integrity check completed");
    Ok(outcome)
}
