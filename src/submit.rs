//! Submission assembly: final draft validation and the single outbound
//! create call.
//!
//! The UI layer is expected to validate first; the assembler validates
//! again because it is the last line of defense before transmission. It
//! performs no retries and keeps no state; callers own de-duplication,
//! typically by refusing to start a second submission while one is
//! outstanding.

use std::result::Result as StdResult;

use tracing::{info, instrument};

use crate::client::ReportsBackend;
use crate::config::{MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES};
use crate::error::{Result, ValidationError};
use crate::types::{ReportDetail, ReportDraft, ZONE_OTHER};

/// Checks the draft invariants: non-empty description, a custom zone label
/// when the zone is the "other" sentinel, and attachment count/size bounds.
pub fn validate_draft(draft: &ReportDraft) -> StdResult<(), ValidationError> {
    if draft.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if draft.zone == ZONE_OTHER
        && draft
            .custom_zone
            .as_deref()
            .map_or(true, |zone| zone.trim().is_empty())
    {
        return Err(ValidationError::MissingCustomZone);
    }
    if draft.attachments.len() > MAX_ATTACHMENTS {
        return Err(ValidationError::TooManyAttachments {
            count: draft.attachments.len(),
            limit: MAX_ATTACHMENTS,
        });
    }
    for file in &draft.attachments {
        if file.size() > MAX_ATTACHMENT_BYTES {
            return Err(ValidationError::OversizeAttachment {
                name: file.name.clone(),
                size: file.size(),
                limit: MAX_ATTACHMENT_BYTES,
            });
        }
    }
    Ok(())
}

/// Validates and transmits one draft: exactly one create call, no retry.
/// A draft that fails validation never reaches the network; a backend
/// rejection propagates with the backend's reason intact.
#[instrument(skip_all, fields(zone = %draft.zone, attachments = draft.attachments.len()))]
pub async fn submit_draft<B: ReportsBackend + ?Sized>(
    backend: &B,
    draft: &ReportDraft,
) -> Result<ReportDetail> {
    validate_draft(draft)?;
    let detail = backend.submit_report(draft).await?;
    info!(id = detail.report.id, "report submitted");
    Ok(detail)
}
