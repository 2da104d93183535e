//! Wire types shared with the reporting backend.
//!
//! Everything here deserializes from the backend's camelCase JSON. The
//! backend owns report records; the client only observes them and requests
//! transitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RECENT_WINDOW_SECS;
use crate::sanitize::SanitizedFile;

/// Backend-assigned report identifier.
pub type ReportId = i64;

/// Sentinel zone value meaning "somewhere else"; requires a custom zone label.
pub const ZONE_OTHER: &str = "AUTRE";

/// One enumerated incident location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub value: String,
    pub label: String,
}

/// Backend-assigned severity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// A report being composed on the submitter's device. Holds only sanitized
/// attachments; destroyed after a successful submission.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub zone: String,
    pub custom_zone: Option<String>,
    pub incident_time: NaiveTime,
    pub description: String,
    pub attachments: Vec<SanitizedFile>,
}

/// A stored report as the triage list sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: ReportId,
    pub zone: String,
    #[serde(default)]
    pub custom_zone: Option<String>,
    pub incident_time: String,
    pub category: String,
    pub severity: Severity,
    pub anonymized_content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub blockchain_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_by: Option<i64>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ReportRecord {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Whether the record was created within the recency window, evaluated
    /// against the caller's `now`. Display-time only; the answer decays, so
    /// it must not be memoized beyond a single render.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age.num_seconds() >= 0 && age.num_seconds() <= RECENT_WINDOW_SECS
    }
}

/// Full report detail, as returned by the create and fetch-one calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: ReportRecord,
    pub description: String,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub blockchain: Option<BlockchainAnchor>,
}

/// Anchoring material fixed at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainAnchor {
    pub tx_hash: String,
    pub content_hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// Raw verification payload: the hash anchored at submission time and the
/// hash recomputed from the currently stored content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub report_id: ReportId,
    pub integrity_valid: bool,
    pub stored_hash: String,
    pub calculated_hash: String,
    #[serde(default)]
    pub blockchain_tx_hash: Option<String>,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// Confirmation payload of a resolve call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReceipt {
    pub id: ReportId,
    #[serde(default)]
    pub status: Option<String>,
    pub resolved_by: i64,
    pub resolved_at: DateTime<Utc>,
}

/// Confirmation payload of a delete call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    pub id: ReportId,
    pub deleted_by: i64,
    pub deleted_at: DateTime<Utc>,
}

/// The authenticated operator, from `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One operator-action audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub action: String,
    pub method: String,
    pub endpoint: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub admin: AuditActor,
}

/// The operator who performed an audited action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
}

/// Server-side pagination descriptor for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
}

/// One page of the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogPage {
    pub entries: Vec<AuditLog>,
    pub pagination: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(created_at: DateTime<Utc>) -> ReportRecord {
        ReportRecord {
            id: 1,
            zone: "TERMINAL_1".into(),
            custom_zone: None,
            incident_time: "14:30".into(),
            category: "INCIDENT_TECHNIQUE".into(),
            severity: Severity::Low,
            anonymized_content: "content".into(),
            attachments: vec![],
            blockchain_tx_hash: None,
            created_at,
            resolved_by: None,
            resolved_at: None,
        }
    }

    #[test]
    fn recent_flag_decays_with_the_clock() {
        let now = Utc::now();
        let report = record(now - Duration::seconds(10));
        assert!(report.is_recent(now));
        assert!(!report.is_recent(now + Duration::seconds(120)));
    }

    #[test]
    fn future_created_at_is_not_recent() {
        let now = Utc::now();
        let report = record(now + Duration::seconds(30));
        assert!(!report.is_recent(now));
    }

    #[test]
    fn report_record_deserializes_from_backend_shape() {
        let json = r#"{
            "id": 7,
            "zone": "PARKING",
            "customZone": null,
            "incidentTime": "08:15",
            "category": "COMPORTEMENT_SUSPECT",
            "severity": "high",
            "anonymizedContent": "vehicle left unattended",
            "attachments": ["https://cdn/x.jpg"],
            "blockchainTxHash": "0xabc",
            "createdAt": "2026-08-01T10:00:00Z",
            "resolvedBy": 3,
            "resolvedAt": "2026-08-01T11:00:00Z"
        }"#;
        let report: ReportRecord = serde_json::from_str(json).unwrap();
        assert_eq!(report.severity, Severity::High);
        assert!(report.is_resolved());
        assert_eq!(report.attachments.len(), 1);
    }

    #[test]
    fn severity_round_trips_through_strings() {
        for severity in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            assert_eq!(severity.as_str().parse::<Severity>().unwrap(), severity);
        }
        assert!("urgent".parse::<Severity>().is_err());
    }
}
