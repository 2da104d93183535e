//! HTTP boundary to the reporting backend.
//!
//! Every backend response rides the envelope `{ success, data, message? }`.
//! It is decoded exactly once, here, into the crate's `Result`; downstream
//! components never inspect response shapes themselves. The session
//! credential is an opaque cookie carried automatically by the client's
//! cookie store.

use async_trait::async_trait;
use reqwest::{multipart, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Result, TransmissionError};
use crate::types::{
    AuditLog, AuditLogPage, DeleteReceipt, Operator, PageInfo, ReportDetail, ReportDraft,
    ReportId, ReportRecord, ResolveReceipt, VerifyResponse, Zone,
};

/// The backend operations this core consumes. `ApiClient` is the production
/// implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait ReportsBackend: Send + Sync {
    /// `GET /api/zones`: enumerate valid zone values.
    async fn zones(&self) -> Result<Vec<Zone>>;

    /// `POST /api/reports`: create a report from a draft. One multipart
    /// call per invocation; the assembler guarantees it is called at most
    /// once per draft.
    async fn submit_report(&self, draft: &ReportDraft) -> Result<ReportDetail>;

    /// `GET /api/reports`: the full triage collection.
    async fn list_reports(&self) -> Result<Vec<ReportRecord>>;

    /// `GET /api/reports/{id}`: one report.
    async fn report(&self, id: ReportId) -> Result<ReportDetail>;

    /// `GET /api/reports/{id}/verify`: anchored vs. current hash.
    async fn verify_report(&self, id: ReportId) -> Result<VerifyResponse>;

    /// `PUT /api/reports/{id}/resolve`: mark resolved.
    async fn resolve_report(&self, id: ReportId) -> Result<ResolveReceipt>;

    /// `DELETE /api/reports/{id}`: remove a report.
    async fn delete_report(&self, id: ReportId) -> Result<DeleteReceipt>;

    /// `GET /api/auth/me`: identify the calling operator.
    async fn me(&self) -> Result<Operator>;

    /// `GET /api/health`: backend liveness payload.
    async fn health(&self) -> Result<serde_json::Value>;

    /// `GET /api/admin/logs`: one page of the operator audit trail.
    async fn audit_logs(&self, page: u32, per_page: u32) -> Result<AuditLogPage>;
}

/// Response envelope the backend wraps every payload in.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// The audit endpoint puts pagination beside `data` instead of inside it.
#[derive(Debug, Deserialize)]
struct AuditEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<AuditLog>,
    #[serde(default)]
    pagination: Option<PageInfo>,
    #[serde(default)]
    message: Option<String>,
}

/// Production backend client over HTTP.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(TransmissionError::from)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransmissionError::Unauthorized.into());
        }
        let body = response.bytes().await.map_err(TransmissionError::from)?;
        interpret(status, &body)
    }
}

/// Turns a transport status plus raw body into a typed payload. Non-2xx
/// statuses and non-success envelopes both fail with the backend's own
/// message when it sent one.
fn interpret<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    let envelope: Envelope<T> = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(err) if status.is_success() => {
            return Err(TransmissionError::Decode(err.to_string()).into());
        }
        Err(_) => {
            return Err(
                TransmissionError::Backend(format!("request failed with status {status}")).into(),
            );
        }
    };
    if !status.is_success() || !envelope.success {
        let reason = envelope
            .message
            .or(envelope.error)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        return Err(TransmissionError::Backend(reason).into());
    }
    envelope
        .data
        .ok_or_else(|| TransmissionError::Decode("envelope is missing its data field".into()).into())
}

#[async_trait]
impl ReportsBackend for ApiClient {
    async fn zones(&self) -> Result<Vec<Zone>> {
        let response = self
            .http
            .get(self.url("/api/zones"))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn submit_report(&self, draft: &ReportDraft) -> Result<ReportDetail> {
        let mut form = multipart::Form::new()
            .text("zone", draft.zone.clone())
            .text(
                "incidentTime",
                draft.incident_time.format("%H:%M").to_string(),
            )
            .text("description", draft.description.clone());
        if let Some(custom) = draft.custom_zone.as_deref().filter(|z| !z.is_empty()) {
            form = form.text("customZone", custom.to_string());
        }
        for file in &draft.attachments {
            let part = multipart::Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.media_type)
                .map_err(TransmissionError::from)?;
            form = form.part("attachments", part);
        }
        debug!(
            zone = %draft.zone,
            attachments = draft.attachments.len(),
            "sending report submission"
        );
        let response = self
            .http
            .post(self.url("/api/reports"))
            .multipart(form)
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn list_reports(&self) -> Result<Vec<ReportRecord>> {
        let response = self
            .http
            .get(self.url("/api/reports"))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn report(&self, id: ReportId) -> Result<ReportDetail> {
        let response = self
            .http
            .get(self.url(&format!("/api/reports/{id}")))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn verify_report(&self, id: ReportId) -> Result<VerifyResponse> {
        let response = self
            .http
            .get(self.url(&format!("/api/reports/{id}/verify")))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn resolve_report(&self, id: ReportId) -> Result<ResolveReceipt> {
        let response = self
            .http
            .put(self.url(&format!("/api/reports/{id}/resolve")))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn delete_report(&self, id: ReportId) -> Result<DeleteReceipt> {
        let response = self
            .http
            .delete(self.url(&format!("/api/reports/{id}")))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn me(&self) -> Result<Operator> {
        let response = self
            .http
            .get(self.url("/api/auth/me"))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        Self::decode(response).await
    }

    async fn health(&self) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(self.url("/api/health"))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(
                TransmissionError::Backend(format!("health check failed with status {status}"))
                    .into(),
            );
        }
        response
            .json()
            .await
            .map_err(|err| TransmissionError::Network(err).into())
    }

    async fn audit_logs(&self, page: u32, per_page: u32) -> Result<AuditLogPage> {
        let response = self
            .http
            .get(self.url(&format!("/api/admin/logs?page={page}&perPage={per_page}")))
            .send()
            .await
            .map_err(TransmissionError::from)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransmissionError::Unauthorized.into());
        }
        let body = response.bytes().await.map_err(TransmissionError::from)?;
        let envelope: AuditEnvelope = serde_json::from_slice(&body)
            .map_err(|err| TransmissionError::Decode(err.to_string()))?;
        if !status.is_success() || !envelope.success {
            let reason = envelope
                .message
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(TransmissionError::Backend(reason).into());
        }
        let pagination = envelope.pagination.ok_or_else(|| {
            TransmissionError::Decode("audit response is missing pagination".into())
        })?;
        Ok(AuditLogPage {
            entries: envelope.data,
            pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Zone;

    #[test]
    fn successful_envelope_yields_data() {
        let body = br#"{"success":true,"data":[{"value":"PARKING","label":"Parking"}]}"#;
        let zones: Vec<Zone> = interpret(StatusCode::OK, body).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].value, "PARKING");
    }

    #[test]
    fn backend_message_survives_verbatim() {
        let body = br#"{"success":false,"data":null,"message":"description manquante"}"#;
        let err = interpret::<Vec<Zone>>(StatusCode::BAD_REQUEST, body).unwrap_err();
        match err {
            Error::Transmission(TransmissionError::Backend(reason)) => {
                assert_eq!(reason, "description manquante");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn success_envelope_on_error_status_is_still_a_failure() {
        let body = br#"{"success":true,"data":[]}"#;
        let err = interpret::<Vec<Zone>>(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
        assert!(matches!(
            err,
            Error::Transmission(TransmissionError::Backend(_))
        ));
    }

    #[test]
    fn non_json_error_body_gets_a_generic_reason() {
        let err = interpret::<Vec<Zone>>(StatusCode::BAD_GATEWAY, b"<html>oops</html>").unwrap_err();
        match err {
            Error::Transmission(TransmissionError::Backend(reason)) => {
                assert!(reason.contains("502"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn garbled_success_body_is_a_decode_error() {
        let err = interpret::<Vec<Zone>>(StatusCode::OK, b"not json").unwrap_err();
        assert!(matches!(
            err,
            Error::Transmission(TransmissionError::Decode(_))
        ));
    }

    #[test]
    fn missing_data_field_is_a_decode_error() {
        let body = br#"{"success":true}"#;
        let err = interpret::<Vec<Zone>>(StatusCode::OK, body).unwrap_err();
        assert!(matches!(
            err,
            Error::Transmission(TransmissionError::Decode(_))
        ));
    }
}
