//! End-to-end submission and verification flow against a mocked backend.
//!
//! The legacy mockito server is global to the process, so every test takes
//! the lock before registering mocks.

use std::sync::Mutex;

use blackbox::{
    submit_draft, verify_report, ApiClient, ClientConfig, Error, ReportDraft, ReportsBackend,
    TransmissionError,
};
use chrono::NaiveTime;
use mockito::{mock, server_url, Matcher};
use serde_json::json;

static LOCK: Mutex<()> = Mutex::new(());

fn client() -> ApiClient {
    ApiClient::new(&ClientConfig::with_base_url(server_url())).unwrap()
}

fn draft(description: &str) -> ReportDraft {
    ReportDraft {
        zone: "AUTRE".into(),
        custom_zone: Some("Zone X".into()),
        incident_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        description: description.into(),
        attachments: vec![],
    }
}

fn detail_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "zone": "AUTRE",
        "customZone": "Zone X",
        "incidentTime": "14:30",
        "category": "SECURITE_PHYSIQUE",
        "severity": "medium",
        "anonymizedContent": "Test",
        "attachments": [],
        "blockchainTxHash": "0xfeed",
        "createdAt": "2026-08-29T10:00:00Z",
        "description": "Test",
        "analysis": null,
        "blockchain": {
            "txHash": "0xfeed",
            "contentHash": "abc123",
            "explorerUrl": "https://explorer/tx/0xfeed"
        }
    })
}

#[tokio::test]
async fn submit_then_confirm_and_verify() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let create = mock("POST", "/api/reports")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="zone"\s+AUTRE"#.into()),
            Matcher::Regex(r#"name="customZone"\s+Zone X"#.into()),
            Matcher::Regex(r#"name="incidentTime"\s+14:30"#.into()),
            Matcher::Regex(r#"name="description"\s+Test"#.into()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "success": true, "data": detail_json(7) }).to_string())
        .expect(1)
        .create();

    let fetch = mock("GET", "/api/reports/7")
        .with_header("content-type", "application/json")
        .with_body(json!({ "success": true, "data": detail_json(7) }).to_string())
        .expect(1)
        .create();

    let verify = mock("GET", "/api/reports/7/verify")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "data": {
                    "reportId": 7,
                    "integrityValid": true,
                    "storedHash": "abc123",
                    "calculatedHash": "abc123",
                    "blockchainTxHash": "0xfeed",
                    "explorerUrl": "https://explorer/tx/0xfeed"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let client = client();
    let detail = submit_draft(&client, &draft("Test")).await.unwrap();
    assert_eq!(detail.report.id, 7);

    // Confirmation view: fetch the stored record, then check integrity.
    let confirmed = client.report(detail.report.id).await.unwrap();
    assert_eq!(confirmed.description, "Test");
    assert_eq!(confirmed.report.zone, "AUTRE");

    let outcome = verify_report(&client, detail.report.id).await.unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.anchor.as_deref(), Some("0xfeed"));

    create.assert();
    fetch.assert();
    verify.assert();
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_network() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let create = mock("POST", "/api/reports").expect(0).create();
    let client = client();

    let err = submit_draft(&client, &draft("   ")).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let mut missing_zone = draft("Test");
    missing_zone.custom_zone = None;
    let err = submit_draft(&client, &missing_zone).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    create.assert();
}

#[tokio::test]
async fn backend_rejection_reason_propagates_verbatim() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let _create = mock("POST", "/api/reports")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "success": false, "data": null, "message": "incidentTime invalide" })
                .to_string(),
        )
        .create();

    let err = submit_draft(&client(), &draft("Test")).await.unwrap_err();
    match err {
        Error::Transmission(TransmissionError::Backend(reason)) => {
            assert_eq!(reason, "incidentTime invalide");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn verification_request_failure_is_not_an_invalid_verdict() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let _verify = mock("GET", "/api/reports/9/verify")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({ "success": false, "message": "hash service down" }).to_string())
        .create();

    // A failed request must surface as an error, distinguishable from a
    // clean integrity-invalid outcome.
    let err = verify_report(&client(), 9).await.unwrap_err();
    assert!(matches!(err, Error::Transmission(_)));
}

#[tokio::test]
async fn resolve_and_delete_hit_their_endpoints() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let resolve = mock("PUT", "/api/reports/42/resolve")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "data": {
                    "id": 42,
                    "status": "resolved",
                    "resolvedBy": 3,
                    "resolvedAt": "2026-08-29T10:05:00Z"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let delete = mock("DELETE", "/api/reports/42")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "data": {
                    "id": 42,
                    "deletedBy": 3,
                    "deletedAt": "2026-08-29T10:06:00Z"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let client = client();
    let receipt = client.resolve_report(42).await.unwrap();
    assert_eq!(receipt.id, 42);
    let receipt = client.delete_report(42).await.unwrap();
    assert_eq!(receipt.id, 42);

    resolve.assert();
    delete.assert();
}

#[tokio::test]
async fn unauthorized_listing_is_an_ordinary_failure() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let _list = mock("GET", "/api/reports")
        .with_status(401)
        .with_body(json!({ "success": false, "message": "non authentifié" }).to_string())
        .create();

    let err = client().list_reports().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Transmission(TransmissionError::Unauthorized)
    ));
}
