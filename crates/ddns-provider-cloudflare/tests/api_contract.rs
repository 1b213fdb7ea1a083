//! Contract Test: Cloudflare API v4 wire format
//!
//! Runs the provider against an in-process fake of the two endpoints it
//! uses and checks paths, query, bearer auth and PATCH body.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use ddns_core::config::Secret;
use ddns_core::traits::{DnsProvider, DnsRecord};
use ddns_core::{Error, RecordUpdater, UpdateOutcome};
use ddns_provider_cloudflare::CloudflareProvider;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const TOKEN: &str = "cf-test-token";
const ZONE: &str = "zone-123";
const NAME: &str = "home.example.com";

/// Fake Cloudflare zone holding (id, name, content) rows
#[derive(Default)]
struct FakeZone {
    records: Mutex<Vec<(String, String, String)>>,
    list_calls: AtomicUsize,
    patch_calls: AtomicUsize,
    last_patch_body: Mutex<Option<Value>>,
    force_status: Option<StatusCode>,
}

impl FakeZone {
    fn with_record(id: &str, name: &str, content: &str) -> Self {
        let zone = Self::default();
        zone.records
            .lock()
            .unwrap()
            .push((id.to_string(), name.to_string(), content.to_string()));
        zone
    }

    fn content_of(&self, id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|(rid, _, _)| rid == id)
            .map(|(_, _, c)| c.clone())
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn list_records(
    State(zone): State<Arc<FakeZone>>,
    Path(zone_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    zone.list_calls.fetch_add(1, Ordering::SeqCst);

    if let Some(status) = zone.force_status {
        return (status, "forced").into_response();
    }
    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, "bad token").into_response();
    }
    if zone_id != ZONE {
        return (StatusCode::NOT_FOUND, "no zone").into_response();
    }

    let name = query.get("name").cloned().unwrap_or_default();
    let result: Vec<Value> = zone
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, n, _)| *n == name)
        .map(|(id, n, c)| json!({ "id": id, "name": n, "type": "A", "content": c }))
        .collect();

    Json(json!({ "success": true, "result": result })).into_response()
}

async fn patch_record(
    State(zone): State<Arc<FakeZone>>,
    Path((zone_id, record_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    zone.patch_calls.fetch_add(1, Ordering::SeqCst);
    *zone.last_patch_body.lock().unwrap() = Some(body.clone());

    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, "bad token").into_response();
    }
    if zone_id != ZONE {
        return (StatusCode::NOT_FOUND, "no zone").into_response();
    }

    let mut records = zone.records.lock().unwrap();
    match records.iter_mut().find(|(id, _, _)| *id == record_id) {
        Some(row) => {
            if let Some(content) = body["content"].as_str() {
                row.2 = content.to_string();
            }
            Json(json!({ "success": true, "result": { "id": row.0, "content": row.2 } }))
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "no record").into_response(),
    }
}

/// Serve `zone` on an ephemeral port and return the API base URL
async fn serve(zone: Arc<FakeZone>) -> String {
    let app = Router::new()
        .route("/zones/:zone/dns_records", get(list_records))
        .route("/zones/:zone/dns_records/:id", patch(patch_record))
        .with_state(zone);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn provider(base: &str, token: &str) -> CloudflareProvider {
    CloudflareProvider::new(Secret::new(token), ZONE, base).unwrap()
}

#[tokio::test]
async fn find_record_returns_first_match() {
    let zone = Arc::new(FakeZone::with_record("rec-1", NAME, "198.51.100.7"));
    zone.records.lock().unwrap().push((
        "rec-2".to_string(),
        NAME.to_string(),
        "192.0.2.1".to_string(),
    ));
    let base = serve(zone.clone()).await;

    let record = provider(&base, TOKEN).find_record(NAME).await.unwrap();

    assert_eq!(record, Some(DnsRecord::new("rec-1", "198.51.100.7")));
    assert_eq!(zone.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn find_record_with_no_match_is_none() {
    let zone = Arc::new(FakeZone::with_record("rec-1", "other.example.com", "198.51.100.7"));
    let base = serve(zone).await;

    let record = provider(&base, TOKEN).find_record(NAME).await.unwrap();
    assert_eq!(record, None);
}

#[tokio::test]
async fn bad_token_is_an_authentication_error() {
    let zone = Arc::new(FakeZone::with_record("rec-1", NAME, "198.51.100.7"));
    let base = serve(zone).await;

    let err = provider(&base, "wrong-token")
        .find_record(NAME)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Authentication failed"), "{err}");
}

#[tokio::test]
async fn server_errors_are_reported() {
    let zone = Arc::new(FakeZone {
        force_status: Some(StatusCode::SERVICE_UNAVAILABLE),
        ..FakeZone::default()
    });
    let base = serve(zone).await;

    let err = provider(&base, TOKEN).find_record(NAME).await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert!(err.to_string().contains("transient"));
}

#[tokio::test]
async fn patch_sends_only_content() {
    let zone = Arc::new(FakeZone::with_record("rec-1", NAME, "198.51.100.7"));
    let base = serve(zone.clone()).await;

    provider(&base, TOKEN)
        .patch_content("rec-1", "203.0.113.5")
        .await
        .unwrap();

    assert_eq!(zone.content_of("rec-1").as_deref(), Some("203.0.113.5"));
    assert_eq!(
        zone.last_patch_body.lock().unwrap().clone(),
        Some(json!({ "content": "203.0.113.5" }))
    );
}

#[tokio::test]
async fn patch_unknown_record_is_not_found() {
    let zone = Arc::new(FakeZone::with_record("rec-1", NAME, "198.51.100.7"));
    let base = serve(zone).await;

    let err = provider(&base, TOKEN)
        .patch_content("rec-404", "203.0.113.5")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn updater_over_cloudflare_is_idempotent() {
    let zone = Arc::new(FakeZone::with_record("rec-1", NAME, "198.51.100.7"));
    let base = serve(zone.clone()).await;
    let updater = RecordUpdater::new(Arc::new(provider(&base, TOKEN)), NAME);

    let first = updater.update_record("203.0.113.5").await;
    assert!(matches!(first, UpdateOutcome::Updated { .. }));

    let second = updater.update_record("203.0.113.5").await;
    assert!(matches!(second, UpdateOutcome::Unchanged { .. }));

    assert_eq!(zone.list_calls.load(Ordering::SeqCst), 2);
    assert_eq!(zone.patch_calls.load(Ordering::SeqCst), 1);
}
