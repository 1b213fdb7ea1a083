//! HTTP surface of the edge daemon
//!
//! Exactly one route: `POST /`. Everything else, and every request that
//! fails validation, gets the same `401`. A valid request gets `200` once
//! the record update has run, whatever its outcome.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use ddns_core::{
    EdgeConfig, RecordUpdater, RejectReason, RequestValidator, Submission, UpdateOutcome, Verdict,
};
use ddns_provider_cloudflare::CloudflareProvider;

/// Upper bound on an update body; anything larger is unreadable
pub const MAX_BODY_BYTES: usize = 8 * 1024;

const OK_BODY: &str = "OK";
const UNAUTHORIZED_BODY: &str = "Unauthorized";

/// Shared, read-only request context
#[derive(Debug, Clone)]
pub struct AppState {
    validator: RequestValidator,
    updater: RecordUpdater,
    client_ip_header: Option<HeaderName>,
}

impl AppState {
    pub fn new(
        validator: RequestValidator,
        updater: RecordUpdater,
        client_ip_header: Option<HeaderName>,
    ) -> Self {
        Self {
            validator,
            updater,
            client_ip_header,
        }
    }

    /// Wire the validator, the Cloudflare provider and the updater
    pub fn from_config(config: &EdgeConfig) -> ddns_core::Result<Self> {
        let validator = RequestValidator::new(&config.auth)?;
        let provider = CloudflareProvider::from_config(&config.provider)?;

        let updater = RecordUpdater::new(Arc::new(provider), config.record.name.clone())
            .with_dry_run(config.record.dry_run);

        let client_ip_header = config
            .server
            .client_ip_header
            .as_deref()
            .map(|name| {
                HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes()).map_err(|e| {
                    ddns_core::Error::config(format!("Invalid client IP header '{}': {}", name, e))
                })
            })
            .transpose()?;

        Ok(Self::new(validator, updater, client_ip_header))
    }

    /// Address the request came from: the trusted header when configured,
    /// otherwise the TCP peer.
    fn source_addr(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        match &self.client_ip_header {
            Some(name) => headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            // IPv4-mapped peers from a dual-stack socket compare as plain IPv4
            None => peer.map(|addr| addr.ip().to_canonical().to_string()),
        }
    }
}

/// Create the edge router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handle_update).fallback(reject))
        .fallback(reject)
        .with_state(state)
}

async fn handle_update(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Response {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let (parts, body) = request.into_parts();

    let verdict = match read_body(body).await {
        Some(bytes) => {
            let source_addr = state.source_addr(&parts.headers, peer);
            let signature = parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            state.validator.validate(&Submission {
                body: &bytes,
                signature,
                source_addr: source_addr.as_deref(),
            })
        }
        None => Verdict::Invalid(RejectReason::UnreadableBody),
    };

    let verified_addr = match verdict {
        Verdict::Valid(addr) => addr,
        Verdict::Invalid(reason) => {
            tracing::warn!(
                reason = %reason,
                peer = ?peer,
                "Rejected update request"
            );
            return unauthorized();
        }
    };

    tracing::info!(addr = %verified_addr, "Accepted update request");

    // Run the update on its own task so a client disconnect cannot cancel
    // the outbound calls halfway.
    let updater = state.updater.clone();
    let task = tokio::spawn(async move { updater.update_record(&verified_addr).await });
    match task.await {
        Ok(outcome) => log_outcome(&outcome),
        Err(e) => tracing::error!(error = %e, "Record update task failed"),
    }

    (StatusCode::OK, OK_BODY).into_response()
}

async fn reject(method: Method, uri: Uri) -> Response {
    tracing::debug!(%method, %uri, "Unrouted request");
    unauthorized()
}

async fn read_body(body: Body) -> Option<axum::body::Bytes> {
    match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            None
        }
    }
}

fn log_outcome(outcome: &UpdateOutcome) {
    if outcome.is_current() {
        tracing::info!(outcome = %outcome, "Record update finished");
    } else {
        tracing::warn!(outcome = %outcome, "Record not updated");
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response()
}
