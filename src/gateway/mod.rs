//! Core capture-and-relay pipeline.
//!
//! The [`capture_handler`] function is the Axum fallback that receives
//! every non-`/health` request on the capture port: it logs the request
//! as pending, then hands it to [`complete`], the response-strategy
//! selector that decides how the caller's connection is finished
//! relative to fan-out completion. Submodules handle header sanitizing
//! ([`headers`]), concurrent destination dispatch ([`fanout`]), and
//! re-execution of stored entries ([`replay`]).
//!
//! [`InboundRequest`] is the one typed entry point into the pipeline:
//! live HTTP calls and synthetic replays both construct it, so the
//! dispatcher never distinguishes between the two.

pub mod fanout;
pub mod headers;
pub mod replay;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;

use crate::config::model::{GatewayConfig, ResponseMode};
use crate::server::AppState;
use crate::store::LogEntry;

/// One normalized inbound request, live or replayed. Immutable once
/// constructed.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path and query exactly as received.
    pub original_url: String,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub raw_body: Bytes,
    /// Present only when the content type is JSON and the body parses.
    pub json_body: Option<Value>,
    /// Links the request to its log entry. Absent means fan-out results
    /// are not recorded.
    pub correlation_id: Option<String>,
}

impl InboundRequest {
    #[must_use]
    pub fn from_live(
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        body: Bytes,
        correlation_id: Option<String>,
    ) -> Self {
        let original_url = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());

        let query: HashMap<String, String> = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let is_json = headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        let json_body = if is_json {
            serde_json::from_slice(&body).ok()
        } else {
            None
        };

        Self {
            method,
            original_url,
            headers,
            query,
            raw_body: body,
            json_body,
            correlation_id,
        }
    }

    /// Synthesize a request from a stored log entry for replay. The raw
    /// body is rebuilt from the stored text representation; headers that
    /// are no longer representable are skipped with a warning.
    pub fn from_entry(
        entry: &LogEntry,
        correlation_id: String,
    ) -> Result<Self, crate::error::HookpitError> {
        let method = Method::from_bytes(entry.method.as_bytes()).map_err(|e| {
            crate::error::HookpitError::HttpRequest {
                source: Box::new(e),
            }
        })?;

        let mut headers = HeaderMap::new();
        for (key, value) in &entry.headers {
            match (
                key.parse::<axum::http::HeaderName>(),
                axum::http::HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(val)) => {
                    headers.insert(name, val);
                }
                _ => {
                    tracing::warn!(header = %key, "stored header not representable, skipping");
                }
            }
        }

        Ok(Self {
            method,
            original_url: entry.url.clone(),
            headers,
            query: entry.query.clone(),
            raw_body: Bytes::from(entry.raw_body.clone()),
            json_body: entry.body.clone(),
            correlation_id: Some(correlation_id),
        })
    }

    /// Inbound headers collapsed to a plain string map.
    #[must_use]
    pub fn headers_map(&self) -> HashMap<String, String> {
        headers::collapse_headers(&self.headers)
    }
}

/// Axum fallback for the capture port: log as pending, then complete
/// per the configured response mode.
pub async fn capture_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let inbound = InboundRequest::from_live(
        method,
        &uri,
        req_headers,
        body,
        Some(correlation_id.clone()),
    );

    state
        .log
        .append(LogEntry::from_inbound(&inbound, &correlation_id))
        .await;
    state.stats.captured.fetch_add(1, Ordering::Relaxed);

    // Snapshot: a config swap mid-flight never affects this dispatch.
    let config = {
        let guard = state.config.read().await;
        Arc::clone(&guard.config)
    };

    tracing::info!(
        correlation_id = %correlation_id,
        method = %inbound.method,
        url = %inbound.original_url,
        mode = config.response.label(),
        "request captured"
    );

    complete(state, inbound, config).await
}

/// Response-strategy selector. Produces exactly one terminal response
/// for the caller per call.
pub async fn complete(
    state: Arc<AppState>,
    inbound: InboundRequest,
    config: Arc<GatewayConfig>,
) -> Response {
    match &config.response {
        ResponseMode::InstantAck => {
            // Detached task: the caller is answered before any
            // destination settles, and its lifetime is independent of
            // the originating connection.
            tokio::spawn(async move {
                let results = fanout::dispatch(&state.http_client, &inbound, &config).await;
                match &inbound.correlation_id {
                    Some(id) => state.log.record_fanout(id, results).await,
                    None => {
                        tracing::debug!("fan-out settled without a correlation id, not recorded");
                    }
                }
            });
            (StatusCode::OK, "OK").into_response()
        }

        ResponseMode::CollectiveAck => {
            let results = fanout::dispatch(&state.http_client, &inbound, &config).await;
            if let Some(id) = &inbound.correlation_id {
                state.log.record_fanout(id, results.clone()).await;
            }
            Json(results).into_response()
        }

        ResponseMode::Echo => {
            // No dispatch at all; nothing to record for destinations.
            let body = inbound.json_body.clone().unwrap_or_else(|| {
                Value::String(String::from_utf8_lossy(&inbound.raw_body).into_owned())
            });
            Json(serde_json::json!({
                "message": "Webhook received",
                "method": inbound.method.as_str(),
                "headers": inbound.headers_map(),
                "query": inbound.query,
                "body": body,
            }))
            .into_response()
        }

        ResponseMode::Other(mode) => {
            tracing::warn!(mode = %mode, "unrecognized response mode, answering bare 200");
            StatusCode::OK.into_response()
        }
    }
}
