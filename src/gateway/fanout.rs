//! Concurrent fan-out of a single captured request to all configured
//! destinations.
//!
//! [`dispatch`] issues one outbound call per destination template and
//! reassembles the outcomes in configuration order, regardless of
//! completion order. It never fails as a whole: every transport error
//! is captured as a per-destination [`DispatchOutcome::Failure`], so
//! callers always get exactly one [`DispatchResult`] per template.
//!
//! There is no concurrency cap, no retry, and no timeout; a hung
//! destination is bounded only by the transport's own defaults and
//! delays only its own task.

use std::collections::HashMap;
use std::time::Instant;

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::Full;
use serde::{Deserialize, Serialize};

use crate::config::model::GatewayConfig;
use crate::server::HttpClient;

use super::headers::{collapse_headers, sanitize_headers};
use super::InboundRequest;

/// Outcome of one outbound call to one destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Destination actually called, after wildcard expansion.
    pub url: String,
    /// Wall-clock time from dispatch start to response-or-error.
    pub ms: u64,
    pub response: DispatchOutcome,
}

/// Exactly one of success or failure, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchOutcome {
    Success {
        status: u16,
        #[serde(default)]
        headers: HashMap<String, String>,
        #[serde(default)]
        body: String,
    },
    Failure {
        error: bool,
        message: String,
    },
}

impl DispatchOutcome {
    /// True when the destination answered with a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { status, .. } if (200..300).contains(status))
    }
}

/// Expand a destination template against the inbound path+query.
///
/// A trailing `*` is replaced with the original path+query verbatim;
/// templates without the marker are used unmodified. The inbound
/// path always starts with `/`, so a `/` left before the marker is
/// dropped to avoid a doubled slash.
#[must_use]
pub fn expand_destination(template: &str, original_url: &str) -> String {
    let trimmed = template.trim();
    trimmed.strip_suffix('*').map_or_else(
        || trimmed.to_string(),
        |base| {
            let base = base.strip_suffix('/').unwrap_or(base);
            format!("{base}{original_url}")
        },
    )
}

/// Fan the inbound request out to every configured destination.
///
/// Results are returned in the order destinations were configured.
pub async fn dispatch(
    client: &HttpClient,
    inbound: &InboundRequest,
    config: &GatewayConfig,
) -> Vec<DispatchResult> {
    if config.endpoints.is_empty() {
        return Vec::new();
    }

    let forwarded_headers = sanitize_headers(&inbound.headers);

    tracing::info!(
        correlation_id = inbound.correlation_id.as_deref().unwrap_or("-"),
        endpoints = config.endpoints.len(),
        method = %inbound.method,
        "fanning out"
    );

    let mut handles = Vec::with_capacity(config.endpoints.len());
    for template in &config.endpoints {
        let url = expand_destination(template, &inbound.original_url);

        // Only POST and PUT carry a body downstream, even if bytes
        // were received on other methods.
        let body = if inbound.method == Method::POST || inbound.method == Method::PUT {
            inbound.raw_body.clone()
        } else {
            Bytes::new()
        };

        let task = call_destination(
            client.clone(),
            inbound.method.clone(),
            url.clone(),
            forwarded_headers.clone(),
            body,
        );
        handles.push((url, tokio::spawn(task)));
    }

    // Join in configuration order; completion order is irrelevant.
    let mut results = Vec::with_capacity(handles.len());
    for (url, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                tracing::error!(url = %url, error = %join_err, "destination task panicked");
                DispatchResult {
                    url,
                    ms: 0,
                    response: DispatchOutcome::Failure {
                        error: true,
                        message: format!("dispatch task failed: {join_err}"),
                    },
                }
            }
        };
        results.push(result);
    }
    results
}

#[allow(clippy::cast_possible_truncation)]
async fn call_destination(
    client: HttpClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
) -> DispatchResult {
    let start = Instant::now();

    let mut builder = hyper::Request::builder().method(method).uri(url.clone());
    for (key, value) in &headers {
        builder = builder.header(key, value);
    }

    let request = match builder.body(Full::new(body)) {
        Ok(r) => r,
        Err(e) => return failure(url, &start, e.to_string()),
    };

    match client.request(request).await {
        Ok(response) => {
            let status = response.status().as_u16();
            let resp_headers = collapse_headers(response.headers());

            match response.into_body().collect().await {
                Ok(collected) => {
                    let text = String::from_utf8_lossy(&collected.to_bytes()).into_owned();
                    let ms = start.elapsed().as_millis() as u64;
                    tracing::info!(url = %url, status, ms, "destination responded");
                    DispatchResult {
                        url,
                        ms,
                        response: DispatchOutcome::Success {
                            status,
                            headers: resp_headers,
                            body: text,
                        },
                    }
                }
                Err(e) => failure(url, &start, format!("body read error: {e}")),
            }
        }
        Err(e) => failure(url, &start, e.to_string()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn failure(url: String, start: &Instant, message: String) -> DispatchResult {
    let ms = start.elapsed().as_millis() as u64;
    tracing::warn!(url = %url, error = %message, ms, "destination failed");
    DispatchResult {
        url,
        ms,
        response: DispatchOutcome::Failure {
            error: true,
            message,
        },
    }
}
