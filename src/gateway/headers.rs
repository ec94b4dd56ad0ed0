//! Header sanitizing for downstream forwarding.
//!
//! [`sanitize_headers`] produces the header set that is safe to send
//! to destinations: connection-specific headers are dropped so the
//! outbound transport can recompute them, and two markers are injected
//! (a tunnel interstitial bypass and a relay provenance tag). Pure
//! function, no failure modes.

use std::collections::HashMap;

use axum::http::header::{CONTENT_LENGTH, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Ngrok and similar tunnels show a browser warning page unless this
/// header is present on the request.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

/// Identifies the relay as the sender to downstream endpoints.
pub const PROVENANCE_HEADER: &str = "x-relayed-by";

pub fn sanitize_headers(original: &HeaderMap) -> HeaderMap {
    let mut headers = original.clone();

    // Connection-specific; the outbound transport sets these itself.
    headers.remove(HOST);
    headers.remove(CONTENT_LENGTH);

    headers.insert(
        HeaderName::from_static(TUNNEL_BYPASS_HEADER),
        HeaderValue::from_static("I Shall Pass!"),
    );
    headers.insert(
        HeaderName::from_static(PROVENANCE_HEADER),
        HeaderValue::from_static("hookpit"),
    );

    headers
}

/// Collapse a [`HeaderMap`] into a plain string map. Multi-value
/// headers keep the last value; non-UTF8 values are dropped.
#[must_use]
pub fn collapse_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
