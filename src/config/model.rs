//! Serde data structures for the Hookpit gateway configuration.
//!
//! Contains [`GatewayConfig`] (the root), the [`ResponseMode`] enum
//! selecting how the webhook caller is answered relative to fan-out
//! completion, and the disabled [`RetryConfig`] placeholder. Unknown
//! fields are tolerated so configs from older or newer versions still
//! load; unknown response modes map to [`ResponseMode::Other`], which
//! the gateway answers with a bare `200 OK`.

use serde::{Deserialize, Serialize};

/// The active gateway configuration.
///
/// One value is live at a time. The management API replaces it with a
/// whole-value swap; dispatches read a snapshot at their start, so a
/// swap mid-flight never affects an already-running fan-out.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Ordered destination templates. A trailing `*` means "append the
    /// inbound request's path and query".
    pub endpoints: Vec<String>,

    pub response: ResponseMode,

    /// Retry policy placeholder. Parsed and round-tripped through the
    /// management API but never consulted: the dispatcher makes exactly
    /// one attempt per destination.
    #[serde(skip_serializing_if = "RetryConfig::is_disabled")]
    pub retry: RetryConfig,
}

/// How the original webhook caller's connection is completed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseMode {
    /// Answer `200 OK` immediately; fan-out settles in the background.
    InstantAck,
    /// Wait for every destination, answer with the full result array.
    CollectiveAck,
    /// No fan-out; echo the received payload back to the caller.
    Echo,
    /// Unrecognized mode string, preserved verbatim. Answered with a
    /// bare `200 OK` and nothing recorded.
    Other(String),
}

impl Default for ResponseMode {
    fn default() -> Self {
        Self::InstantAck
    }
}

impl ResponseMode {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::InstantAck => "INSTANT_ACK",
            Self::CollectiveAck => "COLLECTIVE_ACK",
            Self::Echo => "ECHO",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ResponseMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "INSTANT_ACK" => Self::InstantAck,
            "COLLECTIVE_ACK" => Self::CollectiveAck,
            "ECHO" => Self::Echo,
            _ => Self::Other(raw),
        }
    }
}

impl From<ResponseMode> for String {
    fn from(mode: ResponseMode) -> Self {
        mode.label().to_string()
    }
}

/// Disabled retry placeholder carried for config compatibility.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff_multiplier: f64,
    pub retry_on: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 3,
            delay_ms: 1000,
            backoff_multiplier: 2.0,
            retry_on: vec![500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    fn is_disabled(&self) -> bool {
        !self.enabled
    }
}
