//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`GatewayConfig`] for
//! structural errors: empty endpoint templates, malformed destination
//! URLs, unsupported schemes, and unrecognized response modes. Returns
//! a list of [`ValidationError`] values with per-field suggestions.
//!
//! Validation runs when a config file is loaded at startup or through
//! `hookpit validate`. The management API accepts any config-shaped
//! value without these checks, matching the permissive runtime surface.

use url::Url;

use super::model::{GatewayConfig, ResponseMode};
use crate::error::ValidationError;

pub const VALID_RESPONSE_MODES: &[&str] = &["INSTANT_ACK", "COLLECTIVE_ACK", "ECHO"];

/// Validate a single destination template. Returns `Ok(())` or a
/// human-readable error.
pub fn validate_endpoint(template: &str) -> Result<(), String> {
    let trimmed = template.trim();
    if trimmed.is_empty() {
        return Err("endpoint template cannot be empty".into());
    }

    // A trailing '*' is the wildcard marker; substitute a plausible
    // path so the rest of the template can be parsed as a URL.
    let test_url = trimmed
        .strip_suffix('*')
        .map_or_else(|| trimmed.to_string(), |base| format!("{base}/webhook"));

    match Url::parse(&test_url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{trimmed}' is not a valid URL")),
    }
}

pub fn validate(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (idx, template) in config.endpoints.iter().enumerate() {
        if let Err(message) = validate_endpoint(template) {
            errors.push(ValidationError {
                endpoint: format!("#{idx}"),
                field: "url".into(),
                message,
                suggestion: Some(
                    "use an absolute http(s) URL, optionally ending in '*' \
                     to append the inbound path"
                        .into(),
                ),
            });
        }
    }

    if let ResponseMode::Other(raw) = &config.response {
        errors.push(ValidationError {
            endpoint: "(root)".into(),
            field: "response".into(),
            message: format!("'{raw}' is not a recognized response mode"),
            suggestion: Some(format!("expected one of {}", VALID_RESPONSE_MODES.join(", "))),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// One-line summary used by `hookpit validate` on success.
#[must_use]
pub fn format_validation_report(path: &str, config: &GatewayConfig) -> String {
    format!(
        "{path} is valid: {} endpoint(s), response mode {}",
        config.endpoints.len(),
        config.response.label()
    )
}
