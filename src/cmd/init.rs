//! `hookpit init` — generate a starter configuration file.
//!
//! Creates a YAML, JSON, or TOML config file with either minimal
//! or fully documented templates.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::HookpitError;

pub fn execute(args: &InitArgs) -> Result<(), HookpitError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("hookpit.{}", args.format.extension())));

    if output.exists() {
        return Err(HookpitError::FileExists { path: output });
    }

    let content = match (&args.format, args.full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    };

    std::fs::write(&output, content)?;
    println!("Created {}", output.display());
    Ok(())
}

const YAML_MINIMAL: &str = r#"# Hookpit gateway config

endpoints:
  - "http://localhost:3000/hook"
response: "COLLECTIVE_ACK"
"#;

const YAML_FULL: &str = r#"# Hookpit gateway config
#
# endpoints: ordered list of destinations every captured request is
# relayed to. A trailing '*' appends the inbound path+query, e.g.
# "https://mirror.example.com/*" receives POST /webhook/stripe as
# POST https://mirror.example.com/webhook/stripe.
endpoints:
  - "https://primary.example.com/hooks/stripe"
  - "https://mirror.example.com/*"

# response: how the webhook caller is answered.
#   INSTANT_ACK     200 OK immediately, relay settles in the background
#   COLLECTIVE_ACK  wait for every destination, answer with all results
#   ECHO            no relay, echo the received payload back
response: "INSTANT_ACK"

# Retry placeholder — accepted for forward compatibility, not acted on.
# retry:
#   enabled: false
#   maxAttempts: 3
#   delayMs: 1000
#   backoffMultiplier: 2.0
#   retryOn: [500, 502, 503, 504]
"#;

const JSON_MINIMAL: &str = r#"{
  "endpoints": ["http://localhost:3000/hook"],
  "response": "COLLECTIVE_ACK"
}
"#;

const JSON_FULL: &str = r#"{
  "endpoints": [
    "https://primary.example.com/hooks/stripe",
    "https://mirror.example.com/*"
  ],
  "response": "INSTANT_ACK",
  "retry": {
    "enabled": false,
    "maxAttempts": 3,
    "delayMs": 1000,
    "backoffMultiplier": 2.0,
    "retryOn": [500, 502, 503, 504]
  }
}
"#;

const TOML_MINIMAL: &str = r#"# Hookpit gateway config

endpoints = ["http://localhost:3000/hook"]
response = "COLLECTIVE_ACK"
"#;

const TOML_FULL: &str = r#"# Hookpit gateway config
#
# A trailing '*' in an endpoint appends the inbound path+query.
endpoints = [
  "https://primary.example.com/hooks/stripe",
  "https://mirror.example.com/*",
]

# INSTANT_ACK | COLLECTIVE_ACK | ECHO
response = "INSTANT_ACK"

# Retry placeholder — accepted for forward compatibility, not acted on.
[retry]
enabled = false
maxAttempts = 3
delayMs = 1000
backoffMultiplier = 2.0
retryOn = [500, 502, 503, 504]
"#;
