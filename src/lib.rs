//! Hookpit is a webhook capture-and-relay gateway.
//!
//! It accepts inbound HTTP requests on a capture port, records each one
//! in a bounded request log, and fans the request out to a configurable
//! list of downstream endpoints concurrently. A management surface on a
//! second port exposes inspection, replay, export/import, and live
//! configuration swaps.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Configuration model, validation, and startup file loading via
//!   the [`ConfigSource`](config::ConfigSource) trait.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`gateway`] -- Core capture pipeline: header sanitizing, concurrent fan-out,
//!   response-strategy selection, and replay of stored requests.
//! - [`store`] -- Bounded in-memory request log with optional on-disk persistence.
//! - [`api`] -- Management router: log inspection, replay, export/import, config.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `sentry-integration` | Sentry error tracking |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod logging;
pub mod server;
pub mod store;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
