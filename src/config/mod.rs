//! Configuration loading and validation.
//!
//! Defines the [`ConfigSource`] trait for pluggable startup config
//! backends and the [`ConfigVersion`] enum used to identify the loaded
//! value in health output. Submodules provide the data model,
//! validation logic, and concrete file-based source implementations.
//!
//! After startup the live config is owned by
//! [`AppState`](crate::server::AppState) and replaced wholesale through
//! the management API; there is no file polling or hot-reload loop.

pub mod model;
pub mod sources;
pub mod validation;

use async_trait::async_trait;

use crate::error::HookpitError;
use model::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits (Rust 1.75+) does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<(GatewayConfig, ConfigVersion), HookpitError>;
}
