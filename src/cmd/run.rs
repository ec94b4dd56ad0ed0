//! `hookpit run` — start the gateway.
//!
//! Loads the startup configuration (explicit file, auto-detected file,
//! or built-in defaults), then serves two Axum servers until shutdown:
//! the capture server receiving webhook traffic and the management
//! server exposing the inspection/replay API and dashboard.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::RunArgs;
use crate::config::model::GatewayConfig;
use crate::config::sources::{self, sha256_hex};
use crate::config::{ConfigSource, ConfigVersion};
use crate::error::HookpitError;
use crate::logging;
use crate::server::{self, AppState, LoadedConfig, Stats};
use crate::store::RequestLog;

pub async fn execute(args: RunArgs) -> Result<(), HookpitError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = args
        .sentry_dsn
        .as_ref()
        .map(|dsn| crate::sentry_integration::init(dsn, args.sentry_environment.as_deref()));

    let (config, version, source_name) = load_startup_config(args.config.as_deref()).await?;

    let endpoint_count = config.endpoints.len();
    let response_mode = config.response.label().to_string();

    let log = RequestLog::new(args.log_capacity, args.logs_dir.clone());
    log.ensure_persistence_dir().await;

    let state = Arc::new(AppState {
        config: tokio::sync::RwLock::new(LoadedConfig {
            config: Arc::new(config),
            version,
            source_name,
            loaded_at: Instant::now(),
        }),
        log,
        http_client: server::build_http_client(),
        start_time: Instant::now(),
        stats: Stats::new(),
    });

    let capture_router = server::build_capture_router(state.clone(), args.max_body);
    let management_router = server::build_management_router(state);

    let capture_addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let management_addr: SocketAddr = format!("{}:{}", args.host, args.management_port).parse()?;

    let capture_listener = tokio::net::TcpListener::bind(capture_addr).await?;
    let management_listener = tokio::net::TcpListener::bind(management_addr).await?;

    tracing::info!(
        capture = %capture_addr,
        management = %management_addr,
        endpoints = endpoint_count,
        mode = %response_mode,
        "hookpit started"
    );

    // One shutdown signal fans out to both servers.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        server::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut capture_rx = shutdown_rx.clone();
    let mut management_rx = shutdown_rx;

    let capture = axum::serve(capture_listener, capture_router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = capture_rx.changed().await;
        });
    let management = axum::serve(management_listener, management_router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = management_rx.changed().await;
        });

    tokio::try_join!(capture, management)?;

    tracing::info!("hookpit stopped");
    Ok(())
}

/// Resolve the startup config: explicit file, auto-detected file in the
/// working directory, or built-in defaults (capture everything, no
/// destinations, instant ack).
async fn load_startup_config(
    explicit: Option<&std::path::Path>,
) -> Result<(GatewayConfig, ConfigVersion, String), HookpitError> {
    if let Some(path) = explicit {
        let source = create_file_source(path)?;
        let (config, version) = source.load().await?;
        return Ok((config, version, source.name().to_string()));
    }

    let candidates = ["hookpit.yaml", "hookpit.yml", "hookpit.json", "hookpit.toml"];

    for name in &candidates {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            let source = create_file_source(&path)?;
            let (config, version) = source.load().await?;
            return Ok((config, version, source.name().to_string()));
        }
    }

    tracing::info!("no config file found, starting with defaults");
    let config = GatewayConfig::default();
    let version = serde_json::to_string(&config)
        .map(|s| ConfigVersion::Hash(sha256_hex(s.as_bytes())))
        .unwrap_or_else(|_| ConfigVersion::Hash(String::new()));
    Ok((config, version, "default".to_string()))
}

fn create_file_source(path: &std::path::Path) -> Result<Box<dyn ConfigSource>, HookpitError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(sources::yaml::new(path.to_path_buf()))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(sources::json::new(path.to_path_buf()))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(sources::toml_source::new(path.to_path_buf()))),

        other => Err(HookpitError::UnsupportedFormat(other.to_string())),
    }
}
