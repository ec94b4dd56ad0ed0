//! Integration tests for the management API: log inspection,
//! export/import, replay, and configuration swaps.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hookpit::config::model::GatewayConfig;
use hookpit::config::ConfigVersion;
use hookpit::server::{self, AppState, LoadedConfig, Stats};
use hookpit::store::{now_ms, EntryStatus, LogEntry, RequestLog};

fn test_state(config: GatewayConfig) -> Arc<AppState> {
    Arc::new(AppState {
        config: tokio::sync::RwLock::new(LoadedConfig {
            config: Arc::new(config),
            version: ConfigVersion::Hash("test-hash".into()),
            source_name: "test".into(),
            loaded_at: Instant::now(),
        }),
        log: RequestLog::new(100, None),
        http_client: server::build_http_client(),
        start_time: Instant::now(),
        stats: Stats::new(),
    })
}

async fn spawn_management(state: Arc<AppState>) -> SocketAddr {
    let router = server::build_management_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });
    addr
}

fn seed_entry(id: &str) -> LogEntry {
    LogEntry {
        id: id.into(),
        timestamp: now_ms(),
        method: "POST".into(),
        url: "/hooks/stripe".into(),
        raw_body: r#"{"event":"charge"}"#.into(),
        body: Some(serde_json::json!({ "event": "charge" })),
        status: EntryStatus::Pending,
        ..LogEntry::default()
    }
}

#[tokio::test]
async fn logs_list_paginates_and_reports_total() {
    let state = test_state(GatewayConfig::default());
    for i in 0..5 {
        state.log.append(seed_entry(&format!("e{i}"))).await;
    }
    let addr = spawn_management(state).await;

    let page: serde_json::Value = reqwest::get(format!("http://{addr}/api/logs?limit=2&offset=1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(page["total"], 5);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["offset"], 1);
    let requests = page["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    // Newest first.
    assert_eq!(requests[0]["id"], "e3");
    assert_eq!(requests[1]["id"], "e2");
}

#[tokio::test]
async fn get_log_returns_entry_or_not_found() {
    let state = test_state(GatewayConfig::default());
    state.log.append(seed_entry("known")).await;
    let addr = spawn_management(state).await;

    let entry: serde_json::Value = reqwest::get(format!("http://{addr}/api/logs/known"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entry["id"], "known");
    assert_eq!(entry["method"], "POST");
    assert_eq!(entry["rawBody"], r#"{"event":"charge"}"#);

    let missing = reqwest::get(format!("http://{addr}/api/logs/ghost"))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "Request not found");
}

#[tokio::test]
async fn download_then_upload_round_trips_entries() {
    let state = test_state(GatewayConfig::default());
    state.log.append(seed_entry("a")).await;
    state.log.append(seed_entry("b")).await;
    let addr = spawn_management(state).await;

    let resp = reqwest::get(format!("http://{addr}/api/logs/download"))
        .await
        .unwrap();
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"hookpit-logs-"));

    let export: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(export["total"], 2);
    assert!(export["exportedAt"].is_u64());
    assert_eq!(export["logs"].as_array().unwrap().len(), 2);

    // Import the export into a fresh instance.
    let fresh = test_state(GatewayConfig::default());
    let fresh_addr = spawn_management(fresh.clone()).await;

    let result: serde_json::Value = reqwest::Client::new()
        .post(format!("http://{fresh_addr}/api/logs/upload"))
        .json(&serde_json::json!({ "logs": export["logs"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["imported"], 2);
    assert_eq!(result["total"], 2);
    assert!(fresh.log.get("a").await.is_some());
    assert!(fresh.log.get("b").await.is_some());
}

#[tokio::test]
async fn clear_logs_empties_the_store() {
    let state = test_state(GatewayConfig::default());
    state.log.append(seed_entry("a")).await;
    let addr = spawn_management(state.clone()).await;

    let resp: serde_json::Value = reqwest::Client::new()
        .delete(format!("http://{addr}/api/logs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(resp["message"], "Logs cleared successfully");
    assert_eq!(state.log.count().await, 0);
}

#[tokio::test]
async fn put_config_swaps_the_live_config() {
    let state = test_state(GatewayConfig::default());
    let addr = spawn_management(state.clone()).await;

    let before: serde_json::Value = reqwest::get(format!("http://{addr}/api/config"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["endpoints"].as_array().unwrap().len(), 0);

    let new_config = serde_json::json!({
        "endpoints": ["https://replacement.example.com/hook"],
        "response": "ECHO",
    });
    let resp: serde_json::Value = reqwest::Client::new()
        .put(format!("http://{addr}/api/config"))
        .json(&new_config)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["message"], "Configuration updated successfully");

    let after: serde_json::Value = reqwest::get(format!("http://{addr}/api/config"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["endpoints"][0], "https://replacement.example.com/hook");
    assert_eq!(after["response"], "ECHO");

    // The swap is visible in the shared state, version and source included.
    let guard = state.config.read().await;
    assert_eq!(guard.source_name, "api");
    assert_ne!(guard.version, ConfigVersion::Hash("test-hash".into()));
}

#[tokio::test]
async fn config_download_and_upload_round_trip() {
    let initial: GatewayConfig = serde_json::from_value(serde_json::json!({
        "endpoints": ["https://a.example.com/hook", "https://b.example.com/*"],
        "response": "INSTANT_ACK",
    }))
    .unwrap();
    let state = test_state(initial);
    let addr = spawn_management(state.clone()).await;

    let resp = reqwest::get(format!("http://{addr}/api/config/download"))
        .await
        .unwrap();
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"hookpit-config-"));
    let exported: serde_json::Value = resp.json().await.unwrap();

    let fresh = test_state(GatewayConfig::default());
    let fresh_addr = spawn_management(fresh.clone()).await;

    let result: serde_json::Value = reqwest::Client::new()
        .post(format!("http://{fresh_addr}/api/config/upload"))
        .json(&exported)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["message"], "Configuration uploaded and applied successfully");

    let guard = fresh.config.read().await;
    assert_eq!(guard.source_name, "upload");
    assert_eq!(guard.config.endpoints.len(), 2);
}

#[tokio::test]
async fn version_reports_package_metadata() {
    let state = test_state(GatewayConfig::default());
    let addr = spawn_management(state).await;

    let version: serde_json::Value = reqwest::get(format!("http://{addr}/api/version"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(version["name"], "hookpit");
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn root_redirects_to_dashboard() {
    let state = test_state(GatewayConfig::default());
    let addr = spawn_management(state).await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let resp = client.get(format!("http://{addr}/")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers().get("location").unwrap(), "/dashboard");

    let dashboard = reqwest::get(format!("http://{addr}/dashboard"))
        .await
        .unwrap();
    assert_eq!(dashboard.status(), 200);
    assert!(dashboard.text().await.unwrap().contains("<html"));
}

#[tokio::test]
async fn replay_endpoint_reissues_and_reports_receipt() {
    // A destination for the replayed dispatch to land on.
    let dest = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dest_addr = dest.local_addr().unwrap();
    tokio::spawn(async move {
        let app =
            axum::Router::new().fallback(|| async { (axum::http::StatusCode::OK, "ok") });
        axum::serve(dest, app).await.unwrap();
    });

    let config: GatewayConfig = serde_json::from_value(serde_json::json!({
        "endpoints": [format!("http://{dest_addr}/hook")],
        "response": "COLLECTIVE_ACK",
    }))
    .unwrap();
    let state = test_state(config);
    state.log.append(seed_entry("original")).await;
    let addr = spawn_management(state.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/logs/original/replay"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let receipt: serde_json::Value = resp.json().await.unwrap();

    assert_eq!(receipt["message"], "Request replayed successfully");
    assert_eq!(receipt["originalId"], "original");
    let replay_id = receipt["replayId"].as_str().unwrap();
    assert!(replay_id.starts_with("replay-"));
    assert_eq!(receipt["status"], 200);

    assert_eq!(state.log.count().await, 2);
    assert!(state.log.get(replay_id).await.is_some());
    assert_eq!(
        state.stats.replayed.load(std::sync::atomic::Ordering::Relaxed),
        1
    );
}

#[tokio::test]
async fn replay_of_unknown_entry_is_not_found() {
    let state = test_state(GatewayConfig::default());
    let addr = spawn_management(state).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/logs/ghost/replay"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Request not found");
}

// Management calls never show up in the capture log.
#[tokio::test]
async fn management_traffic_is_not_captured() {
    let state = test_state(GatewayConfig::default());
    let addr = spawn_management(state.clone()).await;

    reqwest::get(format!("http://{addr}/api/version"))
        .await
        .unwrap();
    reqwest::get(format!("http://{addr}/api/logs"))
        .await
        .unwrap();

    assert_eq!(state.log.count().await, 0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(
        state.stats.captured.load(std::sync::atomic::Ordering::Relaxed),
        0
    );
}
