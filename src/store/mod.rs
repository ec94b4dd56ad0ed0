//! Bounded in-memory request log with optional on-disk persistence.
//!
//! [`RequestLog`] keeps captured requests newest-first in a ring of
//! configurable capacity, evicting the oldest when full. When a
//! persistence directory is configured, every entry is additionally
//! written (and rewritten on update) as `<id>.json`; persistence
//! failures are logged and ignored, the in-memory log stays the source
//! of truth.
//!
//! [`RequestLog::record_fanout`] is the result recorder: it attaches a
//! full dispatch attempt's results to an entry and recomputes the
//! aggregate status from scratch. A missing entry (evicted between the
//! original capture and an async completion) is a silent no-op.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::gateway::fanout::DispatchResult;
use crate::gateway::headers::collapse_headers;
use crate::gateway::InboundRequest;

pub const DEFAULT_CAPACITY: usize = 1000;

/// Milliseconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Pending,
    Success,
    Warning,
    Error,
}

/// One captured request. Field names follow the export wire format, so
/// downloaded logs can be re-imported unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: u64,
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub raw_body: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanout_results: Option<Vec<DispatchResult>>,
}

impl LogEntry {
    #[must_use]
    pub fn from_inbound(inbound: &InboundRequest, id: &str) -> Self {
        Self {
            id: id.to_string(),
            timestamp: now_ms(),
            method: inbound.method.to_string(),
            url: inbound.original_url.clone(),
            headers: collapse_headers(&inbound.headers),
            query: inbound.query.clone(),
            body: inbound.json_body.clone(),
            raw_body: String::from_utf8_lossy(&inbound.raw_body).into_owned(),
            status: EntryStatus::Pending,
            fanout_results: None,
        }
    }
}

/// Derive the aggregate status for one dispatch attempt. Recomputed
/// wholesale every time results are written, never accumulated. An
/// empty result set yields `None` and leaves the entry status alone.
#[must_use]
pub fn derive_status(results: &[DispatchResult]) -> Option<EntryStatus> {
    if results.is_empty() {
        return None;
    }
    let succeeded = results.iter().filter(|r| r.response.is_success()).count();
    Some(if succeeded == results.len() {
        EntryStatus::Success
    } else if succeeded == 0 {
        EntryStatus::Error
    } else {
        EntryStatus::Warning
    })
}

pub struct RequestLog {
    entries: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
    persist_dir: Option<PathBuf>,
}

impl RequestLog {
    #[must_use]
    pub fn new(capacity: usize, persist_dir: Option<PathBuf>) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity,
            persist_dir,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create the persistence directory if one is configured. Failure
    /// downgrades persistence to a warning; capture keeps working.
    pub async fn ensure_persistence_dir(&self) {
        if let Some(ref dir) = self.persist_dir {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to create logs directory");
            }
        }
    }

    pub async fn append(&self, entry: LogEntry) {
        {
            let mut entries = self.entries.write().await;
            entries.push_front(entry.clone());
            entries.truncate(self.capacity);
        }
        self.persist(&entry).await;
    }

    pub async fn get(&self, id: &str) -> Option<LogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Newest-first page of entries.
    pub async fn get_all(&self, limit: usize, offset: usize) -> Vec<LogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Bulk-import entries (log upload). Returns how many were added.
    pub async fn import(&self, imported: Vec<LogEntry>) -> usize {
        let count = imported.len();
        for entry in imported {
            self.append(entry).await;
        }
        count
    }

    /// Attach one dispatch attempt's full result set to an entry and
    /// recompute its aggregate status. Missing entries are a no-op.
    pub async fn record_fanout(&self, id: &str, results: Vec<DispatchResult>) {
        let updated = {
            let mut entries = self.entries.write().await;
            match entries.iter_mut().find(|e| e.id == id) {
                Some(entry) => {
                    if let Some(status) = derive_status(&results) {
                        entry.status = status;
                    }
                    entry.fanout_results = Some(results);
                    Some(entry.clone())
                }
                None => {
                    tracing::debug!(id = %id, "fan-out results for evicted entry, dropping");
                    None
                }
            }
        };
        if let Some(entry) = updated {
            self.persist(&entry).await;
        }
    }

    async fn persist(&self, entry: &LogEntry) {
        let Some(ref dir) = self.persist_dir else {
            return;
        };
        // Captured and replayed ids are UUID-derived, but imported
        // entries carry arbitrary ids; anything that could resolve
        // outside the logs directory is kept in memory only.
        if entry.id.is_empty() || entry.id.contains(['/', '\\']) || entry.id.contains("..") {
            tracing::warn!(id = %entry.id, "log entry id unsafe as a file name, not persisting");
            return;
        }
        let path = dir.join(format!("{}.json", entry.id));
        match serde_json::to_vec_pretty(entry) {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(&path, bytes).await {
                    tracing::warn!(path = %path.display(), error = %e, "failed to persist log entry");
                }
            }
            Err(e) => {
                tracing::warn!(id = %entry.id, error = %e, "failed to serialize log entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fanout::DispatchOutcome;

    fn entry(id: &str) -> LogEntry {
        LogEntry {
            id: id.into(),
            timestamp: now_ms(),
            method: "POST".into(),
            url: "/hook".into(),
            status: EntryStatus::Pending,
            ..LogEntry::default()
        }
    }

    fn result(status: Option<u16>) -> DispatchResult {
        DispatchResult {
            url: "https://x.example/hook".into(),
            ms: 1,
            response: match status {
                Some(status) => DispatchOutcome::Success {
                    status,
                    headers: HashMap::new(),
                    body: String::new(),
                },
                None => DispatchOutcome::Failure {
                    error: true,
                    message: "unreachable".into(),
                },
            },
        }
    }

    #[tokio::test]
    async fn append_evicts_oldest_beyond_capacity() {
        let log = RequestLog::new(3, None);
        for i in 0..5 {
            log.append(entry(&format!("e{i}"))).await;
        }

        assert_eq!(log.count().await, 3);
        // Newest first; e0 and e1 were evicted.
        let all = log.get_all(10, 0).await;
        assert_eq!(all[0].id, "e4");
        assert!(log.get("e0").await.is_none());
        assert!(log.get("e1").await.is_none());
    }

    #[tokio::test]
    async fn get_all_paginates_newest_first() {
        let log = RequestLog::new(10, None);
        for i in 0..5 {
            log.append(entry(&format!("e{i}"))).await;
        }

        let page = log.get_all(2, 1).await;
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "e3");
        assert_eq!(page[1].id, "e2");
    }

    #[tokio::test]
    async fn record_fanout_sets_results_and_status() {
        let log = RequestLog::new(10, None);
        log.append(entry("a")).await;

        log.record_fanout("a", vec![result(Some(200)), result(Some(204))])
            .await;

        let stored = log.get("a").await.unwrap();
        assert_eq!(stored.status, EntryStatus::Success);
        assert_eq!(stored.fanout_results.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn record_fanout_overwrites_prior_results() {
        let log = RequestLog::new(10, None);
        log.append(entry("a")).await;

        log.record_fanout("a", vec![result(Some(200))]).await;
        log.record_fanout("a", vec![result(None), result(None)]).await;

        let stored = log.get("a").await.unwrap();
        assert_eq!(stored.status, EntryStatus::Error);
        assert_eq!(stored.fanout_results.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn record_fanout_for_missing_entry_is_noop() {
        let log = RequestLog::new(10, None);
        log.record_fanout("ghost", vec![result(Some(200))]).await;
        assert_eq!(log.count().await, 0);
    }

    #[tokio::test]
    async fn empty_results_leave_status_pending() {
        let log = RequestLog::new(10, None);
        log.append(entry("a")).await;

        log.record_fanout("a", Vec::new()).await;

        assert_eq!(log.get("a").await.unwrap().status, EntryStatus::Pending);
    }

    #[tokio::test]
    async fn import_counts_entries() {
        let log = RequestLog::new(10, None);
        let added = log.import(vec![entry("x"), entry("y")]).await;
        assert_eq!(added, 2);
        assert_eq!(log.count().await, 2);
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hookpit-store-{tag}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn append_persists_entry_as_json_file() {
        let dir = scratch_dir("append");
        let log = RequestLog::new(10, Some(dir.clone()));
        log.ensure_persistence_dir().await;

        log.append(entry("a")).await;

        let bytes = tokio::fs::read(dir.join("a.json")).await.unwrap();
        let stored: LogEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stored.id, "a");
        assert_eq!(stored.status, EntryStatus::Pending);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn record_fanout_rewrites_persisted_file() {
        let dir = scratch_dir("rewrite");
        let log = RequestLog::new(10, Some(dir.clone()));
        log.ensure_persistence_dir().await;
        log.append(entry("a")).await;

        log.record_fanout("a", vec![result(Some(200))]).await;

        let bytes = tokio::fs::read(dir.join("a.json")).await.unwrap();
        let stored: LogEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stored.status, EntryStatus::Success);
        assert_eq!(stored.fanout_results.unwrap().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn traversal_ids_are_kept_in_memory_only() {
        let dir = scratch_dir("traversal");
        let log = RequestLog::new(10, Some(dir.clone()));
        log.ensure_persistence_dir().await;

        // Imported ids are arbitrary strings; one shaped like a relative
        // path must not produce a file outside the logs directory.
        log.append(entry("../escaped")).await;

        assert!(log.get("../escaped").await.is_some());
        assert!(!dir.parent().unwrap().join("escaped.json").exists());
        let mut listing = tokio::fs::read_dir(&dir).await.unwrap();
        assert!(listing.next_entry().await.unwrap().is_none());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn persistence_failure_does_not_block_capture() {
        // Directory deliberately never created; the write fails but the
        // entry still lands in memory.
        let dir = scratch_dir("missing").join("nested");
        let log = RequestLog::new(10, Some(dir));

        log.append(entry("a")).await;

        assert!(log.get("a").await.is_some());
    }

    #[test]
    fn aggregate_status_table() {
        let all_ok = [result(Some(200)), result(Some(201)), result(Some(299))];
        let none_ok = [result(Some(500)), result(Some(404)), result(None)];
        let mixed = [result(Some(200)), result(None), result(Some(503))];

        assert_eq!(derive_status(&all_ok), Some(EntryStatus::Success));
        assert_eq!(derive_status(&none_ok), Some(EntryStatus::Error));
        assert_eq!(derive_status(&mixed), Some(EntryStatus::Warning));
        assert_eq!(derive_status(&[]), None);
    }
}
