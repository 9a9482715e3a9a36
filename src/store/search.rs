//! Read-only search over the session and event directories
//!
//! The two search queries never mutate anything. The group search performs a
//! read-only join from the event directory's group scan into the session
//! directory, silently dropping names that no longer resolve. Events are
//! allowed to outlive their sessions.

use std::sync::Arc;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use super::directory::{SessionDirectory, SessionFilter};
use super::events::EventDirectory;
use super::session::SessionRecord;

/// One row of a replay search response
///
/// Field casing matches the wire format the stock server emits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplaySummary {
    /// Application version
    pub app: String,
    /// Session name
    pub session_name: String,
    /// Human-readable platform name
    pub friendly_name: String,
    /// Creation time, milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Client-reported uploaded byte count
    pub size_in_bytes: u64,
    /// Client-reported total demo time
    pub demo_time_in_ms: u32,
    /// Number of currently active viewers
    pub num_viewers: usize,
    /// Live flag
    #[serde(rename = "bIsLive")]
    pub is_live: bool,
    /// Changelist
    pub changelist: i32,
}

impl ReplaySummary {
    fn from_record(record: &SessionRecord) -> Self {
        let timestamp = record
            .created_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            app: record.app_version.clone(),
            session_name: record.name.clone(),
            friendly_name: record.friendly_name.clone(),
            timestamp,
            size_in_bytes: record.total_uploaded_bytes,
            demo_time_in_ms: record.total_demo_time_ms,
            num_viewers: record.viewers.len(),
            is_live: record.is_live,
            changelist: record.changelist,
        }
    }
}

/// Read-only search facade over both directories
pub struct SearchIndex {
    sessions: Arc<SessionDirectory>,
    events: Arc<EventDirectory>,
}

impl SearchIndex {
    /// Create a search index over the given directories
    pub fn new(sessions: Arc<SessionDirectory>, events: Arc<EventDirectory>) -> Self {
        Self { sessions, events }
    }

    /// Find replays matching the filter
    pub async fn search_replays(&self, filter: &SessionFilter) -> Vec<ReplaySummary> {
        let matched = self.sessions.find_all(filter).await;

        let mut summaries = Vec::with_capacity(matched.len());
        for session in matched {
            let record = session.read().await;
            summaries.push(ReplaySummary::from_record(&record));
        }

        summaries
    }

    /// Find replays owning at least one event in `group`
    ///
    /// Session names the event directory remembers but the session directory
    /// no longer holds are skipped without error.
    pub async fn search_replays_by_group(&self, group: &str) -> Vec<ReplaySummary> {
        let names = self.events.sessions_by_group(group).await;

        let mut summaries = Vec::new();
        for name in names {
            if let Some(session) = self.sessions.get(&name).await {
                let record = session.read().await;
                summaries.push(ReplaySummary::from_record(&record));
            } else {
                tracing::debug!(session = %name, group = %group, "Dropping dangling event reference");
            }
        }

        summaries
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::store::directory::SessionParams;

    use super::*;

    fn setup() -> (Arc<SessionDirectory>, Arc<EventDirectory>, SearchIndex) {
        let sessions = Arc::new(SessionDirectory::new());
        let events = Arc::new(EventDirectory::new());
        let search = SearchIndex::new(Arc::clone(&sessions), Arc::clone(&events));
        (sessions, events, search)
    }

    fn params(name: &str, app: &str) -> SessionParams {
        SessionParams {
            name: Some(name.to_string()),
            app_version: app.to_string(),
            net_version: "net-2".to_string(),
            changelist: Some(100),
            friendly_name: "TestPlatform".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_replays_shapes_summaries() {
        let (sessions, _events, search) = setup();
        sessions.create_or_replace(params("S", "4.27")).await;
        sessions.stop("S", 60_000, 12, 1024).await.unwrap();
        sessions.add_viewer("S", "bob").await.unwrap();

        let results = search.search_replays(&SessionFilter::any()).await;
        assert_eq!(results.len(), 1);

        let summary = &results[0];
        assert_eq!(summary.app, "4.27");
        assert_eq!(summary.session_name, "S");
        assert_eq!(summary.friendly_name, "TestPlatform");
        assert_eq!(summary.size_in_bytes, 1024);
        assert_eq!(summary.demo_time_in_ms, 60_000);
        assert_eq!(summary.num_viewers, 1);
        assert!(!summary.is_live);
        assert_eq!(summary.changelist, 100);
        assert!(summary.timestamp > 0);
    }

    #[tokio::test]
    async fn test_search_replays_applies_filter() {
        let (sessions, _events, search) = setup();
        sessions.create_or_replace(params("A", "4.27")).await;
        sessions.create_or_replace(params("B", "5.0")).await;

        let all = search.search_replays(&SessionFilter::any()).await;
        assert_eq!(all.len(), 2);

        let filtered = search
            .search_replays(&SessionFilter::any().app_version("4.27"))
            .await;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].session_name, "A");
    }

    #[tokio::test]
    async fn test_group_search_drops_dangling_sessions() {
        let (sessions, events, search) = setup();
        sessions.create_or_replace(params("alive", "4.27")).await;

        events.add("alive", "boss-fight", 0, 1, "", Bytes::new()).await;
        events.add("gone", "boss-fight", 0, 1, "", Bytes::new()).await;

        let results = search.search_replays_by_group("boss-fight").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].session_name, "alive");
    }

    #[tokio::test]
    async fn test_summary_serializes_with_wire_casing() {
        let (sessions, _events, search) = setup();
        sessions.create_or_replace(params("S", "4.27")).await;

        let results = search.search_replays(&SessionFilter::any()).await;
        let json = serde_json::to_value(&results[0]).unwrap();

        assert_eq!(json["App"], "4.27");
        assert_eq!(json["SessionName"], "S");
        assert_eq!(json["bIsLive"], false);
        assert_eq!(json["NumViewers"], 0);
        assert!(json.get("app").is_none());
    }
}
