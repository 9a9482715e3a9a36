//! Session directory implementation
//!
//! The central directory that owns every replay session: creation and
//! overwrite, header/chunk uploads, aggregate stats, user lists, and viewer
//! presence. The periodic inactivity sweep lives here too.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::RwLock;

use super::config::StoreConfig;
use super::error::{Result, StoreError};
use super::ids::random_hex_id;
use super::session::{SessionFile, SessionRecord};

/// Parameters for creating a session
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    /// Explicit session name; a random 128-bit hex id is generated if absent
    pub name: Option<String>,
    /// Application version
    pub app_version: String,
    /// Network protocol version
    pub net_version: String,
    /// Changelist; defaults to 0 when the client omits it
    pub changelist: Option<i32>,
    /// Human-readable platform name
    pub friendly_name: String,
}

/// Conjunctive filter for session searches
///
/// Every populated field must match; absent fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Exact application version
    pub app_version: Option<String>,
    /// Exact changelist
    pub changelist: Option<i32>,
    /// Exact network version
    pub net_version: Option<String>,
    /// Username that must appear in the session's user list
    pub username: Option<String>,
}

impl SessionFilter {
    /// Filter matching every session
    pub fn any() -> Self {
        Self::default()
    }

    /// Require an exact application version
    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    /// Require an exact changelist
    pub fn changelist(mut self, cl: i32) -> Self {
        self.changelist = Some(cl);
        self
    }

    /// Require an exact network version
    pub fn net_version(mut self, version: impl Into<String>) -> Self {
        self.net_version = Some(version.into());
        self
    }

    /// Require a username in the session's user list
    pub fn username(mut self, user: impl Into<String>) -> Self {
        self.username = Some(user.into());
        self
    }

    fn matches(&self, record: &SessionRecord) -> bool {
        if let Some(ref app) = self.app_version {
            if record.app_version != *app {
                return false;
            }
        }
        if let Some(cl) = self.changelist {
            if record.changelist != cl {
                return false;
            }
        }
        if let Some(ref net) = self.net_version {
            if record.net_version != *net {
                return false;
            }
        }
        if let Some(ref user) = self.username {
            if !record.users.iter().any(|u| u == user) {
                return false;
            }
        }
        true
    }
}

/// Snapshot handed to a viewer on start-downloading
///
/// Built under the session's lock so the id and the stats are consistent.
#[derive(Debug, Clone)]
pub struct ViewerTicket {
    /// Freshly issued viewer id, to be used for all heartbeats
    pub viewer_id: String,
    /// Client-reported total chunk count
    pub num_chunks: u32,
    /// Client-reported total demo time in milliseconds
    pub demo_time_ms: u32,
    /// Wire state label ("Live" or empty)
    pub state: String,
}

/// A chunk payload plus the per-session stats emitted as response headers
#[derive(Debug, Clone)]
pub struct ChunkData {
    /// Raw chunk bytes, returned unmodified
    pub data: Bytes,
    /// Client-reported total chunk count
    pub num_chunks: u32,
    /// Client-reported total demo time in milliseconds
    pub demo_time_ms: u32,
    /// Wire state label ("Live" or empty)
    pub state: String,
    /// Start-of-range marker; the stock server sends 0 for non-live replays
    pub mtime1: u32,
    /// End of the chunk's covered time range
    pub mtime2: u32,
}

/// Central directory for all replay sessions
///
/// The top-level map has its own lock; each session record has another. Only
/// the map lock is held to resolve a name, so concurrent uploads to
/// different sessions never serialize against each other.
pub struct SessionDirectory {
    /// Map of session name to session record
    sessions: RwLock<HashMap<String, Arc<RwLock<SessionRecord>>>>,

    /// Configuration
    config: StoreConfig,
}

impl SessionDirectory {
    /// Create a new directory with default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a new directory with custom configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the directory configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Resolve a session name to its record handle
    async fn session(&self, name: &str) -> Result<Arc<RwLock<SessionRecord>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(name.to_string()))
    }

    /// Create a session, replacing any existing one with the same name
    ///
    /// Replacement discards the prior record entirely: chunks, header,
    /// viewers, and stats are gone, not migrated. Returns the session name.
    pub async fn create_or_replace(&self, params: SessionParams) -> String {
        let name = params.name.unwrap_or_else(random_hex_id);

        let record = SessionRecord::new(
            name.clone(),
            params.app_version,
            params.net_version,
            params.changelist.unwrap_or(0),
            params.friendly_name,
        );

        let mut sessions = self.sessions.write().await;
        let replaced = sessions
            .insert(name.clone(), Arc::new(RwLock::new(record)))
            .is_some();

        tracing::info!(session = %name, replaced = replaced, "Session created");

        name
    }

    /// Set (or overwrite) the session's header
    ///
    /// `num_chunks_hint` is accepted from the wire but only logged; the
    /// header upload does not change the chunk aggregate.
    pub async fn set_header(
        &self,
        name: &str,
        file: SessionFile,
        num_chunks_hint: u32,
        demo_time_ms: u32,
    ) -> Result<()> {
        let session = self.session(name).await?;
        let mut record = session.write().await;

        record.header = Some(file);
        record.total_demo_time_ms = demo_time_ms;

        tracing::debug!(
            session = %name,
            demo_time_ms = demo_time_ms,
            num_chunks_hint = num_chunks_hint,
            "Header set"
        );

        Ok(())
    }

    /// Append a chunk and overwrite the client-reported aggregates
    ///
    /// The three counters are taken verbatim from the caller; the store
    /// never recomputes them from actual chunk sizes.
    pub async fn add_chunk(
        &self,
        name: &str,
        file: SessionFile,
        demo_time_ms: u32,
        total_chunks: u32,
        total_bytes: u64,
    ) -> Result<()> {
        let session = self.session(name).await?;
        let mut record = session.write().await;

        record.append_chunk(file);
        record.total_demo_time_ms = demo_time_ms;
        record.total_chunks = total_chunks;
        record.total_uploaded_bytes = total_bytes;

        tracing::debug!(
            session = %name,
            stored_chunks = record.chunk_count(),
            total_chunks = total_chunks,
            total_bytes = total_bytes,
            demo_time_ms = demo_time_ms,
            "Chunk appended"
        );

        Ok(())
    }

    /// Final aggregate update when the client stops uploading
    ///
    /// Does not transition the live flag; no operation does.
    pub async fn stop(
        &self,
        name: &str,
        demo_time_ms: u32,
        total_chunks: u32,
        total_bytes: u64,
    ) -> Result<()> {
        let session = self.session(name).await?;
        let mut record = session.write().await;

        record.total_demo_time_ms = demo_time_ms;
        record.total_chunks = total_chunks;
        record.total_uploaded_bytes = total_bytes;

        tracing::info!(
            session = %name,
            total_chunks = total_chunks,
            total_bytes = total_bytes,
            demo_time_ms = demo_time_ms,
            "Upload stopped"
        );

        Ok(())
    }

    /// Replace the session's user list
    pub async fn set_users(&self, name: &str, users: Vec<String>) -> Result<()> {
        let session = self.session(name).await?;
        let mut record = session.write().await;

        tracing::debug!(session = %name, users = users.len(), "User list replaced");
        record.users = users;

        Ok(())
    }

    /// Fetch the header payload
    pub async fn get_header(&self, name: &str) -> Result<Bytes> {
        let session = self.session(name).await?;
        let record = session.read().await;

        record
            .header
            .as_ref()
            .map(|file| file.data.clone())
            .ok_or_else(|| StoreError::HeaderNotFound(name.to_string()))
    }

    /// Fetch a chunk by position, with the stats the transport echoes back
    pub async fn get_chunk(&self, name: &str, index: usize) -> Result<ChunkData> {
        let session = self.session(name).await?;
        let record = session.read().await;

        let file = record.chunk(index).ok_or_else(|| StoreError::ChunkNotFound {
            session: name.to_string(),
            index,
        })?;

        Ok(ChunkData {
            data: file.data.clone(),
            num_chunks: record.total_chunks,
            demo_time_ms: record.total_demo_time_ms,
            state: record.state_label().to_string(),
            mtime1: 0,
            mtime2: file.end_time_ms,
        })
    }

    /// Get a handle to a session record
    pub async fn get(&self, name: &str) -> Option<Arc<RwLock<SessionRecord>>> {
        self.sessions.read().await.get(name).cloned()
    }

    /// Find every session matching the filter
    ///
    /// Iteration order is unspecified but stable for an unmodified directory.
    pub async fn find_all(&self, filter: &SessionFilter) -> Vec<Arc<RwLock<SessionRecord>>> {
        let sessions = self.sessions.read().await;

        let mut matched = Vec::new();
        for session in sessions.values() {
            let record = session.read().await;
            if filter.matches(&record) {
                matched.push(Arc::clone(session));
            }
        }

        matched
    }

    /// Register a viewer, returning its ticket
    ///
    /// The id and the aggregate snapshot come from one critical section, so
    /// the start-downloading response is internally consistent.
    pub async fn add_viewer(&self, name: &str, username: &str) -> Result<ViewerTicket> {
        let session = self.session(name).await?;
        let mut record = session.write().await;

        let viewer_id = record.viewers.add(username, Instant::now());

        tracing::info!(
            session = %name,
            viewer_id = %viewer_id,
            user = %username,
            viewers = record.viewers.len(),
            "Viewer added"
        );

        Ok(ViewerTicket {
            viewer_id,
            num_chunks: record.total_chunks,
            demo_time_ms: record.total_demo_time_ms,
            state: record.state_label().to_string(),
        })
    }

    /// Process a viewer heartbeat
    ///
    /// Unknown session is an error; unknown viewer id is not (the viewer may
    /// have just been expired by the sweep).
    pub async fn viewer_heartbeat(&self, name: &str, viewer_id: &str, is_final: bool) -> Result<()> {
        let session = self.session(name).await?;
        let mut record = session.write().await;

        record.viewers.heartbeat(viewer_id, is_final, Instant::now());

        tracing::debug!(
            session = %name,
            viewer_id = %viewer_id,
            is_final = is_final,
            "Viewer heartbeat"
        );

        Ok(())
    }

    /// Run the viewer inactivity sweep once, against the current time
    pub async fn sweep_viewers(&self) {
        self.sweep_viewers_at(Instant::now()).await;
    }

    /// Run the viewer inactivity sweep once, against `now`
    ///
    /// Snapshots the session list under the map read lock, then takes each
    /// session's own lock in turn. The map lock is not held while sweeping,
    /// so request handlers on unrelated sessions are never blocked for more
    /// than one session's critical section.
    pub async fn sweep_viewers_at(&self, now: Instant) {
        let snapshot: Vec<(String, Arc<RwLock<SessionRecord>>)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .map(|(name, session)| (name.clone(), Arc::clone(session)))
                .collect()
        };

        for (name, session) in snapshot {
            let mut record = session.write().await;
            for username in record.viewers.sweep(now, self.config.viewer_timeout) {
                tracing::info!(session = %name, user = %username, "Viewer expired");
            }
        }
    }

    /// Spawn the periodic sweep task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_sweep_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let directory = Arc::clone(self);
        let interval = directory.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                directory.sweep_viewers().await;
            }
        })
    }

    /// Total number of sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn params(name: &str) -> SessionParams {
        SessionParams {
            name: Some(name.to_string()),
            app_version: "4.27".to_string(),
            net_version: "net-2".to_string(),
            changelist: Some(100),
            friendly_name: "TestPlatform".to_string(),
        }
    }

    fn chunk(data: &'static [u8], index: u32) -> SessionFile {
        SessionFile::chunk(format!("stream.{}", index), Bytes::from_static(data), 0, 1000, index)
    }

    #[tokio::test]
    async fn test_create_generates_name_when_absent() {
        let dir = SessionDirectory::new();

        let name = dir
            .create_or_replace(SessionParams {
                name: None,
                app_version: "4.27".into(),
                ..Default::default()
            })
            .await;

        assert_eq!(name.len(), 32);
        assert!(dir.get(&name).await.is_some());
    }

    #[tokio::test]
    async fn test_create_with_same_name_discards_prior_state() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("S")).await;

        dir.add_chunk("S", chunk(b"data", 0), 1000, 1, 4).await.unwrap();
        dir.set_header("S", SessionFile::header("replay.header", Bytes::from_static(b"hdr")), 1, 1000)
            .await
            .unwrap();
        dir.add_viewer("S", "bob").await.unwrap();

        // Overwrite: not a merge
        dir.create_or_replace(params("S")).await;

        let session = dir.get("S").await.unwrap();
        let record = session.read().await;
        assert_eq!(record.chunk_count(), 0);
        assert!(record.header.is_none());
        assert!(record.viewers.is_empty());
        assert_eq!(record.total_chunks, 0);
        assert_eq!(dir.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_chunks_round_trip_in_append_order() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("S")).await;

        let payloads: [&'static [u8]; 3] = [b"alpha", b"beta", b"gamma"];
        for (i, payload) in payloads.iter().enumerate() {
            dir.add_chunk("S", chunk(payload, i as u32), 1000, i as u32 + 1, 64)
                .await
                .unwrap();
        }

        for (i, payload) in payloads.iter().enumerate() {
            let data = dir.get_chunk("S", i).await.unwrap();
            assert_eq!(data.data.as_ref(), *payload);
        }
    }

    #[tokio::test]
    async fn test_get_chunk_out_of_range() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("S")).await;
        dir.add_chunk("S", chunk(b"only", 0), 1000, 1, 4).await.unwrap();

        let err = dir.get_chunk("S", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::ChunkNotFound { index: 1, .. }));

        let err = dir.get_chunk("missing", 0).await.unwrap_err();
        assert!(matches!(err, StoreError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_chunk_data_carries_session_stats() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("S")).await;

        let file = SessionFile::chunk("stream.0", Bytes::from_static(b"c"), 500, 1500, 0);
        dir.add_chunk("S", file, 9000, 7, 12345).await.unwrap();

        let data = dir.get_chunk("S", 0).await.unwrap();
        assert_eq!(data.num_chunks, 7);
        assert_eq!(data.demo_time_ms, 9000);
        assert_eq!(data.state, "");
        assert_eq!(data.mtime1, 0);
        assert_eq!(data.mtime2, 1500);
    }

    #[tokio::test]
    async fn test_mutations_on_unknown_session() {
        let dir = SessionDirectory::new();

        assert!(dir.stop("nope", 0, 0, 0).await.is_err());
        assert!(dir.set_users("nope", vec![]).await.is_err());
        assert!(dir
            .set_header("nope", SessionFile::header("replay.header", Bytes::new()), 0, 0)
            .await
            .is_err());
        assert!(dir.add_viewer("nope", "bob").await.is_err());
        assert!(dir.get_header("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_header_overwritten_on_resend() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("S")).await;

        dir.set_header("S", SessionFile::header("replay.header", Bytes::from_static(b"v1")), 0, 100)
            .await
            .unwrap();
        dir.set_header("S", SessionFile::header("replay.header", Bytes::from_static(b"v2")), 0, 200)
            .await
            .unwrap();

        assert_eq!(dir.get_header("S").await.unwrap().as_ref(), b"v2");
        let session = dir.get("S").await.unwrap();
        assert_eq!(session.read().await.total_demo_time_ms, 200);
    }

    #[tokio::test]
    async fn test_find_all_conjunctive_filter() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("A")).await;
        dir.create_or_replace(SessionParams {
            name: Some("B".into()),
            app_version: "4.27".into(),
            net_version: "net-3".into(),
            changelist: Some(200),
            friendly_name: "Other".into(),
        })
        .await;
        dir.create_or_replace(SessionParams {
            name: Some("C".into()),
            app_version: "5.0".into(),
            net_version: "net-2".into(),
            changelist: Some(100),
            friendly_name: "Other".into(),
        })
        .await;
        dir.set_users("A", vec!["bob".into()]).await.unwrap();

        // No filters: everything
        assert_eq!(dir.find_all(&SessionFilter::any()).await.len(), 3);

        // Single predicate
        let by_app = dir.find_all(&SessionFilter::any().app_version("4.27")).await;
        assert_eq!(by_app.len(), 2);

        // Conjunction
        let both = dir
            .find_all(&SessionFilter::any().app_version("4.27").changelist(100))
            .await;
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].read().await.name, "A");

        // Username predicate
        let by_user = dir.find_all(&SessionFilter::any().username("bob")).await;
        assert_eq!(by_user.len(), 1);

        let none = dir
            .find_all(&SessionFilter::any().app_version("4.27").net_version("nope"))
            .await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_viewer_lifecycle_through_directory() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("S")).await;
        dir.add_chunk("S", chunk(b"x", 0), 4000, 3, 100).await.unwrap();

        let ticket = dir.add_viewer("S", "bob").await.unwrap();
        assert_eq!(ticket.num_chunks, 3);
        assert_eq!(ticket.demo_time_ms, 4000);
        assert_eq!(ticket.state, "");

        // Re-add replaces the previous entry
        let second = dir.add_viewer("S", "bob").await.unwrap();
        assert_ne!(ticket.viewer_id, second.viewer_id);
        {
            let session = dir.get("S").await.unwrap();
            assert_eq!(session.read().await.viewers.len(), 1);
        }

        // Final heartbeat disconnects
        dir.viewer_heartbeat("S", &second.viewer_id, true).await.unwrap();
        let session = dir.get("S").await.unwrap();
        assert!(session.read().await.viewers.is_empty());

        // Trailing heartbeat after removal is not an error
        dir.viewer_heartbeat("S", &second.viewer_id, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_expires_quiet_viewers() {
        let dir = SessionDirectory::new();
        dir.create_or_replace(params("S")).await;
        dir.add_viewer("S", "bob").await.unwrap();

        let now = Instant::now();
        dir.sweep_viewers_at(now + Duration::from_secs(29)).await;
        {
            let session = dir.get("S").await.unwrap();
            assert_eq!(session.read().await.viewers.len(), 1);
        }

        dir.sweep_viewers_at(now + Duration::from_secs(31)).await;
        let session = dir.get("S").await.unwrap();
        assert!(session.read().await.viewers.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_uploads_to_different_sessions() {
        let dir = Arc::new(SessionDirectory::new());
        dir.create_or_replace(params("A")).await;
        dir.create_or_replace(params("B")).await;

        let mut handles = Vec::new();
        for name in ["A", "B"] {
            let dir = Arc::clone(&dir);
            handles.push(tokio::spawn(async move {
                for i in 0..50u32 {
                    dir.add_chunk(name, chunk(b"payload", i), 1000, i + 1, 64)
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for name in ["A", "B"] {
            let session = dir.get(name).await.unwrap();
            assert_eq!(session.read().await.chunk_count(), 50);
        }
    }
}
