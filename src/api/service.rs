//! Replay protocol service
//!
//! One typed method per request the transport can route. The service owns
//! the directories and performs all filename/query validation the stock
//! server left to chance; the router only binds paths and query strings and
//! picks the response encoding.

use std::sync::Arc;

use bytes::Bytes;

use crate::store::{
    ChunkData, EventDirectory, Result, SearchIndex, SessionDirectory, SessionFile, SessionFilter,
    SessionParams, StoreConfig, StoreError,
};

use super::filename::{parse_event_path, parse_upload_filename, UploadTarget};
use super::response::{
    AddEventResponse, EventListResponse, EventSummary, SearchReplaysResponse,
    StartDownloadingResponse, StartSessionResponse,
};

/// Query values accompanying a file upload
///
/// All fields are optional at the wire level; which ones are required
/// depends on whether the filename targets the header or a chunk.
#[derive(Debug, Clone, Default)]
pub struct UploadQuery {
    /// Client-reported total chunk count
    pub num_chunks: Option<u32>,
    /// Client-reported total demo time in milliseconds
    pub time: Option<u32>,
    /// Start of the chunk's covered time range
    pub mtime1: Option<u32>,
    /// End of the chunk's covered time range
    pub mtime2: Option<u32>,
    /// Client-reported total uploaded bytes
    pub abs_size: Option<u64>,
}

/// Query values accompanying an add/update event request
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Event group (category)
    pub group: Option<String>,
    /// Start of the covered time range
    pub time1: Option<u32>,
    /// End of the covered time range
    pub time2: Option<u32>,
    /// Opaque metadata string; absent behaves as empty
    pub meta: Option<String>,
    /// Accepted from the wire and ignored, as in the stock server
    pub increment_size: Option<bool>,
}

/// Query values for the replay search
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Exact application version
    pub app: Option<String>,
    /// Exact changelist
    pub cl: Option<i32>,
    /// Exact network version
    pub version: Option<String>,
    /// Accepted and ignored, as in the stock server
    pub meta: Option<String>,
    /// Username that must appear in the session's user list
    pub user: Option<String>,
    /// Accepted and ignored, as in the stock server
    pub recent: Option<bool>,
}

impl SearchQuery {
    fn to_filter(&self) -> SessionFilter {
        SessionFilter {
            app_version: self.app.clone(),
            changelist: self.cl,
            net_version: self.version.clone(),
            username: self.user.clone(),
        }
    }
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(StoreError::MissingField(field))
}

/// The replay upload/download service
///
/// Constructed once at startup and shared with every request handler.
pub struct ReplayService {
    sessions: Arc<SessionDirectory>,
    events: Arc<EventDirectory>,
    search: SearchIndex,
}

impl ReplayService {
    /// Create a service with default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a service with custom store configuration
    pub fn with_config(config: StoreConfig) -> Self {
        let sessions = Arc::new(SessionDirectory::with_config(config));
        let events = Arc::new(EventDirectory::new());
        let search = SearchIndex::new(Arc::clone(&sessions), Arc::clone(&events));

        Self {
            sessions,
            events,
            search,
        }
    }

    /// Get a handle to the session directory
    pub fn sessions(&self) -> &Arc<SessionDirectory> {
        &self.sessions
    }

    /// Get a handle to the event directory
    pub fn events(&self) -> &Arc<EventDirectory> {
        &self.events
    }

    /// Spawn the periodic viewer inactivity sweep
    pub fn spawn_sweep_task(&self) -> tokio::task::JoinHandle<()> {
        self.sessions.spawn_sweep_task()
    }

    // --- Uploading ---

    /// POST `/replay` and POST `/replay/{session}`
    ///
    /// Creates (or overwrites) a session; with no explicit name a random id
    /// is generated.
    pub async fn start_session(
        &self,
        name: Option<String>,
        app: String,
        version: String,
        cl: Option<i32>,
        friendly_name: String,
    ) -> StartSessionResponse {
        let session_id = self
            .sessions
            .create_or_replace(SessionParams {
                name,
                app_version: app,
                net_version: version,
                changelist: cl,
                friendly_name,
            })
            .await;

        StartSessionResponse { session_id }
    }

    /// POST `/replay/{session}/stopUploading`
    pub async fn stop_uploading(
        &self,
        session: &str,
        num_chunks: u32,
        time: u32,
        abs_size: u64,
    ) -> Result<()> {
        self.sessions.stop(session, time, num_chunks, abs_size).await
    }

    /// POST `/replay/{session}/users`
    ///
    /// An absent body replaces the list with nothing, as the stock server
    /// does.
    pub async fn set_users(&self, session: &str, users: Option<Vec<String>>) -> Result<()> {
        self.sessions
            .set_users(session, users.unwrap_or_default())
            .await
    }

    /// POST `/replay/{session}/file/{filename}`
    ///
    /// Dispatches on the filename: `replay.header` sets the header,
    /// `stream.{N}` appends a chunk. Anything else, and any missing query
    /// value the selected branch needs, is a client error.
    pub async fn upload_file(
        &self,
        session: &str,
        filename: &str,
        query: &UploadQuery,
        body: Bytes,
    ) -> Result<()> {
        match parse_upload_filename(filename)? {
            UploadTarget::Header => {
                let time = require(query.time, "time")?;
                let num_chunks = require(query.num_chunks, "numChunks")?;

                let file = SessionFile::header(filename, body);
                self.sessions.set_header(session, file, num_chunks, time).await
            }
            UploadTarget::Chunk(index) => {
                let time = require(query.time, "time")?;
                let num_chunks = require(query.num_chunks, "numChunks")?;
                let mtime1 = require(query.mtime1, "mTime1")?;
                let mtime2 = require(query.mtime2, "mTime2")?;
                let abs_size = require(query.abs_size, "absSize")?;

                let file = SessionFile::chunk(filename, body, mtime1, mtime2, index);
                self.sessions
                    .add_chunk(session, file, time, num_chunks, abs_size)
                    .await
            }
        }
    }

    /// POST `/replay/{session}/event`
    ///
    /// Returns the generated event id so the caller can address the event
    /// later; the stock server threw it away.
    pub async fn add_event(
        &self,
        session: &str,
        query: &EventQuery,
        body: Bytes,
    ) -> Result<AddEventResponse> {
        let group = require(query.group.as_deref(), "group")?;
        let time1 = require(query.time1, "time1")?;
        let time2 = require(query.time2, "time2")?;
        let meta = query.meta.as_deref().unwrap_or_default();

        let event_id = self
            .events
            .add(session, group, time1, time2, meta, body)
            .await;

        Ok(AddEventResponse { event_id })
    }

    /// POST `/replay/{session}/event/{session2}_{eventName}`
    ///
    /// The tail path segment carries the owning session and the event id;
    /// only the id is consulted for the lookup.
    pub async fn update_event(&self, tail: &str, query: &EventQuery, body: Bytes) -> Result<()> {
        let (_, event_id) = parse_event_path(tail)?;

        let group = require(query.group.as_deref(), "group")?;
        let time1 = require(query.time1, "time1")?;
        let time2 = require(query.time2, "time2")?;
        let meta = query.meta.as_deref().unwrap_or_default();

        self.events
            .update(event_id, group, time1, time2, meta, body)
            .await
    }

    // --- Downloading ---

    /// POST `/replay/{session}/startDownloading`
    pub async fn start_downloading(
        &self,
        session: &str,
        user: &str,
    ) -> Result<StartDownloadingResponse> {
        let ticket = self.sessions.add_viewer(session, user).await?;

        Ok(StartDownloadingResponse {
            state: ticket.state,
            num_chunks: ticket.num_chunks,
            time: ticket.demo_time_ms,
            viewer_id: ticket.viewer_id,
        })
    }

    /// POST `/replay/{session}/viewer/{viewerName}`
    pub async fn viewer_heartbeat(
        &self,
        session: &str,
        viewer_id: &str,
        is_final: bool,
    ) -> Result<()> {
        self.sessions.viewer_heartbeat(session, viewer_id, is_final).await
    }

    /// GET `/replay/{session}/file/replay.header`
    ///
    /// The transport emits the bytes as an octet stream with an exact length.
    pub async fn get_header_file(&self, session: &str) -> Result<Bytes> {
        self.sessions.get_header(session).await
    }

    /// GET `/replay/{session}/file/stream.{chunkIndex}`
    ///
    /// The payload's stat fields become the `NumChunks`/`Time`/`State`/
    /// `MTime1`/`MTime2` response headers.
    pub async fn get_chunk_file(&self, session: &str, index: usize) -> Result<ChunkData> {
        self.sessions.get_chunk(session, index).await
    }

    /// GET `/replay/{session}/event`
    pub async fn list_events(&self, session: &str, group: &str) -> EventListResponse {
        let entries = self.events.list_by_group(session, group).await;

        EventListResponse {
            events: entries
                .into_iter()
                .map(|entry| EventSummary {
                    id: entry.id,
                    group: entry.group,
                    meta: entry.meta,
                    time1: entry.time1,
                    time2: entry.time2,
                })
                .collect(),
        }
    }

    // --- Searching ---

    /// GET `/replay`
    pub async fn search_replays(&self, query: &SearchQuery) -> SearchReplaysResponse {
        SearchReplaysResponse {
            replays: self.search.search_replays(&query.to_filter()).await,
        }
    }

    /// GET `/event`
    pub async fn search_replays_by_group(&self, group: &str) -> SearchReplaysResponse {
        SearchReplaysResponse {
            replays: self.search.search_replays_by_group(group).await,
        }
    }

    /// GET `/event/{eventName}`
    pub async fn get_event_payload(&self, event_id: &str) -> Result<Bytes> {
        Ok(self.events.get(event_id).await?.data)
    }
}

impl Default for ReplayService {
    fn default() -> Self {
        Self::new()
    }
}
