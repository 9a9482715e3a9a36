//! # replay-rs
//!
//! In-memory backend for a live game-replay upload/download protocol.
//! Recording clients push a replay as a header plus an ordered sequence of
//! binary chunks; other clients discover replays, stream the chunks back
//! (optionally while the recording is still running), and attach searchable
//! events (checkpoints, bookmarks) to time ranges within a replay.
//!
//! The crate is the protocol core only: session identity and lifecycle,
//! ordered chunk accumulation, viewer presence with heartbeat/timeout, and
//! the event index. Routing, content negotiation, and authentication belong
//! to whatever transport sits in front of [`api::ReplayService`].
//!
//! ## Quick start
//!
//! ```no_run
//! use bytes::Bytes;
//! use replay_rs::api::{ReplayService, UploadQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ReplayService::new();
//!     let sweep = service.spawn_sweep_task();
//!
//!     let created = service
//!         .start_session(None, "4.27".into(), "net-2".into(), None, "Linux".into())
//!         .await;
//!
//!     let query = UploadQuery {
//!         num_chunks: Some(1),
//!         time: Some(1000),
//!         mtime1: Some(0),
//!         mtime2: Some(1000),
//!         abs_size: Some(5),
//!     };
//!     service
//!         .upload_file(&created.session_id, "stream.0", &query, Bytes::from_static(b"chunk"))
//!         .await?;
//!
//!     let chunk = service.get_chunk_file(&created.session_id, 0).await?;
//!     assert_eq!(chunk.data.as_ref(), b"chunk");
//!
//!     sweep.abort();
//!     Ok(())
//! }
//! ```
//!
//! ## Trust model
//!
//! Chunk and header payloads are opaque blobs; the store never validates
//! them. The aggregate counters (total chunks, bytes, demo time) are
//! client-reported and stored verbatim: the client is authoritative for
//! its own stats.

pub mod api;
pub mod store;

pub use api::ReplayService;
pub use store::{
    EventDirectory, SearchIndex, SessionDirectory, SessionFilter, StoreConfig, StoreError,
};
