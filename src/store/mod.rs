//! In-memory replay session store
//!
//! The store owns all protocol state: sessions with their ordered chunk
//! sequences, viewer presence, and the event index. The store is volatile:
//! process lifetime only, no persistence.
//!
//! # Architecture
//!
//! ```text
//!                    Arc<SessionDirectory>              Arc<EventDirectory>
//!              ┌───────────────────────────┐        ┌──────────────────────┐
//!              │ sessions: RwLock<HashMap< │        │ inner: RwLock<       │
//!              │   name,                   │        │   by_id,             │
//!              │   Arc<RwLock<             │        │   order,             │
//!              │     SessionRecord {       │        │   by_session,        │
//!              │       header, chunks,     │        │ >                    │
//!              │       stats, viewers,     │        └──────────┬───────────┘
//!              │     }                     │                   │
//!              │   >>                      │              read-only join
//!              │ >>                        │                   │
//!              └─────────────┬─────────────┘             SearchIndex
//!                            │
//!          ┌─────────────────┼─────────────────┐
//!          ▼                 ▼                 ▼
//!     [Uploader]        [Viewer]          [Sweep task]
//!     add_chunk()       add_viewer()      sweep_viewers()
//!                       heartbeat()
//! ```
//!
//! # Locking discipline
//!
//! The top-level map and each session record have independent locks, so
//! concurrent uploads to different sessions never serialize against each
//! other. Every operation is a pure in-memory transition inside one bounded
//! critical section; nothing here suspends on I/O while holding a lock. The
//! sweep snapshots the session list and then visits one session lock at a
//! time.

pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod ids;
pub mod search;
pub mod session;
pub mod viewers;

pub use config::StoreConfig;
pub use directory::{ChunkData, SessionDirectory, SessionFilter, SessionParams, ViewerTicket};
pub use error::{Result, StoreError};
pub use events::{EventDirectory, EventEntry};
pub use search::{ReplaySummary, SearchIndex};
pub use session::{SessionFile, SessionRecord};
pub use viewers::{Viewer, ViewerTable};
