//! Event directory implementation
//!
//! Events are out-of-band annotations (checkpoints, bookmarks) attached to a
//! time range within a replay and tagged with a free-form group. They are
//! indexed by id for direct lookup, by session for per-replay listings, and
//! scanned in insertion order for the cross-session group search.
//!
//! The session reference is soft: nothing checks that the named session
//! still exists, and overwriting a session does not touch its events.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use tokio::sync::RwLock;

use super::error::{Result, StoreError};
use super::ids::random_hex_id;

/// A single event record
#[derive(Debug, Clone)]
pub struct EventEntry {
    /// Globally unique event id
    pub id: String,
    /// Name of the owning session; soft reference, never validated
    pub session_name: String,
    /// Free-form category used for tagging and search
    pub group: String,
    /// Start of the covered time range, in demo milliseconds
    pub time1: u32,
    /// End of the covered time range, in demo milliseconds
    pub time2: u32,
    /// Opaque metadata string
    pub meta: String,
    /// Opaque payload; never inspected by the store
    pub data: Bytes,
}

#[derive(Default)]
struct EventIndex {
    /// All events by id
    by_id: HashMap<String, EventEntry>,
    /// Event ids in insertion order, for stable group scans
    order: Vec<String>,
    /// Event ids per session, in insertion order
    by_session: HashMap<String, Vec<String>>,
}

/// Directory of all event records
///
/// Independent of the session directory; the group-to-session join is done
/// read-only at query time by the search layer.
pub struct EventDirectory {
    inner: RwLock<EventIndex>,
}

impl EventDirectory {
    /// Create an empty event directory
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(EventIndex::default()),
        }
    }

    /// Add an event, returning its freshly allocated id
    ///
    /// The id is part of the external contract: without it the caller has no
    /// way to address the event for updates later.
    pub async fn add(
        &self,
        session_name: &str,
        group: &str,
        time1: u32,
        time2: u32,
        meta: &str,
        data: Bytes,
    ) -> String {
        let id = random_hex_id();

        let entry = EventEntry {
            id: id.clone(),
            session_name: session_name.to_string(),
            group: group.to_string(),
            time1,
            time2,
            meta: meta.to_string(),
            data,
        };

        let mut index = self.inner.write().await;
        index.by_id.insert(id.clone(), entry);
        index.order.push(id.clone());
        index
            .by_session
            .entry(session_name.to_string())
            .or_default()
            .push(id.clone());

        tracing::info!(event = %id, session = %session_name, group = %group, "Event added");

        id
    }

    /// Update an event's mutable fields in place
    ///
    /// The id and the owning session are stable; only group, times, meta and
    /// payload change. Unknown ids are reported, not swallowed.
    pub async fn update(
        &self,
        event_id: &str,
        group: &str,
        time1: u32,
        time2: u32,
        meta: &str,
        data: Bytes,
    ) -> Result<()> {
        let mut index = self.inner.write().await;

        let entry = index
            .by_id
            .get_mut(event_id)
            .ok_or_else(|| StoreError::EventNotFound(event_id.to_string()))?;

        entry.group = group.to_string();
        entry.time1 = time1;
        entry.time2 = time2;
        entry.meta = meta.to_string();
        entry.data = data;

        tracing::info!(event = %event_id, group = %group, "Event updated");

        Ok(())
    }

    /// Fetch an event by id
    pub async fn get(&self, event_id: &str) -> Result<EventEntry> {
        let index = self.inner.read().await;
        index
            .by_id
            .get(event_id)
            .cloned()
            .ok_or_else(|| StoreError::EventNotFound(event_id.to_string()))
    }

    /// All events of one session with an exact group match, in insertion order
    pub async fn list_by_group(&self, session_name: &str, group: &str) -> Vec<EventEntry> {
        let index = self.inner.read().await;

        let Some(ids) = index.by_session.get(session_name) else {
            return Vec::new();
        };

        ids.iter()
            .filter_map(|id| index.by_id.get(id))
            .filter(|entry| entry.group == group)
            .cloned()
            .collect()
    }

    /// Distinct session names owning at least one event in `group`
    ///
    /// Insertion-stable: names appear in the order their first matching
    /// event was added. Names of since-overwritten sessions are included;
    /// resolving them is the search layer's problem.
    pub async fn sessions_by_group(&self, group: &str) -> Vec<String> {
        let index = self.inner.read().await;

        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for id in &index.order {
            if let Some(entry) = index.by_id.get(id) {
                if entry.group == group && seen.insert(entry.session_name.clone()) {
                    names.push(entry.session_name.clone());
                }
            }
        }

        names
    }

    /// Total number of events
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}

impl Default for EventDirectory {
    fn default() -> Self {
        Self::new()
    }
}
