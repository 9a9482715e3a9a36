//! Viewer presence tracking
//!
//! Each session keeps a table of clients currently downloading it. Viewers
//! announce themselves once, then keep the entry alive with heartbeats; a
//! periodic sweep driven by the directory removes entries that have gone
//! quiet. The table itself never looks at the clock on its own.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single active viewer of a session
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Username the viewer announced on start-downloading
    pub username: String,
    /// Last heartbeat (or add) time
    pub last_seen: Instant,
}

/// Per-session table of active viewers, keyed by viewer id
///
/// Viewer ids are monotonic tokens scoped to one table. The counter is never
/// reset, so an id cannot be reissued after its viewer is removed.
#[derive(Debug, Default)]
pub struct ViewerTable {
    entries: HashMap<String, Viewer>,
    next_token: u64,
}

impl ViewerTable {
    /// Create an empty viewer table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a viewer, returning its freshly issued id
    ///
    /// Any existing entry for the same username is evicted first
    /// (last-write-wins, no merge).
    pub fn add(&mut self, username: &str, now: Instant) -> String {
        self.entries.retain(|_, v| v.username != username);

        self.next_token += 1;
        let viewer_id = format!("viewer-{:08x}", self.next_token);

        self.entries.insert(
            viewer_id.clone(),
            Viewer {
                username: username.to_string(),
                last_seen: now,
            },
        );

        viewer_id
    }

    /// Process a heartbeat for `viewer_id`
    ///
    /// A final heartbeat removes the viewer immediately; otherwise the
    /// last-seen time is refreshed. An unknown id is a no-op, not an error:
    /// a heartbeat racing the inactivity sweep is expected.
    pub fn heartbeat(&mut self, viewer_id: &str, is_final: bool, now: Instant) {
        if is_final {
            self.entries.remove(viewer_id);
        } else if let Some(viewer) = self.entries.get_mut(viewer_id) {
            viewer.last_seen = now;
        }
    }

    /// Remove every viewer quiet for longer than `threshold`
    ///
    /// Returns the usernames of removed viewers for logging.
    pub fn sweep(&mut self, now: Instant, threshold: Duration) -> Vec<String> {
        let mut removed = Vec::new();

        self.entries.retain(|_, viewer| {
            let quiet = now
                .checked_duration_since(viewer.last_seen)
                .unwrap_or_default();
            if quiet > threshold {
                removed.push(viewer.username.clone());
                false
            } else {
                true
            }
        });

        removed
    }

    /// Number of active viewers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a viewer by id
    pub fn get(&self, viewer_id: &str) -> Option<&Viewer> {
        self.entries.get(viewer_id)
    }
}
