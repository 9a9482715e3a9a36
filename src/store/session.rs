//! Per-session record types
//!
//! This module defines the state stored for one replay session: identity,
//! the header slot, the ordered chunk sequence, client-reported aggregate
//! stats, the allowed-user list, and the viewer table.

use std::time::SystemTime;

use bytes::Bytes;

use super::viewers::ViewerTable;

/// One uploaded file: either the replay header or a stream chunk
///
/// Cheap to clone; the payload is reference-counted.
#[derive(Debug, Clone)]
pub struct SessionFile {
    /// Filename as sent by the client (e.g. "replay.header", "stream.3")
    pub filename: String,
    /// Opaque payload; never inspected by the store
    pub data: Bytes,
    /// Start of the covered time range, in demo milliseconds
    pub start_time_ms: u32,
    /// End of the covered time range, in demo milliseconds
    pub end_time_ms: u32,
    /// Chunk index as reported by the client in the filename
    ///
    /// Informational only. The authoritative retrieval index is the chunk's
    /// position in the session's sequence, assigned at append time.
    pub chunk_index: u32,
}

impl SessionFile {
    /// Create a header file
    pub fn header(filename: impl Into<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            data,
            start_time_ms: 0,
            end_time_ms: 0,
            chunk_index: 0,
        }
    }

    /// Create a stream chunk
    pub fn chunk(
        filename: impl Into<String>,
        data: Bytes,
        start_time_ms: u32,
        end_time_ms: u32,
        chunk_index: u32,
    ) -> Self {
        Self {
            filename: filename.into(),
            data,
            start_time_ms,
            end_time_ms,
            chunk_index,
        }
    }
}

/// State for a single replay session
pub struct SessionRecord {
    /// Session name, the unique key in the directory
    pub name: String,
    /// Application version the replay was recorded with
    pub app_version: String,
    /// Network protocol version
    pub net_version: String,
    /// Changelist the build was made from
    pub changelist: i32,
    /// Human-readable platform name
    pub friendly_name: String,
    /// Live flag; no operation ever sets this, it is carried for the wire
    pub is_live: bool,
    /// Replay header, overwritten on resend
    pub header: Option<SessionFile>,
    /// Append-only chunk sequence; position is the retrieval index
    chunks: Vec<SessionFile>,
    /// Client-reported total demo time, overwritten verbatim
    pub total_demo_time_ms: u32,
    /// Client-reported chunk count, overwritten verbatim
    pub total_chunks: u32,
    /// Client-reported uploaded byte count, overwritten verbatim
    pub total_uploaded_bytes: u64,
    /// Usernames allowed/expected to view the replay
    pub users: Vec<String>,
    /// Active viewers
    pub viewers: ViewerTable,
    /// Creation time, set once
    pub created_at: SystemTime,
}

impl SessionRecord {
    /// Create a fresh session record
    pub(super) fn new(
        name: String,
        app_version: String,
        net_version: String,
        changelist: i32,
        friendly_name: String,
    ) -> Self {
        Self {
            name,
            app_version,
            net_version,
            changelist,
            friendly_name,
            is_live: false,
            header: None,
            chunks: Vec::new(),
            total_demo_time_ms: 0,
            total_chunks: 0,
            total_uploaded_bytes: 0,
            users: Vec::new(),
            viewers: ViewerTable::new(),
            created_at: SystemTime::now(),
        }
    }

    /// Append a chunk, assigning it the next position in the sequence
    ///
    /// The client-reported `chunk_index` inside the file is not consulted;
    /// duplicates and out-of-order uploads are appended as-is.
    pub fn append_chunk(&mut self, file: SessionFile) {
        self.chunks.push(file);
    }

    /// Get a chunk by its position in the sequence
    pub fn chunk(&self, index: usize) -> Option<&SessionFile> {
        self.chunks.get(index)
    }

    /// Number of chunks actually stored (not the client-reported total)
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Wire label for the live state: "Live" or empty
    pub fn state_label(&self) -> &'static str {
        if self.is_live {
            "Live"
        } else {
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SessionRecord {
        SessionRecord::new(
            "abc".into(),
            "1.0".into(),
            "net-2".into(),
            1234,
            "TestPlatform".into(),
        )
    }

    #[test]
    fn test_new_record_is_empty() {
        let rec = record();

        assert!(rec.header.is_none());
        assert_eq!(rec.chunk_count(), 0);
        assert_eq!(rec.total_chunks, 0);
        assert!(!rec.is_live);
        assert_eq!(rec.state_label(), "");
        assert!(rec.viewers.is_empty());
    }

    #[test]
    fn test_chunks_retrieved_by_position() {
        let mut rec = record();

        // Client-reported indices deliberately out of order
        rec.append_chunk(SessionFile::chunk("stream.5", Bytes::from_static(b"one"), 0, 10, 5));
        rec.append_chunk(SessionFile::chunk("stream.0", Bytes::from_static(b"two"), 10, 20, 0));

        assert_eq!(rec.chunk_count(), 2);
        // Position wins over the reported chunk_index
        assert_eq!(rec.chunk(0).unwrap().data.as_ref(), b"one");
        assert_eq!(rec.chunk(1).unwrap().data.as_ref(), b"two");
        assert!(rec.chunk(2).is_none());
    }
}
