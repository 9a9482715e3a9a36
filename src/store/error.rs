//! Store error types
//!
//! Error types for session/event store operations.

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Session not found
    SessionNotFound(String),
    /// Session has no header uploaded yet
    HeaderNotFound(String),
    /// Chunk index out of range for the session
    ChunkNotFound { session: String, index: usize },
    /// Event not found
    EventNotFound(String),
    /// Upload filename is neither the header nor a parseable chunk name
    InvalidUploadFilename(String),
    /// Event path segment could not be split into session and event id
    InvalidEventPath(String),
    /// A required request field was missing
    MissingField(&'static str),
}

impl StoreError {
    /// Whether this error maps to a "not found" response at the transport
    ///
    /// Everything else is a client-input error ("bad request").
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::SessionNotFound(_)
                | StoreError::HeaderNotFound(_)
                | StoreError::ChunkNotFound { .. }
                | StoreError::EventNotFound(_)
        )
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::SessionNotFound(name) => write!(f, "Session not found: {}", name),
            StoreError::HeaderNotFound(name) => {
                write!(f, "Session has no header: {}", name)
            }
            StoreError::ChunkNotFound { session, index } => {
                write!(f, "Chunk {} not found in session {}", index, session)
            }
            StoreError::EventNotFound(id) => write!(f, "Event not found: {}", id),
            StoreError::InvalidUploadFilename(name) => {
                write!(f, "Invalid upload filename: {}", name)
            }
            StoreError::InvalidEventPath(path) => write!(f, "Invalid event path: {}", path),
            StoreError::MissingField(field) => write!(f, "Missing required field: {}", field),
        }
    }
}

impl std::error::Error for StoreError {}

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
