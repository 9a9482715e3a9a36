//! Protocol boundary for the replay upload/download surface
//!
//! One typed method per routable request, plus the wire response shapes and
//! the filename/path parsing the routes depend on. The transport in front
//! of this module does path/query binding, body collection, and binary vs.
//! JSON encoding; everything protocol-semantic happens here or below.

pub mod filename;
pub mod response;
pub mod service;

pub use filename::{parse_event_path, parse_upload_filename, UploadTarget};
pub use response::{
    AddEventResponse, EventListResponse, EventSummary, SearchReplaysResponse,
    StartDownloadingResponse, StartSessionResponse,
};
pub use service::{EventQuery, ReplayService, SearchQuery, UploadQuery};
