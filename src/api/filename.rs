//! Upload path parsing
//!
//! Clients address uploads by filename: `replay.header` for the header,
//! `stream.{N}` for chunks. Event updates address the record through a
//! `{session}_{eventId}` path segment. Both shapes are parsed here so the
//! transport can stay a dumb router.

use crate::store::{Result, StoreError};

/// What an uploaded file targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// The session's replay header
    Header,
    /// A stream chunk, with the client-reported index from the filename
    Chunk(u32),
}

/// Parse an upload filename into its target
///
/// Matching is case-insensitive, like the stock server. Anything that is
/// neither the header nor a parseable chunk name is a client error.
pub fn parse_upload_filename(filename: &str) -> Result<UploadTarget> {
    let lowered = filename.to_ascii_lowercase();

    if lowered == "replay.header" {
        return Ok(UploadTarget::Header);
    }

    if let Some(suffix) = lowered.strip_prefix("stream.") {
        if let Ok(index) = suffix.parse::<u32>() {
            return Ok(UploadTarget::Chunk(index));
        }
    }

    Err(StoreError::InvalidUploadFilename(filename.to_string()))
}

/// Split an event-update path segment into (session name, event id)
///
/// Event ids are hex tokens with no underscores, so splitting on the last
/// underscore keeps session names containing underscores intact.
pub fn parse_event_path(tail: &str) -> Result<(&str, &str)> {
    match tail.rsplit_once('_') {
        Some((session, event_id)) if !event_id.is_empty() => Ok((session, event_id)),
        _ => Err(StoreError::InvalidEventPath(tail.to_string())),
    }
}
