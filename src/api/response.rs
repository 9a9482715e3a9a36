//! Wire response types
//!
//! Shapes and field casing match the JSON the stock replay server emits;
//! the transport serializes these verbatim. Binary responses (header, chunk
//! and event payloads) bypass this module and go out as raw octet streams.

use serde::Serialize;

use crate::store::ReplaySummary;

/// Response to a start-session request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartSessionResponse {
    /// Name of the created (or replaced) session
    pub session_id: String,
}

/// Response to a start-downloading request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartDownloadingResponse {
    /// Live state label: "Live" or empty
    pub state: String,
    /// Client-reported total chunk count
    pub num_chunks: u32,
    /// Client-reported total demo time in milliseconds
    pub time: u32,
    /// Viewer id to use for all subsequent heartbeats
    pub viewer_id: String,
}

/// Response to an add-event request
///
/// The stock server discards the generated id, which leaves clients unable
/// to address the event ever again; returning it is a deliberate deviation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddEventResponse {
    /// Id of the created event
    pub event_id: String,
}

/// One event row in a per-session listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSummary {
    /// Event id
    pub id: String,
    /// Group the event is tagged with
    pub group: String,
    /// Opaque metadata string
    pub meta: String,
    /// Start of the covered time range
    pub time1: u32,
    /// End of the covered time range
    pub time2: u32,
}

/// Response to a per-session event listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventListResponse {
    /// Matching events, in insertion order
    pub events: Vec<EventSummary>,
}

/// Response to either replay search
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchReplaysResponse {
    /// Matching replays
    pub replays: Vec<ReplaySummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_session_casing() {
        let resp = StartSessionResponse {
            session_id: "abc123".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["SessionId"], "abc123");
    }

    #[test]
    fn test_start_downloading_casing() {
        let resp = StartDownloadingResponse {
            state: String::new(),
            num_chunks: 4,
            time: 9000,
            viewer_id: "viewer-00000001".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["NumChunks"], 4);
        assert_eq!(json["State"], "");
        assert_eq!(json["Time"], 9000);
        assert_eq!(json["ViewerId"], "viewer-00000001");
    }

    #[test]
    fn test_event_list_casing() {
        let resp = EventListResponse {
            events: vec![EventSummary {
                id: "e1".to_string(),
                group: "boss-fight".to_string(),
                meta: "m".to_string(),
                time1: 1,
                time2: 2,
            }],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["Events"][0]["Id"], "e1");
        assert_eq!(json["Events"][0]["Group"], "boss-fight");
        assert_eq!(json["Events"][0]["Time1"], 1);
    }
}
