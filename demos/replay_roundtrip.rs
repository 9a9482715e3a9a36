//! Replay upload/download round trip
//!
//! Run with: cargo run --example replay_roundtrip
//!
//! Drives the service the way a recording client and a viewer would:
//! start a session, upload the header and a few chunks, tag an event,
//! then stream everything back and search for it.

use bytes::Bytes;
use replay_rs::api::{EventQuery, ReplayService, SearchQuery, UploadQuery};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let service = ReplayService::new();
    let sweep = service.spawn_sweep_task();

    // Recording client: start a session and push the replay
    let created = service
        .start_session(None, "4.27".into(), "net-2".into(), Some(12345), "Linux".into())
        .await;
    let session = created.session_id.clone();
    tracing::info!(session = %session, "Session started");

    service
        .upload_file(
            &session,
            "replay.header",
            &UploadQuery {
                num_chunks: Some(0),
                time: Some(0),
                ..Default::default()
            },
            Bytes::from_static(b"demo-header"),
        )
        .await?;

    let chunks: [&'static [u8]; 3] = [b"chunk-zero", b"chunk-one", b"chunk-two"];
    for (i, payload) in chunks.iter().enumerate() {
        let query = UploadQuery {
            num_chunks: Some(i as u32 + 1),
            time: Some((i as u32 + 1) * 1000),
            mtime1: Some(i as u32 * 1000),
            mtime2: Some((i as u32 + 1) * 1000),
            abs_size: Some(chunks.iter().take(i + 1).map(|c| c.len() as u64).sum()),
        };
        service
            .upload_file(&session, &format!("stream.{}", i), &query, Bytes::from_static(payload))
            .await?;
    }

    let event = service
        .add_event(
            &session,
            &EventQuery {
                group: Some("boss-fight".into()),
                time1: Some(1500),
                time2: Some(2500),
                meta: Some("phase-2".into()),
                increment_size: None,
            },
            Bytes::from_static(b"event-payload"),
        )
        .await?;
    tracing::info!(event = %event.event_id, "Event tagged");

    service.stop_uploading(&session, 3, 3000, 30).await?;

    // Viewer: announce, stream back, heartbeat, disconnect
    let ticket = service.start_downloading(&session, "spectator").await?;
    tracing::info!(viewer = %ticket.viewer_id, chunks = ticket.num_chunks, "Downloading");

    let header = service.get_header_file(&session).await?;
    tracing::info!(bytes = header.len(), "Got header");

    for i in 0..ticket.num_chunks as usize {
        let chunk = service.get_chunk_file(&session, i).await?;
        tracing::info!(index = i, bytes = chunk.data.len(), mtime2 = chunk.mtime2, "Got chunk");
        service.viewer_heartbeat(&session, &ticket.viewer_id, false).await?;
    }

    service.viewer_heartbeat(&session, &ticket.viewer_id, true).await?;

    // Search both ways
    let by_filter = service
        .search_replays(&SearchQuery {
            app: Some("4.27".into()),
            ..Default::default()
        })
        .await;
    let by_group = service.search_replays_by_group("boss-fight").await;
    tracing::info!(
        by_filter = by_filter.replays.len(),
        by_group = by_group.replays.len(),
        "Search results"
    );

    println!("{}", serde_json::to_string_pretty(&by_group)?);

    sweep.abort();
    Ok(())
}
