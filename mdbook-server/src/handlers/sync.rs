//! Server-Sent Events handler for real-time updates

use crate::state::{AppState, ServerEvent};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Event name and JSON payload of a server event
fn event_data(event: ServerEvent) -> (&'static str, serde_json::Value) {
    match event {
        ServerEvent::BookCreated { bid, title } => {
            ("book_created", json!({ "bid": bid, "title": title }))
        }
        ServerEvent::BookUpdated { bid, digest } => {
            ("book_updated", json!({ "bid": bid, "digest": digest }))
        }
        ServerEvent::BookDeleted { bid } => ("book_deleted", json!({ "bid": bid })),
        ServerEvent::ReferencesUpdated { id } => ("references_updated", json!({ "id": id })),
        ServerEvent::ExportComplete { bid, format } => {
            ("export_complete", json!({ "bid": bid, "format": format }))
        }
    }
}

/// SSE endpoint for real-time updates
pub async fn sync_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe());

    let event_stream = stream.filter_map(|result| match result {
        Ok(event) => {
            let (event_type, data) = event_data(event);
            Some(Ok(Event::default().event(event_type).data(data.to_string())))
        }
        Err(_) => None, // Lagged, skip
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_data() {
        let (name, data) = event_data(ServerEvent::BookUpdated {
            bid: "moon".to_string(),
            digest: "abc".to_string(),
        });
        assert_eq!(name, "book_updated");
        assert_eq!(data, json!({ "bid": "moon", "digest": "abc" }));
    }
}
