//! Server-Sent Events (SSE) utilities

use crate::events::BoardEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Stream board events to one SSE client
///
/// Sends an initial `ConnectionStatus` event, then every event received on
/// `rx` as JSON. A lagging client skips the events it missed and keeps
/// streaming. Heartbeats are sent every 15 seconds.
pub fn board_event_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<BoardEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} board events", service_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = match serde_json::to_string(&event) {
                        Ok(data) => data,
                        Err(e) => {
                            warn!("SSE: failed to serialize {}: {}", event.event_type(), e);
                            continue;
                        }
                    };
                    debug!("SSE: sending {}", event.event_type());
                    yield Ok(Event::default().event(event.event_type()).data(data));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("SSE: client lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
