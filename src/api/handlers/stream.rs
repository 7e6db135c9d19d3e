use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::Stream;

use crate::api::state::AppState;
use crate::broadcaster::SessionStream;
use crate::events::Envelope;

/// `GET /orders/{id}/events` — replays everything seen so far, then forwards
/// live events until the order reaches a terminal state. An unknown order
/// id or an order already terminal is still a 200: the contract (§4.5) puts
/// `not_found`/terminal handling inside the event stream itself, not in the
/// HTTP status.
pub async fn stream_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        match state.scheduler.broadcaster().attach(&id) {
            SessionStream::NotFound => {
                yield to_event(&Envelope::new(id, crate::events::OrderEvent::Error {
                    message: "order not found".into(),
                }));
            }
            SessionStream::Terminal(envelope) => {
                yield to_event(&envelope);
            }
            SessionStream::Live { replay, mut rx } => {
                for envelope in replay {
                    let terminal = envelope.is_terminal();
                    yield to_event(&envelope);
                    if terminal {
                        return;
                    }
                }

                loop {
                    match rx.recv().await {
                        Ok(envelope) => {
                            let terminal = envelope.is_terminal();
                            yield to_event(&envelope);
                            if terminal {
                                return;
                            }
                        }
                        // A slow client is dropped outright rather than resumed
                        // from a gap (§5: "drop the client, not the events").
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => return,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn to_event(envelope: &Envelope) -> Result<Event, Infallible> {
    Ok(Event::default().json_data(envelope).unwrap_or_else(|_| Event::default().data("serialization error")))
}
