use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dao::models::SessionId,
    dao::session_store::SessionStore,
    dto::sse::{Handshake, ServerEvent, SessionChangedEvent},
    state::SharedState,
};

/// Subscribe to change pings for one session.
pub fn subscribe_session(state: &SharedState, id: SessionId) -> broadcast::Receiver<()> {
    state.store().subscribe(id)
}

/// Convert a change-ping receiver into an SSE response, forwarding a
/// `session_changed` event per ping and cleaning up once the client
/// disconnects.
pub fn to_sse_stream(
    session_id: SessionId,
    mut receiver: broadcast::Receiver<()>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if let Some(handshake) = handshake_event(&session_id) {
            if tx.send(Ok(handshake)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(()) => {
                            let Some(event) = changed_event(&session_id) else {
                                continue;
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Collapsed pings still mean "refetch now", so a
                            // single forwarded event is enough.
                            let Some(event) = changed_event(&session_id) else {
                                continue;
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        tracing::info!(session_id = %session_id, "session SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Initial event confirming the subscription.
fn handshake_event(session_id: &SessionId) -> Option<Event> {
    let payload = Handshake {
        session_id: session_id.to_string(),
        message: "session stream connected".into(),
    };
    ServerEvent::json(Some("handshake".to_string()), &payload)
        .ok()
        .map(into_sse_event)
}

/// Payload-free change notification; subscribers refetch the snapshot.
fn changed_event(session_id: &SessionId) -> Option<Event> {
    let payload = SessionChangedEvent {
        session_id: session_id.to_string(),
    };
    ServerEvent::json(Some("session_changed".to_string()), &payload)
        .ok()
        .map(into_sse_event)
}

fn into_sse_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
