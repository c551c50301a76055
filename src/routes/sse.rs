use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::{session_service, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sessions/{id}/events",
    tag = "sse",
    params(("id" = String, Path, description = "Session code, case-insensitive")),
    responses(
        (status = 200, description = "Change notification stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Session not found")
    )
)]
/// Stream payload-free change pings for one session.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    // Reject unknown codes before holding a stream open.
    let session = session_service::get_session(&state, &id).await?;
    let receiver = sse_service::subscribe_session(&state, session.id.clone());
    info!(session_id = %session.id, "new session SSE connection");
    Ok(sse_service::to_sse_stream(session.id, receiver))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sessions/{id}/events", get(session_stream))
}
