use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dao::models::TeamPatch,
    dto::session::{
        CreateSessionRequest, JoinSessionRequest, SessionListResponse, SessionResponse,
        TeamResponse, UpdateTeamRequest,
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes handling the session lifecycle and team updates.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_recent_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/teams/{team_name}", put(update_team))
}

/// Create a new session seeded with its first team.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 400, description = "Missing or blank name fields")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    payload.validate()?;
    let session =
        session_service::create_session(&state, &payload.session_name, &payload.team_name).await?;
    Ok(Json(SessionResponse::of(session)))
}

/// List recently created sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "session",
    responses(
        (status = 200, description = "Recent sessions", body = SessionListResponse)
    )
)]
pub async fn list_recent_sessions(
    State(state): State<SharedState>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = session_service::list_recent_sessions(&state).await?;
    Ok(Json(SessionListResponse {
        success: true,
        sessions: sessions.into_iter().map(Into::into).collect(),
    }))
}

/// Fetch one session with its teams. The code is case-insensitive.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = String, Path, description = "Session code, case-insensitive")),
    responses(
        (status = 200, description = "Session found", body = SessionResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session_service::get_session(&state, &id).await?;
    Ok(Json(SessionResponse::of(session)))
}

/// Join an existing session with a new team.
#[utoipa::path(
    post,
    path = "/sessions/{id}/join",
    tag = "session",
    params(("id" = String, Path, description = "Session code, case-insensitive")),
    request_body = JoinSessionRequest,
    responses(
        (status = 200, description = "Team joined", body = SessionResponse),
        (status = 400, description = "Blank name, session full, or duplicate team name"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<JoinSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    payload.validate()?;
    let session = session_service::join_session(&state, &id, &payload.team_name).await?;
    Ok(Json(SessionResponse::of(session)))
}

/// Apply a partial score/badges update to one team.
///
/// The team name path segment is percent-decoded by the extractor before
/// matching.
#[utoipa::path(
    put,
    path = "/sessions/{id}/teams/{team_name}",
    tag = "session",
    params(
        ("id" = String, Path, description = "Session code, case-insensitive"),
        ("team_name" = String, Path, description = "Exact team name, percent-encoded")
    ),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 404, description = "Session or team not found")
    )
)]
pub async fn update_team(
    State(state): State<SharedState>,
    Path((id, team_name)): Path<(String, String)>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let patch = TeamPatch {
        score: payload.score,
        badges: payload.badges,
    };
    let team = session_service::update_team(&state, &id, &team_name, patch).await?;
    Ok(Json(TeamResponse {
        success: true,
        team: team.into(),
    }))
}
