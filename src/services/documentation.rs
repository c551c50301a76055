use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Galaxy Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::create_session,
        crate::routes::session::list_recent_sessions,
        crate::routes::session::get_session,
        crate::routes::session::join_session,
        crate::routes::session::update_team,
        crate::routes::sse::session_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::JoinSessionRequest,
            crate::dto::session::UpdateTeamRequest,
            crate::dto::session::SessionDto,
            crate::dto::session::TeamDto,
            crate::dto::session::SessionResponse,
            crate::dto::session::SessionListResponse,
            crate::dto::session::TeamResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SessionChangedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Session and team operations"),
        (name = "sse", description = "Per-session change notification stream"),
    )
)]
pub struct ApiDoc;
