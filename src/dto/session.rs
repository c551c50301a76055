use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{SessionEntity, TeamEntity},
    dto::{format_system_time, validation::validate_non_blank},
};

/// Payload used to create a brand-new session with its first team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Display name of the session.
    #[validate(custom(function = validate_non_blank))]
    pub session_name: String,
    /// Name of the creating team.
    #[validate(custom(function = validate_non_blank))]
    pub team_name: String,
}

/// Payload used to join an existing session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    /// Name of the joining team, unique within the session.
    #[validate(custom(function = validate_non_blank))]
    pub team_name: String,
}

/// Partial team update; omitted fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTeamRequest {
    /// Replacement score, when provided.
    #[serde(default)]
    pub score: Option<i64>,
    /// Replacement badge list, when provided.
    #[serde(default)]
    pub badges: Option<Vec<String>>,
}

/// Public projection of a team exposed to REST clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Current score.
    pub score: i64,
    /// Earned badge labels in insertion order.
    pub badges: Vec<String>,
    /// RFC3339 join timestamp.
    pub joined_at: String,
    /// Owning user, absent for guest teams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl From<TeamEntity> for TeamDto {
    fn from(entity: TeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            score: entity.score,
            badges: entity.badges,
            joined_at: format_system_time(entity.joined_at),
            user_id: entity.user_id,
        }
    }
}

/// Public projection of a session with its teams.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    /// Canonical session code.
    pub id: String,
    /// Display name.
    pub name: String,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// Maximum number of teams allowed to join.
    pub max_teams: usize,
    /// Creating user, absent for anonymous hosts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    /// Participating teams in arrival order.
    pub teams: Vec<TeamDto>,
}

impl From<SessionEntity> for SessionDto {
    fn from(entity: SessionEntity) -> Self {
        Self {
            id: entity.id.to_string(),
            name: entity.name,
            created_at: format_system_time(entity.created_at),
            max_teams: entity.max_teams,
            created_by: entity.created_by,
            teams: entity.teams.into_iter().map(Into::into).collect(),
        }
    }
}

/// Envelope returned by operations that yield a full session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Always true on the success path.
    pub success: bool,
    /// The session with its teams.
    pub session: SessionDto,
}

impl SessionResponse {
    /// Wrap a session entity in the success envelope.
    pub fn of(entity: SessionEntity) -> Self {
        Self {
            success: true,
            session: entity.into(),
        }
    }
}

/// Envelope returned by the recent-sessions listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Always true on the success path.
    pub success: bool,
    /// Sessions ordered by creation time descending.
    pub sessions: Vec<SessionDto>,
}

/// Envelope returned by the team update operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResponse {
    /// Always true on the success path.
    pub success: bool,
    /// The team after the patch was applied.
    pub team: TeamDto,
}
