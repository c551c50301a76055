//! Session lifecycle operations: create, join, lookup, team updates, listing.
//!
//! Every operation is stateless per call; all durable state lives behind the
//! [`SessionStore`] injected into the shared application state. Capacity and
//! name-uniqueness checks run atomically inside the store.

use rand::Rng;
use tracing::info;

use crate::{
    dao::models::{
        JoinOutcome, SessionEntity, SessionId, TeamEntity, TeamPatch, UpdateOutcome,
    },
    dao::session_store::SessionStore,
    error::ServiceError,
    state::SharedState,
};

/// Alphabet used for generated session codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// How many collisions we tolerate before giving up on code allocation.
const CODE_ALLOCATION_ATTEMPTS: usize = 8;

/// Create a new session holding one team, returning the persisted record.
pub async fn create_session(
    state: &SharedState,
    session_name: &str,
    team_name: &str,
) -> Result<SessionEntity, ServiceError> {
    if session_name.trim().is_empty() || team_name.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "Session name and team name are required".into(),
        ));
    }

    let config = state.config();
    let id = allocate_session_code(state, config.session_code_length).await?;

    let session = SessionEntity {
        id: id.clone(),
        name: session_name.to_string(),
        created_at: std::time::SystemTime::now(),
        max_teams: config.max_teams,
        created_by: None,
        teams: vec![TeamEntity::new(team_name.to_string(), None)],
    };

    state.store().save_session(session.clone()).await?;
    info!(session_id = %id, "session created");

    Ok(session)
}

/// Join an existing session with a new team.
pub async fn join_session(
    state: &SharedState,
    raw_id: &str,
    team_name: &str,
) -> Result<SessionEntity, ServiceError> {
    if team_name.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Team name is required".into()));
    }

    let id = SessionId::canonical(raw_id);
    let team = TeamEntity::new(team_name.to_string(), None);

    match state.store().join_team(id.clone(), team).await? {
        JoinOutcome::Joined(session) => {
            info!(session_id = %id, team = team_name, "team joined session");
            Ok(session)
        }
        JoinOutcome::SessionMissing => Err(ServiceError::NotFound("Session not found".into())),
        JoinOutcome::Full => Err(ServiceError::SessionFull),
        JoinOutcome::NameTaken => Err(ServiceError::NameTaken),
    }
}

/// Fetch one session with its teams, canonicalizing the code first.
pub async fn get_session(
    state: &SharedState,
    raw_id: &str,
) -> Result<SessionEntity, ServiceError> {
    let id = SessionId::canonical(raw_id);
    state
        .store()
        .find_session(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Session not found".into()))
}

/// Apply a partial score/badges update to one team, matched by exact name.
///
/// The patch is applied verbatim: no monotonicity or badge-content checks run
/// here, so callers are score-authoritative. Server-side recomputation from
/// quiz answers is explicitly out of scope.
pub async fn update_team(
    state: &SharedState,
    raw_id: &str,
    team_name: &str,
    patch: TeamPatch,
) -> Result<TeamEntity, ServiceError> {
    let id = SessionId::canonical(raw_id);
    match state
        .store()
        .update_team(id, team_name.to_string(), patch)
        .await?
    {
        UpdateOutcome::Updated(team) => Ok(team),
        UpdateOutcome::SessionMissing => Err(ServiceError::NotFound("Session not found".into())),
        UpdateOutcome::TeamMissing => {
            Err(ServiceError::NotFound("Team not found in session".into()))
        }
    }
}

/// List recent sessions for discovery, newest first.
pub async fn list_recent_sessions(
    state: &SharedState,
) -> Result<Vec<SessionEntity>, ServiceError> {
    let limit = state.config().recent_sessions_limit;
    Ok(state.store().list_recent(limit).await?)
}

/// Generate an unused session code, retrying on the rare collision.
async fn allocate_session_code(
    state: &SharedState,
    length: usize,
) -> Result<SessionId, ServiceError> {
    for _ in 0..CODE_ALLOCATION_ATTEMPTS {
        let id = SessionId::canonical(&random_code(length));
        if state.store().find_session(id.clone()).await?.is_none() {
            return Ok(id);
        }
    }

    Err(ServiceError::Internal(
        "could not allocate a unique session code".into(),
    ))
}

/// Sample a random code over the uppercase alphanumeric alphabet.
fn random_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
