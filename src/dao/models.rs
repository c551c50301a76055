use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical session identifier: a short shareable code stored uppercase.
///
/// Input codes are case-insensitive; construction through [`SessionId::canonical`]
/// normalizes them so lookups with `"ab12cd"` and `"AB12CD"` hit the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Normalize a raw code into its canonical uppercase form.
    pub fn canonical(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    /// Borrow the canonical code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Representation of a team stored in persistence and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier assigned by the store.
    pub id: Uuid,
    /// Display name, unique within its session (case-sensitive).
    pub name: String,
    /// Current score for the team. Starts at 0 and may be overwritten.
    pub score: i64,
    /// Earned badge labels in insertion order. The store does not deduplicate.
    pub badges: Vec<String>,
    /// When the team joined its session.
    pub joined_at: SystemTime,
    /// Owning user, when the team is not a guest.
    pub user_id: Option<Uuid>,
}

impl TeamEntity {
    /// Build a fresh team with zero score and no badges, joined now.
    pub fn new(name: String, user_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            score: 0,
            badges: Vec::new(),
            joined_at: SystemTime::now(),
            user_id,
        }
    }
}

/// Aggregate session entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Canonical session code, immutable once created.
    pub id: SessionId,
    /// Display name of the session.
    pub name: String,
    /// Creation timestamp, used to order the recent-sessions listing.
    pub created_at: SystemTime,
    /// Hard cap on the number of teams that can join.
    pub max_teams: usize,
    /// Creating user, when the host is not anonymous.
    pub created_by: Option<Uuid>,
    /// Participating teams in arrival order.
    pub teams: Vec<TeamEntity>,
}

/// Partial update applied to one team; omitted fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TeamPatch {
    /// Replacement score, when provided.
    pub score: Option<i64>,
    /// Replacement badge list, when provided.
    pub badges: Option<Vec<String>>,
}

/// Result of an atomic join attempt against one session.
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    /// The team was appended; carries the updated session.
    Joined(SessionEntity),
    /// No session exists under the given code.
    SessionMissing,
    /// The session already holds its maximum number of teams.
    Full,
    /// A team with the same name already joined this session.
    NameTaken,
}

/// Result of a partial team update against one session.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// The patch was applied; carries the updated team.
    Updated(TeamEntity),
    /// No session exists under the given code.
    SessionMissing,
    /// The session exists but holds no team with the given name.
    TeamMissing,
}
