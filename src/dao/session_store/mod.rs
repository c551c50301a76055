pub mod memory;

use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::dao::models::{JoinOutcome, SessionEntity, SessionId, TeamEntity, TeamPatch, UpdateOutcome};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for sessions and their teams.
///
/// Implementations must serialize `join_team` calls against the same session so
/// the capacity and name-uniqueness checks are atomic with the insert: two
/// concurrent joins can never both slip past a full roster or claim the same
/// name.
pub trait SessionStore: Send + Sync {
    /// Persist a brand-new session, replacing any record under the same code.
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch one session with its teams.
    fn find_session(
        &self,
        id: SessionId,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// List sessions ordered by creation time descending, capped to `limit`.
    fn list_recent(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Atomically append a team to a session, enforcing capacity and name
    /// uniqueness inside the store.
    fn join_team(
        &self,
        id: SessionId,
        team: TeamEntity,
    ) -> BoxFuture<'static, StorageResult<JoinOutcome>>;
    /// Apply a partial update to one team, matched by exact name.
    fn update_team(
        &self,
        id: SessionId,
        team_name: String,
        patch: TeamPatch,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>>;
    /// Subscribe to payload-free change pings for one session. A ping fires
    /// after every successful mutation of that session's record.
    fn subscribe(&self, id: SessionId) -> broadcast::Receiver<()>;
    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
