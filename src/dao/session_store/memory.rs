//! In-memory [`SessionStore`] backend.
//!
//! Sessions live in a [`DashMap`] keyed by canonical code. Mutations take the
//! map's exclusive per-key guard, so a join's capacity and name checks happen
//! under the same lock as the insert — the serialization contract documented
//! on the trait.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::dao::models::{
    JoinOutcome, SessionEntity, SessionId, TeamEntity, TeamPatch, UpdateOutcome,
};
use crate::dao::session_store::SessionStore;
use crate::dao::storage::StorageResult;

/// Buffered change pings per session subscriber.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Keyed in-memory store with per-session change notification.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<DashMap<SessionId, SessionEntity>>,
    watchers: Arc<DashMap<SessionId, broadcast::Sender<()>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ping every subscriber of `id` that the session changed. Delivery errors
    /// only mean nobody is listening.
    fn notify(&self, id: &SessionId) {
        if let Some(sender) = self.watchers.get(id) {
            let _ = sender.send(());
        }
    }
}

impl SessionStore for MemoryStore {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = session.id.clone();
            store.sessions.insert(id.clone(), session);
            store.notify(&id);
            Ok(())
        })
    }

    fn find_session(
        &self,
        id: SessionId,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.sessions.get(&id).map(|entry| entry.value().clone())) })
    }

    fn list_recent(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut sessions: Vec<SessionEntity> = store
                .sessions
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            sessions.truncate(limit);
            Ok(sessions)
        })
    }

    fn join_team(
        &self,
        id: SessionId,
        team: TeamEntity,
    ) -> BoxFuture<'static, StorageResult<JoinOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let outcome = {
                // get_mut holds the shard write lock for the whole check+insert.
                let Some(mut entry) = store.sessions.get_mut(&id) else {
                    return Ok(JoinOutcome::SessionMissing);
                };
                let session = entry.value_mut();
                if session.teams.len() >= session.max_teams {
                    JoinOutcome::Full
                } else if session.teams.iter().any(|t| t.name == team.name) {
                    JoinOutcome::NameTaken
                } else {
                    session.teams.push(team);
                    JoinOutcome::Joined(session.clone())
                }
            };
            if matches!(outcome, JoinOutcome::Joined(_)) {
                store.notify(&id);
            }
            Ok(outcome)
        })
    }

    fn update_team(
        &self,
        id: SessionId,
        team_name: String,
        patch: TeamPatch,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let outcome = {
                let Some(mut entry) = store.sessions.get_mut(&id) else {
                    return Ok(UpdateOutcome::SessionMissing);
                };
                let session = entry.value_mut();
                match session.teams.iter_mut().find(|t| t.name == team_name) {
                    Some(team) => {
                        if let Some(score) = patch.score {
                            team.score = score;
                        }
                        if let Some(badges) = patch.badges {
                            team.badges = badges;
                        }
                        UpdateOutcome::Updated(team.clone())
                    }
                    None => UpdateOutcome::TeamMissing,
                }
            };
            if matches!(outcome, UpdateOutcome::Updated(_)) {
                store.notify(&id);
            }
            Ok(outcome)
        })
    }

    fn subscribe(&self, id: SessionId) -> broadcast::Receiver<()> {
        self.watchers
            .entry(id)
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(code: &str, max_teams: usize, team_names: &[&str]) -> SessionEntity {
        SessionEntity {
            id: SessionId::canonical(code),
            name: format!("session {code}"),
            created_at: std::time::SystemTime::now(),
            max_teams,
            created_by: None,
            teams: team_names
                .iter()
                .map(|name| TeamEntity::new((*name).to_string(), None))
                .collect(),
        }
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        store.save_session(session("AB12CD", 8, &["Red Team"])).await.unwrap();

        let lower = store
            .find_session(SessionId::canonical("ab12cd"))
            .await
            .unwrap()
            .expect("session by lowercase code");
        let upper = store
            .find_session(SessionId::canonical("AB12CD"))
            .await
            .unwrap()
            .expect("session by uppercase code");
        assert_eq!(lower, upper);
    }

    #[tokio::test]
    async fn join_rejects_duplicate_name_without_mutating() {
        let store = MemoryStore::new();
        store.save_session(session("AAAAAA", 8, &["Red Team"])).await.unwrap();

        let outcome = store
            .join_team(
                SessionId::canonical("AAAAAA"),
                TeamEntity::new("Red Team".into(), None),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, JoinOutcome::NameTaken));

        let session = store
            .find_session(SessionId::canonical("AAAAAA"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.teams.len(), 1);
    }

    #[tokio::test]
    async fn team_names_match_case_sensitively() {
        let store = MemoryStore::new();
        store.save_session(session("AAAAAA", 8, &["Red Team"])).await.unwrap();

        let outcome = store
            .join_team(
                SessionId::canonical("AAAAAA"),
                TeamEntity::new("red team".into(), None),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, JoinOutcome::Joined(_)));
    }

    #[tokio::test]
    async fn join_never_exceeds_capacity() {
        let store = MemoryStore::new();
        store.save_session(session("AAAAAA", 2, &["First"])).await.unwrap();

        let second = store
            .join_team(
                SessionId::canonical("AAAAAA"),
                TeamEntity::new("Second".into(), None),
            )
            .await
            .unwrap();
        assert!(matches!(second, JoinOutcome::Joined(_)));

        let third = store
            .join_team(
                SessionId::canonical("AAAAAA"),
                TeamEntity::new("Third".into(), None),
            )
            .await
            .unwrap();
        assert!(matches!(third, JoinOutcome::Full));

        let session = store
            .find_session(SessionId::canonical("AAAAAA"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.teams.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_joins_respect_capacity() {
        let store = MemoryStore::new();
        store.save_session(session("AAAAAA", 4, &[])).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .join_team(
                        SessionId::canonical("AAAAAA"),
                        TeamEntity::new(format!("Team {i}"), None),
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut joined = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), JoinOutcome::Joined(_)) {
                joined += 1;
            }
        }
        assert_eq!(joined, 4);

        let session = store
            .find_session(SessionId::canonical("AAAAAA"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.teams.len(), 4);
    }

    #[tokio::test]
    async fn partial_update_leaves_omitted_fields_untouched() {
        let store = MemoryStore::new();
        let mut initial = session("AAAAAA", 8, &["Red Team"]);
        initial.teams[0].badges = vec!["Explorer".into()];
        store.save_session(initial).await.unwrap();

        let patch = TeamPatch {
            score: Some(100),
            badges: None,
        };
        let outcome = store
            .update_team(SessionId::canonical("AAAAAA"), "Red Team".into(), patch)
            .await
            .unwrap();
        let UpdateOutcome::Updated(team) = outcome else {
            panic!("expected update to apply");
        };
        assert_eq!(team.score, 100);
        assert_eq!(team.badges, vec!["Explorer".to_string()]);
    }

    #[tokio::test]
    async fn mutations_ping_subscribers() {
        let store = MemoryStore::new();
        store.save_session(session("AAAAAA", 8, &["Red Team"])).await.unwrap();

        let mut receiver = store.subscribe(SessionId::canonical("aaaaaa"));
        store
            .join_team(
                SessionId::canonical("AAAAAA"),
                TeamEntity::new("Blue Team".into(), None),
            )
            .await
            .unwrap();
        receiver.try_recv().expect("ping after join");

        store
            .update_team(
                SessionId::canonical("AAAAAA"),
                "Blue Team".into(),
                TeamPatch {
                    score: Some(10),
                    badges: None,
                },
            )
            .await
            .unwrap();
        receiver.try_recv().expect("ping after update");
    }

    #[tokio::test]
    async fn rejected_join_does_not_ping() {
        let store = MemoryStore::new();
        store.save_session(session("AAAAAA", 1, &["Red Team"])).await.unwrap();

        let mut receiver = store.subscribe(SessionId::canonical("AAAAAA"));
        store
            .join_team(
                SessionId::canonical("AAAAAA"),
                TeamEntity::new("Blue Team".into(), None),
            )
            .await
            .unwrap();
        assert!(receiver.try_recv().is_err());
    }
}
