use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    dao::models::{SessionEntity, SessionId, TeamEntity, TeamPatch},
    dao::session_store::SessionStore,
    error::ServiceError,
    realtime::{
        diff::{SessionUpdate, diff_snapshots},
        feed::UpdateFeed,
    },
    services::session_service,
    state::SharedState,
};

/// Per-client synchronization adapter for one session.
///
/// Spawning subscribes to the store's change pings for the session and keeps a
/// local view (sorted teams, connectivity flag, notification feed) current.
/// Dropping the handle aborts the worker, releasing the subscription; nothing
/// mutates the view afterwards.
pub struct RealtimeSession {
    view: Arc<SessionView>,
    commands: Option<mpsc::UnboundedSender<Command>>,
    worker: Option<JoinHandle<()>>,
}

/// Client-local view state shared between the handle and its worker.
struct SessionView {
    session: RwLock<Option<SessionEntity>>,
    teams: RwLock<Vec<TeamEntity>>,
    connected: AtomicBool,
    feed: Mutex<UpdateFeed>,
}

enum Command {
    Refresh {
        done: Option<oneshot::Sender<()>>,
    },
    UpdateTeam {
        team_name: String,
        score: i64,
        badges: Vec<String>,
    },
}

impl RealtimeSession {
    /// Begin continuous synchronization of one session for one client.
    ///
    /// With no session code (or a blank one) the adapter stays disabled: no
    /// worker runs, the view reads as disconnected and empty. This is the
    /// single-player mode without a shared session.
    pub fn spawn(
        state: SharedState,
        session_id: Option<&str>,
        current_team_name: impl Into<String>,
    ) -> Self {
        let config = state.config();
        let view = Arc::new(SessionView {
            session: RwLock::new(None),
            teams: RwLock::new(Vec::new()),
            connected: AtomicBool::new(false),
            feed: Mutex::new(UpdateFeed::new(
                config.recent_updates_capacity,
                config.visible_updates,
            )),
        });

        let Some(raw_id) = session_id.filter(|id| !id.trim().is_empty()) else {
            return Self {
                view,
                commands: None,
                worker: None,
            };
        };

        let session_id = SessionId::canonical(raw_id);
        let changes = state.store().subscribe(session_id.clone());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            state: state.clone(),
            session_id,
            own_team: current_team_name.into(),
            view: Arc::clone(&view),
            previous: None,
            resync_delay: config.resync_delay,
        };
        let handle = tokio::spawn(worker.run(commands_rx, changes));

        Self {
            view,
            commands: Some(commands_tx),
            worker: Some(handle),
        }
    }

    /// Latest successfully fetched session, if any.
    pub async fn session(&self) -> Option<SessionEntity> {
        self.view.session.read().await.clone()
    }

    /// Current team list, sorted by score descending (stable on ties).
    pub async fn teams(&self) -> Vec<TeamEntity> {
        self.view.teams.read().await.clone()
    }

    /// Whether the most recent synchronization fetch succeeded.
    pub fn is_connected(&self) -> bool {
        self.view.connected.load(Ordering::Acquire)
    }

    /// Full retained notification history, newest first.
    pub async fn recent_updates(&self) -> Vec<SessionUpdate> {
        self.view.feed.lock().await.recent().cloned().collect()
    }

    /// The displayed slice of the notification history.
    pub async fn visible_updates(&self) -> Vec<SessionUpdate> {
        self.view.feed.lock().await.visible().cloned().collect()
    }

    /// Drop all buffered notifications.
    pub async fn clear_recent_updates(&self) {
        self.view.feed.lock().await.clear();
    }

    /// Run one synchronization cycle and wait for it to commit.
    ///
    /// Queued behind any in-flight cycle; a no-op on a disabled adapter.
    pub async fn refresh(&self) {
        let Some(commands) = &self.commands else {
            return;
        };
        let (done_tx, done_rx) = oneshot::channel();
        if commands
            .send(Command::Refresh {
                done: Some(done_tx),
            })
            .is_err()
        {
            return;
        }
        let _ = done_rx.await;
    }

    /// Write the given team's score and badges verbatim, then pull the
    /// server-confirmed state back after a short delay.
    ///
    /// The local view is not updated optimistically; the visible score only
    /// changes once the follow-up fetch confirms it. Write failures are logged
    /// and do not crash the adapter.
    pub fn update_team_data(&self, team_name: impl Into<String>, score: i64, badges: Vec<String>) {
        let Some(commands) = &self.commands else {
            return;
        };
        let _ = commands.send(Command::UpdateTeam {
            team_name: team_name.into(),
            score,
            badges,
        });
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Background task driving the synchronization cycles for one adapter.
struct Worker {
    state: SharedState,
    session_id: SessionId,
    own_team: String,
    view: Arc<SessionView>,
    previous: Option<Vec<TeamEntity>>,
    resync_delay: Duration,
}

impl Worker {
    /// Event loop: one arm per trigger source, every cycle fully sequential.
    ///
    /// A change ping arriving while a cycle runs sits in the broadcast buffer
    /// and becomes the next cycle; a lagged receiver collapses the backlog
    /// into a single refetch. Out-of-order snapshot commits cannot happen
    /// because nothing here is concurrent with itself.
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut changes: broadcast::Receiver<()>,
    ) {
        // Initial load before reacting to anything else.
        self.sync_cycle().await;

        let mut changes_open = true;
        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(Command::Refresh { done }) => {
                            self.sync_cycle().await;
                            if let Some(done) = done {
                                let _ = done.send(());
                            }
                        }
                        Some(Command::UpdateTeam { team_name, score, badges }) => {
                            self.write_team(team_name, score, badges).await;
                            sleep(self.resync_delay).await;
                            self.sync_cycle().await;
                        }
                        None => break,
                    }
                }
                change = changes.recv(), if changes_open => {
                    match change {
                        Ok(()) | Err(RecvError::Lagged(_)) => self.sync_cycle().await,
                        Err(RecvError::Closed) => changes_open = false,
                    }
                }
            }
        }
    }

    /// One fetch → diff → commit pass.
    async fn sync_cycle(&mut self) {
        match session_service::get_session(&self.state, self.session_id.as_str()).await {
            Ok(session) => {
                if let Some(previous) = &self.previous {
                    let updates = diff_snapshots(previous, &session.teams, &self.own_team);
                    if !updates.is_empty() {
                        self.view.feed.lock().await.append(updates);
                    }
                }
                self.previous = Some(session.teams.clone());

                let mut teams = session.teams.clone();
                // Stable sort so teams with equal scores keep arrival order.
                teams.sort_by_key(|team| std::cmp::Reverse(team.score));

                *self.view.teams.write().await = teams;
                *self.view.session.write().await = Some(session);
                self.view.connected.store(true, Ordering::Release);
            }
            Err(err) => {
                // Stale data stays visible; the flag tells the UI we are
                // disconnected until a later cycle succeeds.
                match err {
                    ServiceError::NotFound(_) => {
                        debug!(session_id = %self.session_id, "session missing during sync")
                    }
                    other => {
                        debug!(session_id = %self.session_id, error = %other, "sync fetch failed")
                    }
                }
                self.view.connected.store(false, Ordering::Release);
            }
        }
    }

    /// Verbatim score/badges write for the calling team.
    async fn write_team(&self, team_name: String, score: i64, badges: Vec<String>) {
        let patch = TeamPatch {
            score: Some(score),
            badges: Some(badges),
        };
        if let Err(err) =
            session_service::update_team(&self.state, self.session_id.as_str(), &team_name, patch)
                .await
        {
            warn!(
                session_id = %self.session_id,
                team = %team_name,
                error = %err,
                "failed to update team data"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::session_store::memory::MemoryStore,
        realtime::diff::UpdateKind,
        state::AppState,
    };

    fn test_state() -> SharedState {
        AppState::new(Arc::new(MemoryStore::new()), AppConfig::default())
    }

    async fn wait_until<F, Fut>(mut condition: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if condition().await {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met within one second");
    }

    #[tokio::test]
    async fn reports_other_clients_join() {
        let state = test_state();
        let session = session_service::create_session(&state, "Mission Alpha", "Red Team")
            .await
            .unwrap();

        let red = RealtimeSession::spawn(state.clone(), Some(session.id.as_str()), "Red Team");
        red.refresh().await;
        assert!(red.is_connected());
        assert!(red.recent_updates().await.is_empty());

        session_service::join_session(&state, session.id.as_str(), "Blue Team")
            .await
            .unwrap();
        red.refresh().await;

        let updates = red.recent_updates().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].team_name, "Blue Team");
        assert_eq!(updates[0].kind, UpdateKind::TeamJoined);
        assert_eq!(red.teams().await.len(), 2);
    }

    #[tokio::test]
    async fn own_join_is_not_reported_to_self() {
        let state = test_state();
        let session = session_service::create_session(&state, "Mission Alpha", "Red Team")
            .await
            .unwrap();

        // Blue subscribes before joining; its own appearance must stay silent.
        let blue = RealtimeSession::spawn(state.clone(), Some(session.id.as_str()), "Blue Team");
        blue.refresh().await;

        session_service::join_session(&state, session.id.as_str(), "Blue Team")
            .await
            .unwrap();
        blue.refresh().await;

        assert!(blue.recent_updates().await.is_empty());
        assert_eq!(blue.teams().await.len(), 2);
    }

    #[tokio::test]
    async fn badge_and_score_changes_are_ordered() {
        let state = test_state();
        let session = session_service::create_session(&state, "Mission Alpha", "Team X")
            .await
            .unwrap();
        session_service::update_team(
            &state,
            session.id.as_str(),
            "Team X",
            TeamPatch {
                score: Some(10),
                badges: Some(vec!["A".into()]),
            },
        )
        .await
        .unwrap();

        let observer =
            RealtimeSession::spawn(state.clone(), Some(session.id.as_str()), "Observer");
        observer.refresh().await;

        session_service::update_team(
            &state,
            session.id.as_str(),
            "Team X",
            TeamPatch {
                score: Some(25),
                badges: Some(vec!["A".into(), "B".into()]),
            },
        )
        .await
        .unwrap();
        observer.refresh().await;

        let updates = observer.recent_updates().await;
        assert_eq!(updates.len(), 2);
        // The diff batch keeps its internal order: badge first, then score.
        assert_eq!(
            updates[0].kind,
            UpdateKind::BadgeEarned { badge: "B".into() }
        );
        assert_eq!(
            updates[1].kind,
            UpdateKind::ScoreUpdated {
                old_score: 10,
                new_score: 25
            }
        );
    }

    #[tokio::test]
    async fn change_pings_trigger_resync_without_manual_refresh() {
        let state = test_state();
        let session = session_service::create_session(&state, "Mission Alpha", "Red Team")
            .await
            .unwrap();

        let red = RealtimeSession::spawn(state.clone(), Some(session.id.as_str()), "Red Team");
        red.refresh().await;

        session_service::join_session(&state, session.id.as_str(), "Blue Team")
            .await
            .unwrap();

        wait_until(|| async { red.teams().await.len() == 2 }).await;
    }

    #[tokio::test]
    async fn missing_session_reads_as_disconnected() {
        let state = test_state();
        let adapter = RealtimeSession::spawn(state, Some("NOPE42"), "Red Team");
        adapter.refresh().await;

        assert!(!adapter.is_connected());
        assert!(adapter.teams().await.is_empty());
        assert!(adapter.session().await.is_none());
    }

    #[tokio::test]
    async fn disabled_adapter_is_inert() {
        let state = test_state();
        let adapter = RealtimeSession::spawn(state, None, "Solo Team");
        adapter.refresh().await;

        assert!(!adapter.is_connected());
        assert!(adapter.teams().await.is_empty());

        // Writes are dropped rather than panicking.
        adapter.update_team_data("Solo Team", 10, vec![]);
    }

    #[tokio::test]
    async fn write_is_confirmed_by_fast_follow_fetch() {
        let state = test_state();
        let session = session_service::create_session(&state, "Mission Alpha", "Red Team")
            .await
            .unwrap();

        let red = RealtimeSession::spawn(state.clone(), Some(session.id.as_str()), "Red Team");
        red.refresh().await;

        red.update_team_data("Red Team", 42, vec!["Explorer".into()]);
        // refresh() queues behind the write command and its follow-up cycle.
        red.refresh().await;

        let teams = red.teams().await;
        assert_eq!(teams[0].score, 42);
        assert_eq!(teams[0].badges, vec!["Explorer".to_string()]);
        // Own write, so no self-notification.
        assert!(red.recent_updates().await.is_empty());
    }

    #[tokio::test]
    async fn teams_sort_by_score_descending() {
        let state = test_state();
        let session = session_service::create_session(&state, "Mission Alpha", "Low")
            .await
            .unwrap();
        session_service::join_session(&state, session.id.as_str(), "High")
            .await
            .unwrap();
        session_service::update_team(
            &state,
            session.id.as_str(),
            "High",
            TeamPatch {
                score: Some(30),
                badges: None,
            },
        )
        .await
        .unwrap();

        let observer =
            RealtimeSession::spawn(state.clone(), Some(session.id.as_str()), "Observer");
        observer.refresh().await;

        let teams = observer.teams().await;
        assert_eq!(teams[0].name, "High");
        assert_eq!(teams[1].name, "Low");
    }

    #[tokio::test]
    async fn clear_empties_the_notification_feed() {
        let state = test_state();
        let session = session_service::create_session(&state, "Mission Alpha", "Red Team")
            .await
            .unwrap();

        let red = RealtimeSession::spawn(state.clone(), Some(session.id.as_str()), "Red Team");
        red.refresh().await;
        session_service::join_session(&state, session.id.as_str(), "Blue Team")
            .await
            .unwrap();
        red.refresh().await;
        assert!(!red.recent_updates().await.is_empty());

        red.clear_recent_updates().await;
        assert!(red.recent_updates().await.is_empty());
    }
}
