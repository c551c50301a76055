use std::time::SystemTime;

use crate::dao::models::TeamEntity;

/// A detected change between two consecutive session snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    /// What changed.
    pub kind: UpdateKind,
    /// Name of the affected team.
    pub team_name: String,
    /// When the diff step generated this event.
    pub timestamp: SystemTime,
}

/// Type-specific payload of a [`SessionUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// A team appeared that was absent from the previous snapshot.
    TeamJoined,
    /// A badge label is present now that was absent before.
    BadgeEarned {
        /// The newly earned badge label.
        badge: String,
    },
    /// The team's score strictly increased.
    ScoreUpdated {
        /// Score in the previous snapshot.
        old_score: i64,
        /// Score in the new snapshot.
        new_score: i64,
    },
}

/// Compute the update events between two snapshots of a session's teams.
///
/// Events are never emitted for `own_team`, so a client is not notified about
/// its own join, badges, or score changes. For each other team, in new-snapshot
/// order: a team absent before yields one `TeamJoined`; a team present before
/// yields one `BadgeEarned` per newly present badge label (membership by exact
/// label, in new-snapshot badge order) followed by a `ScoreUpdated` when the
/// score strictly increased. Decreases and unchanged scores stay silent.
///
/// Callers skip this entirely on the very first fetch; without a previous
/// snapshot every team would register as freshly joined.
pub fn diff_snapshots(
    previous: &[TeamEntity],
    current: &[TeamEntity],
    own_team: &str,
) -> Vec<SessionUpdate> {
    let now = SystemTime::now();
    let mut updates = Vec::new();

    for team in current {
        if team.name == own_team {
            continue;
        }

        match previous.iter().find(|t| t.name == team.name) {
            None => {
                updates.push(SessionUpdate {
                    kind: UpdateKind::TeamJoined,
                    team_name: team.name.clone(),
                    timestamp: now,
                });
            }
            Some(old) => {
                for badge in &team.badges {
                    if !old.badges.contains(badge) {
                        updates.push(SessionUpdate {
                            kind: UpdateKind::BadgeEarned {
                                badge: badge.clone(),
                            },
                            team_name: team.name.clone(),
                            timestamp: now,
                        });
                    }
                }

                if team.score > old.score {
                    updates.push(SessionUpdate {
                        kind: UpdateKind::ScoreUpdated {
                            old_score: old.score,
                            new_score: team.score,
                        },
                        team_name: team.name.clone(),
                        timestamp: now,
                    });
                }
            }
        }
    }

    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str, score: i64, badges: &[&str]) -> TeamEntity {
        let mut team = TeamEntity::new(name.to_string(), None);
        team.score = score;
        team.badges = badges.iter().map(|b| (*b).to_string()).collect();
        team
    }

    #[test]
    fn new_team_yields_joined_event() {
        let previous = vec![team("Red Team", 0, &[])];
        let current = vec![team("Red Team", 0, &[]), team("Blue Team", 0, &[])];

        let updates = diff_snapshots(&previous, &current, "Red Team");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].team_name, "Blue Team");
        assert_eq!(updates[0].kind, UpdateKind::TeamJoined);
    }

    #[test]
    fn own_team_never_produces_events() {
        let previous = vec![team("Other", 0, &[])];
        let current = vec![
            team("Other", 0, &[]),
            team("Mine", 50, &["Explorer", "Navigator"]),
        ];

        assert!(diff_snapshots(&previous, &current, "Mine").is_empty());

        // Same suppression when the own team changes between snapshots.
        let previous = vec![team("Mine", 10, &["Explorer"])];
        let current = vec![team("Mine", 99, &["Explorer", "Navigator"])];
        assert!(diff_snapshots(&previous, &current, "Mine").is_empty());
    }

    #[test]
    fn badge_then_score_for_same_team() {
        let previous = vec![team("Team X", 10, &["A"])];
        let current = vec![team("Team X", 25, &["A", "B"])];

        let updates = diff_snapshots(&previous, &current, "Observer");
        assert_eq!(updates.len(), 2);
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

    #[test]
    fn new_badges_emit_in_snapshot_order() {
        let previous = vec![team("Team X", 0, &["A"])];
        let current = vec![team("Team X", 0, &["C", "A", "B"])];

        let updates = diff_snapshots(&previous, &current, "Observer");
        let badges: Vec<_> = updates
            .iter()
            .map(|u| match &u.kind {
                UpdateKind::BadgeEarned { badge } => badge.clone(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(badges, vec!["C".to_string(), "B".to_string()]);
    }

    #[test]
    fn equal_or_decreased_scores_stay_silent() {
        let previous = vec![team("Team X", 50, &[])];

        let same = vec![team("Team X", 50, &[])];
        assert!(diff_snapshots(&previous, &same, "Observer").is_empty());

        let lower = vec![team("Team X", 20, &[])];
        assert!(diff_snapshots(&previous, &lower, "Observer").is_empty());
    }
}
