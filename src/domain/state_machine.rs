//! Pure room state transitions.
//!
//! [`apply`] takes a [`RoomCommand`] and the room's current stored state and
//! returns the next state plus the events to broadcast. It performs no I/O;
//! loading, persisting and delivery belong to the session coordinator.

use super::{ConnectionId, RoomEvent, RoomId, RoomState};
use crate::error::GatewayError;

/// A state-changing request against one room.
///
/// Room identity is not part of the command: the caller already resolved
/// which room's state to pass in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    /// Bind `conn_id` to `name` in the room.
    Join {
        /// Joining connection.
        conn_id: ConnectionId,
        /// Display name.
        name: String,
    },
    /// Remove `conn_id` from the room.
    Leave {
        /// Leaving connection.
        conn_id: ConnectionId,
    },
    /// Record a vote for the name bound to `conn_id`.
    Vote {
        /// Voting connection.
        conn_id: ConnectionId,
        /// Opaque vote value.
        value: String,
    },
    /// Publish all votes and their numeric average.
    Reveal,
    /// Clear all votes.
    Reset,
    /// Remove a connection that went away without leaving.
    Disconnect {
        /// Closed connection.
        conn_id: ConnectionId,
    },
}

/// What a transition did to the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The room did not exist and was created by this transition.
    Created,
    /// The room state changed and must be written back.
    Mutated,
    /// The state was only read.
    ReadOnly,
}

/// Result of applying a command: next state and outbound events.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Room state after the command.
    pub state: RoomState,
    /// Events to broadcast to the room, in order.
    pub events: Vec<RoomEvent>,
    /// Whether the state has to be persisted.
    pub effect: Effect,
}

impl Transition {
    /// Returns `true` when the new state must be written to the store.
    #[must_use]
    pub fn needs_persist(&self) -> bool {
        self.effect != Effect::ReadOnly
    }
}

/// Computes the next room state and outbound events for `command`.
///
/// `current` is `None` when the store has no entry for `room_id`; only
/// `Join` accepts that, through the explicit room-creation branch.
///
/// # Errors
///
/// - [`GatewayError::UnknownRoom`] for any command other than `Join` when
///   `current` is `None`.
/// - [`GatewayError::UnresolvedConnection`] for `Leave`, `Vote` and
///   `Disconnect` from a connection that is not in the room.
pub fn apply(
    room_id: &RoomId,
    command: &RoomCommand,
    current: Option<&RoomState>,
) -> Result<Transition, GatewayError> {
    match (command, current) {
        (RoomCommand::Join { conn_id, name }, None) => Ok(create_room(*conn_id, name)),
        (RoomCommand::Join { conn_id, name }, Some(state)) => {
            Ok(join(state.clone(), *conn_id, name))
        }
        (_, None) => Err(GatewayError::UnknownRoom(room_id.clone())),
        (
            RoomCommand::Leave { conn_id } | RoomCommand::Disconnect { conn_id },
            Some(state),
        ) => remove_user(state.clone(), *conn_id),
        (RoomCommand::Vote { conn_id, value }, Some(state)) => {
            vote(state.clone(), *conn_id, value)
        }
        (RoomCommand::Reveal, Some(state)) => Ok(reveal(state)),
        (RoomCommand::Reset, Some(state)) => Ok(reset(state.clone())),
    }
}

fn create_room(conn_id: ConnectionId, name: &str) -> Transition {
    Transition {
        effect: Effect::Created,
        ..join(RoomState::new(), conn_id, name)
    }
}

fn join(mut state: RoomState, conn_id: ConnectionId, name: &str) -> Transition {
    state.insert_user(&conn_id, name);
    let events = vec![
        RoomEvent::UserJoined {
            name: name.to_string(),
        },
        RoomEvent::UsersUpdated {
            users: state.user_names(),
        },
    ];
    Transition {
        state,
        events,
        effect: Effect::Mutated,
    }
}

fn remove_user(mut state: RoomState, conn_id: ConnectionId) -> Result<Transition, GatewayError> {
    let name = state
        .remove_user(&conn_id)
        .ok_or(GatewayError::UnresolvedConnection(conn_id))?;
    let events = vec![
        RoomEvent::UserLeft { name },
        RoomEvent::UsersUpdated {
            users: state.user_names(),
        },
    ];
    Ok(Transition {
        state,
        events,
        effect: Effect::Mutated,
    })
}

fn vote(mut state: RoomState, conn_id: ConnectionId, value: &str) -> Result<Transition, GatewayError> {
    let name = state
        .name_of(&conn_id)
        .ok_or(GatewayError::UnresolvedConnection(conn_id))?
        .to_string();
    state.votes.insert(name.clone(), value.to_string());
    Ok(Transition {
        state,
        events: vec![RoomEvent::VoteUpdate {
            name,
            vote: value.to_string(),
        }],
        effect: Effect::Mutated,
    })
}

fn reveal(state: &RoomState) -> Transition {
    let average = numeric_average(state.votes.values().map(String::as_str));
    Transition {
        state: state.clone(),
        events: vec![RoomEvent::VotesRevealed {
            votes: state.votes.clone(),
            average,
        }],
        effect: Effect::ReadOnly,
    }
}

fn reset(mut state: RoomState) -> Transition {
    state.votes.clear();
    Transition {
        state,
        events: vec![RoomEvent::VotesReset {}],
        effect: Effect::Mutated,
    }
}

/// Returns `true` if `vote` is a non-empty run of ASCII decimal digits.
#[must_use]
pub fn is_numeric_vote(vote: &str) -> bool {
    !vote.is_empty() && vote.bytes().all(|b| b.is_ascii_digit())
}

/// Mean of the numeric votes rounded to two decimals, or `0.0` if none.
///
/// Non-numeric votes such as `"abstain"` or `"?"` are ignored, as are digit
/// runs too long to be represented as a finite `f64`. Halfway cases round
/// to the even neighbour (`1.125` becomes `1.12`), so the result is always
/// a finite number.
#[must_use]
pub fn numeric_average<'a>(votes: impl IntoIterator<Item = &'a str>) -> f64 {
    let values: Vec<f64> = votes
        .into_iter()
        .filter(|v| is_numeric_vote(v))
        .filter_map(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = if sum.is_finite() {
        sum / count
    } else {
        values.iter().map(|v| v / count).sum()
    };
    let scaled = mean * 100.0;
    if scaled.is_finite() {
        scaled.round_ties_even() / 100.0
    } else {
        mean
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn room() -> RoomId {
        RoomId::new("r1")
    }

    fn must(result: Result<Transition, GatewayError>) -> Transition {
        match result {
            Ok(t) => t,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    fn joined(names: &[(&ConnectionId, &str)]) -> RoomState {
        let mut state = RoomState::new();
        for (conn, name) in names {
            state.insert_user(conn, *name);
        }
        state
    }

    #[test]
    fn join_unknown_room_creates_it() {
        let conn = ConnectionId::new();
        let t = must(apply(
            &room(),
            &RoomCommand::Join {
                conn_id: conn,
                name: "Alice".to_string(),
            },
            None,
        ));
        assert_eq!(t.effect, Effect::Created);
        assert_eq!(t.state.name_of(&conn), Some("Alice"));
        assert_eq!(
            t.events,
            vec![
                RoomEvent::UserJoined {
                    name: "Alice".to_string()
                },
                RoomEvent::UsersUpdated {
                    users: vec!["Alice".to_string()]
                },
            ]
        );
    }

    #[test]
    fn join_does_not_deduplicate_names() {
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let state = joined(&[(&a, "Alice")]);
        let t = must(apply(
            &room(),
            &RoomCommand::Join {
                conn_id: b,
                name: "Alice".to_string(),
            },
            Some(&state),
        ));
        assert_eq!(t.effect, Effect::Mutated);
        assert_eq!(t.state.user_names(), vec!["Alice", "Alice"]);
    }

    #[test]
    fn leave_removes_the_name_bound_at_join() {
        let (a, b, c) = (ConnectionId::new(), ConnectionId::new(), ConnectionId::new());
        let mut state = RoomState::new();
        for (conn, name) in [(a, "Ann"), (b, "Ben"), (c, "Cat")] {
            state = must(apply(
            &room(),
                &RoomCommand::Join {
                    conn_id: conn,
                    name: name.to_string(),
                },
                Some(&state),
            ))
            .state;
        }
        for (conn, name) in [(b, "Ben"), (a, "Ann"), (c, "Cat")] {
            let t = must(apply(&room(), &RoomCommand::Leave { conn_id: conn }, Some(&state)));
            assert_eq!(
                t.events.first(),
                Some(&RoomEvent::UserLeft {
                    name: name.to_string()
                })
            );
            state = t.state;
        }
        assert!(state.is_dormant());
    }

    #[test]
    fn leave_keeps_remaining_join_order() {
        let (a, b, c) = (ConnectionId::new(), ConnectionId::new(), ConnectionId::new());
        let state = joined(&[(&a, "Ann"), (&b, "Ben"), (&c, "Cat")]);
        let t = must(apply(&room(), &RoomCommand::Leave { conn_id: a }, Some(&state)));
        assert_eq!(
            t.events.get(1),
            Some(&RoomEvent::UsersUpdated {
                users: vec!["Ben".to_string(), "Cat".to_string()]
            })
        );
    }

    #[test]
    fn leave_unknown_connection_is_unresolved() {
        let state = joined(&[(&ConnectionId::new(), "Ann")]);
        let result = apply(
            &room(),
            &RoomCommand::Leave {
                conn_id: ConnectionId::new(),
            },
            Some(&state),
        );
        assert!(matches!(result, Err(GatewayError::UnresolvedConnection(_))));
    }

    #[test]
    fn leave_keeps_departed_vote_until_reset() {
        let a = ConnectionId::new();
        let mut state = joined(&[(&a, "Ann")]);
        state.votes.insert("Ann".to_string(), "3".to_string());
        let t = must(apply(&room(), &RoomCommand::Leave { conn_id: a }, Some(&state)));
        assert_eq!(t.state.votes.len(), 1);
        let t = must(apply(&room(), &RoomCommand::Reset, Some(&t.state)));
        assert!(t.state.votes.is_empty());
    }

    #[test]
    fn vote_before_join_changes_nothing() {
        let state = joined(&[(&ConnectionId::new(), "Ann")]);
        let result = apply(
            &room(),
            &RoomCommand::Vote {
                conn_id: ConnectionId::new(),
                value: "5".to_string(),
            },
            Some(&state),
        );
        assert!(matches!(result, Err(GatewayError::UnresolvedConnection(_))));
    }

    #[test]
    fn vote_overwrites_previous_vote() {
        let a = ConnectionId::new();
        let state = joined(&[(&a, "Ann")]);
        let t = must(apply(
            &room(),
            &RoomCommand::Vote {
                conn_id: a,
                value: "5".to_string(),
            },
            Some(&state),
        ));
        let t = must(apply(
            &room(),
            &RoomCommand::Vote {
                conn_id: a,
                value: "abstain".to_string(),
            },
            Some(&t.state),
        ));
        assert_eq!(t.state.votes.get("Ann").map(String::as_str), Some("abstain"));
        assert_eq!(
            t.events,
            vec![RoomEvent::VoteUpdate {
                name: "Ann".to_string(),
                vote: "abstain".to_string()
            }]
        );
    }

    #[test]
    fn reveal_averages_numeric_votes_only() {
        let mut state = RoomState::new();
        state.votes.insert("A".to_string(), "5".to_string());
        state.votes.insert("B".to_string(), "3".to_string());
        state.votes.insert("C".to_string(), "abstain".to_string());
        let t = must(apply(&room(), &RoomCommand::Reveal, Some(&state)));
        assert_eq!(t.effect, Effect::ReadOnly);
        assert!(!t.needs_persist());
        assert_eq!(t.state, state);
        let Some(RoomEvent::VotesRevealed { votes, average }) = t.events.first() else {
            panic!("expected votes_revealed");
        };
        assert_eq!(votes, &state.votes);
        assert!((average - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reveal_without_votes_averages_zero() {
        let t = must(apply(&room(), &RoomCommand::Reveal, Some(&RoomState::new())));
        assert_eq!(
            t.events,
            vec![RoomEvent::VotesRevealed {
                votes: indexmap::IndexMap::new(),
                average: 0.0
            }]
        );
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        assert!((numeric_average(["1", "2", "2"]) - 1.67).abs() < 1e-9);
        assert!((numeric_average(["8", "5"]) - 6.5).abs() < 1e-9);
    }

    #[test]
    fn average_rounds_halfway_cases_to_even() {
        let ones_and_a_two = ["1", "1", "1", "1", "1", "1", "1", "2"];
        assert!((numeric_average(ones_and_a_two) - 1.12).abs() < 1e-9);
        let one_eighth = ["1", "0", "0", "0", "0", "0", "0", "0"];
        assert!((numeric_average(one_eighth) - 0.12).abs() < 1e-9);
        let three_eighths = ["3", "0", "0", "0", "0", "0", "0", "0"];
        assert!((numeric_average(three_eighths) - 0.38).abs() < 1e-9);
    }

    #[test]
    fn oversized_votes_never_produce_non_finite_average() {
        let huge = "9".repeat(400);
        assert!((numeric_average([huge.as_str(), "4"]) - 4.0).abs() < 1e-9);
        assert!((numeric_average([huge.as_str()])).abs() < f64::EPSILON);

        let near_max = format!("1{}", "0".repeat(308));
        let average = numeric_average([near_max.as_str(), near_max.as_str()]);
        assert!(average.is_finite());
        assert!(average > 1e307);
    }

    #[test]
    fn numeric_classification() {
        assert!(is_numeric_vote("13"));
        assert!(is_numeric_vote("007"));
        assert!(!is_numeric_vote(""));
        assert!(!is_numeric_vote("-1"));
        assert!(!is_numeric_vote("2.5"));
        assert!(!is_numeric_vote(" 3"));
        assert!(!is_numeric_vote("?"));
    }

    #[test]
    fn reset_emits_exactly_one_event_and_is_idempotent() {
        let mut state = RoomState::new();
        for i in 0..5 {
            state.votes.insert(format!("user{i}"), i.to_string());
        }
        let once = must(apply(&room(), &RoomCommand::Reset, Some(&state)));
        assert_eq!(once.events, vec![RoomEvent::VotesReset {}]);
        assert!(once.state.votes.is_empty());
        let twice = must(apply(&room(), &RoomCommand::Reset, Some(&once.state)));
        assert_eq!(twice.state, once.state);
        assert_eq!(twice.events.len(), 1);
    }

    #[test]
    fn non_join_commands_on_missing_room_are_unknown() {
        let room = RoomId::new("ghost");
        for command in [
            RoomCommand::Reveal,
            RoomCommand::Reset,
            RoomCommand::Leave {
                conn_id: ConnectionId::new(),
            },
            RoomCommand::Vote {
                conn_id: ConnectionId::new(),
                value: "1".to_string(),
            },
        ] {
            let result = apply(&room, &command, None);
            let Err(GatewayError::UnknownRoom(id)) = result else {
                panic!("expected unknown room for {command:?}");
            };
            assert_eq!(id, room);
        }
    }

    #[test]
    fn disconnect_behaves_like_leave() {
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let state = joined(&[(&a, "Ann"), (&b, "Ben")]);
        let left = must(apply(&room(), &RoomCommand::Leave { conn_id: a }, Some(&state)));
        let gone = must(apply(&room(), &RoomCommand::Disconnect { conn_id: a }, Some(&state)));
        assert_eq!(left, gone);
    }
}
