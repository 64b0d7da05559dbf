//! Property-based tests for the session state machine
//!
//! Arbitrary command scripts are replayed through the pure transition, then
//! the resulting states are checked against the invariants every reachable
//! state must satisfy.

use super::command::Command;
use super::state::{Participant, Poll, SessionState};
use super::tally::compute_tally;
use super::transition::{transition, SessionError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

// ============================================================================
// Script generation
// ============================================================================

/// One scripted operation, referencing participants by a small slot pool so
/// repeat submissions, kicks of strangers, and answer races actually happen.
#[derive(Debug, Clone)]
enum Op {
    Create {
        question: String,
        options: Vec<String>,
    },
    Register {
        slot: u8,
    },
    Submit {
        slot: u8,
        option_index: usize,
    },
    Expire,
    Kick {
        slot: u8,
    },
}

fn arb_options() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[A-Za-z ]{1,12}", 2..5)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        ("[A-Za-z ?]{1,20}", arb_options())
            .prop_map(|(question, options)| Op::Create { question, options }),
        (0u8..4).prop_map(|slot| Op::Register { slot }),
        (0u8..4, 0usize..6).prop_map(|(slot, option_index)| Op::Submit { slot, option_index }),
        Just(Op::Expire),
        (0u8..4).prop_map(|slot| Op::Kick { slot }),
    ]
}

fn arb_script() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(arb_op(), 0..24)
}

fn participant_id(slot: u8) -> String {
    format!("participant-{slot}")
}

/// Materialize one op the way the machine would: payloads fully built, ids
/// unique per created entity, timestamps strictly increasing.
fn command_for(op: &Op, step: usize, state: &SessionState, now: DateTime<Utc>) -> Option<Command> {
    match op {
        Op::Create { question, options } => Some(Command::CreatePoll {
            poll: Poll {
                id: format!("poll-{step}"),
                question: question.clone(),
                options: options.clone(),
                created_at: now,
                expires_at: now + Duration::seconds(60),
                is_active: true,
            },
        }),
        Op::Register { slot } => {
            let id = participant_id(*slot);
            // Identifiers are never reissued; a slot registers at most once.
            if state.participant(&id).is_some() {
                return None;
            }
            Some(Command::RegisterParticipant {
                participant: Participant {
                    id,
                    name: format!("Participant {slot}"),
                    joined_at: now,
                    kicked: false,
                },
            })
        }
        Op::Submit { slot, option_index } => Some(Command::SubmitAnswer {
            participant_id: participant_id(*slot),
            participant_name: format!("Participant {slot}"),
            option_index: *option_index,
            submitted_at: now,
        }),
        Op::Expire => Some(Command::ExpirePoll),
        Op::Kick { slot } => Some(Command::KickParticipant {
            participant_id: participant_id(*slot),
        }),
    }
}

fn run_script(ops: &[Op]) -> SessionState {
    let mut state = SessionState::default();
    for (step, op) in ops.iter().enumerate() {
        let now = base_time() + Duration::seconds(step as i64);
        let Some(command) = command_for(op, step, &state, now) else {
            continue;
        };
        if let Ok(next) = transition(&state, command) {
            state = next;
        }
    }
    state
}

/// History entries may only flip `is_active` true → false; everything else
/// is frozen at creation.
fn poll_unchanged_except_closing(old: &Poll, new: &Poll) -> bool {
    old.id == new.id
        && old.question == new.question
        && old.options == new.options
        && old.created_at == new.created_at
        && old.expires_at == new.expires_at
        && (old.is_active || !new.is_active)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn cached_tally_matches_a_recompute(ops in arb_script()) {
        let state = run_script(&ops);
        if let Some(results) = &state.results {
            let poll = state
                .current_poll
                .as_ref()
                .expect("cached tally implies a current poll");
            prop_assert_eq!(&results.poll_id, &poll.id);
            prop_assert_eq!(results, &compute_tally(poll, &state.answers));

            let vote_sum: u64 = results.votes.iter().sum();
            prop_assert_eq!(vote_sum, results.total_votes);
            prop_assert_eq!(
                results.total_votes as usize,
                state.answers.iter().filter(|a| a.poll_id == poll.id).count()
            );
            prop_assert_eq!(results.votes.len(), poll.options.len());
        }
    }

    #[test]
    fn reachable_states_satisfy_the_structural_invariants(ops in arb_script()) {
        let state = run_script(&ops);

        // The current poll is the history entry with its id, verbatim.
        if let Some(current) = &state.current_poll {
            let entry = state.polls.iter().find(|p| p.id == current.id);
            prop_assert_eq!(entry, Some(current));
        }
        // No orphan answers.
        for answer in &state.answers {
            prop_assert!(state.polls.iter().any(|p| p.id == answer.poll_id));
        }
        // At most one answer per (participant, poll) pair.
        for (i, a) in state.answers.iter().enumerate() {
            prop_assert!(!state.answers[..i]
                .iter()
                .any(|b| b.poll_id == a.poll_id && b.participant_id == a.participant_id));
        }
        // Answer indices are always in range for their poll.
        for answer in &state.answers {
            let poll = state.polls.iter().find(|p| p.id == answer.poll_id).unwrap();
            prop_assert!(answer.option_index < poll.options.len());
        }
    }

    #[test]
    fn histories_are_append_only(ops in arb_script()) {
        let mut state = SessionState::default();
        for (step, op) in ops.iter().enumerate() {
            let now = base_time() + Duration::seconds(step as i64);
            let Some(command) = command_for(op, step, &state, now) else {
                continue;
            };
            if let Ok(next) = transition(&state, command) {
                prop_assert!(next.polls.len() >= state.polls.len());
                prop_assert!(next.answers.len() >= state.answers.len());
                prop_assert!(next.participants.len() >= state.participants.len());

                prop_assert_eq!(&next.answers[..state.answers.len()], &state.answers[..]);
                for (old, new) in state.polls.iter().zip(&next.polls) {
                    prop_assert!(poll_unchanged_except_closing(old, new));
                }
                for (old, new) in state.participants.iter().zip(&next.participants) {
                    prop_assert_eq!(&old.id, &new.id);
                    // The kicked flag never clears.
                    prop_assert!(!old.kicked || new.kicked);
                }
                state = next;
            }
        }
    }

    #[test]
    fn repeat_and_out_of_range_submissions_always_fail(
        ops in arb_script(),
        extra in 0usize..6,
    ) {
        let state = run_script(&ops);
        let Some(poll) = state.current_poll.as_ref().filter(|p| p.is_active) else {
            return Ok(());
        };

        if let Some(answer) = state.answers.iter().find(|a| a.poll_id == poll.id) {
            let result = transition(&state, Command::SubmitAnswer {
                participant_id: answer.participant_id.clone(),
                participant_name: answer.participant_name.clone(),
                option_index: extra.min(poll.options.len() - 1),
                submitted_at: base_time() + Duration::seconds(10_000),
            });
            prop_assert_eq!(result, Err(SessionError::DuplicateAnswer {
                participant_id: answer.participant_id.clone(),
                poll_id: poll.id.clone(),
            }));
        }

        let index = poll.options.len() + extra;
        let result = transition(&state, Command::SubmitAnswer {
            participant_id: "probe".into(),
            participant_name: "Probe".into(),
            option_index: index,
            submitted_at: base_time() + Duration::seconds(10_000),
        });
        prop_assert_eq!(result, Err(SessionError::InvalidOption {
            index,
            option_count: poll.options.len(),
        }));
    }

    #[test]
    fn expiry_is_idempotent(ops in arb_script()) {
        let state = run_script(&ops);
        let once = transition(&state, Command::ExpirePoll).unwrap();
        prop_assert!(once.active_deadline().is_none());

        let twice = transition(&once, Command::ExpirePoll).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn snapshots_round_trip(ops in arb_script()) {
        let state = run_script(&ops);
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, state);
    }

    #[test]
    fn answering_everyone_unblocks_creation(ops in arb_script()) {
        let mut state = run_script(&ops);
        let Some(poll_id) = state
            .current_poll
            .as_ref()
            .filter(|p| p.is_active)
            .map(|p| p.id.clone())
        else {
            // Without an active poll, creation is always allowed.
            prop_assert!(state.can_create_new_poll());
            return Ok(());
        };
        if state.active_participant_count() == 0 {
            return Ok(());
        }

        let pending: Vec<String> = state
            .active_participants()
            .filter(|p| !state.has_answered(&p.id, &poll_id))
            .map(|p| p.id.clone())
            .collect();
        for id in pending {
            state = transition(&state, Command::SubmitAnswer {
                participant_id: id.clone(),
                participant_name: id,
                option_index: 0,
                submitted_at: base_time() + Duration::seconds(10_000),
            }).unwrap();
        }
        prop_assert!(state.can_create_new_poll());
    }
}
