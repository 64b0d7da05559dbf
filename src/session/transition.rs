//! Pure session state transition
//!
//! Given a state and a command, produce the next state or reject the command
//! with the caller's state untouched. No I/O, no clock reads, no identifier
//! generation: given the same inputs this function always produces the same
//! outputs, and a rejection can never leave a partially applied state behind.

use super::command::Command;
use super::state::{Answer, SessionState};
use super::tally::compute_tally;
use thiserror::Error;

/// Validation failures surfaced synchronously to the caller of a mutating
/// operation. None are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no active poll accepting answers")]
    NoActivePoll,

    #[error("option index {index} out of range for a poll with {option_count} options")]
    InvalidOption { index: usize, option_count: usize },

    #[error("participant {participant_id} already answered poll {poll_id}")]
    DuplicateAnswer {
        participant_id: String,
        poll_id: String,
    },

    #[error("invalid poll definition: {0}")]
    InvalidPollDefinition(String),

    #[error("participant name must not be empty")]
    InvalidParticipantName,

    #[error("unknown participant: {0}")]
    UnknownParticipant(String),
}

/// Apply one command to the session.
pub fn transition(state: &SessionState, command: Command) -> Result<SessionState, SessionError> {
    match command {
        Command::CreatePoll { poll } => {
            if poll.question.trim().is_empty() {
                return Err(SessionError::InvalidPollDefinition(
                    "question must not be empty".into(),
                ));
            }
            if poll.options.len() < 2 {
                return Err(SessionError::InvalidPollDefinition(format!(
                    "a poll needs at least two options, got {}",
                    poll.options.len()
                )));
            }

            let mut next = state.clone();
            next.current_poll = Some(poll.clone());
            next.polls.push(poll);
            // A fresh poll has no answers yet.
            next.results = None;
            Ok(next)
        }

        Command::RegisterParticipant { participant } => {
            if participant.name.trim().is_empty() {
                return Err(SessionError::InvalidParticipantName);
            }

            let mut next = state.clone();
            next.participants.push(participant);
            Ok(next)
        }

        Command::SubmitAnswer {
            participant_id,
            participant_name,
            option_index,
            submitted_at,
        } => {
            let poll = state
                .current_poll
                .as_ref()
                .filter(|p| p.is_active)
                .ok_or(SessionError::NoActivePoll)?;

            if option_index >= poll.options.len() {
                return Err(SessionError::InvalidOption {
                    index: option_index,
                    option_count: poll.options.len(),
                });
            }
            if state.has_answered(&participant_id, &poll.id) {
                return Err(SessionError::DuplicateAnswer {
                    participant_id,
                    poll_id: poll.id.clone(),
                });
            }

            let mut next = state.clone();
            next.answers.push(Answer {
                participant_id,
                participant_name,
                poll_id: poll.id.clone(),
                option_index,
                submitted_at,
            });
            next.results = Some(compute_tally(poll, &next.answers));
            Ok(next)
        }

        Command::ExpirePoll => {
            let mut next = state.clone();
            let Some(poll) = next.current_poll.as_mut().filter(|p| p.is_active) else {
                // Nothing to expire; repeated invocations are safe.
                return Ok(next);
            };
            poll.is_active = false;
            let poll_id = poll.id.clone();
            // The history entry is the same logical poll; keep both in step.
            if let Some(entry) = next.polls.iter_mut().find(|p| p.id == poll_id) {
                entry.is_active = false;
            }
            Ok(next)
        }

        Command::KickParticipant { participant_id } => {
            let mut next = state.clone();
            let Some(participant) = next
                .participants
                .iter_mut()
                .find(|p| p.id == participant_id)
            else {
                return Err(SessionError::UnknownParticipant(participant_id));
            };
            // One-way flag; kicking twice is a no-op.
            participant.kicked = true;
            Ok(next)
        }
    }
}
