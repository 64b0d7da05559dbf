//! Commands accepted by the session transition

use super::state::{Participant, Poll};
use chrono::{DateTime, Utc};

/// Mutations the session accepts.
///
/// Payloads arrive fully built; identifier and timestamp generation happens
/// in [`super::SessionMachine`], which keeps the transition itself pure.
#[derive(Debug, Clone)]
pub enum Command {
    /// Replace the current poll and append it to history.
    CreatePoll { poll: Poll },

    /// Append a newly registered participant.
    RegisterParticipant { participant: Participant },

    /// Admit one answer for the current poll. The poll id is derived from
    /// the current poll inside the transition.
    SubmitAnswer {
        participant_id: String,
        participant_name: String,
        option_index: usize,
        submitted_at: DateTime<Utc>,
    },

    /// Close the current poll. Idempotent.
    ExpirePoll,

    /// Mark a participant ineligible for future polls.
    KickParticipant { participant_id: String },
}
