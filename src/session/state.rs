//! Session state types
//!
//! Plain value types plus the derived read-only queries the presentation
//! layer consumes. All mutation goes through [`super::transition`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a poll accepts answers once created, in seconds.
pub const DEFAULT_POLL_DURATION_SECS: i64 = 60;

/// A timed multiple-choice poll.
///
/// Immutable once created, except for `is_active`, which flips true → false
/// exactly once at expiry and never back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    /// Ordered option labels. At least two; labels need not be unique.
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

/// One participant's answer to one poll. At most one per
/// `(participant_id, poll_id)` pair; the transition enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub participant_id: String,
    /// Display name, denormalized so results render without a roster lookup.
    pub participant_name: String,
    pub poll_id: String,
    pub option_index: usize,
    pub submitted_at: DateTime<Utc>,
}

/// A registered participant. Never removed, only flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    /// One-way flag. Removes quorum eligibility; historical answers stay
    /// in history and keep counting.
    #[serde(default)]
    pub kicked: bool,
}

/// Vote counts for one poll, always recomputed from the answer history,
/// never patched incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyResult {
    pub poll_id: String,
    pub question: String,
    /// Copied from the poll so results render independently of it.
    pub options: Vec<String>,
    /// One bucket per option; `votes.len() == options.len()`.
    pub votes: Vec<u64>,
    pub total_votes: u64,
    /// The answers that produced the counts above.
    pub answers: Vec<Answer>,
}

/// Aggregate root for one polling session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// `None` until the first poll is created. An inactive poll here is a
    /// distinct state: the last poll, closed.
    pub current_poll: Option<Poll>,
    /// Append-only history of every poll ever created.
    pub polls: Vec<Poll>,
    /// Append-only history of every answer ever admitted, across all polls.
    pub answers: Vec<Answer>,
    pub participants: Vec<Participant>,
    /// Cached tally for the current poll, refreshed on each admitted answer.
    pub results: Option<TallyResult>,
}

/// A participant paired with whether they answered the current poll.
/// Derived on demand by joining the answer history, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub participant: Participant,
    pub answered_current: bool,
}

/// Immutable per-session configuration. Not part of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub poll_duration: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_duration: Duration::seconds(DEFAULT_POLL_DURATION_SECS),
        }
    }
}

impl SessionState {
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn has_answered(&self, participant_id: &str, poll_id: &str) -> bool {
        self.answers
            .iter()
            .any(|a| a.poll_id == poll_id && a.participant_id == participant_id)
    }

    /// Whether the participant has answered the current poll. False when no
    /// poll exists.
    pub fn has_answered_current(&self, participant_id: &str) -> bool {
        self.current_poll
            .as_ref()
            .is_some_and(|poll| self.has_answered(participant_id, &poll.id))
    }

    /// Participants still eligible for quorum.
    pub fn active_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| !p.kicked)
    }

    pub fn active_participant_count(&self) -> usize {
        self.active_participants().count()
    }

    pub fn current_poll_answer_count(&self) -> usize {
        match &self.current_poll {
            Some(poll) => self.answers.iter().filter(|a| a.poll_id == poll.id).count(),
            None => 0,
        }
    }

    /// Participants with the derived answered-current-poll flag, for display.
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.participants
            .iter()
            .map(|p| RosterEntry {
                answered_current: self.has_answered_current(&p.id),
                participant: p.clone(),
            })
            .collect()
    }

    /// Whether the moderator may start a new poll: true on a fresh session,
    /// once the current poll closed, or once every non-kicked participant has
    /// answered the current poll (and at least one such participant exists).
    pub fn can_create_new_poll(&self) -> bool {
        let Some(poll) = &self.current_poll else {
            return true;
        };
        if !poll.is_active {
            return true;
        }
        self.active_participant_count() > 0
            && self
                .active_participants()
                .all(|p| self.has_answered(&p.id, &poll.id))
    }

    /// Seconds until the current poll closes, rounded up. Zero without an
    /// active poll.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> u64 {
        let Some(poll) = self.current_poll.as_ref().filter(|p| p.is_active) else {
            return 0;
        };
        let millis = (poll.expires_at - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            #[allow(clippy::cast_sign_loss)] // positive after the check above
            let millis = millis as u64;
            millis.div_ceil(1000)
        }
    }

    /// Deadline of the currently active poll, if any. What the expiry
    /// scheduler watches.
    pub fn active_deadline(&self) -> Option<DateTime<Utc>> {
        self.current_poll
            .as_ref()
            .filter(|p| p.is_active)
            .map(|p| p.expires_at)
    }
}
