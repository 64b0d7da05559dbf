//! Stateful owner of one polling session
//!
//! [`SessionMachine`] wraps the pure transition with identifier and timestamp
//! generation, persists a snapshot after every successful mutation, and
//! exposes the query surface presentation layers consume. It is generic over
//! its collaborators so tests can run it against an in-memory store and a
//! manual clock.

use super::command::Command;
use super::state::{Participant, Poll, RosterEntry, SessionConfig, SessionState, TallyResult};
use super::transition::{transition, SessionError};
use crate::clock::Clock;
use crate::store::SnapshotStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct SessionMachine<S, C> {
    state: SessionState,
    config: SessionConfig,
    store: S,
    clock: C,
}

impl<S: SnapshotStore, C: Clock> SessionMachine<S, C> {
    /// Start an empty session.
    pub fn new(store: S, clock: C, config: SessionConfig) -> Self {
        Self {
            state: SessionState::default(),
            config,
            store,
            clock,
        }
    }

    /// Start from the persisted snapshot when one loads cleanly, otherwise
    /// from an empty session. A corrupt snapshot is recoverable, never fatal.
    pub fn restore(store: S, clock: C, config: SessionConfig) -> Self {
        let state = match store.load() {
            Some(state) => {
                tracing::info!(
                    polls = state.polls.len(),
                    participants = state.participants.len(),
                    "Restored session snapshot"
                );
                state
            }
            None => {
                tracing::info!("No usable snapshot, starting fresh session");
                SessionState::default()
            }
        };
        Self {
            state,
            config,
            store,
            clock,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Create a poll and make it current. Returns the new poll id.
    ///
    /// Deliberately does not consult [`Self::can_create_new_poll`]: whether
    /// creation is currently allowed is the caller's policy, not the core's.
    pub fn create_poll(
        &mut self,
        question: impl Into<String>,
        options: Vec<String>,
    ) -> Result<String, SessionError> {
        let created_at = self.clock.now();
        let poll = Poll {
            id: Uuid::new_v4().to_string(),
            question: question.into(),
            options,
            created_at,
            expires_at: created_at + self.config.poll_duration,
            is_active: true,
        };
        let poll_id = poll.id.clone();

        self.apply(Command::CreatePoll { poll })?;
        tracing::info!(poll_id = %poll_id, "Poll created");
        Ok(poll_id)
    }

    /// Register a participant. Returns their identifier, the durable handle
    /// a device keeps and presents on every later submission.
    pub fn register_participant(&mut self, name: impl Into<String>) -> Result<String, SessionError> {
        let participant = Participant {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            joined_at: self.clock.now(),
            kicked: false,
        };
        let participant_id = participant.id.clone();

        self.apply(Command::RegisterParticipant { participant })?;
        tracing::info!(participant_id = %participant_id, "Participant registered");
        Ok(participant_id)
    }

    /// Admit one answer for the current poll and refresh the cached tally.
    pub fn submit_answer(
        &mut self,
        participant_id: impl Into<String>,
        participant_name: impl Into<String>,
        option_index: usize,
    ) -> Result<(), SessionError> {
        let participant_id = participant_id.into();
        self.apply(Command::SubmitAnswer {
            participant_id: participant_id.clone(),
            participant_name: participant_name.into(),
            option_index,
            submitted_at: self.clock.now(),
        })?;
        tracing::debug!(participant_id = %participant_id, option_index, "Answer admitted");
        Ok(())
    }

    /// Close the current poll. Safe to call any number of times; returns
    /// whether this call closed it.
    pub fn expire_poll(&mut self) -> bool {
        let Some(poll_id) = self
            .state
            .current_poll
            .as_ref()
            .filter(|p| p.is_active)
            .map(|p| p.id.clone())
        else {
            return false;
        };

        match self.apply(Command::ExpirePoll) {
            Ok(()) => {
                tracing::info!(poll_id = %poll_id, "Poll expired");
                true
            }
            // ExpirePoll is infallible; kept for uniformity with apply().
            Err(_) => false,
        }
    }

    /// Mark a participant ineligible for future polls. Their past answers
    /// stay in history and keep counting toward tallies.
    pub fn kick_participant(&mut self, participant_id: &str) -> Result<(), SessionError> {
        self.apply(Command::KickParticipant {
            participant_id: participant_id.to_string(),
        })?;
        tracing::info!(participant_id = %participant_id, "Participant kicked");
        Ok(())
    }

    // ==================== Queries ====================

    pub fn can_create_new_poll(&self) -> bool {
        self.state.can_create_new_poll()
    }

    pub fn time_remaining(&self) -> u64 {
        self.state.time_remaining(self.clock.now())
    }

    pub fn results(&self) -> Option<&TallyResult> {
        self.state.results.as_ref()
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.state.roster()
    }

    pub fn active_deadline(&self) -> Option<DateTime<Utc>> {
        self.state.active_deadline()
    }

    fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        self.state = transition(&self.state, command)?;
        // Fire-and-forget: a failed save never fails the mutation.
        if let Err(e) = self.store.save(&self.state) {
            tracing::warn!(error = %e, "Failed to persist session snapshot");
        }
        Ok(())
    }
}
