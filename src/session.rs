//! Poll session state machine
//!
//! Pure transitions over an owned [`SessionState`], reducer style: commands
//! in, next state out. Identifier and timestamp generation, persistence, and
//! locking live at the edges ([`SessionMachine`], [`SessionHandle`]).

mod command;
mod machine;
mod state;
mod tally;
mod transition;

#[cfg(test)]
mod proptests;

pub use command::Command;
pub use machine::SessionMachine;
pub use state::{
    Answer, Participant, Poll, RosterEntry, SessionConfig, SessionState, TallyResult,
    DEFAULT_POLL_DURATION_SECS,
};
pub use tally::compute_tally;
pub use transition::{transition, SessionError};

use crate::clock::Clock;
use crate::store::SnapshotStore;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Clone-able, thread-safe handle to one session.
///
/// Every operation holds the session's single lock for its full
/// read-then-write span, so concurrent drivers (a moderator actor plus the
/// expiry scheduler, or a server fielding many submitters) can never
/// interleave partial writes.
pub struct SessionHandle<S, C> {
    inner: Arc<Mutex<SessionMachine<S, C>>>,
}

impl<S, C> Clone for SessionHandle<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SnapshotStore, C: Clock> SessionHandle<S, C> {
    /// Wrap a fresh, empty session.
    pub fn new(store: S, clock: C, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionMachine::new(store, clock, config))),
        }
    }

    /// Wrap a session restored from the store's snapshot (empty when none
    /// loads cleanly).
    pub fn restore(store: S, clock: C, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionMachine::restore(store, clock, config))),
        }
    }

    pub fn create_poll(
        &self,
        question: impl Into<String>,
        options: Vec<String>,
    ) -> Result<String, SessionError> {
        self.inner.lock().unwrap().create_poll(question, options)
    }

    pub fn register_participant(&self, name: impl Into<String>) -> Result<String, SessionError> {
        self.inner.lock().unwrap().register_participant(name)
    }

    pub fn submit_answer(
        &self,
        participant_id: impl Into<String>,
        participant_name: impl Into<String>,
        option_index: usize,
    ) -> Result<(), SessionError> {
        self.inner
            .lock()
            .unwrap()
            .submit_answer(participant_id, participant_name, option_index)
    }

    pub fn expire_poll(&self) -> bool {
        self.inner.lock().unwrap().expire_poll()
    }

    pub fn kick_participant(&self, participant_id: &str) -> Result<(), SessionError> {
        self.inner.lock().unwrap().kick_participant(participant_id)
    }

    pub fn can_create_new_poll(&self) -> bool {
        self.inner.lock().unwrap().can_create_new_poll()
    }

    pub fn time_remaining(&self) -> u64 {
        self.inner.lock().unwrap().time_remaining()
    }

    pub fn results(&self) -> Option<TallyResult> {
        self.inner.lock().unwrap().results().cloned()
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.inner.lock().unwrap().roster()
    }

    pub fn participant(&self, id: &str) -> Option<Participant> {
        self.inner.lock().unwrap().state().participant(id).cloned()
    }

    pub fn active_participant_count(&self) -> usize {
        self.inner.lock().unwrap().state().active_participant_count()
    }

    pub fn current_poll_answer_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .state()
            .current_poll_answer_count()
    }

    pub fn active_deadline(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().unwrap().active_deadline()
    }

    /// Point-in-time copy of the whole session state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.lock().unwrap().state().clone()
    }
}
