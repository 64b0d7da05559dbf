//! Live classroom polling session core
//!
//! A moderator creates timed multiple-choice polls, participants submit one
//! answer each, and results are tallied in real time. This crate is the
//! authoritative in-process state container behind that flow: a pure
//! transition layer over [`session::SessionState`], wrapped by a
//! lock-per-operation [`session::SessionHandle`], with persistence
//! ([`store`]) and expiry ([`scheduler`]) injected as collaborators. How the
//! state is replicated to other devices is the embedder's concern; everything
//! here is synchronous and single-writer.
//!
//! ```
//! use livepoll::clock::SystemClock;
//! use livepoll::session::{SessionConfig, SessionHandle};
//! use livepoll::store::{
//!     IdentityStore, MemoryIdentityStore, MemorySnapshotStore, ParticipantIdentity,
//! };
//!
//! let session = SessionHandle::new(
//!     MemorySnapshotStore::new(),
//!     SystemClock,
//!     SessionConfig::default(),
//! );
//!
//! // A device registers once and keeps the issued handle.
//! let alice = session.register_participant("Alice")?;
//! let device = MemoryIdentityStore::new();
//! device.save(&ParticipantIdentity {
//!     participant_id: alice.clone(),
//!     name: "Alice".into(),
//! })?;
//!
//! session.create_poll("Pick a color", vec!["Red".into(), "Blue".into()])?;
//! session.submit_answer(alice.as_str(), "Alice", 0)?;
//!
//! let tally = session.results().expect("an admitted answer caches a tally");
//! assert_eq!(tally.votes, vec![1, 0]);
//! assert!(session.can_create_new_poll());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod clock;
pub mod scheduler;
pub mod session;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{ExpiryScheduler, DEFAULT_TICK_PERIOD};
pub use session::{
    compute_tally, transition, Answer, Command, Participant, Poll, RosterEntry, SessionConfig,
    SessionError, SessionHandle, SessionMachine, SessionState, TallyResult,
    DEFAULT_POLL_DURATION_SECS,
};
pub use store::{
    IdentityStore, JsonSnapshotStore, MemoryIdentityStore, MemorySnapshotStore,
    ParticipantIdentity, SnapshotStore, StoreError,
};

/// Production wiring: a disk-backed session on the real clock.
pub type DurableSession = SessionHandle<JsonSnapshotStore, SystemClock>;
