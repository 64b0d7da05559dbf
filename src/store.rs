//! Persistence bridge
//!
//! Durable whole-session snapshots plus the per-device participant identity
//! handle. Both are trait seams so a session can run against disk, memory, or
//! a test double. The state machine treats saves as fire-and-forget: failures
//! are logged by the caller and never surface into mutation results.

use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Durable storage for whole-session snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Best-effort restore. A missing, unreadable, or malformed snapshot
    /// yields `None`; corrupt state is recoverable, never fatal.
    fn load(&self) -> Option<SessionState>;

    fn save(&self, state: &SessionState) -> Result<(), StoreError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self) -> Option<SessionState> {
        (**self).load()
    }

    fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}

/// One JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Option<SessionState> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read snapshot");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring malformed snapshot");
                None
            }
        }
    }

    fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec(state)?;
        // Write-then-rename so a crash mid-save can't leave a half-written
        // snapshot behind.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store, for tests and sessions that opt out of durability.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<Option<SessionState>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Option<SessionState> {
        self.inner.lock().unwrap().clone()
    }

    fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        *self.inner.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}

/// What a device keeps so a participant survives a reload: the opaque id
/// issued at registration plus the display name it was registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantIdentity {
    pub participant_id: String,
    pub name: String,
}

/// Ephemeral per-device storage for the registration handle. Callers save
/// the identity right after `register_participant` and present it on every
/// later submission.
pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Option<ParticipantIdentity>;
    fn save(&self, identity: &ParticipantIdentity) -> Result<(), StoreError>;
    fn clear(&self);
}

/// Process-lifetime identity storage, scoped like one browser tab.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    inner: Mutex<Option<ParticipantIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Option<ParticipantIdentity> {
        self.inner.lock().unwrap().clone()
    }

    fn save(&self, identity: &ParticipantIdentity) -> Result<(), StoreError> {
        *self.inner.lock().unwrap() = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) {
        *self.inner.lock().unwrap() = None;
    }
}
