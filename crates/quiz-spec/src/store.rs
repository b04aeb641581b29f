//! Persistence of the resumable quiz snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::answers::AnswerSet;
use crate::profile::UserProfile;
use crate::units::UnitSystem;

/// The persisted subset of the quiz state.
///
/// No compatibility is promised across versions; unreadable snapshots are
/// reported as errors and callers start fresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PersistedState {
    #[serde(default)]
    pub answers: AnswerSet,
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub unit_system: UnitSystem,
    #[serde(default)]
    pub current_step: usize,
}

/// JSON Schema describing [`PersistedState`].
pub fn persisted_state_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(PersistedState)).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored quiz state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value style storage for a single quiz snapshot.
pub trait StateStore {
    /// `Ok(None)` when nothing was stored yet.
    fn load(&self) -> Result<Option<PersistedState>, StoreError>;
    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-process store, useful for hosts that persist elsewhere and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Option<PersistedState>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Some(state),
            saves: 0,
        }
    }

    pub fn current(&self) -> Option<&PersistedState> {
        self.state.as_ref()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError> {
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.state = None;
        Ok(())
    }
}

/// Stores the snapshot as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    key: String,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        let state = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "loaded quiz state");
        Ok(Some(state))
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let path = self.path();
        let contents = serde_json::to_string_pretty(state)?;
        fs::write(&path, contents).map_err(|source| io_error(&path, source))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
