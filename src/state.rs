//! Persisted workflow state.
//!
//! One JSON document per project at `<project>/.speckit/checkpoints.json`.
//! Loading never fails: missing, unreadable, malformed, stale or
//! inconsistent documents all come back as a fresh default state plus a
//! [`LoadWarning`]. Saving always stamps [`STATE_VERSION`] and surfaces
//! write failures to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::steps::{Answers, AnswerKey, StepId, StepLedger};

/// Version of the on-disk document this build understands
pub const STATE_VERSION: u32 = 1;

/// Default state directory inside a project
pub const DEFAULT_STATE_DIR: &str = ".speckit";

/// State file name inside the state directory
pub const STATE_FILE: &str = "checkpoints.json";

/// Default assistant recorded in fresh state
pub const DEFAULT_AGENT: &str = "claude";

const BUILDING_MARKER: &str = "building";

/// Where the workflow currently stands.
///
/// Either a step from the ledger or the transient `building` marker that is
/// set while the build step's assistant session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cursor {
    Step(StepId),
    Building,
}

impl Cursor {
    /// Ledger position; `Building` sits on the build step
    pub fn position(self) -> usize {
        match self {
            Cursor::Step(step) => StepLedger::position(step),
            Cursor::Building => StepLedger::position(StepId::Build),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cursor::Step(step) => step.as_str(),
            Cursor::Building => BUILDING_MARKER,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::Step(StepLedger::first())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            BUILDING_MARKER => Ok(Cursor::Building),
            // Written by older releases before the first checkpoint ran
            "init" => Ok(Cursor::default()),
            other => other
                .parse::<StepId>()
                .map(Cursor::Step)
                .map_err(|e| e.to_string()),
        }
    }
}

impl TryFrom<String> for Cursor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.as_str().to_string()
    }
}

fn default_agent() -> String {
    DEFAULT_AGENT.to_string()
}

/// The single persisted workflow document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Empty means unset
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub current_step: Cursor,
    /// Append-only, duplicate-free, always a prefix of the ledger order
    #[serde(default)]
    pub completed_steps: Vec<StepId>,
    #[serde(default)]
    pub answers: Answers,
    /// Chosen assistant; advisory
    #[serde(default = "default_agent")]
    pub agent: String,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            current_step: Cursor::default(),
            completed_steps: Vec::new(),
            answers: Answers::default(),
            agent: default_agent(),
        }
    }
}

impl WorkflowState {
    /// Whether an answer-key already holds a value
    pub fn has_answer(&self, key: AnswerKey) -> bool {
        match key {
            AnswerKey::ProjectName => !self.project_name.is_empty(),
            other => self.answers.contains(other),
        }
    }

    pub fn is_complete(&self, step: StepId) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Append to the ledger unless already recorded. Returns true if appended.
    pub fn mark_complete(&mut self, step: StepId) -> bool {
        if self.is_complete(step) {
            return false;
        }
        self.completed_steps.push(step);
        true
    }

    /// Whether `completed_steps` is a duplicate-free prefix of the ledger and
    /// the cursor sits on the first incomplete step or the one after it.
    pub fn ledger_is_consistent(&self) -> bool {
        let total = StepLedger::steps().len();
        let done = self.completed_steps.len();
        let is_prefix = done <= total
            && self
                .completed_steps
                .iter()
                .zip(StepLedger::steps())
                .all(|(step, def)| *step == def.id);
        if !is_prefix {
            return false;
        }

        let cursor = self.current_step.position();
        if done == total {
            cursor == total - 1
        } else {
            cursor == done || cursor == done + 1
        }
    }
}

/// Why a stored document was discarded
#[derive(Debug, Error)]
pub enum LoadWarning {
    #[error("could not read checkpoint file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checkpoint file {path} is not valid: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoint format changed (found version {found})")]
    VersionMismatch { found: String },

    #[error("checkpoint file {path} has an inconsistent step ledger")]
    InconsistentLedger { path: PathBuf },
}

/// Result of [`StateStore::load`]
#[derive(Debug)]
pub struct LoadedState {
    pub state: WorkflowState,
    /// Set when a stored document existed but was discarded
    pub warning: Option<LoadWarning>,
}

impl LoadedState {
    fn fresh(warning: Option<LoadWarning>) -> Self {
        if let Some(ref w) = warning {
            tracing::warn!(warning = %w, "Resetting checkpoint state");
        }
        Self {
            state: WorkflowState::default(),
            warning,
        }
    }
}

/// Failure to persist state. Always fatal to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize checkpoint state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create state directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write checkpoint file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// On-disk shape: the state plus its version stamp
#[derive(Serialize)]
struct Document<'a> {
    version: u32,
    #[serde(flatten)]
    state: &'a WorkflowState,
}

/// Durable load/save of the workflow document at one path
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for a project directory using the given state directory name
    pub fn for_project(project_dir: &Path, state_dir: &str) -> Self {
        Self::new(Self::state_path(project_dir, state_dir))
    }

    pub fn state_path(project_dir: &Path, state_dir: &str) -> PathBuf {
        project_dir.join(state_dir).join(STATE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the state file (context files are written here too)
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the document, falling back to a fresh state on any problem
    pub fn load(&self) -> LoadedState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No checkpoint file, starting fresh");
                return LoadedState::fresh(None);
            }
            Err(source) => {
                return LoadedState::fresh(Some(LoadWarning::Unreadable {
                    path: self.path.clone(),
                    source,
                }))
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&contents) {
            Ok(v) => v,
            Err(source) => {
                return LoadedState::fresh(Some(LoadWarning::Malformed {
                    path: self.path.clone(),
                    source,
                }))
            }
        };

        let version = value.get("version");
        if version.and_then(serde_json::Value::as_u64) != Some(u64::from(STATE_VERSION)) {
            let found = version.map_or_else(|| "none".to_string(), ToString::to_string);
            return LoadedState::fresh(Some(LoadWarning::VersionMismatch { found }));
        }

        let state: WorkflowState = match serde_json::from_value(value) {
            Ok(s) => s,
            Err(source) => {
                return LoadedState::fresh(Some(LoadWarning::Malformed {
                    path: self.path.clone(),
                    source,
                }))
            }
        };

        if !state.ledger_is_consistent() {
            return LoadedState::fresh(Some(LoadWarning::InconsistentLedger {
                path: self.path.clone(),
            }));
        }

        tracing::debug!(
            path = %self.path.display(),
            current_step = %state.current_step,
            completed = state.completed_steps.len(),
            "Loaded checkpoint state"
        );
        LoadedState {
            state,
            warning: None,
        }
    }

    /// Write the whole document, replacing whatever was there
    pub fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let contents = serde_json::to_string_pretty(&Document {
            version: STATE_VERSION,
            state,
        })?;

        // Write beside the target, then swap it in
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            current_step = %state.current_step,
            "Saved checkpoint state"
        );
        Ok(())
    }
}
