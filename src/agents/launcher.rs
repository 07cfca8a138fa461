//! Starting an assistant session for a confirmed checkpoint.
//!
//! The launcher writes the rendered context document under the state
//! directory and the assistant's `interview-context` command file, then runs
//! the assistant in the foreground with the project as working directory.
//! Without a terminal on stdin it only writes the files.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use super::assistant::Assistant;
use super::prompt::ContextRenderer;
use crate::steps::{ContextPayload, StepId};

/// Context document name for the build step
pub const BUILD_CONTEXT_FILE: &str = "launcher-context.md";

/// Slash-command file written for the assistant
pub const COMMAND_FILE: &str = "interview-context.md";

/// How a launch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The session ran and exited cleanly
    Launched,
    /// The session exited with a failure status
    Ended,
    /// The assistant binary was not found
    NotInstalled,
    /// No terminal; files were written for the user to run by hand
    Manual,
}

/// What a launch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub assistant: Assistant,
    pub context_file: PathBuf,
    pub command_file: PathBuf,
    pub outcome: LaunchOutcome,
}

/// Hands a context payload to a coding assistant
pub trait AssistantLauncher {
    fn launch(&self, payload: &ContextPayload, project_dir: &Path) -> Result<LaunchReport>;
}

/// Context document path for a step inside `state_dir`
pub fn context_file_name(step: StepId) -> String {
    if step == StepId::Build {
        BUILD_CONTEXT_FILE.to_string()
    } else {
        format!("context-{step}.md")
    }
}

/// Launches the real assistant binary
pub struct CliLauncher {
    assistant: Assistant,
    renderer: ContextRenderer,
    state_dir: String,
    interactive: bool,
}

impl CliLauncher {
    /// Launcher that spawns only when stdin is a terminal
    pub fn new(assistant: Assistant, state_dir: &str) -> Result<Self> {
        Ok(Self {
            assistant,
            renderer: ContextRenderer::new(state_dir)?,
            state_dir: state_dir.to_string(),
            interactive: io::stdin().is_terminal(),
        })
    }

    /// Override terminal detection
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn write_context(&self, payload: &ContextPayload, project_dir: &Path) -> Result<PathBuf> {
        let dir = project_dir.join(&self.state_dir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(context_file_name(payload.step));
        let contents = self.renderer.render_context(payload)?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write context file {}", path.display()))?;
        Ok(path)
    }

    fn write_command(&self, payload: &ContextPayload, project_dir: &Path) -> Result<PathBuf> {
        let dir = project_dir.join(self.assistant.command_dir());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(COMMAND_FILE);
        let contents = self.renderer.render_command(payload)?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write command file {}", path.display()))?;
        Ok(path)
    }

    fn run(&self, context_file: &Path, project_dir: &Path) -> Result<LaunchOutcome> {
        let context_file = context_file
            .canonicalize()
            .unwrap_or_else(|_| context_file.to_path_buf());

        tracing::info!(
            assistant = %self.assistant,
            context = %context_file.display(),
            "Launching assistant"
        );

        let status = Command::new(self.assistant.binary())
            .arg(self.assistant.prompt_flag())
            .arg(&context_file)
            .current_dir(project_dir)
            .status();

        match status {
            Ok(s) if s.success() => Ok(LaunchOutcome::Launched),
            Ok(s) => {
                tracing::info!(assistant = %self.assistant, code = ?s.code(), "Assistant session ended");
                Ok(LaunchOutcome::Ended)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(assistant = %self.assistant, "Assistant binary not found");
                Ok(LaunchOutcome::NotInstalled)
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to start {}", self.assistant.display_name())),
        }
    }
}

impl AssistantLauncher for CliLauncher {
    fn launch(&self, payload: &ContextPayload, project_dir: &Path) -> Result<LaunchReport> {
        let context_file = self.write_context(payload, project_dir)?;
        let command_file = self.write_command(payload, project_dir)?;

        let outcome = if self.interactive {
            self.run(&context_file, project_dir)?
        } else {
            tracing::debug!(step = %payload.step, "No terminal, skipping assistant launch");
            LaunchOutcome::Manual
        };

        Ok(LaunchReport {
            assistant: self.assistant,
            context_file,
            command_file,
            outcome,
        })
    }
}

/// A recorded call to [`MockLauncher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockLaunch {
    pub step: StepId,
    pub project_dir: PathBuf,
    pub payload: ContextPayload,
}

/// Launcher for tests: records payloads, touches nothing
#[derive(Clone)]
pub struct MockLauncher {
    pub assistant: Assistant,
    /// Outcome reported for every launch
    pub outcome: Arc<Mutex<LaunchOutcome>>,
    /// Record of launches
    pub launches: Arc<Mutex<Vec<MockLaunch>>>,
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new(LaunchOutcome::Launched)
    }
}

impl MockLauncher {
    pub fn new(outcome: LaunchOutcome) -> Self {
        Self {
            assistant: Assistant::Claude,
            outcome: Arc::new(Mutex::new(outcome)),
            launches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_outcome(&self, outcome: LaunchOutcome) {
        if let Ok(mut current) = self.outcome.lock() {
            *current = outcome;
        }
    }

    /// Steps launched so far, in order
    pub fn launched_steps(&self) -> Vec<StepId> {
        self.launches
            .lock()
            .map(|log| log.iter().map(|l| l.step).collect())
            .unwrap_or_default()
    }
}

impl AssistantLauncher for MockLauncher {
    fn launch(&self, payload: &ContextPayload, project_dir: &Path) -> Result<LaunchReport> {
        if let Ok(mut log) = self.launches.lock() {
            log.push(MockLaunch {
                step: payload.step,
                project_dir: project_dir.to_path_buf(),
                payload: payload.clone(),
            });
        }

        let outcome = self
            .outcome
            .lock()
            .map(|o| *o)
            .unwrap_or(LaunchOutcome::Launched);

        Ok(LaunchReport {
            assistant: self.assistant,
            context_file: project_dir.join(context_file_name(payload.step)),
            command_file: project_dir
                .join(self.assistant.command_dir())
                .join(COMMAND_FILE),
            outcome,
        })
    }
}
