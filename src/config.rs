use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::agents::Assistant;
use crate::questions::{Question, QuestionSource};
use crate::state::DEFAULT_STATE_DIR;
use crate::steps::{EngineOptions, QualityLevel};

/// Environment variable prefix, e.g. `HERE_SPEC__WORKFLOW__AUTO_CONFIRM=true`
pub const ENV_PREFIX: &str = "HERE_SPEC";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Assistant used when `init` cannot pick one from the system check
    #[serde(default = "default_agent")]
    pub default_agent: Assistant,
    /// Default offered for the quality approach question
    #[serde(default)]
    pub default_quality: QualityLevel,
    /// Accept every "proceed now?" checkpoint confirmation
    #[serde(default)]
    pub auto_confirm: bool,
    /// State directory inside each project
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_agent() -> Assistant {
    Assistant::Claude
}

fn default_state_dir() -> String {
    DEFAULT_STATE_DIR.to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_agent: default_agent(),
            default_quality: QualityLevel::default(),
            auto_confirm: false,
            state_dir: default_state_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Print milestone celebrations between steps
    #[serde(default = "default_celebrations")]
    pub celebrations: bool,
}

fn default_celebrations() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            celebrations: default_celebrations(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to `<state_dir>/logs/` instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

const EDIT_CELEBRATIONS: Question = Question::new("celebrations", "Show celebrations?");
const EDIT_AGENT: Question = Question::new("default_agent", "Default assistant?");
const EDIT_QUALITY: Question = Question::new("default_quality", "Default quality approach?");
const EDIT_SAVE: Question = Question::new("save_config", "Save configuration?");

impl Config {
    /// User config file, `~/.config/here-spec/config.toml` on Linux
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("here-spec").join("config.toml"))
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_layers(Self::user_config_path().as_deref(), config_path)
    }

    /// Defaults, then the user file, then an explicit file, then the environment
    pub fn load_layers(user_config: Option<&Path>, config_path: Option<&str>) -> Result<Self> {
        // Embedded defaults so here-spec works without any config file
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        if let Some(user_config) = user_config {
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config.to_path_buf()));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Write this config as TOML to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        std::fs::write(path, toml_str).context("Failed to write config file")?;

        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Save to the user config file, returning where it went
    pub fn save_user(&self) -> Result<PathBuf> {
        let path = Self::user_config_path().context("No config directory on this system")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Delete `path` if present. Returns whether a file was removed.
    pub fn reset_at(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("Failed to remove config file"),
        }
    }

    pub fn reset_user() -> Result<bool> {
        match Self::user_config_path() {
            Some(path) => Self::reset_at(&path),
            None => Ok(false),
        }
    }

    /// Checkpoint engine switches derived from this config
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            auto_confirm: self.workflow.auto_confirm,
            default_quality: self.workflow.default_quality,
            ..EngineOptions::default()
        }
    }

    /// Logs directory for a project
    pub fn logs_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.workflow.state_dir).join("logs")
    }

    /// Walk the editable preferences. Returns true when the user chose to save.
    pub fn edit(&mut self, questions: &mut dyn QuestionSource) -> io::Result<bool> {
        let celebrations = questions.ask_confirm(&EDIT_CELEBRATIONS, self.ui.celebrations)?;

        let agent_id = questions.ask_choice(
            &EDIT_AGENT,
            Assistant::OPTIONS,
            self.workflow.default_agent.as_str(),
        )?;
        let agent = agent_id.parse().unwrap_or(self.workflow.default_agent);

        let quality_id = questions.ask_choice(
            &EDIT_QUALITY,
            QualityLevel::OPTIONS,
            self.workflow.default_quality.as_str(),
        )?;
        let quality = QualityLevel::from_id(&quality_id).unwrap_or(self.workflow.default_quality);

        if !questions.ask_confirm(&EDIT_SAVE, true)? {
            return Ok(false);
        }

        self.ui.celebrations = celebrations;
        self.workflow.default_agent = agent;
        self.workflow.default_quality = quality;
        Ok(true)
    }
}
