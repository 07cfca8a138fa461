//! Known coding assistants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::questions::ChoiceOption;

/// A coding assistant the launcher knows how to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assistant {
    Claude,
    Opencode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown assistant '{0}' (expected claude or opencode)")]
pub struct UnknownAssistantError(pub String);

impl Assistant {
    /// Preference order when picking one automatically
    pub const ALL: [Assistant; 2] = [Assistant::Claude, Assistant::Opencode];

    pub const OPTIONS: &'static [ChoiceOption] = &[
        ChoiceOption {
            id: "claude",
            label: "Claude Code (recommended)",
        },
        ChoiceOption {
            id: "opencode",
            label: "Opencode (free tier available)",
        },
    ];

    /// Identifier persisted in state and config
    pub fn as_str(self) -> &'static str {
        match self {
            Assistant::Claude => "claude",
            Assistant::Opencode => "opencode",
        }
    }

    /// Executable looked up on PATH
    pub fn binary(self) -> &'static str {
        self.as_str()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Assistant::Claude => "Claude Code",
            Assistant::Opencode => "Opencode",
        }
    }

    /// Flag that passes the context document path
    pub fn prompt_flag(self) -> &'static str {
        match self {
            Assistant::Claude => "--system-prompt",
            Assistant::Opencode => "--prompt",
        }
    }

    /// Directory (relative to the project) holding slash-command files
    pub fn command_dir(self) -> &'static str {
        match self {
            Assistant::Claude => ".claude/commands",
            Assistant::Opencode => ".opencode/commands",
        }
    }

    /// Install instructions, one command per line
    pub fn install_hint(self) -> &'static [&'static str] {
        match self {
            Assistant::Claude => &["npm install -g @anthropic-ai/claude-code"],
            Assistant::Opencode => &["npm install -g opencode-ai", "opencode auth login"],
        }
    }
}

impl fmt::Display for Assistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Assistant {
    type Err = UnknownAssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Assistant::Claude),
            "opencode" => Ok(Assistant::Opencode),
            _ => Err(UnknownAssistantError(s.to_string())),
        }
    }
}
