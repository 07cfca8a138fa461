//! Coding assistants and how context reaches them

mod assistant;
mod launcher;
mod prompt;

pub use assistant::{Assistant, UnknownAssistantError};
pub use launcher::{
    context_file_name, AssistantLauncher, CliLauncher, LaunchOutcome, LaunchReport, MockLaunch,
    MockLauncher, BUILD_CONTEXT_FILE, COMMAND_FILE,
};
pub use prompt::ContextRenderer;
