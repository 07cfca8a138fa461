//! Detection of the host toolchain and installed coding assistants
//!
//! Used by `check` for the full report and by `init` to pick an assistant.

mod detection;

pub use detection::{detect_system, DetectedAssistant, SystemInfo};
