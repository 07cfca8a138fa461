//! Host and assistant detection
//!
//! Checks for binaries on PATH with the `which` crate and asks detected
//! assistants for their version.

use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;
use sysinfo::System;

use crate::agents::Assistant;

/// Package managers reported by the system check, in display order
const PACKAGE_MANAGERS: [&str; 4] = ["pip3", "npm", "brew", "apt"];

/// One detected assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedAssistant {
    pub assistant: Assistant,
    pub path: PathBuf,
    /// `<binary> --version` output, "unknown" when it could not be read
    pub version: String,
}

/// Snapshot of the host as far as the workflow cares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub git: bool,
    pub node: bool,
    /// `python3 --version`, `None` when python3 is missing
    pub python: Option<String>,
    pub assistants: Vec<DetectedAssistant>,
    pub package_managers: Vec<String>,
}

impl SystemInfo {
    pub fn has_assistant(&self, assistant: Assistant) -> bool {
        self.assistants.iter().any(|d| d.assistant == assistant)
    }

    /// First installed assistant in preference order
    pub fn recommended_assistant(&self) -> Option<Assistant> {
        Assistant::ALL
            .into_iter()
            .find(|a| self.has_assistant(*a))
    }
}

/// Probe the host
pub fn detect_system() -> SystemInfo {
    let info = SystemInfo {
        os: detect_os(),
        git: is_installed("git"),
        node: is_installed("node"),
        python: is_installed("python3")
            .then(|| get_version("python3").unwrap_or_else(|| "unknown".to_string())),
        assistants: Assistant::ALL.into_iter().filter_map(detect_assistant).collect(),
        package_managers: PACKAGE_MANAGERS
            .iter()
            .filter(|pm| is_installed(pm))
            .map(|pm| (*pm).to_string())
            .collect(),
    };

    tracing::debug!(
        os = %info.os,
        assistants = info.assistants.len(),
        "System detection complete"
    );
    info
}

fn detect_assistant(assistant: Assistant) -> Option<DetectedAssistant> {
    let path = which::which(assistant.binary()).ok()?;
    let version = get_version(assistant.binary()).unwrap_or_else(|| "unknown".to_string());
    Some(DetectedAssistant {
        assistant,
        path,
        version,
    })
}

fn is_installed(binary: &str) -> bool {
    which::which(binary).is_ok()
}

/// Run `<binary> --version`; some tools print to stderr
fn get_version(binary: &str) -> Option<String> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let version = if stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    } else {
        stdout
    };
    (!version.is_empty()).then_some(version)
}

fn detect_os() -> String {
    let name = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
    let kernel = System::kernel_version().unwrap_or_default();
    label_os(&name, &kernel)
}

/// Friendly OS label; flags WSL from the kernel release
fn label_os(name: &str, kernel: &str) -> String {
    let lower = name.to_lowercase();
    if lower.contains("darwin") || lower.contains("macos") {
        "macOS".to_string()
    } else if lower.contains("windows") {
        "Windows".to_string()
    } else if kernel.to_lowercase().contains("microsoft") {
        format!("{name} (WSL)")
    } else {
        name.to_string()
    }
}
