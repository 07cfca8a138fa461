//! Project discovery by scanning for checkpoint state files

use std::fs;
use std::path::Path;

use crate::state::StateStore;

/// Whether `dir` holds a checkpoint state file
pub fn is_project(dir: &Path, state_dir: &str) -> bool {
    StateStore::state_path(dir, state_dir).is_file()
}

/// Discover projects among the immediate subdirectories of `root`
///
/// Returns a sorted list of directory names that hold a state file.
pub fn discover(root: &Path, state_dir: &str) -> Vec<String> {
    let mut projects = Vec::new();

    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && is_project(&path, state_dir) {
                if let Some(name) = path.file_name() {
                    projects.push(name.to_string_lossy().to_string());
                }
            }
        }
    }

    projects.sort();
    projects
}
