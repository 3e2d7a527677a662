//! Spec Kit directory layout and artifact reading.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const CONSTITUTION_FILE: &str = "constitution.md";
pub const SPEC_FILE: &str = "spec.md";
pub const PLAN_FILE: &str = "plan.md";
pub const TASKS_FILE: &str = "tasks.md";
pub const FEATURES_DIR: &str = "features";

/// Read a text file, treating any failure as absence.
///
/// Missing files are the common case and are not logged. Other failures
/// (permissions, invalid UTF-8) are logged at DEBUG and still yield `None`.
pub fn read_file_safe(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            debug!(path = ?path, error = %e, "artifact_read_failed");
            None
        }
    }
}

/// Borrow the text of an artifact only when it has content.
///
/// Empty files are treated the same as missing ones.
pub fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|t| !t.is_empty())
}

/// Paths inside a project's specification directory.
#[derive(Debug, Clone)]
pub struct SpecifyLayout {
    root: PathBuf,
}

impl SpecifyLayout {
    pub fn new(project_root: &Path, specify_dir: &str) -> Self {
        Self {
            root: project_root.join(specify_dir),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn constitution(&self) -> PathBuf {
        self.root.join(CONSTITUTION_FILE)
    }

    pub fn spec(&self) -> PathBuf {
        self.root.join(SPEC_FILE)
    }

    pub fn plan(&self) -> PathBuf {
        self.root.join(PLAN_FILE)
    }

    pub fn tasks(&self) -> PathBuf {
        self.root.join(TASKS_FILE)
    }

    pub fn features_dir(&self) -> PathBuf {
        self.root.join(FEATURES_DIR)
    }

    /// Whether the features directory exists and contains at least one entry.
    pub fn has_features(&self) -> bool {
        match std::fs::read_dir(self.features_dir()) {
            Ok(mut entries) => entries.next().is_some(),
            Err(_) => false,
        }
    }
}
