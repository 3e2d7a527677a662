use std::path::PathBuf;

use thiserror::Error;

/// Conditions that stop generation before any output is written.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("No tasks found")]
    NoTasks { issues: Vec<String> },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
