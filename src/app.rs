//! Generation pipeline: analyze a project, render documents, write them out.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GenerateError;
use crate::iterations::calculate_iterations;
use crate::project::{Project, analyze_project};
use crate::templates::{generate_config, generate_prompt};

/// Inputs for one generation run, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub feature: Option<String>,
    pub max_iterations: Option<u32>,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct Generated {
    pub project: Project,
    pub prompt_path: PathBuf,
    pub config_path: PathBuf,
    pub max_iterations: u32,
}

/// Resolve the project path to an absolute, existing directory path.
pub fn resolve_project_path(path: &Path) -> Result<PathBuf, GenerateError> {
    fs::canonicalize(path).map_err(|e| {
        debug!(path = ?path, error = %e, "project_path_unresolved");
        GenerateError::PathNotFound(path.to_path_buf())
    })
}

fn write_output(path: &Path, contents: &str) -> Result<(), GenerateError> {
    fs::write(path, contents).map_err(|source| {
        warn!(path = ?path, error = %source, "output_write_failed");
        GenerateError::Write {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!(path = ?path, bytes = contents.len(), "output_written");
    Ok(())
}

/// Analyze the project at `root` and write the prompt and loop configuration.
///
/// Nothing is written when no tasks are found.
pub fn generate(
    root: &Path,
    options: &GenerateOptions,
    config: &Config,
) -> Result<Generated, GenerateError> {
    let project = analyze_project(root, &config.paths.specify, options.feature.as_deref());

    if project.total_tasks == 0 {
        warn!(issues = ?project.issues, "no_tasks_found");
        return Err(GenerateError::NoTasks {
            issues: project.issues,
        });
    }

    let max_iterations = options
        .max_iterations
        .unwrap_or_else(|| calculate_iterations(project.total_incomplete, project.feature_count()));
    debug!(
        max_iterations,
        overridden = options.max_iterations.is_some(),
        "iterations_selected"
    );

    let prompt = generate_prompt(&project, config);
    let loop_config = generate_config(&project, config, max_iterations);

    let prompt_path = config.prompt_path(root);
    let config_path = config.config_output_path(root);
    write_output(&prompt_path, &prompt)?;
    write_output(&config_path, &loop_config)?;

    Ok(Generated {
        project,
        prompt_path,
        config_path,
        max_iterations,
    })
}
