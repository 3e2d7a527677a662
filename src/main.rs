mod app;
mod config;
mod constraints;
mod error;
mod features;
mod iterations;
mod logging;
mod project;
mod specify;
mod stack;
mod summary;
mod tasks;
mod templates;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use crate::app::{GenerateOptions, generate, resolve_project_path};
use crate::error::GenerateError;
use crate::summary::{JsonSummary, render_text};

/// Generate Ralph prompts from Spec Kit projects.
#[derive(Parser, Debug)]
#[command(name = "spec-to-ralph", version, about)]
struct Cli {
    /// Path to project root (default: current directory)
    #[arg(default_value = ".")]
    project_path: PathBuf,

    /// Feature selection: 'all', single ID, or comma-separated list
    #[arg(long)]
    feature: Option<String>,

    /// Override the auto-calculated max iterations
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_iterations: Option<u32>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<ExitCode> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    // Initialize logging before anything else
    let logging_context = match logging::init() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    let result = run(&cli, logging_context.as_ref());

    if let Some(ctx) = &logging_context {
        info!(
            session_id = %ctx.session_id,
            duration_secs = start_time.elapsed().as_secs_f64(),
            "session_end"
        );
    }

    result
}

fn run(cli: &Cli, logging_context: Option<&logging::LoggingContext>) -> Result<ExitCode> {
    let root = match resolve_project_path(&cli.project_path) {
        Ok(root) => root,
        Err(e) => return Ok(report_fatal(&e)),
    };

    let loaded_config = config::load_config(&root);
    debug!(
        config_path = %loaded_config.config_path.display(),
        project_config = ?loaded_config.project_config_path,
        status = ?loaded_config.status,
        "config_loaded"
    );
    let config = loaded_config.config;

    if let Some(ctx) = logging_context {
        if let Err(e) = logging::update_log_level(&ctx.reload_handle, &config.logging.level) {
            warn!(error = %e, "log_level_update_failed");
        }
        logging::cleanup_old_logs(&ctx.log_directory);
    }

    let options = GenerateOptions {
        feature: cli.feature.clone(),
        max_iterations: cli.max_iterations,
    };
    info!(root = %root.display(), feature = ?options.feature, "generation_started");

    let generated = match generate(&root, &options, &config) {
        Ok(generated) => generated,
        Err(e @ (GenerateError::PathNotFound(_) | GenerateError::NoTasks { .. })) => {
            return Ok(report_fatal(&e));
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to write generated files")),
    };

    if cli.json {
        let json = JsonSummary::new(&generated, &config)
            .to_json()
            .context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        println!("{}", render_text(&generated, &config));
    }

    Ok(ExitCode::SUCCESS)
}

/// Print a fatal error (and any accumulated issues) to stderr.
fn report_fatal(error: &GenerateError) -> ExitCode {
    warn!(error = %error, "generation_aborted");
    eprintln!("Error: {}", error);
    if let GenerateError::NoTasks { issues } = error {
        for issue in issues {
            eprintln!("  - {}", issue);
        }
    }
    ExitCode::FAILURE
}
