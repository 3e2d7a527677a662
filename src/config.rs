use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the optional per-project override file, read from the project root.
pub const PROJECT_CONFIG_FILE: &str = ".ralph-prompt";

/// Status of config file loading
#[derive(Debug, Clone)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// No config file present, using built-in defaults
    Defaults,
    /// Error occurred during loading, using defaults.
    /// String is used in Debug output for logging.
    #[allow(dead_code)]
    Error(String),
}

/// Input and output locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Spec Kit directory holding constitution, specs and tasks.
    pub specify: String,
    /// Generated prompt document.
    pub prompt: String,
    /// Generated loop configuration document.
    pub config: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            specify: ".specify".to_string(),
            prompt: "PROMPT.md".to_string(),
            config: "ralph-config.md".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// How the generated documents tell the user to start the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Slash command that starts the loop in the agent.
    pub command: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            command: "/ralph-loop".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default, rename = "loop")]
    pub ralph_loop: LoopConfig,
}

impl Config {
    /// Path of the generated prompt for a project.
    pub fn prompt_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.paths.prompt)
    }

    /// Path of the generated loop configuration for a project.
    pub fn config_output_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.paths.config)
    }
}

/// Partial path configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialPathsConfig {
    pub specify: Option<String>,
    pub prompt: Option<String>,
    pub config: Option<String>,
}

/// Partial logging configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLoggingConfig {
    pub level: Option<String>,
}

/// Partial loop configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLoopConfig {
    pub command: Option<String>,
}

/// Project-specific configuration where every field is optional.
/// Parsed from `.ralph-prompt` files. Fields that are `None` inherit from the global config.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialConfig {
    pub paths: PartialPathsConfig,
    pub logging: PartialLoggingConfig,
    #[serde(rename = "loop")]
    pub ralph_loop: PartialLoopConfig,
}

/// Merge a global config with a project-level partial config.
/// Project values override global values where present.
pub fn merge_config(global: &Config, project: &PartialConfig) -> Config {
    Config {
        paths: PathsConfig {
            specify: project
                .paths
                .specify
                .clone()
                .unwrap_or_else(|| global.paths.specify.clone()),
            prompt: project
                .paths
                .prompt
                .clone()
                .unwrap_or_else(|| global.paths.prompt.clone()),
            config: project
                .paths
                .config
                .clone()
                .unwrap_or_else(|| global.paths.config.clone()),
        },
        logging: LoggingConfig {
            level: project
                .logging
                .level
                .clone()
                .unwrap_or_else(|| global.logging.level.clone()),
        },
        ralph_loop: LoopConfig {
            command: project
                .ralph_loop
                .command
                .clone()
                .unwrap_or_else(|| global.ralph_loop.command.clone()),
        },
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: ConfigLoadStatus,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "speckit", "spec-to-ralph").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (`.ralph-prompt` in the project root), if present.
pub fn get_project_config_path(project_root: &Path) -> Option<PathBuf> {
    let path = project_root.join(PROJECT_CONFIG_FILE);
    if path.is_file() { Some(path) } else { None }
}

/// Load a project config from the given path.
/// Returns Ok(PartialConfig) on success, Err(String) on parse/read failure.
fn load_project_config(path: &Path) -> Result<PartialConfig, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_read_failed");
        format!("Failed to read {}: {}", PROJECT_CONFIG_FILE, e)
    })?;

    toml::from_str::<PartialConfig>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_parse_failed");
        format!("Invalid {}: {}", PROJECT_CONFIG_FILE, e)
    })
}

/// Load configuration from the global file, the project file, the environment,
/// and defaults, in increasing order of precedence.
pub fn load_config(project_root: &Path) -> LoadedConfig {
    let project_config_path = get_project_config_path(project_root);

    let (global, config_path, status) = match get_config_path() {
        Some(path) => {
            debug!("Config path: {:?}", path);
            let (config, status) = load_global_config(&path);
            (config, path, status)
        }
        None => {
            warn!("Could not determine config directory, using defaults");
            (
                Config::default(),
                PathBuf::from("config.toml"),
                ConfigLoadStatus::Error("Could not determine config directory".to_string()),
            )
        }
    };

    let config = apply_project_config(global, project_config_path.as_deref());
    let config = apply_env_overrides(config, |key| env::var(key).ok());

    LoadedConfig {
        config,
        config_path,
        project_config_path,
        status,
    }
}

/// Merge a project config over the global one. Read or parse failures keep
/// the global config.
fn apply_project_config(global: Config, project_config_path: Option<&Path>) -> Config {
    let Some(project_path) = project_config_path else {
        return global;
    };

    match load_project_config(project_path) {
        Ok(partial) => {
            info!(path = ?project_path, "project_config_loaded");
            merge_config(&global, &partial)
        }
        Err(e) => {
            warn!(path = ?project_path, error = %e, "project_config_error");
            global
        }
    }
}

/// Load the global config file. A missing file means built-in defaults; the
/// file is never created.
fn load_global_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    match fs::read_to_string(config_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!("Loaded config from {:?}", config_path);
                (config, ConfigLoadStatus::Loaded)
            }
            Err(e) => {
                warn!(
                    "Config file malformed at {:?}: {}. Using defaults.",
                    config_path, e
                );
                (
                    Config::default(),
                    ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
                )
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No config file at {:?}, using defaults", config_path);
            (Config::default(), ConfigLoadStatus::Defaults)
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                "Permission denied reading config at {:?}. Using defaults.",
                config_path
            );
            (
                Config::default(),
                ConfigLoadStatus::Error("Permission denied reading config".to_string()),
            )
        }
        Err(e) => {
            warn!(
                "Error reading config at {:?}: {}. Using defaults.",
                config_path, e
            );
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Read error: {}", e)),
            )
        }
    }
}

/// Apply environment variable overrides to config.
///
/// `lookup` resolves a variable name to its value; production passes
/// `std::env::var`.
fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(dir) = lookup("SPEC_TO_RALPH_SPECIFY_DIR") {
        debug!("Overriding paths.specify from SPEC_TO_RALPH_SPECIFY_DIR");
        config.paths.specify = dir;
    }

    if let Some(path) = lookup("SPEC_TO_RALPH_PROMPT_FILE") {
        debug!("Overriding paths.prompt from SPEC_TO_RALPH_PROMPT_FILE");
        config.paths.prompt = path;
    }

    if let Some(path) = lookup("SPEC_TO_RALPH_CONFIG_FILE") {
        debug!("Overriding paths.config from SPEC_TO_RALPH_CONFIG_FILE");
        config.paths.config = path;
    }

    if let Some(command) = lookup("SPEC_TO_RALPH_LOOP_COMMAND") {
        debug!("Overriding loop.command from SPEC_TO_RALPH_LOOP_COMMAND");
        config.ralph_loop.command = command;
    }

    if let Some(level) = lookup("SPEC_TO_RALPH_LOG") {
        debug!("Overriding logging.level from SPEC_TO_RALPH_LOG");
        config.logging.level = level;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.specify, ".specify");
        assert_eq!(config.paths.prompt, "PROMPT.md");
        assert_eq!(config.paths.config, "ralph-config.md");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ralph_loop.command, "/ralph-loop");
    }

    #[test]
    fn test_output_paths_are_under_project_root() {
        let config = Config::default();
        let root = Path::new("/work/project");
        assert_eq!(config.prompt_path(root), root.join("PROMPT.md"));
        assert_eq!(config.config_output_path(root), root.join("ralph-config.md"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
[paths]
specify = "specs"
prompt = "docs/PROMPT.md"
config = "docs/loop.md"

[logging]
level = "debug"

[loop]
command = "/loop"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.paths.specify, "specs");
        assert_eq!(config.paths.prompt, "docs/PROMPT.md");
        assert_eq!(config.paths.config, "docs/loop.md");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.ralph_loop.command, "/loop");
    }

    #[test]
    fn test_config_partial_deserialization() {
        // Only logging section specified, others should use defaults
        let toml_str = r#"
[logging]
level = "trace"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.paths.prompt, "PROMPT.md");
        assert_eq!(config.ralph_loop.command, "/ralph-loop");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml_str = r#"
[paths]
prompt = "P.md"
unknown_key = "should be ignored"

[unknown_section]
foo = "bar"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.paths.prompt, "P.md");
    }

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(serialized.contains("[loop]"));
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.paths.specify, ".specify");
        assert_eq!(parsed.ralph_loop.command, "/ralph-loop");
    }

    #[test]
    fn test_partial_config_empty() {
        let partial: PartialConfig = toml::from_str("").unwrap();
        assert!(partial.paths.specify.is_none());
        assert!(partial.paths.prompt.is_none());
        assert!(partial.paths.config.is_none());
        assert!(partial.logging.level.is_none());
        assert!(partial.ralph_loop.command.is_none());
    }

    #[test]
    fn test_merge_config_no_overrides() {
        let global = Config::default();
        let merged = merge_config(&global, &PartialConfig::default());

        assert_eq!(merged.paths.specify, global.paths.specify);
        assert_eq!(merged.paths.prompt, global.paths.prompt);
        assert_eq!(merged.paths.config, global.paths.config);
        assert_eq!(merged.logging.level, global.logging.level);
        assert_eq!(merged.ralph_loop.command, global.ralph_loop.command);
    }

    #[test]
    fn test_merge_config_partial_overrides() {
        let global = Config::default();
        let partial: PartialConfig = toml::from_str(
            r#"
[paths]
specify = "spec-kit"

[loop]
command = "/my-loop"
"#,
        )
        .unwrap();
        let merged = merge_config(&global, &partial);

        // Overridden fields
        assert_eq!(merged.paths.specify, "spec-kit");
        assert_eq!(merged.ralph_loop.command, "/my-loop");

        // Inherited fields
        assert_eq!(merged.paths.prompt, global.paths.prompt);
        assert_eq!(merged.paths.config, global.paths.config);
        assert_eq!(merged.logging.level, global.logging.level);
    }

    #[test]
    fn test_apply_project_config_from_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[paths]\nprompt = \"AGENT.md\"\n",
        )
        .unwrap();

        let path = get_project_config_path(dir.path());
        assert_eq!(path, Some(dir.path().join(PROJECT_CONFIG_FILE)));

        let config = apply_project_config(Config::default(), path.as_deref());
        assert_eq!(config.paths.prompt, "AGENT.md");
        assert_eq!(config.paths.config, "ralph-config.md");
    }

    #[test]
    fn test_apply_project_config_malformed_keeps_global() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_FILE);
        fs::write(&path, "[paths\nprompt = ").unwrap();

        let config = apply_project_config(Config::default(), Some(&path));
        assert_eq!(config.paths.prompt, "PROMPT.md");
    }

    #[test]
    fn test_project_config_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(get_project_config_path(dir.path()), None);
    }

    #[test]
    fn test_load_global_config_missing_file_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (config, status) = load_global_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Defaults));
        assert_eq!(config.paths.prompt, "PROMPT.md");
        assert!(!path.exists());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_load_global_config_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[loop]\ncommand = \"/loop\"\n").unwrap();

        let (config, status) = load_global_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Loaded));
        assert_eq!(config.ralph_loop.command, "/loop");
    }

    #[test]
    fn test_load_global_config_malformed_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not = [valid").unwrap();

        let (config, status) = load_global_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Error(_)));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SPEC_TO_RALPH_SPECIFY_DIR", "spec"),
            ("SPEC_TO_RALPH_LOOP_COMMAND", "/loop"),
            ("SPEC_TO_RALPH_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let config = apply_env_overrides(Config::default(), |key| {
            vars.get(key).map(|v| v.to_string())
        });
        assert_eq!(config.paths.specify, "spec");
        assert_eq!(config.ralph_loop.command, "/loop");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.paths.prompt, "PROMPT.md");
    }
}
