//! Tech stack detection and backpressure command selection.
//!
//! Backpressure commands are the checks the agent must run after every task.
//! They come from explicit `test command:` / `lint command:` lines in the plan
//! or constitution, topped up with defaults for the detected ecosystem.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EXPLICIT_TEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\btest\s*(?:command|cmd)?\s*:\s*[`"]?([^`"\n]+)[`"]?"#).expect("valid regex")
});

static EXPLICIT_LINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\blint\s*(?:command|cmd)?\s*:\s*[`"]?([^`"\n]+)[`"]?"#).expect("valid regex")
});

pub const TODO_TEST_COMMAND: &str = "# TODO: Add test command";
pub const TODO_LINT_COMMAND: &str = "# TODO: Add lint command";

/// Detected project ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TechStack {
    Node,
    Python,
    Rust,
    Go,
    #[default]
    Unknown,
}

impl TechStack {
    /// Stacks in detection precedence order.
    const PRECEDENCE: [TechStack; 4] = [Self::Node, Self::Python, Self::Rust, Self::Go];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Unknown => "unknown",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Node => &["typescript", "node", "npm", "react", "next.js", "javascript"],
            Self::Python => &["python", "django", "flask", "fastapi", "pytest"],
            Self::Rust => &["rust", "cargo"],
            Self::Go => &["golang", "go mod", "go test", " go "],
            Self::Unknown => &[],
        }
    }

    /// Classify lowercased text by the first keyword group that matches.
    pub fn detect(text: &str) -> Self {
        Self::PRECEDENCE
            .into_iter()
            .find(|stack| stack.keywords().iter().any(|k| text.contains(k)))
            .unwrap_or(Self::Unknown)
    }

    /// Default commands for this stack, in the order they should run.
    ///
    /// `text` is the lowercased source, needed to decide whether a node
    /// project also gets a build step.
    fn default_commands(&self, text: &str) -> Vec<DefaultCommand> {
        use CommandKind::*;
        match self {
            Self::Node => {
                let mut commands = vec![
                    DefaultCommand::new(Test, "npm test"),
                    DefaultCommand::new(Lint, "npm run lint"),
                ];
                if text.contains("typescript") {
                    commands.push(DefaultCommand::new(Build, "npm run build"));
                }
                commands
            }
            Self::Python => vec![
                DefaultCommand::new(Test, "pytest"),
                DefaultCommand::new(Lint, "ruff check ."),
            ],
            Self::Rust => vec![
                DefaultCommand::new(Test, "cargo test"),
                DefaultCommand::new(Lint, "cargo clippy"),
                DefaultCommand::new(Build, "cargo build"),
            ],
            Self::Go => vec![
                DefaultCommand::new(Test, "go test ./..."),
                DefaultCommand::new(Lint, "go vet ./..."),
            ],
            Self::Unknown => Vec::new(),
        }
    }
}

impl std::fmt::Display for TechStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Test,
    Lint,
    Build,
}

#[derive(Debug, Clone, Copy)]
struct DefaultCommand {
    kind: CommandKind,
    command: &'static str,
}

impl DefaultCommand {
    fn new(kind: CommandKind, command: &'static str) -> Self {
        Self { kind, command }
    }
}

/// Result of scanning the plan and constitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDetection {
    pub stack: TechStack,
    pub commands: Vec<String>,
}

fn capture_explicit(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|cmd| !cmd.is_empty())
}

/// Detect the tech stack and backpressure commands.
///
/// The inputs are concatenated as-is and lowercased before scanning, so
/// explicit commands are returned in lowercase.
pub fn detect_tech_stack(plan: &str, constitution: &str) -> StackDetection {
    let combined = format!("{}{}", plan, constitution).to_lowercase();

    let explicit_test = capture_explicit(&EXPLICIT_TEST, &combined);
    let explicit_lint = capture_explicit(&EXPLICIT_LINT, &combined);

    let mut commands: Vec<String> = explicit_test
        .iter()
        .chain(explicit_lint.iter())
        .cloned()
        .collect();

    let stack = TechStack::detect(&combined);
    for default in stack.default_commands(&combined) {
        let overridden = match default.kind {
            CommandKind::Test => explicit_test.is_some(),
            CommandKind::Lint => explicit_lint.is_some(),
            CommandKind::Build => false,
        };
        if !overridden {
            commands.push(default.command.to_string());
        }
    }

    if commands.is_empty() {
        commands = vec![TODO_TEST_COMMAND.to_string(), TODO_LINT_COMMAND.to_string()];
    }

    StackDetection {
        stack,
        commands: dedup_preserving_order(commands),
    }
}

fn dedup_preserving_order(commands: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    commands
        .into_iter()
        .filter(|cmd| seen.insert(cmd.clone()))
        .collect()
}
