//! Result reporting: the `--json` object and the human-readable summary.

use serde::Serialize;

use crate::app::Generated;
use crate::config::Config;
use crate::project::Structure;
use crate::stack::TechStack;
use crate::templates::run_command;

/// Issues shown in the human-readable summary before collapsing the rest.
const MAX_LISTED_ISSUES: usize = 5;

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub success: bool,
    pub structure: &'static str,
    pub files: OutputFiles,
    /// `None` (serialized as `null`) for flat projects.
    pub features: Option<Vec<FeatureSummary>>,
    pub analysis: Analysis,
    pub issues: Vec<String>,
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct OutputFiles {
    pub prompt: String,
    pub config: String,
}

#[derive(Debug, Serialize)]
pub struct FeatureSummary {
    pub id: String,
    pub tasks: usize,
    pub incomplete: usize,
}

#[derive(Debug, Serialize)]
pub struct Analysis {
    pub tech_stack: TechStack,
    pub total_tasks: usize,
    pub incomplete_tasks: usize,
    pub max_iterations: u32,
    pub backpressure_commands: Vec<String>,
}

impl JsonSummary {
    pub fn new(generated: &Generated, config: &Config) -> Self {
        let project = &generated.project;
        let features = match &project.structure {
            Structure::Features(set) => Some(
                set.selected()
                    .map(|f| FeatureSummary {
                        id: f.id.clone(),
                        tasks: f.task_count,
                        incomplete: f.incomplete_tasks,
                    })
                    .collect(),
            ),
            _ => None,
        };

        Self {
            success: true,
            structure: project.structure.label(),
            files: OutputFiles {
                prompt: generated.prompt_path.display().to_string(),
                config: generated.config_path.display().to_string(),
            },
            features,
            analysis: Analysis {
                tech_stack: project.tech_stack,
                total_tasks: project.total_tasks,
                incomplete_tasks: project.total_incomplete,
                max_iterations: generated.max_iterations,
                backpressure_commands: project.backpressure_commands.clone(),
            },
            issues: project.issues.clone(),
            command: run_command(config, generated.max_iterations),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Render the summary printed after a successful run without `--json`.
pub fn render_text(generated: &Generated, config: &Config) -> String {
    let project = &generated.project;
    let mut lines = vec![
        format!("✅ Generated: {}", generated.prompt_path.display()),
        format!("✅ Generated: {}", generated.config_path.display()),
        String::new(),
        format!("📁 Structure: {}", project.structure.label()),
    ];

    let selected = project.selected_features();
    if !selected.is_empty() {
        lines.push("📋 Features selected:".to_string());
        lines.extend(selected.iter().map(|f| {
            format!(
                "   - {}: {}/{} tasks",
                f.id, f.incomplete_tasks, f.task_count
            )
        }));
    }

    lines.push(String::new());
    lines.push("📊 Summary:".to_string());
    lines.push(format!("   Tech Stack: {}", project.tech_stack));
    lines.push(format!(
        "   Tasks: {} incomplete / {} total",
        project.total_incomplete, project.total_tasks
    ));
    lines.push(format!("   Max Iterations: {}", generated.max_iterations));

    if !project.issues.is_empty() {
        lines.push(String::new());
        lines.push("⚠️  Issues:".to_string());
        lines.extend(
            project
                .issues
                .iter()
                .take(MAX_LISTED_ISSUES)
                .map(|issue| format!("   - {}", issue)),
        );
        if project.issues.len() > MAX_LISTED_ISSUES {
            lines.push(format!(
                "   ... and {} more",
                project.issues.len() - MAX_LISTED_ISSUES
            ));
        }
    }

    lines.push(String::new());
    lines.push("🚀 Run:".to_string());
    lines.push(format!("   {}", run_command(config, generated.max_iterations)));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;
    use crate::project::{FeatureSet, FlatArtifacts, Project};
    use std::path::PathBuf;

    fn generated(structure: Structure, issues: Vec<String>) -> Generated {
        Generated {
            project: Project {
                root: PathBuf::from("/work/shop"),
                structure,
                constitution: None,
                total_tasks: 5,
                total_incomplete: 3,
                backpressure_commands: vec!["pytest".to_string(), "ruff check .".to_string()],
                constraints: Vec::new(),
                tech_stack: TechStack::Python,
                issues,
            },
            prompt_path: PathBuf::from("/work/shop/PROMPT.md"),
            config_path: PathBuf::from("/work/shop/ralph-config.md"),
            max_iterations: 14,
        }
    }

    fn auth_feature() -> Feature {
        Feature {
            id: "001-auth".to_string(),
            number: "001".to_string(),
            name: "auth".to_string(),
            path: PathBuf::from("/work/shop/.specify/features/001-auth"),
            spec: None,
            plan: None,
            tasks: None,
            task_count: 5,
            incomplete_tasks: 3,
            issues: Vec::new(),
        }
    }

    #[test]
    fn test_json_summary_flat() {
        let generated = generated(Structure::Flat(FlatArtifacts::default()), vec!["x".to_string()]);
        let json = JsonSummary::new(&generated, &Config::default()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["structure"], "flat");
        assert_eq!(value["files"]["prompt"], "/work/shop/PROMPT.md");
        assert_eq!(value["files"]["config"], "/work/shop/ralph-config.md");
        assert!(value["features"].is_null());
        assert_eq!(value["analysis"]["tech_stack"], "python");
        assert_eq!(value["analysis"]["total_tasks"], 5);
        assert_eq!(value["analysis"]["incomplete_tasks"], 3);
        assert_eq!(value["analysis"]["max_iterations"], 14);
        assert_eq!(
            value["analysis"]["backpressure_commands"],
            serde_json::json!(["pytest", "ruff check ."])
        );
        assert_eq!(value["issues"], serde_json::json!(["x"]));
        assert_eq!(
            value["command"],
            r#"/ralph-loop "Follow PROMPT.md" --max-iterations 14 --completion-promise "ALL_TASKS_COMPLETE""#
        );
    }

    #[test]
    fn test_json_summary_features() {
        let structure = Structure::Features(FeatureSet {
            features: vec![auth_feature()],
            selected: vec![0],
        });
        let generated = generated(structure, Vec::new());
        let json = JsonSummary::new(&generated, &Config::default()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["structure"], "features");
        assert_eq!(
            value["features"],
            serde_json::json!([{"id": "001-auth", "tasks": 5, "incomplete": 3}])
        );
    }

    #[test]
    fn test_render_text_features_and_issue_overflow() {
        let structure = Structure::Features(FeatureSet {
            features: vec![auth_feature()],
            selected: vec![0],
        });
        let issues = (1..=7).map(|i| format!("issue {i}")).collect();
        let text = render_text(&generated(structure, issues), &Config::default());

        assert!(text.contains("📁 Structure: features"));
        assert!(text.contains("   - 001-auth: 3/5 tasks"));
        assert!(text.contains("   Tech Stack: python"));
        assert!(text.contains("   Tasks: 3 incomplete / 5 total"));
        assert!(text.contains("   Max Iterations: 14"));
        assert!(text.contains("   - issue 5"));
        assert!(!text.contains("issue 6"));
        assert!(text.contains("   ... and 2 more"));
        assert!(text.ends_with(
            r#"   /ralph-loop "Follow PROMPT.md" --max-iterations 14 --completion-promise "ALL_TASKS_COMPLETE""#
        ));
    }

    #[test]
    fn test_render_text_flat_without_issues() {
        let text = render_text(
            &generated(Structure::Flat(FlatArtifacts::default()), Vec::new()),
            &Config::default(),
        );
        assert!(text.starts_with("✅ Generated: /work/shop/PROMPT.md\n✅ Generated: /work/shop/ralph-config.md"));
        assert!(!text.contains("Features selected"));
        assert!(!text.contains("Issues"));
    }
}
