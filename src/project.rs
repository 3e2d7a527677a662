//! Whole-project analysis.
//!
//! Combines artifact loading, task analysis, feature selection, constraint
//! extraction and stack detection into one [`Project`] description.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::constraints::extract_constraints;
use crate::features::{Feature, Selection, discover_features, resolve_feature_selection};
use crate::specify::{SpecifyLayout, non_empty, read_file_safe};
use crate::stack::{TechStack, detect_tech_stack};
use crate::tasks::analyze_tasks;

/// Artifacts of a flat project (`.specify/{spec,plan,tasks}.md`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatArtifacts {
    pub spec: Option<String>,
    pub plan: Option<String>,
    pub tasks: Option<String>,
}

/// Discovered features and the ones selected for this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
    /// Indices into `features`, in selection order.
    pub selected: Vec<usize>,
}

impl FeatureSet {
    pub fn selected(&self) -> impl Iterator<Item = &Feature> + '_ {
        self.selected.iter().map(|&i| &self.features[i])
    }
}

/// Layout of the project's specification artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Structure {
    #[default]
    Unknown,
    Flat(FlatArtifacts),
    Features(FeatureSet),
}

impl Structure {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Flat(_) => "flat",
            Self::Features(_) => "features",
        }
    }
}

/// Everything learned about a project in one run.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub structure: Structure,
    pub constitution: Option<String>,
    pub total_tasks: usize,
    pub total_incomplete: usize,
    pub backpressure_commands: Vec<String>,
    pub constraints: Vec<String>,
    pub tech_stack: TechStack,
    pub issues: Vec<String>,
}

impl Project {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            structure: Structure::Unknown,
            constitution: None,
            total_tasks: 0,
            total_incomplete: 0,
            backpressure_commands: Vec::new(),
            constraints: Vec::new(),
            tech_stack: TechStack::Unknown,
            issues: Vec::new(),
        }
    }

    /// Final path component of the root, or `Project` when there is none.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Project".to_string())
    }

    /// Selected features; empty unless the project is feature-based.
    pub fn selected_features(&self) -> Vec<&Feature> {
        match &self.structure {
            Structure::Features(set) => set.selected().collect(),
            _ => Vec::new(),
        }
    }

    /// Number of features the loop will move through (1 for flat projects).
    pub fn feature_count(&self) -> usize {
        match &self.structure {
            Structure::Features(set) => set.selected.len(),
            _ => 1,
        }
    }

    fn set_stack(&mut self, plan: &str) {
        let detection = detect_tech_stack(plan, self.constitution.as_deref().unwrap_or_default());
        self.tech_stack = detection.stack;
        self.backpressure_commands = detection.commands;
    }
}

/// Analyze the project rooted at `root`, reading `<root>/<specify_dir>`.
pub fn analyze_project(root: &Path, specify_dir: &str, feature_selection: Option<&str>) -> Project {
    let mut project = Project::new(root);
    let layout = SpecifyLayout::new(root, specify_dir);

    if !layout.exists() {
        warn!(path = ?layout.root(), "specify_dir_missing");
        project
            .issues
            .push(format!("{}/ directory not found", specify_dir));
        return project;
    }

    project.constitution = read_file_safe(&layout.constitution());
    if non_empty(&project.constitution).is_none() {
        project
            .issues
            .push("Missing constitution.md (recommended)".to_string());
    }

    let flat_tasks = layout.tasks();
    if layout.has_features() {
        analyze_features(&mut project, &layout, specify_dir, feature_selection);
    } else if flat_tasks.exists() {
        analyze_flat(&mut project, &layout);
    } else {
        project.issues.push(format!(
            "No tasks.md or features/ found in {}/",
            specify_dir
        ));
    }

    if let Some(constitution) = non_empty(&project.constitution) {
        project.constraints = extract_constraints(constitution);
    }

    info!(
        structure = project.structure.label(),
        total_tasks = project.total_tasks,
        incomplete = project.total_incomplete,
        tech_stack = %project.tech_stack,
        issues = project.issues.len(),
        "project_analyzed"
    );
    project
}

fn analyze_features(
    project: &mut Project,
    layout: &SpecifyLayout,
    specify_dir: &str,
    feature_selection: Option<&str>,
) {
    let features = discover_features(&layout.features_dir());
    let selection = if features.is_empty() {
        Selection {
            indices: Vec::new(),
            errors: vec![format!("No features found in {}/features/", specify_dir)],
        }
    } else {
        resolve_feature_selection(&features, feature_selection)
    };
    project.issues.extend(selection.errors);

    let set = FeatureSet {
        features,
        selected: selection.indices,
    };

    for feature in set.selected() {
        debug!(feature = %feature.id, tasks = feature.task_count, "feature_selected");
        project.total_tasks += feature.task_count;
        project.total_incomplete += feature.incomplete_tasks;
        project.issues.extend(
            feature
                .issues
                .iter()
                .map(|issue| format!("[{}] {}", feature.id, issue)),
        );
    }

    let plan = set
        .selected()
        .find_map(|f| non_empty(&f.plan))
        .unwrap_or_default()
        .to_string();

    project.structure = Structure::Features(set);
    project.set_stack(&plan);
}

fn analyze_flat(project: &mut Project, layout: &SpecifyLayout) {
    let artifacts = FlatArtifacts {
        spec: read_file_safe(&layout.spec()),
        plan: read_file_safe(&layout.plan()),
        tasks: read_file_safe(&layout.tasks()),
    };

    if let Some(tasks) = non_empty(&artifacts.tasks) {
        let analysis = analyze_tasks(tasks);
        project.total_tasks = analysis.total;
        project.total_incomplete = analysis.incomplete;
        project.issues.extend(analysis.issues);
    } else {
        project.issues.push("tasks.md is empty".to_string());
    }

    let plan = non_empty(&artifacts.plan).unwrap_or_default().to_string();
    project.structure = Structure::Flat(artifacts);
    project.set_stack(&plan);
}
