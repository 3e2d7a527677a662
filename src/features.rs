//! Feature discovery and selection for feature-based Spec Kit projects.
//!
//! Features live in `.specify/features/<id>/`, where `<id>` is conventionally
//! `<digits>-<slug>` (e.g. `001-user-auth`).

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::specify::{PLAN_FILE, SPEC_FILE, TASKS_FILE, non_empty, read_file_safe};
use crate::tasks::analyze_tasks;

static FEATURE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)-(.+)$").expect("valid regex"));

/// A single feature directory and its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Full directory name, e.g. `001-user-auth`.
    pub id: String,
    /// Numeric prefix, empty when the directory has none.
    pub number: String,
    pub name: String,
    pub path: PathBuf,
    pub spec: Option<String>,
    pub plan: Option<String>,
    pub tasks: Option<String>,
    pub task_count: usize,
    pub incomplete_tasks: usize,
    pub issues: Vec<String>,
}

impl Feature {
    /// Load a feature from its directory, analyzing tasks and recording
    /// missing artifacts.
    pub fn load(path: &Path, id: &str) -> Self {
        let (number, name) = parse_feature_id(id);
        let mut feature = Feature {
            id: id.to_string(),
            number,
            name,
            path: path.to_path_buf(),
            spec: read_file_safe(&path.join(SPEC_FILE)),
            plan: read_file_safe(&path.join(PLAN_FILE)),
            tasks: read_file_safe(&path.join(TASKS_FILE)),
            task_count: 0,
            incomplete_tasks: 0,
            issues: Vec::new(),
        };

        if let Some(tasks) = non_empty(&feature.tasks) {
            let analysis = analyze_tasks(tasks);
            feature.task_count = analysis.total;
            feature.incomplete_tasks = analysis.incomplete;
            feature.issues.extend(analysis.issues);
        } else {
            feature.issues.push("Missing tasks.md (required)".to_string());
        }
        if non_empty(&feature.spec).is_none() {
            feature.issues.push("Missing spec.md (recommended)".to_string());
        }
        if non_empty(&feature.plan).is_none() {
            feature.issues.push("Missing plan.md (recommended)".to_string());
        }

        feature
    }
}

/// Split a feature directory name into `(number, name)`.
pub fn parse_feature_id(dirname: &str) -> (String, String) {
    match FEATURE_ID.captures(dirname) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (String::new(), dirname.to_string()),
    }
}

/// Discover every non-hidden feature directory, sorted by name.
pub fn discover_features(features_dir: &Path) -> Vec<Feature> {
    let entries = match std::fs::read_dir(features_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = ?features_dir, error = %e, "features_dir_unreadable");
            return Vec::new();
        }
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            if name.starts_with('.') {
                None
            } else {
                Some((name, entry.path()))
            }
        })
        .collect();
    dirs.sort();

    let features: Vec<Feature> = dirs
        .iter()
        .map(|(id, path)| Feature::load(path, id))
        .collect();
    debug!(count = features.len(), "features_discovered");
    features
}

/// Outcome of resolving a `--feature` selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Indices into the discovered feature list, in selection order.
    pub indices: Vec<usize>,
    pub errors: Vec<String>,
}

/// Find the feature a single selector token refers to.
///
/// Features are tried in discovery order; the first one whose id, number,
/// name or part of its name matches wins.
pub fn match_feature(features: &[Feature], selector: &str) -> Option<usize> {
    let selector = selector.trim().to_lowercase();
    if selector.is_empty() {
        return None;
    }

    features.iter().position(|f| {
        let name = f.name.to_lowercase();
        f.id.to_lowercase() == selector
            || (!f.number.is_empty() && f.number == selector)
            || name == selector
            || name.contains(&selector)
    })
}

/// Resolve a selector string (`all`, an id/number/name, or a comma list)
/// into the features to work on.
///
/// An empty feature list selects nothing; the caller reports that case.
pub fn resolve_feature_selection(features: &[Feature], selection: Option<&str>) -> Selection {
    if features.is_empty() {
        return Selection::default();
    }

    let selection = selection.map(str::trim).unwrap_or_default();

    if selection.is_empty() {
        if features.len() == 1 {
            return Selection {
                indices: vec![0],
                errors: Vec::new(),
            };
        }
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        return Selection {
            indices: Vec::new(),
            errors: vec![format!(
                "Multiple features found. Please specify --feature: {}",
                ids.join(", ")
            )],
        };
    }

    if selection.eq_ignore_ascii_case("all") {
        return Selection {
            indices: (0..features.len()).collect(),
            errors: Vec::new(),
        };
    }

    let mut result = Selection::default();
    for token in selection.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match match_feature(features, token) {
            Some(index) => {
                if !result.indices.contains(&index) {
                    result.indices.push(index);
                }
            }
            None => {
                warn!(selector = %token, "feature_not_found");
                result.errors.push(format!("Feature not found: '{}'", token));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn feature(id: &str) -> Feature {
        let (number, name) = parse_feature_id(id);
        Feature {
            id: id.to_string(),
            number,
            name,
            path: PathBuf::from(id),
            spec: None,
            plan: None,
            tasks: None,
            task_count: 0,
            incomplete_tasks: 0,
            issues: Vec::new(),
        }
    }

    fn sample() -> Vec<Feature> {
        vec![
            feature("001-user-auth"),
            feature("002-dashboard"),
            feature("003-user-profile"),
        ]
    }

    fn selected_ids(features: &[Feature], selection: &Selection) -> Vec<String> {
        selection
            .indices
            .iter()
            .map(|&i| features[i].id.clone())
            .collect()
    }

    #[test]
    fn test_parse_feature_id_with_number() {
        assert_eq!(
            parse_feature_id("001-user-auth"),
            ("001".to_string(), "user-auth".to_string())
        );
    }

    #[test]
    fn test_parse_feature_id_without_number() {
        assert_eq!(
            parse_feature_id("user-auth"),
            (String::new(), "user-auth".to_string())
        );
        assert_eq!(parse_feature_id("42"), (String::new(), "42".to_string()));
    }

    #[test]
    fn test_resolve_all_in_discovery_order() {
        let features = sample();
        let selection = resolve_feature_selection(&features, Some("ALL"));
        assert_eq!(selection.indices, vec![0, 1, 2]);
        assert!(selection.errors.is_empty());
    }

    #[test]
    fn test_resolve_empty_selector_single_feature() {
        let features = vec![feature("001-user-auth")];
        let selection = resolve_feature_selection(&features, None);
        assert_eq!(selection.indices, vec![0]);
        assert!(selection.errors.is_empty());

        let selection = resolve_feature_selection(&features, Some(""));
        assert_eq!(selection.indices, vec![0]);
    }

    #[test]
    fn test_resolve_empty_selector_multiple_features_is_ambiguous() {
        let features = sample();
        let selection = resolve_feature_selection(&features, None);
        assert!(selection.indices.is_empty());
        assert_eq!(
            selection.errors,
            vec![
                "Multiple features found. Please specify --feature: 001-user-auth, 002-dashboard, 003-user-profile"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_resolve_no_features() {
        let selection = resolve_feature_selection(&[], Some("all"));
        assert_eq!(selection, Selection::default());
    }

    #[test]
    fn test_resolve_by_id_number_and_name() {
        let features = sample();
        let selection = resolve_feature_selection(&features, Some("003-USER-PROFILE"));
        assert_eq!(selected_ids(&features, &selection), vec!["003-user-profile"]);

        let selection = resolve_feature_selection(&features, Some("002"));
        assert_eq!(selected_ids(&features, &selection), vec!["002-dashboard"]);

        let selection = resolve_feature_selection(&features, Some("Dashboard"));
        assert_eq!(selected_ids(&features, &selection), vec!["002-dashboard"]);
    }

    #[test]
    fn test_resolve_substring_first_match_wins() {
        let features = sample();
        let selection = resolve_feature_selection(&features, Some("user"));
        assert_eq!(selected_ids(&features, &selection), vec!["001-user-auth"]);
    }

    #[test]
    fn test_first_matching_feature_wins_over_later_exact_name() {
        let features = vec![feature("001-auth-admin"), feature("002-auth")];
        assert_eq!(match_feature(&features, "auth"), Some(0));

        let selection = resolve_feature_selection(&features, Some("auth"));
        assert_eq!(selected_ids(&features, &selection), vec!["001-auth-admin"]);

        // An exact id still reaches the later feature.
        assert_eq!(match_feature(&features, "002-auth"), Some(1));
    }

    #[test]
    fn test_resolve_comma_list_in_token_order_without_duplicates() {
        let features = sample();
        let selection = resolve_feature_selection(&features, Some(" 3 , 001,dashboard,user-auth,,"));
        // "3" is not an exact number; it matches nothing by name either.
        assert_eq!(
            selected_ids(&features, &selection),
            vec!["001-user-auth", "002-dashboard"]
        );
        assert_eq!(selection.errors, vec!["Feature not found: '3'".to_string()]);
    }

    #[test]
    fn test_resolve_not_found_continues() {
        let features = sample();
        let selection = resolve_feature_selection(&features, Some("billing,002"));
        assert_eq!(selected_ids(&features, &selection), vec!["002-dashboard"]);
        assert_eq!(
            selection.errors,
            vec!["Feature not found: 'billing'".to_string()]
        );
    }

    #[test]
    fn test_discover_features_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let features_dir = dir.path();
        std::fs::create_dir(features_dir.join("002-dashboard")).unwrap();
        std::fs::create_dir(features_dir.join("001-user-auth")).unwrap();
        std::fs::create_dir(features_dir.join(".hidden")).unwrap();
        std::fs::write(features_dir.join("README.md"), "not a feature").unwrap();

        std::fs::write(
            features_dir.join("001-user-auth").join("tasks.md"),
            "- [ ] login\n- [x] signup\n",
        )
        .unwrap();
        std::fs::write(features_dir.join("001-user-auth").join("spec.md"), "spec").unwrap();
        std::fs::write(features_dir.join("001-user-auth").join("plan.md"), "plan").unwrap();

        let features = discover_features(features_dir);
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["001-user-auth", "002-dashboard"]);

        let auth = &features[0];
        assert_eq!(auth.number, "001");
        assert_eq!(auth.name, "user-auth");
        assert_eq!(auth.task_count, 2);
        assert_eq!(auth.incomplete_tasks, 1);
        assert!(auth.issues.is_empty());

        let dashboard = &features[1];
        assert_eq!(dashboard.task_count, 0);
        assert_eq!(
            dashboard.issues,
            vec![
                "Missing tasks.md (required)".to_string(),
                "Missing spec.md (recommended)".to_string(),
                "Missing plan.md (recommended)".to_string(),
            ]
        );
    }

    #[test]
    fn test_discover_features_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(discover_features(&dir.path().join("features")).is_empty());
    }

    #[test]
    fn test_feature_empty_tasks_file_counts_as_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tasks.md"), "").unwrap();
        let feature = Feature::load(dir.path(), "004-empty");
        assert!(
            feature
                .issues
                .contains(&"Missing tasks.md (required)".to_string())
        );
    }
}
