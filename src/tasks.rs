//! Task list analysis.
//!
//! Counts checkbox items (`- [ ]` / `- [x]`) in a tasks document, falling back
//! to top-level numbered items when no checkboxes are present, and flags
//! unchecked tasks that look too large for a single iteration.

use once_cell::sync::Lazy;
use regex::Regex;

const UNCHECKED_MARKER: &str = "- [ ]";

/// Characters of a task description quoted in a large-task warning.
const LARGE_TASK_PREVIEW_LEN: usize = 60;

/// Number of ` and ` conjunctions that marks a task as too large.
const LARGE_TASK_AND_COUNT: usize = 2;

static CHECKED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)- \[x\]").expect("valid regex"));

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\d+\.[ \t]+\S").expect("valid regex"));

static UNCHECKED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- \[ \][ \t]*(.+)").expect("valid regex"));

/// Counts and warnings for one tasks document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskAnalysis {
    pub total: usize,
    pub incomplete: usize,
    pub issues: Vec<String>,
}

/// Analyze the raw text of a tasks document.
pub fn analyze_tasks(contents: &str) -> TaskAnalysis {
    if contents.is_empty() {
        return TaskAnalysis {
            total: 0,
            incomplete: 0,
            issues: vec!["No tasks content".to_string()],
        };
    }

    let mut incomplete = contents.matches(UNCHECKED_MARKER).count();
    let complete = CHECKED.find_iter(contents).count();
    let mut total = incomplete + complete;

    // Numbered lists carry no completion marker, so every item is pending.
    if total == 0 {
        total = NUMBERED_ITEM.find_iter(contents).count();
        incomplete = total;
    }

    let issues = UNCHECKED_ITEM
        .captures_iter(contents)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|task| task.to_lowercase().matches(" and ").count() >= LARGE_TASK_AND_COUNT)
        .map(|task| {
            let preview: String = task.chars().take(LARGE_TASK_PREVIEW_LEN).collect();
            format!("Large task (multiple 'and'): {}...", preview)
        })
        .collect();

    TaskAnalysis {
        total,
        incomplete,
        issues,
    }
}
