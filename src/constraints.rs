//! Constraint extraction from the project constitution.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of constraints carried into generated documents.
pub const MAX_CONSTRAINTS: usize = 15;

/// Entries must be longer than this to count as a constraint.
const MIN_CONSTRAINT_LEN: usize = 10;

/// Length of the lowercase prefix used to detect duplicates.
const DEDUP_PREFIX_LEN: usize = 50;

static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*]\s+(.+)$").expect("valid regex"));

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+(.+)$").expect("valid regex"));

/// Pull bullet and numbered lines out of a constitution.
///
/// Trailing periods are stripped, short entries dropped, and entries sharing
/// a lowercase 50-character prefix collapse to the first one seen.
pub fn extract_constraints(constitution: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut constraints = Vec::new();

    for line in constitution.lines() {
        let line = line.trim();
        let Some(caps) = BULLET_ITEM
            .captures(line)
            .or_else(|| NUMBERED_ITEM.captures(line))
        else {
            continue;
        };

        let content = caps[1].trim().trim_end_matches('.');
        if content.chars().count() <= MIN_CONSTRAINT_LEN {
            continue;
        }

        let key: String = content.to_lowercase().chars().take(DEDUP_PREFIX_LEN).collect();
        if seen.insert(key) {
            constraints.push(content.to_string());
            if constraints.len() == MAX_CONSTRAINTS {
                break;
            }
        }
    }

    constraints
}
