//! Recommended iteration budget for a Ralph loop.

pub const MIN_ITERATIONS: u32 = 10;
pub const MAX_ITERATIONS: u32 = 100;

/// Iterations budgeted per incomplete task.
const ITERATIONS_PER_TASK: u32 = 4;

/// Extra iterations for each transition between features.
const ITERATIONS_PER_FEATURE_SWITCH: u32 = 5;

/// Compute the recommended `--max-iterations` value.
///
/// Four iterations per pending task, five per feature transition, plus a 20%
/// buffer (truncated), clamped to `[10, 100]`.
pub fn calculate_iterations(incomplete_tasks: usize, feature_count: usize) -> u32 {
    let tasks = u32::try_from(incomplete_tasks).unwrap_or(u32::MAX);
    let transitions = u32::try_from(feature_count.saturating_sub(1)).unwrap_or(u32::MAX);

    let base = tasks
        .saturating_mul(ITERATIONS_PER_TASK)
        .saturating_add(transitions.saturating_mul(ITERATIONS_PER_FEATURE_SWITCH));
    let with_buffer = u64::from(base) * 6 / 5;

    with_buffer.clamp(u64::from(MIN_ITERATIONS), u64::from(MAX_ITERATIONS)) as u32
}
