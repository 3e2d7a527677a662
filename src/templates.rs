//! Prompt and loop-configuration document templates.
//!
//! Three prompt variants exist: flat (one tasks list), single-feature, and
//! multi-feature. All share the same iteration process, constraints section,
//! completion signals and stuck-task policy.

use crate::config::Config;
use crate::features::Feature;
use crate::project::{Project, Structure};

/// Emitted by the agent when every task is done and all checks pass.
pub const ALL_TASKS_COMPLETE: &str = "ALL_TASKS_COMPLETE";

/// Emitted by the agent after repeated iterations without progress.
pub const BLOCKED: &str = "BLOCKED";

/// Constraints listed in a prompt; the rest stay in the constitution.
const PROMPT_CONSTRAINTS: usize = 10;

const FALLBACK_CONSTRAINT: &str = "- Follow all guidelines in constitution.md";

/// The `/ralph-loop ...` invocation printed after generation.
pub fn run_command(config: &Config, max_iterations: u32) -> String {
    format!(
        r#"{} "Follow {}" --max-iterations {} --completion-promise "{}""#,
        config.ralph_loop.command, config.paths.prompt, max_iterations, ALL_TASKS_COMPLETE
    )
}

fn constraints_text(project: &Project) -> String {
    if project.constraints.is_empty() {
        return FALLBACK_CONSTRAINT.to_string();
    }
    project
        .constraints
        .iter()
        .take(PROMPT_CONSTRAINTS)
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n")
}

fn backpressure_text(project: &Project) -> String {
    project
        .backpressure_commands
        .iter()
        .map(|cmd| format!("   {}", cmd))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Select and render the prompt variant matching the project structure.
pub fn generate_prompt(project: &Project, config: &Config) -> String {
    match &project.structure {
        Structure::Flat(_) => generate_prompt_flat(project, config),
        _ => match project.selected_features().as_slice() {
            [feature] => generate_prompt_single_feature(project, feature, config),
            _ => generate_prompt_multi_feature(project, config),
        },
    }
}

/// Prompt for a flat project with one tasks list.
pub fn generate_prompt_flat(project: &Project, config: &Config) -> String {
    let specify = &config.paths.specify;
    format!(
        r#"# Ralph Loop: {project_name}

## Context

Before starting, read these files to understand the project:
- `@{specify}/constitution.md` - Non-negotiable rules you MUST follow
- `@{specify}/spec.md` - What we're building and acceptance criteria
- `@{specify}/plan.md` - Technical approach and architecture

## Your Mission

Complete all tasks in `{specify}/tasks.md` systematically until done.

## Process (Every Iteration)

1. **Read Tasks**: Check `@{specify}/tasks.md` for the next `- [ ]` unchecked task

2. **Search First**: Before implementing, search the codebase
   - Use grep/find to locate related code
   - Check if similar functionality already exists

3. **Implement**: Make the minimal changes needed for this ONE task

4. **Verify**: Run ALL feedback loops - every one must pass:
```bash
{backpressure}
```

5. **Mark Complete**: Change `- [ ]` to `- [x]` for this task in tasks.md

6. **Commit**: `git add -A && git commit -m "feat: [task description]"`

7. **Continue**: Return to step 1 for the next unchecked task

## Constraints (Non-Negotiable)

{constraints}

## Completion Signals

All tasks done + tests pass:
<promise>{ALL_TASKS_COMPLETE}</promise>

Unable to progress after 10 iterations:
<promise>{BLOCKED}</promise>

## If Stuck

After 5 attempts on one task:
1. Add `BLOCKED:` prefix to the task
2. Document what you tried
3. Move to the next task
"#,
        project_name = project.name(),
        backpressure = backpressure_text(project),
        constraints = constraints_text(project),
    )
}

/// Prompt scoped to a single feature directory.
pub fn generate_prompt_single_feature(project: &Project, feature: &Feature, config: &Config) -> String {
    let specify = &config.paths.specify;
    let feature_dir = format!("{}/features/{}", specify, feature.id);
    format!(
        r#"# Ralph Loop: {project_name} - Feature {feature_id}

## Context

Before starting, read these files:
- `@{specify}/constitution.md` - Global rules (apply to all features)
- `@{feature_dir}/spec.md` - This feature's specification
- `@{feature_dir}/plan.md` - This feature's technical plan

## Your Mission

Complete all tasks in `{feature_dir}/tasks.md`

Current status: {remaining} tasks remaining

## Process (Every Iteration)

1. **Read Tasks**: Check `@{feature_dir}/tasks.md` for the next `- [ ]` unchecked task

2. **Search First**: Before implementing, search the codebase
   - Use grep/find to locate related code
   - Check if similar functionality already exists

3. **Implement**: Make the minimal changes needed for this ONE task

4. **Verify**: Run ALL feedback loops - every one must pass:
```bash
{backpressure}
```

5. **Mark Complete**: Change `- [ ]` to `- [x]` for this task

6. **Commit**: `git add -A && git commit -m "feat({feature_name}): [task description]"`

7. **Continue**: Return to step 1 for the next unchecked task

## Constraints (Non-Negotiable)

{constraints}

## Completion Signals

All tasks in this feature done + tests pass:
<promise>{ALL_TASKS_COMPLETE}</promise>

Unable to progress after 10 iterations:
<promise>{BLOCKED}</promise>

## If Stuck

After 5 attempts on one task:
1. Add `BLOCKED:` prefix to the task
2. Document what you tried
3. Move to the next task
"#,
        project_name = project.name(),
        feature_id = feature.id,
        feature_name = feature.name,
        remaining = feature.incomplete_tasks,
        backpressure = backpressure_text(project),
        constraints = constraints_text(project),
    )
}

/// Prompt walking through several features in order.
pub fn generate_prompt_multi_feature(project: &Project, config: &Config) -> String {
    let specify = &config.paths.specify;
    let features = project.selected_features();

    let feature_list = features
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. `{}` ({} tasks)", i + 1, f.id, f.incomplete_tasks))
        .collect::<Vec<_>>()
        .join("\n");

    let context = std::iter::once(format!(
        "- `@{}/constitution.md` - Global rules (apply to all features)",
        specify
    ))
    .chain(features.iter().map(|f| {
        format!(
            "- `@{}/features/{}/` - spec.md, plan.md, tasks.md",
            specify, f.id
        )
    }))
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        r#"# Ralph Loop: {project_name} - Multiple Features

## Features to Complete (in order)

{feature_list}

Total: {total_incomplete} tasks across {feature_count} features

## Context

{context}

## Your Mission

Complete all features in the order listed above. For each feature:
1. Read its spec.md and plan.md
2. Complete ALL tasks in its tasks.md
3. Only move to the next feature when current is 100% complete

## Process (Every Iteration)

1. **Identify Current Feature**: Find the first feature with incomplete tasks

2. **Read Tasks**: Check that feature's tasks.md for the next `- [ ]` task

3. **Search First**: Before implementing, search the codebase

4. **Implement**: Make the minimal changes needed for this ONE task

5. **Verify**: Run ALL feedback loops - every one must pass:
```bash
{backpressure}
```

6. **Mark Complete**: Change `- [ ]` to `- [x]` for this task

7. **Commit**: `git add -A && git commit -m "feat([feature-name]): [task description]"`

8. **Continue**:
   - If more tasks in current feature → next task
   - If feature complete → move to next feature
   - If all features complete → output completion signal

## Constraints (Non-Negotiable)

{constraints}

## Completion Signals

All features complete + tests pass:
<promise>{ALL_TASKS_COMPLETE}</promise>

Single feature complete (for progress tracking):
<promise>FEATURE_COMPLETE: [feature-id]</promise>

Unable to progress after 10 iterations:
<promise>{BLOCKED}</promise>

## If Stuck

After 5 attempts on one task:
1. Add `BLOCKED:` prefix to the task
2. Document what you tried
3. Move to the next task (same or next feature)
"#,
        project_name = project.name(),
        total_incomplete = project.total_incomplete,
        feature_count = features.len(),
        backpressure = backpressure_text(project),
        constraints = constraints_text(project),
    )
}

/// Render the loop configuration document (`ralph-config.md`).
pub fn generate_config(project: &Project, config: &Config, max_iterations: u32) -> String {
    let selected = project.selected_features();
    let scope = if selected.is_empty() {
        format!("Scope: All tasks in {}/tasks.md", config.paths.specify)
    } else {
        let features = selected
            .iter()
            .map(|f| format!("  - {}: {} tasks", f.id, f.incomplete_tasks))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Features included:\n{}", features)
    };

    format!(
        r#"# Ralph Configuration: {project_name}

## Quick Start

```bash
{loop_command} "Follow {prompt_file} to complete all tasks" \
  --max-iterations {max_iterations} \
  --completion-promise "{ALL_TASKS_COMPLETE}"
```

## Configuration

| Setting | Value |
|---------|-------|
| Max Iterations | {max_iterations} |
| Tech Stack | {tech_stack} |
| Total Tasks | {incomplete} incomplete / {total} total |

{scope}

## Backpressure Commands

```bash
{commands}
```

## Pre-Flight Checklist

- [ ] Review tasks - well-defined?
- [ ] Run backpressure commands manually - working?
- [ ] Git clean? `git add -A && git commit -m "pre-ralph checkpoint"`

## Recovery

```bash
/cancel-ralph              # Stop the loop
git diff                   # See changes
git reset --hard HEAD~1    # Revert last commit
```
"#,
        project_name = project.name(),
        loop_command = config.ralph_loop.command,
        prompt_file = config.paths.prompt,
        tech_stack = project.tech_stack,
        incomplete = project.total_incomplete,
        total = project.total_tasks,
        commands = project.backpressure_commands.join("\n"),
    )
}
