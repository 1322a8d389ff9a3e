use super::{Stage, StageContext, SEED};
use crate::error::Result;
use crate::manifest::StageResult;
use crate::paths;
use crate::types::HookMode;

/// Onboarding task list: one task per persona, stack and enforcing hook.
pub struct SeedStage;

impl Stage for SeedStage {
    fn name(&self) -> &'static str {
        SEED
    }

    fn enabled(&self, ctx: &StageContext<'_>) -> bool {
        ctx.spec.generation.seed_tasks
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageResult> {
        let mut result = StageResult::new();
        let rows = seed_rows(ctx);
        let mut out = format!(
            "# Seed tasks for {}\n\n| ID | Owner | Task | Status |\n|----|-------|------|--------|\n",
            ctx.spec.project.name
        );
        for (i, (owner, task)) in rows.iter().enumerate() {
            out.push_str(&format!("| T{} | {owner} | {task} | todo |\n", i + 1));
        }
        ctx.write(&mut result, paths::SEED_TASKS_MD, out.as_bytes())?;
        tracing::info!(tasks = rows.len(), "seeded task list");
        Ok(result)
    }
}

fn seed_rows(ctx: &StageContext<'_>) -> Vec<(String, String)> {
    let spec = ctx.spec;
    let lead = spec
        .personas
        .first()
        .map(|p| p.id.clone())
        .unwrap_or_else(|| "team".to_string());

    let mut rows = Vec::new();
    for persona in &spec.personas {
        rows.push((
            persona.id.clone(),
            format!(
                "Read `{}` and confirm scope with the team",
                paths::member_rel(&persona.id)
            ),
        ));
    }
    for stack in &spec.stacks {
        rows.push((
            lead.clone(),
            format!(
                "Adopt {} conventions from `{}/{}/`",
                stack.id,
                paths::STACKS_OUT_DIR,
                stack.id
            ),
        ));
    }
    for hook in spec.hooks.iter().filter(|h| h.mode == HookMode::Enforcing) {
        rows.push((
            lead.clone(),
            format!("Wire up the `{}` hook (`{}`)", hook.id, paths::hook_out_rel(&hook.id)),
        ));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::*;
    use crate::composition::HookSelection;

    #[test]
    fn writes_one_row_per_persona_stack_and_enforcing_hook() {
        let mut fx = Fixture::new();
        fx.spec.hooks.push(HookSelection {
            id: "telemetry".to_string(),
            mode: HookMode::Advisory,
        });
        let result = fx.run(&SeedStage);
        assert_eq!(result.wrote, vec!["ai/tasks/seed-tasks.md"]);
        let table = fx.read("ai/tasks/seed-tasks.md");
        assert!(table.contains("| T1 | backend-engineer |"));
        assert!(table.contains("| T2 | qa-lead |"));
        assert!(table.contains("| T3 | backend-engineer | Adopt rust conventions"));
        assert!(table.contains("| T4 | backend-engineer | Wire up the `pre-commit-lint` hook"));
        assert!(!table.contains("telemetry"));
    }
}
