use super::{Stage, StageContext, SCAFFOLD};
use crate::error::Result;
use crate::manifest::StageResult;
use crate::paths;

const SCAFFOLD_DIRS: &[&str] = &[
    paths::MEMBERS_DIR,
    paths::OUTPUTS_DIR,
    paths::TASKS_DIR,
    paths::STACKS_OUT_DIR,
    paths::HOOKS_OUT_DIR,
    paths::CONFIG_OUT_DIR,
    paths::GENERATED_DIR,
];

/// Directory skeleton, one output folder per persona and the root README.
pub struct ScaffoldStage;

impl Stage for ScaffoldStage {
    fn name(&self) -> &'static str {
        SCAFFOLD
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageResult> {
        let mut result = StageResult::new();

        for dir in SCAFFOLD_DIRS {
            crate::io::ensure_dir(&paths::join_rel(ctx.out_dir, dir))?;
        }
        for persona in &ctx.spec.personas {
            ctx.write(&mut result, &paths::outputs_keep_rel(&persona.id), b"")?;
        }
        ctx.write(&mut result, paths::README_MD, readme(ctx).as_bytes())?;

        tracing::info!(files = result.wrote.len(), "scaffolded project layout");
        Ok(result)
    }
}

fn readme(ctx: &StageContext<'_>) -> String {
    let project = &ctx.spec.project;
    let mut out = format!("# {}\n\n", project.name);
    if let Some(desc) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str(desc.trim());
        out.push_str("\n\n");
    }
    out.push_str("## Team\n\n");
    for persona in &ctx.spec.personas {
        out.push_str(&format!(
            "- {} (`{}`), prompt `{}`\n",
            persona.display_title(),
            persona.id,
            paths::member_rel(&persona.id)
        ));
    }
    out.push_str(
        "\n## Layout\n\n\
         - `ai/team/` compiled persona prompts and the team index\n\
         - `ai/outputs/<persona>/` where each persona writes its work\n\
         - `ai/stacks/`, `ai/hooks/` conventions and hook docs copied from the library\n\
         - `ai/config/` composition and safety policy\n\
         - `ai/tasks/` seed task list\n\
         - `ai/generated/` manifest and diff report (rewritten on every run)\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::*;

    #[test]
    fn writes_readme_and_output_folders() {
        let fx = Fixture::new();
        let result = fx.run(&ScaffoldStage);
        assert_eq!(
            result.wrote,
            vec![
                "ai/outputs/backend-engineer/.gitkeep",
                "ai/outputs/qa-lead/.gitkeep",
                "README.md",
            ]
        );
        let readme = fx.read("README.md");
        assert!(readme.starts_with("# Acme Portal"));
        assert!(readme.contains("Qa Lead (`qa-lead`)"));
        assert!(fx.out.path().join("ai/generated").is_dir());
    }
}
