use super::{Stage, StageContext, COPY_ASSETS};
use crate::composition::{HookSelection, SafetyPolicy};
use crate::error::Result;
use crate::manifest::StageResult;
use crate::paths;
use serde::Serialize;
use std::path::Path;

/// Copies stack and hook documents out of the library and writes the
/// composition and safety configuration.
pub struct CopyAssetsStage;

#[derive(Serialize)]
struct SafetyFile<'a> {
    #[serde(flatten)]
    policy: &'a SafetyPolicy,
    hooks: &'a [HookSelection],
}

impl Stage for CopyAssetsStage {
    fn name(&self) -> &'static str {
        COPY_ASSETS
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageResult> {
        let mut result = StageResult::new();

        for stack in &ctx.spec.stacks {
            let src = ctx.library.stack_dir(&stack.id);
            if !src.is_dir() {
                result.warn(format!("stack '{}' not found in library; skipped", stack.id));
                continue;
            }
            let files = match crate::io::collect_relative_files(&src) {
                Ok(files) => files,
                Err(e) => {
                    result.warn(format!("cannot list stack '{}': {e}; skipped", stack.id));
                    continue;
                }
            };
            for rel in files {
                let src_file = paths::join_rel(&src, &rel);
                let Some(data) = read_library_file(&src_file, &mut result) else {
                    continue;
                };
                let dest = format!("{}/{}/{rel}", paths::STACKS_OUT_DIR, stack.id);
                ctx.write(&mut result, &dest, &data)?;
            }
        }

        for hook in &ctx.spec.hooks {
            let src = ctx.library.hook_file(&hook.id);
            if !src.is_file() {
                result.warn(format!("hook '{}' not found in library; skipped", hook.id));
                continue;
            }
            let Some(data) = read_library_file(&src, &mut result) else {
                continue;
            };
            ctx.write(&mut result, &paths::hook_out_rel(&hook.id), &data)?;
        }

        let composition = serde_yaml::to_string(ctx.spec)?;
        ctx.write(&mut result, paths::COMPOSITION_YAML, composition.as_bytes())?;

        let safety = serde_yaml::to_string(&SafetyFile {
            policy: &ctx.spec.safety,
            hooks: &ctx.spec.hooks,
        })?;
        ctx.write(&mut result, paths::SAFETY_YAML, safety.as_bytes())?;

        tracing::info!(files = result.wrote.len(), "copied library assets");
        Ok(result)
    }
}

fn read_library_file(path: &Path, result: &mut StageResult) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(data) => Some(data),
        Err(e) => {
            result.warn(format!("cannot read {}: {e}; skipped", path.display()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::*;
    use crate::composition::{CompositionSpec, StackSelection};

    #[test]
    fn copies_stack_tree_hooks_and_config() {
        let fx = Fixture::new();
        let result = fx.run(&CopyAssetsStage);
        assert_eq!(
            result.wrote,
            vec![
                "ai/stacks/rust/conventions.md",
                "ai/stacks/rust/snippets/error.md",
                "ai/hooks/pre-commit-lint.md",
                "ai/config/composition.yaml",
                "ai/config/safety.yaml",
            ]
        );
        assert_eq!(fx.read("ai/stacks/rust/snippets/error.md"), "Prefer thiserror.\n");

        let echoed = CompositionSpec::from_yaml_str(&fx.read("ai/config/composition.yaml")).unwrap();
        assert_eq!(echoed, fx.spec);

        let safety = fx.read("ai/config/safety.yaml");
        assert!(safety.contains("posture: balanced"));
        assert!(safety.contains("id: pre-commit-lint"));
    }

    #[test]
    fn missing_stack_is_a_warning() {
        let mut fx = Fixture::new();
        fx.spec.stacks.push(StackSelection {
            id: "go".to_string(),
        });
        let result = fx.run(&CopyAssetsStage);
        assert_eq!(result.warnings, vec!["stack 'go' not found in library; skipped"]);
    }
}
