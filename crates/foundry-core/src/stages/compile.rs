use super::{Stage, StageContext, COMPILE};
use crate::composition::PersonaSelection;
use crate::error::Result;
use crate::manifest::StageResult;
use crate::paths;
use crate::template;
use std::collections::BTreeMap;
use std::path::Path;

const GENERATED_NOTICE: &str =
    "<!-- generated by foundry: local edits are kept on overlay, new content goes to a sidecar -->";

/// Compiles one prompt file per persona from the library templates, plus the
/// team index.
pub struct CompileStage;

impl Stage for CompileStage {
    fn name(&self) -> &'static str {
        COMPILE
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageResult> {
        let mut result = StageResult::new();
        let conventions = stack_conventions(ctx, &mut result);

        for persona in &ctx.spec.personas {
            let persona_md = ctx.library.persona_file(&persona.id, paths::PERSONA_MD);
            if !persona_md.is_file() {
                result.warn(format!(
                    "persona '{}' not found in library; prompt not compiled",
                    persona.id
                ));
                continue;
            }
            let Some(source) = read_library_text(&persona_md, &mut result) else {
                continue;
            };
            let vars = variables(ctx, persona);
            let mut body = String::new();
            body.push_str(GENERATED_NOTICE);
            body.push_str("\n\n");
            body.push_str(&render_into(
                &source,
                &vars,
                &persona.id,
                paths::PERSONA_MD,
                &mut result,
            ));

            for (file, heading) in [(paths::OUTPUTS_MD, "Outputs"), (paths::PROMPTS_MD, "Prompts")] {
                let path = ctx.library.persona_file(&persona.id, file);
                if !path.is_file() {
                    result.warn(format!("persona '{}' has no {file}", persona.id));
                    continue;
                }
                let Some(source) = read_library_text(&path, &mut result) else {
                    continue;
                };
                let rendered = render_into(
                    &source,
                    &vars,
                    &persona.id,
                    file,
                    &mut result,
                );
                body.push_str(&format!("\n## {heading}\n\n{}", ensure_newline(&rendered)));
            }

            if !conventions.is_empty() {
                body.push_str("\n## Stack conventions\n");
                for (stack_id, text) in &conventions {
                    body.push_str(&format!("\n### {stack_id}\n\n{}", ensure_newline(text)));
                }
            }

            body.push_str(&safety_section(ctx));
            ctx.write(&mut result, &paths::member_rel(&persona.id), body.as_bytes())?;
        }

        ctx.write(&mut result, paths::TEAM_MD, team_index(ctx).as_bytes())?;
        tracing::info!(
            personas = ctx.spec.personas.len(),
            warnings = result.warnings.len(),
            "compiled persona prompts"
        );
        Ok(result)
    }
}

fn stack_conventions(ctx: &StageContext<'_>, result: &mut StageResult) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for stack in &ctx.spec.stacks {
        let path = ctx.library.stack_conventions(&stack.id);
        if !path.is_file() {
            result.warn(format!(
                "stack '{}' has no conventions.md; left out of prompts",
                stack.id
            ));
            continue;
        }
        if let Some(text) = read_library_text(&path, result) {
            out.push((stack.id.clone(), text));
        }
    }
    out
}

/// Read a library document; unreadable or non-UTF-8 files become warnings.
fn read_library_text(path: &Path, result: &mut StageResult) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            result.warn(format!("cannot read {}: {e}; skipped", path.display()));
            None
        }
    }
}

fn variables(ctx: &StageContext<'_>, persona: &PersonaSelection) -> BTreeMap<&'static str, String> {
    let spec = ctx.spec;
    let stacks = if spec.stacks.is_empty() {
        "none".to_string()
    } else {
        spec.stack_ids().join(", ")
    };
    let team = spec
        .personas
        .iter()
        .map(|p| p.display_title())
        .collect::<Vec<_>>()
        .join(", ");

    let mut vars = BTreeMap::new();
    vars.insert("project_name", spec.project.name.clone());
    vars.insert("project_slug", spec.project.slug.clone());
    vars.insert(
        "project_description",
        spec.project.description.clone().unwrap_or_default(),
    );
    vars.insert("persona_id", persona.id.clone());
    vars.insert("persona_title", persona.display_title());
    vars.insert("stacks", stacks);
    vars.insert("team", team);
    vars.insert("safety_posture", spec.safety.posture.to_string());
    vars
}

fn render_into(
    source: &str,
    vars: &BTreeMap<&'static str, String>,
    persona_id: &str,
    file: &str,
    result: &mut StageResult,
) -> String {
    let rendered = template::render(source, vars);
    for name in &rendered.unresolved {
        result.warn(format!(
            "unresolved placeholder '{{{{{name}}}}}' in {persona_id}/{file}"
        ));
    }
    rendered.text
}

fn safety_section(ctx: &StageContext<'_>) -> String {
    let safety = &ctx.spec.safety;
    let mut out = format!(
        "\n## Safety\n\nPosture: {}. {}\n",
        safety.posture,
        safety.posture.guidance()
    );
    out.push_str(if safety.allow_network {
        "Network access is allowed.\n"
    } else {
        "Network access is not allowed.\n"
    });
    if !safety.protected_paths.is_empty() {
        out.push_str("\nNever modify:\n");
        for p in &safety.protected_paths {
            out.push_str(&format!("- `{p}`\n"));
        }
    }
    if !ctx.spec.hooks.is_empty() {
        out.push_str("\nHooks:\n");
        for hook in &ctx.spec.hooks {
            out.push_str(&format!(
                "- `{}` ({}), see `{}`\n",
                hook.id,
                hook.mode,
                paths::hook_out_rel(&hook.id)
            ));
        }
    }
    out
}

fn team_index(ctx: &StageContext<'_>) -> String {
    let project = &ctx.spec.project;
    let mut out = format!("# {} team\n\n", project.name);
    if let Some(desc) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str(&format!("{}\n\n", desc.trim()));
    }
    out.push_str("| Persona | Prompt | Outputs |\n|---|---|---|\n");
    for persona in &ctx.spec.personas {
        out.push_str(&format!(
            "| {} | `{}` | `{}/{}/` |\n",
            persona.display_title(),
            paths::member_rel(&persona.id),
            paths::OUTPUTS_DIR,
            persona.id
        ));
    }
    out
}

fn ensure_newline(s: &str) -> String {
    if s.ends_with('\n') {
        s.to_string()
    } else {
        format!("{s}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::*;

    #[test]
    fn compiles_members_and_team_index() {
        let fx = Fixture::new();
        let result = fx.run(&CompileStage);
        assert_eq!(
            result.wrote,
            vec![
                "ai/team/members/backend-engineer.md",
                "ai/team/members/qa-lead.md",
                "ai/team/TEAM.md",
            ]
        );

        let be = fx.read("ai/team/members/backend-engineer.md");
        assert!(be.contains("# Backend Engineer"));
        assert!(be.contains("You build Acme Portal services."));
        assert!(be.contains("ai/outputs/backend-engineer/"));
        assert!(be.contains("Stacks in play: rust."));
        assert!(be.contains("### rust\n\nUse cargo fmt."));
        assert!(be.contains("Posture: balanced."));
        assert!(be.contains("`pre-commit-lint` (enforcing)"));

        let team = fx.read("ai/team/TEAM.md");
        assert!(team.contains("| Qa Lead | `ai/team/members/qa-lead.md` |"));
    }

    #[test]
    fn missing_optional_files_become_warnings() {
        let fx = Fixture::new();
        let result = fx.run(&CompileStage);
        assert!(result.warnings.contains(&"persona 'qa-lead' has no outputs.md".to_string()));
        assert!(result.warnings.contains(&"persona 'qa-lead' has no prompts.md".to_string()));
    }

    #[test]
    fn unresolved_placeholders_are_reported() {
        let fx = Fixture::new();
        std::fs::write(
            fx.lib_dir.path().join("personas/qa-lead/persona.md"),
            "Owner: {{ owner }}\n",
        )
        .unwrap();
        let result = fx.run(&CompileStage);
        assert!(result
            .warnings
            .iter()
            .any(|w| w == "unresolved placeholder '{{owner}}' in qa-lead/persona.md"));
        assert!(fx.read("ai/team/members/qa-lead.md").contains("Owner: {{ owner }}"));
    }

    #[test]
    fn unreadable_library_file_is_a_warning() {
        let fx = Fixture::new();
        std::fs::write(
            fx.lib_dir.path().join("personas/backend-engineer/outputs.md"),
            [0xff, 0xfe, 0x00],
        )
        .unwrap();
        let result = fx.run(&CompileStage);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("outputs.md") && w.ends_with("skipped")));
        let be = fx.read("ai/team/members/backend-engineer.md");
        assert!(!be.contains("## Outputs"));
        assert!(be.contains("## Prompts"));
    }

    #[test]
    fn output_is_deterministic() {
        let fx = Fixture::new();
        fx.run(&CompileStage);
        let first = fx.read("ai/team/members/backend-engineer.md");
        fx.run(&CompileStage);
        assert_eq!(first, fx.read("ai/team/members/backend-engineer.md"));
    }
}
