//! Pre-generation checks. Runs before any file is touched; errors abort the
//! pipeline, warnings are surfaced alongside the result.

use crate::composition::CompositionSpec;
use crate::library::Library;
use crate::paths;
use crate::types::{SafetyPosture, Strictness};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Where the generation would land and how.
#[derive(Debug, Clone, Copy)]
pub struct TargetContext<'a> {
    pub dir: &'a Path,
    pub overlay: bool,
    pub force: bool,
}

pub fn validate_composition(
    spec: &CompositionSpec,
    library: &Library,
    strictness: Strictness,
    target: TargetContext<'_>,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    // Missing library entries: errors unless lenient.
    let mut missing = |msg: String| {
        if strictness == Strictness::Lenient {
            warnings.push(msg);
        } else {
            errors.push(msg);
        }
    };

    let mut id_errors = Vec::new();

    if spec.project.name.trim().is_empty() {
        id_errors.push("project name is empty".to_string());
    }
    if paths::validate_slug(&spec.project.slug).is_err() {
        id_errors.push(format!(
            "project slug '{}' must be lowercase alphanumeric with hyphens",
            spec.project.slug
        ));
    }
    if spec.personas.is_empty() {
        id_errors.push("at least one persona is required".to_string());
    }

    let groups: [(&str, Vec<&str>); 3] = [
        ("persona", spec.persona_ids()),
        ("stack", spec.stack_ids()),
        ("hook", spec.hooks.iter().map(|h| h.id.as_str()).collect()),
    ];
    for (kind, ids) in &groups {
        let mut seen = HashSet::new();
        for id in ids {
            if paths::validate_slug(id).is_err() {
                id_errors.push(format!("invalid {kind} id '{id}'"));
                continue;
            }
            if !seen.insert(*id) {
                id_errors.push(format!("duplicate {kind} '{id}'"));
                continue;
            }
            let present = match *kind {
                "persona" => library.has_persona(id),
                "stack" => library.has_stack(id),
                _ => library.has_hook(id),
            };
            if !present {
                missing(format!("{kind} '{id}' not found in library"));
            }
        }
    }

    // Optional persona files only matter for ids that passed the checks above.
    for persona in &spec.personas {
        if paths::validate_slug(&persona.id).is_err() || !library.has_persona(&persona.id) {
            continue;
        }
        for file in [paths::OUTPUTS_MD, paths::PROMPTS_MD] {
            if !library.persona_file(&persona.id, file).is_file() {
                warnings.push(format!("persona '{}' has no {file}", persona.id));
            }
        }
    }

    if spec.stacks.is_empty() {
        warnings.push("no stacks selected; prompts will carry no stack conventions".to_string());
    }
    if spec.safety.posture == SafetyPosture::Permissive && spec.safety.allow_network {
        warnings.push("permissive posture with network access enabled".to_string());
    }
    for protected in &spec.safety.protected_paths {
        if paths::validate_relative_path(protected).is_err() {
            warnings.push(format!(
                "protected path '{protected}' should be relative to the project root"
            ));
        }
    }

    if !target.overlay && !target.force {
        let never_generated = !paths::manifest_path(target.dir).exists();
        match crate::io::is_empty_dir(target.dir) {
            Ok(true) => {}
            Ok(false) if never_generated => errors.push(format!(
                "output directory {} is not empty and was not generated by foundry; \
                 use overlay mode or force",
                target.dir.display()
            )),
            Ok(false) => {}
            Err(e) => errors.push(format!(
                "cannot inspect output directory {}: {e}",
                target.dir.display()
            )),
        }
    }

    errors.splice(0..0, id_errors);
    if strictness == Strictness::Strict {
        errors.extend(warnings.drain(..).map(|w| format!("strict: {w}")));
    }

    ValidationResult { errors, warnings }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
