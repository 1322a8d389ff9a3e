use crate::cmd::generate::load_composition;
use crate::output::{print_findings, print_json};
use foundry_core::config::FoundryConfig;
use foundry_core::generator::resolve_output_dir;
use foundry_core::library::Library;
use foundry_core::types::Strictness;
use foundry_core::validate::{validate_composition, TargetContext, ValidationResult};
use std::path::Path;

pub fn run(
    library: &Path,
    config: &FoundryConfig,
    composition: &Path,
    strictness: Option<Strictness>,
    output_root: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let spec = load_composition(composition)?;
    let strictness = strictness.unwrap_or(config.default_strictness);
    let output_dir = resolve_output_dir(&spec, output_root, config)?;

    let result = match Library::open(library) {
        Ok(lib) => validate_composition(
            &spec,
            &lib,
            strictness,
            TargetContext {
                dir: &output_dir,
                overlay: false,
                force: false,
            },
        ),
        Err(e) => ValidationResult {
            errors: vec![e.to_string()],
            warnings: Vec::new(),
        },
    };

    if json {
        let value = serde_json::json!({
            "strictness": strictness,
            "output_dir": output_dir,
            "errors": result.errors,
            "warnings": result.warnings,
        });
        print_json(&value)?;
    } else if result.errors.is_empty() && result.warnings.is_empty() {
        println!("Composition '{}' is valid. No warnings.", spec.project.slug);
    } else {
        print_findings(&result.errors, &result.warnings);
    }

    if !result.is_ok() {
        anyhow::bail!("composition validation found errors");
    }
    Ok(())
}
