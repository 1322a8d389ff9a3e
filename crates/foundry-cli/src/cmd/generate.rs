use crate::output::{print_findings, print_json, print_table};
use anyhow::Context;
use clap::Args;
use foundry_core::composition::CompositionSpec;
use foundry_core::config::FoundryConfig;
use foundry_core::generator::{generate_project, GenerateRequest, GenerationOutcome};
use foundry_core::overlay::OverlayPlan;
use foundry_core::types::Strictness;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct GenerateArgs {
    /// Composition file (.yaml, .yml or .json)
    pub composition: PathBuf,

    /// Parent directory for the project (overrides composition and config)
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// lenient, standard or strict (default: config)
    #[arg(long)]
    pub strictness: Option<Strictness>,

    /// Reconcile with an existing project instead of writing directly
    #[arg(long)]
    pub overlay: bool,

    /// Build the overlay plan but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate into a non-empty directory, or apply the configured conflict policy
    #[arg(long)]
    pub force: bool,

    /// Delete files the previous run wrote but this one does not
    #[arg(long)]
    pub prune_orphans: bool,
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

pub fn run(
    library: &Path,
    config: &FoundryConfig,
    args: GenerateArgs,
    json: bool,
) -> anyhow::Result<()> {
    let spec = load_composition(&args.composition)?;
    let req = GenerateRequest {
        library_root: library,
        output_root: args.output_root.as_deref(),
        strictness: args.strictness.unwrap_or(config.default_strictness),
        overlay: args.overlay,
        dry_run: args.dry_run,
        force: args.force,
        prune_orphans: args.prune_orphans,
        config,
    };
    let outcome = generate_project(&spec, &req)
        .with_context(|| format!("failed to generate '{}'", spec.project.slug))?;
    report(&spec, &outcome, args.dry_run, json)
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

pub fn plan(
    library: &Path,
    config: &FoundryConfig,
    composition: &Path,
    output_root: Option<&Path>,
    force: bool,
    prune_orphans: bool,
    json: bool,
) -> anyhow::Result<()> {
    let spec = load_composition(composition)?;
    let req = GenerateRequest {
        library_root: library,
        output_root,
        strictness: config.default_strictness,
        overlay: true,
        dry_run: true,
        force,
        prune_orphans,
        config,
    };
    let outcome = generate_project(&spec, &req)
        .with_context(|| format!("failed to plan '{}'", spec.project.slug))?;
    report(&spec, &outcome, true, json)
}

pub(crate) fn load_composition(path: &Path) -> anyhow::Result<CompositionSpec> {
    CompositionSpec::load(path)
        .with_context(|| format!("failed to load composition {}", path.display()))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn report(
    spec: &CompositionSpec,
    outcome: &GenerationOutcome,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let rejected = !outcome.validation.is_ok();

    if json {
        let value = serde_json::json!({
            "output_dir": outcome.output_dir,
            "dry_run": dry_run,
            "validation": outcome.validation,
            "overlay_plan": outcome.overlay_plan,
            "manifest": outcome.manifest,
        });
        print_json(&value)?;
    } else if rejected {
        print_findings(&outcome.validation.errors, &outcome.validation.warnings);
    } else {
        print_findings(&[], &outcome.validation.warnings);
        if let Some(plan) = &outcome.overlay_plan {
            print_plan(plan);
        }
        if dry_run {
            println!("Dry run: nothing written to {}", outcome.output_dir.display());
        } else {
            print_stages(outcome);
            println!(
                "Generated '{}' at {}: {} files, {} warnings",
                spec.project.slug,
                outcome.output_dir.display(),
                outcome.manifest.total_files_written(),
                outcome.manifest.all_warnings().len(),
            );
        }
    }

    if rejected {
        anyhow::bail!("composition '{}' failed validation", spec.project.slug);
    }
    Ok(())
}

fn print_plan(plan: &OverlayPlan) {
    let rows: Vec<Vec<String>> = plan
        .actions
        .iter()
        .map(|a| vec![a.action.to_string(), a.path.clone(), a.reason.clone()])
        .collect();
    print_table(&["ACTION", "PATH", "REASON"], &rows);

    let c = plan.counts();
    println!(
        "\n{} create, {} update, {} skip, {} delete, {} conflict",
        c.create, c.update, c.skip, c.delete, c.conflict
    );
    for orphan in &plan.orphans {
        println!("[orphan] {orphan}");
    }
    print_findings(&[], &plan.warnings);
}

fn print_stages(outcome: &GenerationOutcome) {
    let rows: Vec<Vec<String>> = outcome
        .manifest
        .stages
        .iter()
        .map(|(name, r)| {
            vec![
                name.clone(),
                r.wrote.len().to_string(),
                r.warnings.len().to_string(),
            ]
        })
        .collect();
    print_table(&["STAGE", "FILES", "WARNINGS"], &rows);
    for w in outcome.manifest.all_warnings() {
        println!("[warning] {w}");
    }
}
