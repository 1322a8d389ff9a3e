//! The generation pipeline.
//!
//! validate → scaffold → compile → copy-assets → seed → git-init → diff →
//! manifest. Fresh generations write straight into the project directory.
//! Overlay runs (and every dry run) write into a staging directory that is
//! reconciled with the target through an [`OverlayPlan`] and removed on
//! every exit path.

use crate::composition::CompositionSpec;
use crate::config::{FoundryConfig, WarnLevel};
use crate::error::{FoundryError, Result};
use crate::io;
use crate::library::Library;
use crate::manifest::{GenerationManifest, PreviousManifest, StageResult};
use crate::overlay::{apply_overlay_plan, build_overlay_plan, OverlayOptions, OverlayPlan};
use crate::paths;
use crate::stages::{self, StageContext};
use crate::types::Strictness;
use crate::validate::{validate_composition, TargetContext, ValidationResult};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    pub library_root: &'a Path,
    /// Overrides both the composition's and the config's output root.
    pub output_root: Option<&'a Path>,
    pub strictness: Strictness,
    pub overlay: bool,
    /// Plan only; the target is never written.
    pub dry_run: bool,
    pub force: bool,
    pub prune_orphans: bool,
    pub config: &'a FoundryConfig,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub manifest: GenerationManifest,
    pub validation: ValidationResult,
    pub overlay_plan: Option<OverlayPlan>,
    pub output_dir: PathBuf,
}

/// `<root>/<slug>`, where root is the request override, then the
/// composition's `output_root`, then the config default.
pub fn resolve_output_dir(
    spec: &CompositionSpec,
    output_root: Option<&Path>,
    config: &FoundryConfig,
) -> Result<PathBuf> {
    let root = output_root
        .or(spec.generation.output_root.as_deref())
        .unwrap_or(config.output_root.as_path());
    Ok(paths::expand_home(root)?.join(&spec.project.slug))
}

pub fn generate_project(spec: &CompositionSpec, req: &GenerateRequest<'_>) -> Result<GenerationOutcome> {
    let output_dir = resolve_output_dir(spec, req.output_root, req.config)?;
    let staged = req.overlay || req.dry_run;

    let library = match Library::open(req.library_root) {
        Ok(lib) => lib,
        Err(e) => {
            return Ok(rejected(
                spec,
                output_dir,
                ValidationResult {
                    errors: vec![e.to_string()],
                    warnings: Vec::new(),
                },
            ))
        }
    };

    let mut validation = validate_composition(
        spec,
        &library,
        req.strictness,
        TargetContext {
            dir: &output_dir,
            overlay: staged,
            force: req.force,
        },
    );
    validation.errors.extend(
        req.config
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| format!("config: {}", w.message)),
    );
    if !validation.is_ok() {
        tracing::warn!(errors = validation.errors.len(), "composition rejected");
        return Ok(rejected(spec, output_dir, validation));
    }

    let version = library.version(req.config.git.version_timeout());
    let mut manifest = GenerationManifest::new(spec, version);
    let previous_bytes = io::read_if_exists(&paths::manifest_path(&output_dir))?;

    tracing::info!(
        project = %spec.project.slug,
        output = %output_dir.display(),
        overlay = req.overlay,
        dry_run = req.dry_run,
        "generating project"
    );

    if !staged {
        io::ensure_dir(&output_dir)?;
        let ctx = StageContext {
            spec,
            library: &library,
            out_dir: &output_dir,
            config: req.config,
            staged: false,
        };
        run_content_stages(&ctx, &mut manifest)?;
        write_bookkeeping(&output_dir, &mut manifest, previous_bytes.as_deref(), spec)?;
        return Ok(GenerationOutcome {
            manifest,
            validation,
            overlay_plan: None,
            output_dir,
        });
    }

    let staging = tempfile::Builder::new().prefix("foundry-overlay-").tempdir()?;
    let ctx = StageContext {
        spec,
        library: &library,
        out_dir: staging.path(),
        config: req.config,
        staged: true,
    };
    run_content_stages(&ctx, &mut manifest)?;

    let previous = PreviousManifest::from_bytes(previous_bytes.as_deref());
    let opts = OverlayOptions {
        force: req.force,
        prune_orphans: req.prune_orphans,
        conflict_policy: req.config.overlay.conflict_policy,
        sidecar_suffix: req.config.overlay.sidecar_suffix.clone(),
    };
    let mut plan = build_overlay_plan(staging.path(), &output_dir, previous.manifest(), &opts)?;
    if let PreviousManifest::Corrupt(reason) = &previous {
        plan.warnings.push(format!(
            "previous manifest ignored ({reason}); every differing file is treated as unmanaged"
        ));
    }

    if !req.dry_run {
        io::ensure_dir(&output_dir)?;
        let summary = apply_overlay_plan(&plan, staging.path(), &output_dir, &opts.sidecar_suffix)?;
        manifest.overlay = Some(summary);
        write_bookkeeping(&output_dir, &mut manifest, previous_bytes.as_deref(), spec)?;
    }

    if let Err(e) = staging.close() {
        tracing::warn!(error = %e, "failed to remove overlay staging directory");
    }

    Ok(GenerationOutcome {
        manifest,
        validation,
        overlay_plan: Some(plan),
        output_dir,
    })
}

fn rejected(spec: &CompositionSpec, output_dir: PathBuf, validation: ValidationResult) -> GenerationOutcome {
    GenerationOutcome {
        manifest: GenerationManifest::empty(spec),
        validation,
        overlay_plan: None,
        output_dir,
    }
}

fn run_content_stages(ctx: &StageContext<'_>, manifest: &mut GenerationManifest) -> Result<()> {
    for stage in stages::content_stages() {
        if !stage.enabled(ctx) {
            tracing::debug!(stage = stage.name(), "stage skipped");
            continue;
        }
        let result = stage.run(ctx).map_err(|e| FoundryError::StageFailed {
            stage: stage.name().to_string(),
            reason: e.to_string(),
        })?;
        for w in &result.warnings {
            tracing::warn!(stage = stage.name(), "{w}");
        }
        manifest.push_stage(stage.name(), result);
    }
    Ok(())
}

/// Archive the previous manifest, write the diff report if enabled, then
/// write the new manifest. Runs against the real project directory.
fn write_bookkeeping(
    project_dir: &Path,
    manifest: &mut GenerationManifest,
    previous_bytes: Option<&[u8]>,
    spec: &CompositionSpec,
) -> Result<()> {
    let mut record = StageResult::new();
    let archived = paths::previous_manifest_path(project_dir);
    match previous_bytes {
        Some(bytes) => {
            io::atomic_write(&archived, bytes)?;
            record.record_write(paths::PREVIOUS_MANIFEST_JSON)?;
        }
        None if archived.exists() => std::fs::remove_file(&archived)?,
        None => {}
    }

    if spec.generation.diff_report {
        let diff = crate::diff::write_diff_report(project_dir, manifest)?;
        manifest.push_stage(stages::DIFF, diff);
    }

    record.record_write(paths::MANIFEST_JSON)?;
    manifest.push_stage(stages::MANIFEST, record);
    manifest.save(&paths::manifest_path(project_dir))?;
    tracing::info!(
        run_id = %manifest.run_id,
        files = manifest.total_files_written(),
        warnings = manifest.all_warnings().len(),
        "wrote manifest"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
