use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use foundry_core::manifest::GenerationManifest;
use foundry_core::paths;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ManifestSubcommand {
    /// Show the manifest of a generated project
    Show {
        /// Project directory
        project: PathBuf,

        /// Also list every file written
        #[arg(long)]
        files: bool,
    },
}

pub fn run(subcmd: ManifestSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ManifestSubcommand::Show { project, files } => show(&project, files, json),
    }
}

fn show(project: &Path, files: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::manifest_path(project);
    if !path.exists() {
        anyhow::bail!("no manifest at {}; was this project generated by foundry?", path.display());
    }
    let manifest = GenerationManifest::load(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if json {
        return print_json(&manifest);
    }

    println!("Run:      {}", manifest.run_id);
    println!("At:       {}", manifest.generated_at.to_rfc3339());
    if !manifest.library_version.is_empty() {
        println!("Library:  {}", manifest.library_version);
    }
    println!(
        "Files:    {}  Warnings: {}\n",
        manifest.total_files_written(),
        manifest.all_warnings().len()
    );

    let rows: Vec<Vec<String>> = manifest
        .stages
        .iter()
        .map(|(name, r)| vec![name.clone(), r.wrote.len().to_string(), r.warnings.len().to_string()])
        .collect();
    print_table(&["STAGE", "FILES", "WARNINGS"], &rows);

    if let Some(overlay) = &manifest.overlay {
        for s in &overlay.sidecars {
            println!("[sidecar] {s}");
        }
        for o in &overlay.orphans {
            println!("[orphan] {o}");
        }
    }
    for w in manifest.all_warnings() {
        println!("[warning] {w}");
    }
    if files {
        println!();
        for f in manifest.all_files() {
            println!("{f}");
        }
    }
    Ok(())
}
