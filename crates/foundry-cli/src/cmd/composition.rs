use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use foundry_core::composition::CompositionSpec;
use foundry_core::library::Library;
use foundry_core::paths;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum CompositionSubcommand {
    /// Write a skeleton composition file
    New {
        /// Project slug (lowercase alphanumerics and hyphens)
        slug: String,

        /// Persona id (repeatable; default: every persona in the library)
        #[arg(long = "persona")]
        personas: Vec<String>,

        /// Stack id (repeatable)
        #[arg(long = "stack")]
        stacks: Vec<String>,

        /// Hook id (repeatable)
        #[arg(long = "hook")]
        hooks: Vec<String>,

        /// Output file (default: <slug>.yaml); .json writes JSON
        #[arg(long)]
        out: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(library: &Path, subcmd: CompositionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CompositionSubcommand::New {
            slug,
            personas,
            stacks,
            hooks,
            out,
            force,
        } => new(library, &slug, personas, &stacks, &hooks, out, force, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn new(
    library: &Path,
    slug: &str,
    mut personas: Vec<String>,
    stacks: &[String],
    hooks: &[String],
    out: Option<PathBuf>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    paths::validate_slug(slug)?;

    if personas.is_empty() {
        let lib = Library::open(library)
            .context("no --persona given and the library could not be opened")?;
        personas = lib.persona_ids()?;
        if personas.is_empty() {
            anyhow::bail!("no --persona given and the library has no personas");
        }
    }

    let out = out.unwrap_or_else(|| PathBuf::from(format!("{slug}.yaml")));
    if out.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", out.display());
    }

    let spec = CompositionSpec::template(slug, &personas, stacks, hooks);
    spec.save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": out,
            "composition": spec,
        }))?;
    } else {
        println!("Wrote composition '{}' to {}", slug, out.display());
    }
    Ok(())
}
