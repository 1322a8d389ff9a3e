use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use foundry_core::config::FoundryConfig;
use foundry_core::library::Library;
use std::path::Path;

#[derive(Subcommand)]
pub enum LibrarySubcommand {
    /// List the personas, stacks and hooks available in the library
    List,
}

pub fn run(
    library: &Path,
    config: &FoundryConfig,
    subcmd: LibrarySubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        LibrarySubcommand::List => list(library, config, json),
    }
}

fn list(root: &Path, config: &FoundryConfig, json: bool) -> anyhow::Result<()> {
    let lib = Library::open(root).context("failed to open library")?;
    let personas = lib.persona_ids()?;
    let stacks = lib.stack_ids()?;
    let hooks = lib.hook_ids()?;
    let version = lib.version(config.git.version_timeout());

    if json {
        let value = serde_json::json!({
            "root": lib.root(),
            "version": version,
            "personas": personas,
            "stacks": stacks,
            "hooks": hooks,
        });
        return print_json(&value);
    }

    let label = if version.is_empty() { "unversioned" } else { version.as_str() };
    println!("Library: {} ({label})\n", lib.root().display());

    let mut rows = Vec::new();
    for (kind, ids) in [("persona", &personas), ("stack", &stacks), ("hook", &hooks)] {
        rows.extend(ids.iter().map(|id| vec![kind.to_string(), id.clone()]));
    }
    if rows.is_empty() {
        println!("Library is empty.");
    } else {
        print_table(&["KIND", "ID"], &rows);
    }
    Ok(())
}
