use crate::output::{print_findings, print_json};
use clap::Subcommand;
use foundry_core::config::{ConfigWarning, FoundryConfig, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective config (defaults filled in)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(
    path: &Path,
    config: &FoundryConfig,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(path, config, json),
        ConfigSubcommand::Validate => validate(config, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, config: &FoundryConfig, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(config);
    }
    let source = if path.exists() { "" } else { " (not found; defaults)" };
    println!("# {}{source}", path.display());
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config: &FoundryConfig, json: bool) -> anyhow::Result<()> {
    let (errors, warnings): (Vec<ConfigWarning>, Vec<ConfigWarning>) = config
        .validate()
        .into_iter()
        .partition(|w| w.level == WarnLevel::Error);

    if json {
        print_json(&serde_json::json!({
            "errors": errors,
            "warnings": warnings,
        }))?;
    } else if errors.is_empty() && warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        let messages =
            |ws: &[ConfigWarning]| ws.iter().map(|w| w.message.clone()).collect::<Vec<_>>();
        print_findings(&messages(&errors), &messages(&warnings));
    }

    if !errors.is_empty() {
        anyhow::bail!("{} config error(s)", errors.len());
    }
    Ok(())
}
