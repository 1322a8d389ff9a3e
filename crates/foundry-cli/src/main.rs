mod cmd;
mod output;
mod root;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::{
    composition::CompositionSubcommand, config::ConfigSubcommand, generate::GenerateArgs,
    library::LibrarySubcommand, manifest::ManifestSubcommand,
};
use foundry_core::config::FoundryConfig;
use foundry_core::types::Strictness;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "foundry",
    about = "Scaffold AI-assisted team projects from a persona, stack and hook library",
    version,
    propagate_version = true
)]
struct Cli {
    /// Template library root (default: config, then auto-detect from personas/)
    #[arg(long, global = true, env = "FOUNDRY_LIBRARY")]
    library: Option<PathBuf>,

    /// Config file (default: ~/.foundry/config.yaml)
    #[arg(long, global = true, env = "FOUNDRY_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the generation pipeline for a composition
    Generate(GenerateArgs),

    /// Show the overlay plan for a composition without writing anything
    Plan {
        /// Composition file (.yaml, .yml or .json)
        composition: PathBuf,

        /// Parent directory for the project (overrides composition and config)
        #[arg(long)]
        output_root: Option<PathBuf>,

        /// Treat unmanaged conflicts with the configured policy
        #[arg(long)]
        force: bool,

        /// Plan deletion of files the previous run wrote but this one does not
        #[arg(long)]
        prune_orphans: bool,
    },

    /// Validate a composition against the library
    Validate {
        /// Composition file (.yaml, .yml or .json)
        composition: PathBuf,

        /// lenient, standard or strict (default: config)
        #[arg(long)]
        strictness: Option<Strictness>,

        /// Parent directory for the project (overrides composition and config)
        #[arg(long)]
        output_root: Option<PathBuf>,
    },

    /// Inspect the template library
    Library {
        #[command(subcommand)]
        subcommand: LibrarySubcommand,
    },

    /// Inspect a generated project's manifest
    Manifest {
        #[command(subcommand)]
        subcommand: ManifestSubcommand,
    },

    /// Create composition files
    Composition {
        #[command(subcommand)]
        subcommand: CompositionSubcommand,
    },

    /// Show or validate the Foundry config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match cli.config {
        Some(p) => p,
        None => FoundryConfig::default_path()?,
    };
    let config = FoundryConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let library = root::resolve_library(cli.library.as_deref(), &config)?;

    match cli.command {
        Commands::Generate(args) => cmd::generate::run(&library, &config, args, cli.json),
        Commands::Plan {
            composition,
            output_root,
            force,
            prune_orphans,
        } => cmd::generate::plan(
            &library,
            &config,
            &composition,
            output_root.as_deref(),
            force,
            prune_orphans,
            cli.json,
        ),
        Commands::Validate {
            composition,
            strictness,
            output_root,
        } => cmd::validate::run(
            &library,
            &config,
            &composition,
            strictness,
            output_root.as_deref(),
            cli.json,
        ),
        Commands::Library { subcommand } => {
            cmd::library::run(&library, &config, subcommand, cli.json)
        }
        Commands::Manifest { subcommand } => cmd::manifest::run(subcommand, cli.json),
        Commands::Composition { subcommand } => {
            cmd::composition::run(&library, subcommand, cli.json)
        }
        Commands::Config { subcommand } => {
            cmd::config::run(&config_path, &config, subcommand, cli.json)
        }
    }
}
