//! Compendium CLI - Main entry point

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use compendium_markup::{CollectingObserver, TeeObserver, TracingObserver};
use compendium_records::RecordKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::{Overrides, Settings};

#[derive(Parser)]
#[command(name = "compendium")]
#[command(version)]
#[command(about = "Build rendered tabletop reference data", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Config file (default: compendium.yml in this directory or a parent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the remote data
    #[arg(long, global = true)]
    data_url: Option<String>,

    /// Directory for cached remote documents
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Directory for output JSON files
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Directory holding the srd-*.txt name lists
    #[arg(long, global = true)]
    srd_dir: Option<PathBuf>,

    /// Maximum tag substitution passes per string
    #[arg(long, global = true)]
    max_passes: Option<usize>,

    /// Render records in parallel
    #[arg(long, global = true)]
    parallel: bool,

    /// Include third-party bestiary sources
    #[arg(long, global = true)]
    include_third_party: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            data_url: self.data_url.clone(),
            cache_dir: self.cache_dir.clone(),
            out_dir: self.out_dir.clone(),
            srd_dir: self.srd_dir.clone(),
            max_passes: self.max_passes,
            parallel: self.parallel,
            include_third_party: self.include_third_party,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build out/bestiary.json
    Bestiary,

    /// Build out/items.json
    Items,

    /// Build out/races.json
    Races,

    /// Build out/feats.json
    Feats,

    /// Build every record kind, continuing past failures
    All,

    /// Render a markup node from a local JSON file to stdout
    Render {
        /// JSON file to read
        file: PathBuf,

        /// Separator between rendered children
        #[arg(long)]
        join: Option<String>,

        /// End each joined line with a Markdown hard break
        #[arg(long)]
        hard_break: bool,

        /// JSON pointer selecting the node to render (e.g. /monster/0/trait)
        #[arg(long)]
        pointer: Option<String>,
    },
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(format!("compendium={}", level)),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "compendium=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.log_level.as_deref());

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let settings = Settings::resolve(cli.global.overrides(), cli.global.config.as_deref(), &cwd)?;

    // Diagnostics are logged as they happen and counted for the summary
    let observer = Arc::new(TeeObserver::new(
        TracingObserver::new(),
        CollectingObserver::new(),
    ));

    let result = match cli.command {
        Commands::Bestiary => {
            commands::pipeline::execute(&[RecordKind::Bestiary], &settings, observer.clone())
        }
        Commands::Items => {
            commands::pipeline::execute(&[RecordKind::Items], &settings, observer.clone())
        }
        Commands::Races => {
            commands::pipeline::execute(&[RecordKind::Races], &settings, observer.clone())
        }
        Commands::Feats => {
            commands::pipeline::execute(&[RecordKind::Feats], &settings, observer.clone())
        }
        Commands::All => commands::pipeline::execute(&RecordKind::ALL, &settings, observer.clone()),
        Commands::Render {
            file,
            join,
            hard_break,
            pointer,
        } => commands::render::execute(
            commands::render::RenderArgs {
                file,
                join,
                hard_break,
                pointer,
            },
            &settings,
            observer.clone(),
        ),
    };

    let diagnostics = observer.second();
    tracing::info!(
        warnings = diagnostics.len(),
        errors = diagnostics.has_errors(),
        "{} render warnings",
        diagnostics.len()
    );

    result
}
