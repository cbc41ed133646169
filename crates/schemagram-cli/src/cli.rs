//! `schemagram` - build and inspect entity-relationship diagrams from a
//! catalog snapshot

mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use schemagram_diagram::{AttributeVisibility, DiagramSettings};
use std::path::PathBuf;

use commands::CollectOptions;

#[derive(Debug, Parser)]
#[command(
    name = "schemagram",
    version,
    about = "Entity-relationship diagrams for database catalogs"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write JSON logs into this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_json: Option<PathBuf>,

    /// Diagram settings file (defaults to the user config directory)
    #[arg(long, global = true, env = "SCHEMAGRAM_SETTINGS", value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Collect a diagram below one or more catalog roots and print it as JSON
    Collect {
        /// Catalog snapshot (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Project the diagram belongs to
        #[arg(long)]
        project: String,

        /// Diagram name
        #[arg(long, default_value = "diagram")]
        name: String,

        /// Root objects as `<data source>[:<qualified name>]`
        #[arg(long = "root", required = true)]
        roots: Vec<String>,

        /// Include views even if the settings hide them
        #[arg(long)]
        views: bool,

        /// Include table partitions
        #[arg(long)]
        partitions: bool,

        /// Add tables referenced by collected tables
        #[arg(long)]
        related: bool,

        /// Write icons, data kinds, defaults and descriptions
        #[arg(long)]
        full: bool,

        /// Attribute visibility (all, primary, keys, none)
        #[arg(long)]
        visibility: Option<AttributeVisibility>,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Load a saved diagram against a catalog and summarize it
    Inspect {
        /// Catalog snapshot (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Project the diagram belongs to
        #[arg(long)]
        project: String,

        /// Saved diagram (JSON)
        diagram: PathBuf,
    },

    /// List data sources referenced by a legacy XML diagram
    LegacySources {
        /// Legacy diagram file
        file: PathBuf,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<DiagramSettings> {
    match path {
        Some(path) => DiagramSettings::load_from(path),
        None => DiagramSettings::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = logging::LoggingConfig::from_verbosity(cli.verbose).with_json_logs(cli.log_json);
    let _guard = logging::init(config)?;

    match cli.command {
        Command::Collect {
            catalog,
            project,
            name,
            roots,
            views,
            partitions,
            related,
            full,
            visibility,
            out,
        } => {
            let settings = load_settings(cli.settings.as_ref())?;
            let options = CollectOptions {
                catalog,
                project,
                name,
                roots,
                force_views: views,
                partitions,
                related,
                full,
                visibility,
                out,
            };
            commands::collect(options, settings).await
        }
        Command::Inspect {
            catalog,
            project,
            diagram,
        } => {
            let settings = load_settings(cli.settings.as_ref())?;
            commands::inspect(&catalog, &project, &diagram, settings).await
        }
        Command::LegacySources { file } => commands::legacy_sources(&file),
    }
}
