mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, phase::PhaseSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "appdeck",
    about = "Validate single-file UI apps, publish them live, and generate phase-specific prompts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .appdeck/ or apps/)
    #[arg(long, global = true, env = "APPDECK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an app and publish it to the hosting endpoint
    Deploy {
        /// App name, or category/name when the name is ambiguous
        app: String,

        /// Hosting endpoint base URL (overrides deploy.endpoint)
        #[arg(long, env = "APPDECK_ENDPOINT")]
        endpoint: Option<String>,

        /// Bearer token for the hosting endpoint
        #[arg(long, env = "APPDECK_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Validate an app and print a development prompt for its phase
    Prompt {
        /// App name, or category/name
        app: String,

        /// Phase to generate for (default: the app's recorded phase)
        phase: Option<String>,
    },

    /// Check an app against the structural rules without dispatching
    Validate {
        /// App name, or category/name
        app: String,
    },

    /// List every app in the catalog with its phase
    List,

    /// Show or change an app's lifecycle phase
    Phase {
        #[command(subcommand)]
        subcommand: PhaseSubcommand,
    },

    /// Show or validate the project configuration
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

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Deploy {
            app,
            endpoint,
            token,
        } => cmd::deploy::run(&root, &app, endpoint, token, cli.json),
        Commands::Prompt { app, phase } => {
            cmd::prompt::run(&root, &app, phase.as_deref(), cli.json)
        }
        Commands::Validate { app } => cmd::validate::run(&root, &app, cli.json),
        Commands::List => cmd::list::run(&root, cli.json),
        Commands::Phase { subcommand } => cmd::phase::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
