mod cmd;
mod output;
mod root;

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "provision",
    about = "Compile tiered workspace templates and deploy them for a client",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .provision/)
    #[arg(long, global = true, env = "PROVISION_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .provision/ with default config and the built-in schemas
    Init,

    /// Compile a build package for a client and tier
    Build {
        /// Tier: starter, professional or enterprise
        #[arg(long, env = "PROVISION_TIER")]
        tier: String,
        /// Client name
        #[arg(long, env = "PROVISION_CLIENT")]
        client: String,
        /// Include synthetic sample records (true/false)
        #[arg(long, env = "PROVISION_SAMPLE_DATA", value_parser = BoolishValueParser::new())]
        sample_data: Option<bool>,
    },

    /// Deploy the latest build package for a tier to the remote workspace
    Deploy(cmd::deploy::DeployArgs),

    /// Estimate API volume and duration for a tier
    EstimateCost {
        /// Tier to estimate
        #[arg(long, env = "PROVISION_TIER", required_unless_present = "compare")]
        tier: Option<String>,
        /// Count sample records
        #[arg(long)]
        sample_data: bool,
        /// Estimate every tier side by side
        #[arg(long)]
        compare: bool,
    },

    /// Check the schema store for structural problems
    ValidateSchemas,

    /// Check config, schemas, artifacts and (unless --quick) the remote api
    Health {
        /// Skip the remote api probe
        #[arg(long)]
        quick: bool,
        /// API token for the remote probe
        #[arg(long, env = "PROVISION_API_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Show the most recent deployment report
    Report,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Deploy(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Build {
            tier,
            client,
            sample_data,
        } => cmd::build::run(&root, &tier, &client, sample_data, cli.json),
        Commands::Deploy(args) => cmd::deploy::run(&root, args, cli.json),
        Commands::EstimateCost {
            tier,
            sample_data,
            compare,
        } => cmd::estimate::run(tier.as_deref(), sample_data, compare, cli.json),
        Commands::ValidateSchemas => cmd::validate::run(&root, cli.json),
        Commands::Health { quick, token } => {
            cmd::health::run(&root, quick, token.as_deref(), cli.json)
        }
        Commands::Report => cmd::report::run(&root, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
