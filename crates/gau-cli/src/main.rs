use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gau")]
#[command(about = "GAU allocation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env overlays...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Load a disbursement and print its allocations and remainder
    Show {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        disbursement: String,
    },

    /// Apply allocation lines to a disbursement, optionally saving
    Allocate {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        disbursement: String,

        /// `GAU=AMOUNT` or `GAU=PERCENT%`. Repeatable; one row per line.
        #[arg(long = "line", required = true)]
        lines: Vec<String>,

        /// Submit the result to the store and reload
        #[arg(long, default_value_t = false)]
        save: bool,
    },

    /// Remove every allocation from a disbursement
    Clear {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        disbursement: String,
    },

    /// Search selectable GAUs
    Search {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// GAU ids to leave out of the results
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        term: String,
    },
}

fn init_tracing() {
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = gau_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Show {
            config_paths,
            disbursement,
        } => {
            let ctx = commands::Context::from_paths(&config_paths)?;
            commands::allocate::show(&ctx, &disbursement).await?;
        }

        Commands::Allocate {
            config_paths,
            disbursement,
            lines,
            save,
        } => {
            let ctx = commands::Context::from_paths(&config_paths)?;
            commands::allocate::allocate(&ctx, &disbursement, &lines, save).await?;
        }

        Commands::Clear {
            config_paths,
            disbursement,
        } => {
            let ctx = commands::Context::from_paths(&config_paths)?;
            commands::allocate::clear(&ctx, &disbursement).await?;
        }

        Commands::Search {
            config_paths,
            exclude,
            term,
        } => {
            let ctx = commands::Context::from_paths(&config_paths)?;
            commands::search::search(&ctx, &term, &exclude).await?;
        }
    }

    Ok(())
}
