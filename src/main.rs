use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pod_shuffle::{generate, plan_partition, Config, Overrides, Power, Roster};
use tracing::{debug, error};

#[derive(Parser)]
#[command(author, version, about = "Seat players into balanced pods", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the target pod sizes for a head count
    Plan {
        head_count: usize,
        #[arg(long)]
        avoid_large_pods: bool,
    },
    /// Assign the players of a roster file to pods
    Generate {
        roster: PathBuf,
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Allowed power spread inside a pod (0, 0.5 or 1)
        #[arg(long)]
        leniency: Option<f64>,
        /// Allow a full point of spread
        #[arg(long)]
        super_leniency: bool,
        /// Match on bracket tiers; disables leniency
        #[arg(long)]
        bracket: bool,
        #[arg(long)]
        avoid_large_pods: bool,
        #[arg(long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    if let Err(e) = run(cli.command) {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Plan { head_count, avoid_large_pods } => {
            println!("{}", serde_json::to_string(&plan_partition(head_count, avoid_large_pods))?);
        }
        Commands::Generate { roster, config, leniency, super_leniency, bracket, avoid_large_pods, pretty } => {
            let mut config = match config {
                Some(path) => Config::load(&path).with_context(|| format!("loading {}", path.display()))?,
                None => Config::default(),
            };
            config.apply(Overrides {
                leniency: leniency.map(Power::try_from).transpose()?,
                super_leniency,
                bracket,
                avoid_large_pods,
            })?;
            debug!(?config, "resolved config");

            let text = std::fs::read_to_string(&roster).with_context(|| format!("reading {}", roster.display()))?;
            let roster: Roster = serde_json::from_str(&text).context("parsing roster")?;
            let result = generate(&roster, &config)?;
            let output = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{output}");
        }
    }
    Ok(())
}
