use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shipyard::models::Timeframe;

mod cmd;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(version, about = "Trend-to-launch project pipeline")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline once
    Run {
        /// Stop after implementation; never deploy or announce
        #[arg(long)]
        dry_run: bool,

        /// Skip the deploy phase (and with it, the announcement)
        #[arg(long)]
        skip_deploy: bool,

        /// Skip the announce phase
        #[arg(long)]
        skip_announce: bool,

        /// Starting trend window: daily, weekly or monthly
        #[arg(long, value_parser = parse_timeframe)]
        timeframe: Option<Timeframe>,

        /// Only scout repositories in this language
        #[arg(long)]
        language: Option<String>,

        /// Minimum stars for a trending repository
        #[arg(long)]
        min_stars: Option<u32>,
    },
    /// List recorded runs, newest first
    Runs,
    /// Show the checkpointed state of a run
    Status {
        run_id: String,

        /// Also print the run's event log
        #[arg(long)]
        log: bool,
    },
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default shipyard.toml
    Init,
}

fn parse_timeframe(s: &str) -> Result<Timeframe, String> {
    s.parse::<Timeframe>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Run {
            dry_run,
            skip_deploy,
            skip_announce,
            timeframe,
            language,
            min_stars,
        } => {
            let overrides = shipyard::config::CliOverrides {
                dry_run: *dry_run,
                skip_deploy: *skip_deploy,
                skip_announce: *skip_announce,
                timeframe: *timeframe,
                language: language.clone(),
                min_stars: *min_stars,
                verbose: cli.verbose,
            };
            let success = cmd::run_pipeline(&project_dir, overrides).await?;
            if !success {
                std::process::exit(1);
            }
        }
        Commands::Runs => cmd::cmd_runs(&project_dir)?,
        Commands::Status { run_id, log } => cmd::cmd_status(&project_dir, run_id, *log)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
