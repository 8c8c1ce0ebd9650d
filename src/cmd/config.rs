//! Configuration view and validation commands: `shipyard config`.

use anyhow::Result;
use std::path::Path;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    use shipyard::config::{CliOverrides, PipelineConfig};
    use shipyard::shipyard_config::{CONFIG_FILE_NAME, ShipyardToml};

    let shipyard_dir = project_dir.join(".shipyard");
    let config_path = shipyard_dir.join(CONFIG_FILE_NAME);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Shipyard Configuration");
            println!("======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No shipyard.toml found at {}", config_path.display());
                println!("Using defaults. Run 'shipyard config init' to create one.");
            }
            println!();

            let config = PipelineConfig::load(project_dir, &CliOverrides::default())?;

            println!("[pipeline]");
            println!("  dry_run = {}", config.dry_run);
            println!("  skip_deploy = {}", config.skip_deploy);
            println!("  skip_announce = {}", config.skip_announce);
            println!("  state_dir = \"{}\"", config.state_dir.display());
            println!("  log_dir = \"{}\"", config.log_dir.display());
            println!("  workspace_dir = \"{}\"", config.workspace_dir.display());
            println!();

            let b = &config.budgets;
            println!("[budgets] (seconds)");
            println!("  scout_trends = {}", b.scout_trends);
            println!("  generate_ideas = {}", b.generate_ideas);
            println!("  judge_ideas = {}", b.judge_ideas);
            println!("  research = {} (per idea)", b.research);
            println!("  implement = {}", b.implement);
            println!("  deploy = {}", b.deploy);
            println!("  announce = {}", b.announce);
            println!();

            println!("[judge]");
            println!("  min_score = {}", config.judge.min_score);
            println!("  min_strong_axes = {}", config.judge.min_strong_axes);
            println!("  max_retry_rounds = {}", config.judge.retry_rounds());
            println!("  call_timeout_secs = {}", config.judge.call_timeout_secs);
            println!();

            println!("[scout]");
            println!("  timeframe = \"{}\"", config.scout.timeframe);
            if let Some(language) = &config.scout.language {
                println!("  language = \"{}\"", language);
            }
            println!("  min_stars = {}", config.scout.min_stars);
            println!("  max_age_days = {}", config.scout.max_age_days);
            if !config.scout.topics.is_empty() {
                println!("  topics = {:?}", config.scout.topics);
            }
            println!("  limit = {}", config.scout.limit);
            println!();

            println!("Effective values (with env overrides):");
            println!("  claude_cmd = \"{}\"", config.claude_cmd);
            if let Some(model) = &config.model {
                println!("  model = \"{}\"", model);
            }
            println!(
                "  deploy = {}",
                if config.deploy_enabled() { "on" } else { "off" }
            );
            println!(
                "  announce = {}",
                if config.announce_enabled() { "on" } else { "off" }
            );
            println!("  GITHUB_TOKEN = {}", presence(&config.github_token));
            println!(
                "  TWITTER_BEARER_TOKEN = {}",
                presence(&config.twitter_bearer_token)
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No shipyard.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = ShipyardToml::load(&config_path)?;
            let warnings = toml.warnings();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("shipyard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&shipyard_dir)?;
            ShipyardToml::default().save(&config_path)?;

            println!("Created shipyard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [pipeline] dry_run, skip_deploy, skip_announce, directories");
            println!("  - [budgets] per-phase time limits in seconds");
            println!("  - [judge] min_score, min_strong_axes, max_retry_rounds");
            println!("  - [scout] timeframe, language, min_stars, topics");
            println!();
        }
    }

    Ok(())
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() { "set" } else { "not set" }
}
