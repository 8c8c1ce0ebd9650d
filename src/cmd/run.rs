//! One pipeline run: `shipyard run`.

use anyhow::Result;
use std::path::Path;

use shipyard::config::{CliOverrides, PipelineConfig};
use shipyard::oracles::Oracles;
use shipyard::pipeline::{Orchestrator, RunResult, StateManager};

/// Returns whether the run succeeded. Setup problems are errors.
pub async fn run_pipeline(project_dir: &Path, overrides: CliOverrides) -> Result<bool> {
    let config = PipelineConfig::load(project_dir, &overrides)?;
    let _log_guard = shipyard::logging::init(&config.logging, config.verbose)?;
    config.ensure_directories()?;

    let toml = shipyard::shipyard_config::ShipyardToml::load_or_default(
        &config.project_dir.join(".shipyard"),
    )?;
    for warning in toml.warnings() {
        println!("  {} {}", console::style("⚠").yellow(), warning);
    }

    let oracles = Oracles::from_config(&config)?;
    let orchestrator = Orchestrator::new(config.clone(), oracles);

    println!();
    println!(
        "{} run {}",
        console::style("Shipyard").bold(),
        console::style(orchestrator.run_id()).cyan()
    );
    if config.dry_run {
        println!("  {}", console::style("Dry run: deploy and announce are off").dim());
    }
    println!();

    let result = orchestrator.run().await;
    print_summary(&result, &config);
    Ok(result.success)
}

fn print_summary(result: &RunResult, config: &PipelineConfig) {
    println!();
    if result.success {
        println!("{}", console::style("Run complete").green().bold());
    } else {
        println!("{}", console::style("Run failed").red().bold());
    }
    println!("  Duration:  {:.1}s", result.duration.as_secs_f64());

    if let Some(idea) = &result.selected_idea {
        println!("  Idea:      {} ({})", idea.name, idea.source_repo);
    }
    if let Some(implementation) = &result.state.implementation {
        println!(
            "  Build:     {} in {}",
            implementation.status,
            implementation.workspace.display()
        );
    }
    if let Some(url) = &result.repo_url {
        println!("  Repo:      {}", url);
    }
    if let Some(url) = &result.tweet_url {
        println!("  Tweet:     {}", url);
    }
    if let (Some(phase), Some(error)) = (result.failed_phase, &result.error) {
        println!(
            "  {} [{}] {}",
            console::style("Error:").red().bold(),
            phase,
            error
        );
    }
    for warning in &result.state.warnings {
        println!(
            "  {} [{}] {}",
            console::style("⚠").yellow(),
            warning.phase,
            warning.error
        );
    }
    println!();
    println!(
        "State: {}",
        StateManager::new(&config.state_dir)
            .path_for(&result.state.run_id)
            .display()
    );
    println!();
}
