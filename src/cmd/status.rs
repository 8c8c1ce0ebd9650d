//! Run listing and inspection: `shipyard runs`, `shipyard status <run-id>`.

use anyhow::{Context, Result};
use std::path::Path;

use shipyard::audit::{LogLevel, RunLog};
use shipyard::config::{CliOverrides, PipelineConfig};
use shipyard::pipeline::{Phase, PipelineState, StateManager};

fn load_config(project_dir: &Path) -> Result<PipelineConfig> {
    PipelineConfig::load(project_dir, &CliOverrides::default())
}

pub fn cmd_runs(project_dir: &Path) -> Result<()> {
    let config = load_config(project_dir)?;
    let manager = StateManager::new(&config.state_dir);
    let runs = manager.list_runs()?;

    println!();
    if runs.is_empty() {
        println!("No runs recorded yet. Start one with 'shipyard run'.");
        println!();
        return Ok(());
    }

    println!("{:<34} {:<16} {:<8} Idea", "Run", "Phase", "Result");
    println!(
        "{:<34} {:<16} {:<8} ----",
        "----------------------------------", "----------------", "------"
    );
    for run_id in runs {
        match manager.load(&run_id) {
            Ok(state) => println!(
                "{:<34} {:<16} {:<8} {}",
                run_id,
                state.current_phase,
                outcome_label(&state),
                state
                    .selected_idea
                    .as_ref()
                    .map(|i| i.name.as_str())
                    .unwrap_or("-")
            ),
            Err(e) => println!(
                "{:<34} {}",
                run_id,
                console::style(format!("unreadable: {:#}", e)).dim()
            ),
        }
    }
    println!();
    Ok(())
}

fn outcome_label(state: &PipelineState) -> console::StyledObject<&'static str> {
    if !state.errors.is_empty() {
        console::style("failed").red()
    } else if state.current_phase == Phase::Complete {
        console::style("ok").green()
    } else {
        console::style("running").yellow()
    }
}

pub fn cmd_status(project_dir: &Path, run_id: &str, show_log: bool) -> Result<()> {
    let config = load_config(project_dir)?;
    let manager = StateManager::new(&config.state_dir);
    let state = manager
        .load(run_id)
        .with_context(|| format!("No run '{}' in {}", run_id, config.state_dir.display()))?;

    println!();
    println!("Run {}", console::style(&state.run_id).cyan());
    println!("=================================================");
    println!("Started: {}", state.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Phase:   {} ({})", state.current_phase, outcome_label(&state));
    println!();

    if let Some(trends) = &state.trends {
        println!("Trends:    {}", trends.len());
    }
    if let Some(ideas) = &state.ideas {
        println!("Ideas:     {}", ideas.len());
    }
    if let Some(approved) = &state.approved_ideas {
        let names: Vec<&str> = approved.iter().map(|i| i.name.as_str()).collect();
        println!("Approved:  {}", names.join(", "));
    }
    if let Some(idea) = &state.selected_idea {
        println!("Selected:  {} ({})", idea.name, idea.source_repo);
    }
    if let Some(research) = &state.research {
        println!(
            "Research:  {} (confidence {:.2}{})",
            research.recommendation,
            research.confidence,
            if research.heuristic { ", heuristic" } else { "" }
        );
    }
    if let Some(implementation) = &state.implementation {
        println!(
            "Build:     {} in {}",
            implementation.status,
            implementation.workspace.display()
        );
    }
    if let Some(deployment) = &state.deployment {
        println!(
            "Deploy:    {}",
            deployment
                .repo_url
                .as_deref()
                .or(deployment.error.as_deref())
                .unwrap_or("-")
        );
    }
    if let Some(tweet) = &state.announcement {
        println!(
            "Announce:  {}",
            tweet
                .tweet_url
                .as_deref()
                .or(tweet.error.as_deref())
                .unwrap_or("-")
        );
    }

    if !state.errors.is_empty() || !state.warnings.is_empty() {
        println!();
    }
    for error in &state.errors {
        println!(
            "  {} [{}] {}",
            console::style("Error:").red().bold(),
            error.phase,
            error.error
        );
    }
    for warning in &state.warnings {
        println!(
            "  {} [{}] {}",
            console::style("⚠").yellow(),
            warning.phase,
            warning.error
        );
    }
    println!();

    if show_log {
        let path = RunLog::path_for(&config.log_dir, &state.run_id);
        if !path.exists() {
            println!("No event log at {}", path.display());
            println!();
            return Ok(());
        }
        for record in RunLog::read(&path)? {
            let level = match record.level {
                LogLevel::Error => console::style(record.level.to_string()).red(),
                LogLevel::Warn => console::style(record.level.to_string()).yellow(),
                _ => console::style(record.level.to_string()).dim(),
            };
            println!(
                "{} {:<5} {:<14} {}",
                record.timestamp.format("%H:%M:%S"),
                level,
                record.phase,
                record.message
            );
        }
        println!();
    }
    Ok(())
}
