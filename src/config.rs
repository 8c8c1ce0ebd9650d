use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::models::Timeframe;
use crate::oracles::ScoutOptions;
use crate::shipyard_config::{BudgetsSection, JudgeSection, LoggingSection, ShipyardToml};

/// Flags given on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dry_run: bool,
    pub skip_deploy: bool,
    pub skip_announce: bool,
    pub timeframe: Option<Timeframe>,
    pub language: Option<String>,
    pub min_stars: Option<u32>,
    pub verbose: bool,
}

/// Runtime configuration for one pipeline run.
///
/// Built once from `shipyard.toml`, the environment and CLI flags, then
/// handed to the orchestrator by value. Nothing downstream reads ambient
/// state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub project_dir: PathBuf,
    pub dry_run: bool,
    pub skip_deploy: bool,
    pub skip_announce: bool,
    pub budgets: BudgetsSection,
    pub judge: JudgeSection,
    pub scout: ScoutOptions,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub claude_cmd: String,
    pub model: Option<String>,
    pub deploy_owner: Option<String>,
    pub deploy_visibility: String,
    pub github_token: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub logging: LoggingSection,
    pub verbose: bool,
}

impl PipelineConfig {
    /// Load `<project_dir>/.shipyard/shipyard.toml` and layer env and CLI on top.
    pub fn load(project_dir: &Path, cli: &CliOverrides) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let toml = ShipyardToml::load_or_default(&project_dir.join(".shipyard"))?;
        Ok(Self::from_parts(project_dir, toml, cli, |k| std::env::var(k).ok()))
    }

    /// Assemble a config from already-loaded parts. `env` is the variable lookup.
    pub fn from_parts<F>(project_dir: PathBuf, mut toml: ShipyardToml, cli: &CliOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        toml.apply_env(&env);

        let mut scout = ScoutOptions::from(&toml.scout);
        if let Some(timeframe) = cli.timeframe {
            scout.timeframe = timeframe;
        }
        if let Some(language) = &cli.language {
            scout.language = Some(language.clone());
        }
        if let Some(min_stars) = cli.min_stars {
            scout.min_stars = min_stars;
        }

        let resolve = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                project_dir.join(p)
            }
        };
        let state_dir = resolve(&toml.pipeline.state_dir);
        let log_dir = resolve(&toml.pipeline.log_dir);
        let workspace_dir = resolve(&toml.pipeline.workspace_dir);
        let mut logging = toml.logging.clone();
        logging.json_dir = logging.json_dir.as_deref().map(resolve);

        Self {
            dry_run: cli.dry_run || toml.pipeline.dry_run,
            skip_deploy: cli.skip_deploy || toml.pipeline.skip_deploy,
            skip_announce: cli.skip_announce || toml.pipeline.skip_announce,
            budgets: toml.budgets,
            judge: toml.judge,
            scout,
            state_dir,
            log_dir,
            workspace_dir,
            claude_cmd: toml.claude_cmd(),
            model: toml.llm.model.clone(),
            deploy_owner: toml.deploy.owner.clone(),
            deploy_visibility: toml.deploy.visibility.clone(),
            github_token: env("GITHUB_TOKEN").filter(|t| !t.is_empty()),
            twitter_bearer_token: env("TWITTER_BEARER_TOKEN").filter(|t| !t.is_empty()),
            logging,
            verbose: cli.verbose,
            project_dir,
        }
    }

    /// Dry-run suppresses deploy regardless of the skip flag.
    pub fn deploy_enabled(&self) -> bool {
        !self.dry_run && !self.skip_deploy
    }

    /// Announce needs a deployment to point at.
    pub fn announce_enabled(&self) -> bool {
        self.deploy_enabled() && !self.skip_announce
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir).context("Failed to create state directory")?;
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;
        std::fs::create_dir_all(&self.workspace_dir)
            .context("Failed to create workspace directory")?;
        Ok(())
    }
}

#[cfg(test)]
impl PipelineConfig {
    /// Config rooted at `dir` with generous budgets and no env.
    pub(crate) fn for_tests(dir: &Path) -> Self {
        let mut toml = ShipyardToml::default();
        toml.budgets = BudgetsSection::uniform(5);
        Self::from_parts(dir.to_path_buf(), toml, &CliOverrides::default(), |_| None)
    }
}
