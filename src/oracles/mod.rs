//! Collaborator contracts for each pipeline phase.
//!
//! Every phase calls exactly one oracle. The orchestrator only sees these
//! traits; concrete adapters live in the submodules and test doubles in
//! [`mock`].

pub mod announcer;
pub mod claude;
pub mod deployer;
pub mod generator;
pub mod github;
pub mod implementer;
#[cfg(test)]
pub mod mock;
pub mod researcher;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::judge::IdeaJudge;
use crate::models::{
    DeploymentResult, Idea, ImplementationResult, ResearchReport, Timeframe, TrendingRepo,
    TweetResult,
};
use crate::shipyard_config::ScoutSection;

pub use crate::judge::Judge;

/// Filters for trend discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoutOptions {
    pub timeframe: Timeframe,
    pub language: Option<String>,
    pub min_stars: u32,
    pub max_age_days: u32,
    pub topics: Vec<String>,
    pub limit: usize,
}

impl ScoutOptions {
    pub fn with_timeframe(&self, timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            ..self.clone()
        }
    }
}

impl Default for ScoutOptions {
    fn default() -> Self {
        Self::from(&ScoutSection::default())
    }
}

impl From<&ScoutSection> for ScoutOptions {
    fn from(section: &ScoutSection) -> Self {
        Self {
            timeframe: section.timeframe,
            language: section.language.clone(),
            min_stars: section.min_stars,
            max_age_days: section.max_age_days,
            topics: section.topics.clone(),
            limit: section.limit,
        }
    }
}

/// Finds repositories that are gaining attention.
/// Real implementation: `GithubScout`. Test double: `MockScout`.
#[async_trait]
pub trait Scout: Send + Sync {
    async fn scout_trends(&self, options: &ScoutOptions) -> Result<Vec<TrendingRepo>>;
}

/// Turns the full trend set into candidate ideas.
/// Real implementation: `LlmGenerator`. Test double: `MockGenerator`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate_ideas(&self, trends: &[TrendingRepo]) -> Result<Vec<Idea>>;
}

/// Real implementation: `LlmResearcher`. Test double: `MockResearcher`.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, idea: &Idea) -> Result<ResearchReport>;
}

/// Real implementation: `AgentImplementer`. Test double: `MockImplementer`.
#[async_trait]
pub trait Implementer: Send + Sync {
    async fn implement(&self, idea: &Idea, research: &ResearchReport)
    -> Result<ImplementationResult>;
}

/// Real implementation: `GhDeployer`. Test double: `MockDeployer`.
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(
        &self,
        implementation: &ImplementationResult,
        idea: &Idea,
    ) -> Result<DeploymentResult>;
}

/// Real implementation: `TwitterAnnouncer`. Test double: `MockAnnouncer`.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(
        &self,
        deployment: &DeploymentResult,
        idea: &Idea,
        implementation: &ImplementationResult,
    ) -> Result<TweetResult>;
}

/// A single prompt/response exchange with a language model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    /// Run inside this directory with file edits allowed (agent mode).
    pub workspace: Option<PathBuf>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn in_workspace(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace = Some(dir.into());
        self
    }
}

/// Real implementation: `ClaudeCli`. Test double: `MockLlm`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// The full set of collaborators one run needs.
#[derive(Clone)]
pub struct Oracles {
    pub scout: Arc<dyn Scout>,
    pub generator: Arc<dyn Generator>,
    pub judge: Arc<dyn Judge>,
    pub researcher: Arc<dyn Researcher>,
    pub implementer: Arc<dyn Implementer>,
    pub deployer: Arc<dyn Deployer>,
    pub announcer: Arc<dyn Announcer>,
}

impl Oracles {
    /// Wire the production adapters from configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let llm = Arc::new(claude::ClaudeCli::new(
            config.claude_cmd.clone(),
            config.model.clone(),
            config.project_dir.clone(),
        ));

        Ok(Self {
            scout: Arc::new(github::GithubScout::new(config.github_token.clone())?),
            generator: Arc::new(generator::LlmGenerator::new(llm.clone())),
            judge: Arc::new(IdeaJudge::new(llm.clone(), config.judge)),
            researcher: Arc::new(researcher::LlmResearcher::new(llm.clone())),
            implementer: Arc::new(implementer::AgentImplementer::new(
                llm,
                config.workspace_dir.clone(),
            )),
            deployer: Arc::new(deployer::GhDeployer::new(
                config.deploy_owner.clone(),
                config.deploy_visibility.clone(),
            )),
            announcer: Arc::new(announcer::TwitterAnnouncer::new(
                config.twitter_bearer_token.clone(),
            )?),
        })
    }
}
