//! Scriptable test doubles for every oracle, with call recording.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use super::{
    Announcer, CompletionRequest, Deployer, Generator, Implementer, LlmClient, Researcher, Scout,
    ScoutOptions,
};
use crate::judge::{Judge, RejectedIdea};
use crate::models::{
    BuildStatus, DeploymentResult, Idea, ImplementationResult, JudgeAxes, JudgeVerdict,
    Recommendation, RepoLookup, ResearchReport, Timeframe, TrendingRepo, TweetResult,
};

type LlmScript = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;

pub struct MockLlm {
    script: LlmScript,
    delay: Option<Duration>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub fn scripted<F>(f: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(f),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::scripted(move |_| Ok(reply.clone()))
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::scripted(move |_| Err(anyhow!(message.clone())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.script)(&request)
    }
}

/// Returns repositories per timeframe; unknown timeframes yield nothing.
#[derive(Default)]
pub struct MockScout {
    by_timeframe: HashMap<Timeframe, Vec<TrendingRepo>>,
    error: Option<String>,
    calls: Mutex<Vec<ScoutOptions>>,
}

impl MockScout {
    pub fn returning(repos: Vec<TrendingRepo>) -> Self {
        Self::default().on(Timeframe::Daily, repos)
    }

    pub fn on(mut self, timeframe: Timeframe, repos: Vec<TrendingRepo>) -> Self {
        self.by_timeframe.insert(timeframe, repos);
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ScoutOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scout for MockScout {
    async fn scout_trends(&self, options: &ScoutOptions) -> Result<Vec<TrendingRepo>> {
        self.calls.lock().unwrap().push(options.clone());
        if let Some(ref e) = self.error {
            return Err(anyhow!(e.clone()));
        }
        Ok(self
            .by_timeframe
            .get(&options.timeframe)
            .cloned()
            .unwrap_or_default())
    }
}

pub struct MockGenerator {
    ideas: Result<Vec<Idea>, String>,
    calls: Mutex<Vec<Vec<TrendingRepo>>>,
}

impl MockGenerator {
    pub fn returning(ideas: Vec<Idea>) -> Self {
        Self {
            ideas: Ok(ideas),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            ideas: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<TrendingRepo>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate_ideas(&self, trends: &[TrendingRepo]) -> Result<Vec<Idea>> {
        self.calls.lock().unwrap().push(trends.to_vec());
        self.ideas.clone().map_err(|e| anyhow!(e))
    }
}

/// Approves ideas by name; regeneration hands out a fixed batch once.
pub struct MockJudge {
    approve: HashSet<String>,
    regenerated: Mutex<VecDeque<Vec<Idea>>>,
    judged: Mutex<Vec<String>>,
    regenerate_calls: Mutex<Vec<Vec<String>>>,
}

impl MockJudge {
    pub fn approving(names: &[&str]) -> Self {
        Self {
            approve: names.iter().map(|n| n.to_string()).collect(),
            regenerated: Mutex::new(VecDeque::new()),
            judged: Mutex::new(Vec::new()),
            regenerate_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn regenerating(self, ideas: Vec<Idea>) -> Self {
        self.regenerated.lock().unwrap().push_back(ideas);
        self
    }

    /// Names of ideas that reached `judge`, in call order.
    pub fn judged(&self) -> Vec<String> {
        self.judged.lock().unwrap().clone()
    }

    pub fn regenerate_calls(&self) -> usize {
        self.regenerate_calls.lock().unwrap().len()
    }

    /// Rejected idea names passed to each regeneration call.
    pub fn regenerated_from(&self) -> Vec<Vec<String>> {
        self.regenerate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Judge for MockJudge {
    async fn judge(&self, idea: &Idea, _source: &TrendingRepo) -> JudgeVerdict {
        self.judged.lock().unwrap().push(idea.name.clone());
        if self.approve.contains(&idea.name) {
            JudgeVerdict {
                approved: true,
                differentiation_score: 80,
                adjusted_score: 80,
                axes: JudgeAxes::default(),
                reasoning: "distinct".to_string(),
                suggestions: Vec::new(),
            }
        } else {
            let mut verdict = JudgeVerdict::fail_closed("too close to source");
            verdict.differentiation_score = 30;
            verdict.adjusted_score = 30;
            verdict.suggestions = vec!["pick a different audience".to_string()];
            verdict
        }
    }

    async fn regenerate(&self, rejected: &[RejectedIdea], _repos: &RepoLookup) -> Result<Vec<Idea>> {
        self.regenerate_calls
            .lock()
            .unwrap()
            .push(rejected.iter().map(|r| r.idea.name.clone()).collect());
        Ok(self.regenerated.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// Recommendation per idea name; names not listed fail the call.
#[derive(Default)]
pub struct MockResearcher {
    outcomes: HashMap<String, Recommendation>,
    calls: Mutex<Vec<String>>,
}

impl MockResearcher {
    pub fn with(mut self, idea: &str, recommendation: Recommendation) -> Self {
        self.outcomes.insert(idea.to_string(), recommendation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Researcher for MockResearcher {
    async fn research(&self, idea: &Idea) -> Result<ResearchReport> {
        self.calls.lock().unwrap().push(idea.name.clone());
        let recommendation = self
            .outcomes
            .get(&idea.name)
            .copied()
            .ok_or_else(|| anyhow!("research browser crashed on {}", idea.name))?;
        Ok(ResearchReport {
            idea_name: idea.name.clone(),
            recommendation,
            confidence: 0.8,
            competitors: Vec::new(),
            market_gap: "open".to_string(),
            feasibility: "fine".to_string(),
            risks: Vec::new(),
            summary: format!("{} looks {}", idea.name, recommendation),
            heuristic: false,
        })
    }
}

pub struct MockImplementer {
    outcome: Result<BuildStatus, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockImplementer {
    pub fn with_status(status: BuildStatus) -> Self {
        Self {
            outcome: Ok(status),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Implementer for MockImplementer {
    async fn implement(
        &self,
        idea: &Idea,
        _research: &ResearchReport,
    ) -> Result<ImplementationResult> {
        self.calls.lock().unwrap().push(idea.name.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let status = self.outcome.clone().map_err(|e| anyhow!(e))?;
        Ok(ImplementationResult {
            status,
            workspace: PathBuf::from("/tmp/workspaces").join(idea.slug()),
            summary: format!("built {}", idea.name),
            features_implemented: vec!["core".to_string()],
            features_skipped: Vec::new(),
            duration_secs: 1.0,
            error: (status == BuildStatus::Failed).then(|| "tests did not pass".to_string()),
        })
    }
}

pub struct MockDeployer {
    success: bool,
    calls: Mutex<usize>,
}

impl MockDeployer {
    pub fn succeeding() -> Self {
        Self {
            success: true,
            calls: Mutex::new(0),
        }
    }

    pub fn unsuccessful() -> Self {
        Self {
            success: false,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Deployer for MockDeployer {
    async fn deploy(
        &self,
        _implementation: &ImplementationResult,
        idea: &Idea,
    ) -> Result<DeploymentResult> {
        *self.calls.lock().unwrap() += 1;
        Ok(if self.success {
            DeploymentResult {
                success: true,
                repo_url: Some(format!("https://github.com/shipyard/{}", idea.slug())),
                error: None,
            }
        } else {
            DeploymentResult {
                success: false,
                repo_url: None,
                error: Some("permission denied".to_string()),
            }
        })
    }
}

pub struct MockAnnouncer {
    outcome: Result<bool, String>,
    calls: Mutex<usize>,
}

impl MockAnnouncer {
    pub fn succeeding() -> Self {
        Self {
            outcome: Ok(true),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Announcer for MockAnnouncer {
    async fn announce(
        &self,
        deployment: &DeploymentResult,
        idea: &Idea,
        _implementation: &ImplementationResult,
    ) -> Result<TweetResult> {
        *self.calls.lock().unwrap() += 1;
        let success = self.outcome.clone().map_err(|e| anyhow!(e))?;
        Ok(TweetResult {
            success,
            tweet_url: success.then(|| "https://x.com/i/web/status/1".to_string()),
            text: format!(
                "Just shipped {} {}",
                idea.name,
                deployment.repo_url.as_deref().unwrap_or("")
            ),
            error: None,
        })
    }
}
