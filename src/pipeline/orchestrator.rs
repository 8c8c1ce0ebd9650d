//! The phase state machine.
//!
//! Phases run strictly in order:
//! `scout-trends → generate-ideas → judge-ideas → research → implement → [deploy] → [announce]`.
//!
//! Each phase sets `current_phase`, calls its oracle under the phase's time
//! budget, stores the result and checkpoints. The first fatal error ends the
//! run; it is recorded against the phase it happened in and the state is
//! checkpointed once more. Nothing here retries a phase. Only judging loops,
//! and only research tolerates per-item failures.

use serde_json::json;
use std::future::Future;
use std::time::{Duration, Instant};

use super::state::{Phase, PipelineState, StateManager};
use crate::audit::{LogLevel, LogRecord, RunLog};
use crate::budget::TimeBudget;
use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::judge::judge_with_feedback;
use crate::models::{BuildStatus, Idea, Recommendation, repo_lookup};
use crate::oracles::Oracles;

/// Outcome of one run, with the final state for postmortems.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub success: bool,
    pub selected_idea: Option<Idea>,
    pub repo_url: Option<String>,
    pub tweet_url: Option<String>,
    pub duration: Duration,
    pub error: Option<String>,
    pub failed_phase: Option<Phase>,
    pub state: PipelineState,
}

pub struct Orchestrator {
    config: PipelineConfig,
    oracles: Oracles,
    state: PipelineState,
    state_manager: StateManager,
    log: RunLog,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, oracles: Oracles) -> Self {
        let state = PipelineState::new();
        let state_manager = StateManager::new(config.state_dir.clone());
        let log = RunLog::new(&config.log_dir, &state.run_id);
        Self {
            config,
            oracles,
            state,
            state_manager,
            log,
        }
    }

    /// Replace the run log, e.g. with [`RunLog::disabled`].
    pub fn with_run_log(mut self, log: RunLog) -> Self {
        self.log = log;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.state.run_id
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Drive every phase to completion or first failure. Never panics on
    /// oracle misbehaviour; failures come back in the result.
    pub async fn run(mut self) -> RunResult {
        let start = Instant::now();
        self.log.record(
            LogRecord::new(LogLevel::Info, Phase::Init, "run started").data(json!({
                "runId": self.state.run_id,
                "dryRun": self.config.dry_run,
                "skipDeploy": self.config.skip_deploy,
                "skipAnnounce": self.config.skip_announce,
            })),
        );
        self.checkpoint();

        let outcome = self.run_phases().await;

        let (error, failed_phase) = match outcome {
            Ok(()) => {
                self.state.current_phase = Phase::Complete;
                self.log.record(
                    LogRecord::new(LogLevel::Info, Phase::Complete, "run complete")
                        .duration(start.elapsed()),
                );
                (None, None)
            }
            Err(e) => {
                let phase = self.state.current_phase;
                let message = e.to_string();
                self.state.record_error(phase, message.clone());
                self.log.record(
                    LogRecord::new(LogLevel::Error, phase, format!("run failed: {}", message))
                        .data(json!({ "timeout": e.is_timeout() }))
                        .duration(start.elapsed()),
                );
                (Some(message), Some(phase))
            }
        };
        self.checkpoint();

        RunResult {
            success: error.is_none(),
            selected_idea: self.state.selected_idea.clone(),
            repo_url: self
                .state
                .deployment
                .as_ref()
                .and_then(|d| d.repo_url.clone()),
            tweet_url: self
                .state
                .announcement
                .as_ref()
                .and_then(|a| a.tweet_url.clone()),
            duration: start.elapsed(),
            error,
            failed_phase,
            state: self.state,
        }
    }

    async fn run_phases(&mut self) -> Result<(), PipelineError> {
        self.scout_trends().await?;
        self.generate_ideas().await?;
        self.judge_ideas().await?;
        self.research().await?;
        self.implement().await?;

        if self.config.deploy_enabled() {
            self.deploy().await?;
        } else {
            let reason = if self.config.dry_run {
                "dry run"
            } else {
                "skip flag"
            };
            self.log
                .info(self.state.current_phase, format!("deploy skipped ({})", reason));
        }

        if self.config.announce_enabled() {
            self.announce().await;
        } else if !self.config.dry_run && !self.config.skip_announce {
            let phase = self.state.current_phase;
            self.warn(phase, "announce skipped: nothing was deployed");
        } else {
            self.log.info(self.state.current_phase, "announce skipped");
        }
        Ok(())
    }

    async fn scout_trends(&mut self) -> Result<(), PipelineError> {
        self.enter(Phase::ScoutTrends);
        let windows = self.config.scout.timeframe.widening();

        for timeframe in &windows {
            let options = self.config.scout.with_timeframe(*timeframe);
            let label = format!("scout-trends:{}", timeframe);
            let repos = self
                .call(Phase::ScoutTrends, label, || {
                    self.oracles.scout.scout_trends(&options)
                })
                .await?;

            if !repos.is_empty() {
                self.log.record(
                    LogRecord::new(
                        LogLevel::Info,
                        Phase::ScoutTrends,
                        format!("found {} trending repos ({})", repos.len(), timeframe),
                    )
                    .data(json!(repos.iter().map(|r| r.key()).collect::<Vec<_>>())),
                );
                self.state.trends = Some(repos);
                self.checkpoint();
                return Ok(());
            }
            self.log.warn(
                Phase::ScoutTrends,
                format!("no trending repos in the {} window", timeframe),
            );
        }

        Err(PipelineError::NoTrendsFound {
            windows: windows
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    async fn generate_ideas(&mut self) -> Result<(), PipelineError> {
        self.enter(Phase::GenerateIdeas);
        let trends = self.state.trends.clone().unwrap_or_default();

        let ideas = self
            .call(Phase::GenerateIdeas, "generate-ideas".to_string(), || {
                self.oracles.generator.generate_ideas(&trends)
            })
            .await?;
        if ideas.is_empty() {
            return Err(PipelineError::NoIdeasGenerated);
        }

        self.log.info(
            Phase::GenerateIdeas,
            format!("generated {} ideas", ideas.len()),
        );
        self.state.ideas = Some(ideas);
        self.checkpoint();
        Ok(())
    }

    async fn judge_ideas(&mut self) -> Result<(), PipelineError> {
        self.enter(Phase::JudgeIdeas);
        let ideas = self.state.ideas.clone().unwrap_or_default();
        let repos = repo_lookup(self.state.trends.as_deref().unwrap_or_default());
        let retries = self.config.judge.retry_rounds();
        let judge = self.oracles.judge.clone();

        let start = Instant::now();
        let outcome = self
            .budget(Phase::JudgeIdeas, "judge-ideas".to_string())
            .run(|| async move {
                Ok::<_, PipelineError>(
                    judge_with_feedback(judge.as_ref(), ideas, &repos, retries).await,
                )
            })
            .await?;

        self.log.record(
            LogRecord::new(
                LogLevel::Info,
                Phase::JudgeIdeas,
                format!(
                    "{} approved, {} rejected after {} round(s)",
                    outcome.approved.len(),
                    outcome.rejected.len(),
                    outcome.rounds
                ),
            )
            .oracle("judge")
            .data(json!(
                outcome
                    .rejected
                    .iter()
                    .map(|r| json!({
                        "idea": r.idea.name,
                        "score": r.verdict.adjusted_score,
                        "strongAxes": r.verdict.strong_axes(),
                        "reasoning": r.verdict.reasoning,
                    }))
                    .collect::<Vec<_>>()
            ))
            .duration(start.elapsed()),
        );

        if let Some(regenerated) = outcome.regenerated.clone() {
            self.state.ideas = Some(regenerated);
        }
        if outcome.is_exhausted() {
            return Err(PipelineError::JudgingExhausted {
                rounds: outcome.rounds,
                rejected: outcome.rejected.len(),
            });
        }

        self.state.approved_ideas = Some(outcome.approved);
        self.checkpoint();
        Ok(())
    }

    async fn research(&mut self) -> Result<(), PipelineError> {
        self.enter(Phase::Research);
        let candidates = self.state.approved_ideas.clone().unwrap_or_default();

        for idea in &candidates {
            let label = format!("research:{}", idea.name);
            let outcome = self
                .call(Phase::Research, label, || self.oracles.researcher.research(idea))
                .await;

            match outcome {
                Ok(report) if report.recommendation == Recommendation::Ship => {
                    self.log.info(
                        Phase::Research,
                        format!("selected '{}' (confidence {:.2})", idea.name, report.confidence),
                    );
                    self.state.selected_idea = Some(idea.clone());
                    self.state.research = Some(report);
                    self.checkpoint();
                    return Ok(());
                }
                Ok(report) => self.warn(
                    Phase::Research,
                    format!("'{}': research recommended {}", idea.name, report.recommendation),
                ),
                Err(e) => self.warn(Phase::Research, format!("'{}': {}", idea.name, e)),
            }
        }

        Err(PipelineError::NoShippableIdea {
            researched: candidates.len(),
        })
    }

    async fn implement(&mut self) -> Result<(), PipelineError> {
        self.enter(Phase::Implement);
        let (Some(idea), Some(research)) =
            (self.state.selected_idea.clone(), self.state.research.clone())
        else {
            return Err(anyhow::anyhow!("no researched idea selected").into());
        };

        let result = self
            .call(Phase::Implement, "implement".to_string(), || {
                self.oracles.implementer.implement(&idea, &research)
            })
            .await?;

        self.state.implementation = Some(result.clone());
        match result.status {
            BuildStatus::Failed => {
                return Err(PipelineError::ImplementationFailed {
                    reason: result
                        .error
                        .unwrap_or_else(|| "implementer reported failure".to_string()),
                });
            }
            BuildStatus::Partial => self.warn(
                Phase::Implement,
                format!(
                    "partial implementation; skipped: {}",
                    if result.features_skipped.is_empty() {
                        "unspecified".to_string()
                    } else {
                        result.features_skipped.join(", ")
                    }
                ),
            ),
            BuildStatus::Complete => {}
        }
        self.checkpoint();
        Ok(())
    }

    async fn deploy(&mut self) -> Result<(), PipelineError> {
        self.enter(Phase::Deploy);
        let (Some(idea), Some(implementation)) = (
            self.state.selected_idea.clone(),
            self.state.implementation.clone(),
        ) else {
            return Err(anyhow::anyhow!("nothing implemented to deploy").into());
        };

        let result = self
            .call(Phase::Deploy, "deploy".to_string(), || {
                self.oracles.deployer.deploy(&implementation, &idea)
            })
            .await?;

        self.state.deployment = Some(result.clone());
        if !result.success {
            return Err(PipelineError::DeploymentFailed {
                reason: result
                    .error
                    .unwrap_or_else(|| "deployer reported failure".to_string()),
            });
        }
        self.checkpoint();
        Ok(())
    }

    /// Failures here are warnings; the project is already delivered.
    async fn announce(&mut self) {
        self.enter(Phase::Announce);
        let (Some(idea), Some(implementation), Some(deployment)) = (
            self.state.selected_idea.clone(),
            self.state.implementation.clone(),
            self.state.deployment.clone(),
        ) else {
            self.warn(Phase::Announce, "announce skipped: no deployment recorded");
            return;
        };

        let outcome = self
            .call(Phase::Announce, "announce".to_string(), || {
                self.oracles
                    .announcer
                    .announce(&deployment, &idea, &implementation)
            })
            .await;

        match outcome {
            Ok(tweet) => {
                if !tweet.success {
                    self.warn(
                        Phase::Announce,
                        format!(
                            "announcement not posted: {}",
                            tweet.error.as_deref().unwrap_or("unknown error")
                        ),
                    );
                }
                self.state.announcement = Some(tweet);
            }
            Err(e) => self.warn(Phase::Announce, e.to_string()),
        }
        self.checkpoint();
    }

    /// Run one oracle call under `phase`'s budget and log how it went.
    async fn call<T, F, Fut>(&self, phase: Phase, label: String, op: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let oracle = phase.oracle().unwrap_or("pipeline");
        let start = Instant::now();
        let result = self
            .budget(phase, label.clone())
            .run(|| async move { op().await.map_err(|e| PipelineError::oracle(oracle, e)) })
            .await;

        let (level, message) = match &result {
            Ok(_) => (LogLevel::Debug, format!("{} returned", label)),
            Err(e) => (LogLevel::Warn, format!("{}: {}", label, e)),
        };
        self.log.record(
            LogRecord::new(level, phase, message)
                .oracle(oracle)
                .duration(start.elapsed()),
        );
        result
    }

    fn budget(&self, phase: Phase, label: String) -> TimeBudget {
        TimeBudget::new(
            label,
            self.config.budgets.for_phase(phase).unwrap_or_default(),
        )
    }

    fn enter(&mut self, phase: Phase) {
        self.state.current_phase = phase;
        self.log.info(phase, "phase started");
        self.checkpoint();
    }

    fn warn(&mut self, phase: Phase, message: impl Into<String>) {
        let message = message.into();
        self.log.warn(phase, message.clone());
        self.state.record_warning(phase, message);
    }

    /// Persist state. Failure is logged and otherwise ignored.
    fn checkpoint(&self) {
        if let Err(e) = self.state_manager.checkpoint(&self.state) {
            self.log.error(
                self.state.current_phase,
                format!("checkpoint failed: {:#}", e),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{IdeaJudge, Judge};
    use crate::models::idea::sample_idea;
    use crate::models::trend::sample_repo;
    use crate::models::{Timeframe, TrendingRepo};
    use crate::oracles::mock::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Mocks {
        scout: Arc<MockScout>,
        generator: Arc<MockGenerator>,
        judge: Arc<dyn Judge>,
        researcher: Arc<MockResearcher>,
        implementer: Arc<MockImplementer>,
        deployer: Arc<MockDeployer>,
        announcer: Arc<MockAnnouncer>,
    }

    impl Mocks {
        fn happy() -> Self {
            Self {
                scout: Arc::new(MockScout::returning(three_repos())),
                generator: Arc::new(MockGenerator::returning(vec![
                    sample_idea("Alpha", "a/one"),
                    sample_idea("Beta", "b/two"),
                ])),
                judge: Arc::new(MockJudge::approving(&["Alpha", "Beta"])),
                researcher: Arc::new(MockResearcher::default().with("Alpha", Recommendation::Ship)),
                implementer: Arc::new(MockImplementer::with_status(BuildStatus::Complete)),
                deployer: Arc::new(MockDeployer::succeeding()),
                announcer: Arc::new(MockAnnouncer::succeeding()),
            }
        }

        fn oracles(&self) -> Oracles {
            Oracles {
                scout: self.scout.clone(),
                generator: self.generator.clone(),
                judge: self.judge.clone(),
                researcher: self.researcher.clone(),
                implementer: self.implementer.clone(),
                deployer: self.deployer.clone(),
                announcer: self.announcer.clone(),
            }
        }
    }

    fn three_repos() -> Vec<TrendingRepo> {
        vec![
            sample_repo("a", "one"),
            sample_repo("b", "two"),
            sample_repo("c", "three"),
        ]
    }

    async fn run_with(mocks: &Mocks, tweak: impl FnOnce(&mut PipelineConfig)) -> (RunResult, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = PipelineConfig::for_tests(dir.path());
        tweak(&mut config);
        let result = Orchestrator::new(config, mocks.oracles()).run().await;
        (result, dir)
    }

    #[tokio::test]
    async fn test_happy_path_runs_every_phase() {
        let mocks = Mocks::happy();
        let (result, dir) = run_with(&mocks, |_| {}).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.state.current_phase, Phase::Complete);
        assert_eq!(result.selected_idea.as_ref().unwrap().name, "Alpha");
        assert_eq!(
            result.repo_url.as_deref(),
            Some("https://github.com/shipyard/alpha")
        );
        assert!(result.tweet_url.is_some());
        assert!(result.error.is_none());
        assert!(result.state.errors.is_empty());
        assert_eq!(mocks.deployer.calls(), 1);
        assert_eq!(mocks.announcer.calls(), 1);

        // Generator saw the whole trend set.
        assert_eq!(mocks.generator.calls()[0].len(), 3);

        let manager = StateManager::new(dir.path().join(".shipyard/state"));
        let saved = manager.load(&result.state.run_id).unwrap();
        assert_eq!(saved.current_phase, Phase::Complete);
        assert!(saved.deployment.is_some());

        let log_path = RunLog::path_for(&dir.path().join(".shipyard/logs"), &result.state.run_id);
        let records = RunLog::read(&log_path).unwrap();
        assert!(records.iter().any(|r| r.phase == Phase::Implement));
        assert!(records.iter().any(|r| r.oracle.as_deref() == Some("deployer")));
    }

    #[tokio::test]
    async fn test_research_short_circuits_on_first_ship() {
        let mut mocks = Mocks::happy();
        mocks.generator = Arc::new(MockGenerator::returning(vec![
            sample_idea("A", "a/one"),
            sample_idea("B", "a/one"),
            sample_idea("C", "a/one"),
        ]));
        mocks.judge = Arc::new(MockJudge::approving(&["A", "B", "C"]));
        mocks.researcher = Arc::new(
            MockResearcher::default()
                .with("A", Recommendation::Pivot)
                .with("B", Recommendation::Ship)
                .with("C", Recommendation::Ship),
        );

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(result.success);
        assert_eq!(result.selected_idea.unwrap().name, "B");
        assert_eq!(mocks.researcher.calls(), vec!["A", "B"]);
        assert_eq!(result.state.warnings.len(), 1);
        assert!(result.state.warnings[0].error.contains("pivot"));
    }

    #[tokio::test]
    async fn test_research_failures_are_not_fatal() {
        let mut mocks = Mocks::happy();
        // Alpha is not scripted, so its research call errors.
        mocks.researcher = Arc::new(MockResearcher::default().with("Beta", Recommendation::Ship));

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(result.success);
        assert_eq!(result.selected_idea.unwrap().name, "Beta");
        assert!(result.state.warnings[0].error.contains("browser crashed"));
    }

    #[tokio::test]
    async fn test_no_shippable_idea_fails_research() {
        let mut mocks = Mocks::happy();
        mocks.researcher = Arc::new(
            MockResearcher::default()
                .with("Alpha", Recommendation::Abort)
                .with("Beta", Recommendation::Pivot),
        );

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(Phase::Research));
        assert!(result.error.unwrap().contains("2 researched"));
        assert!(mocks.implementer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_implement_error_fails_run_at_implement() {
        let mut mocks = Mocks::happy();
        mocks.implementer = Arc::new(MockImplementer::failing("agent crashed"));

        let (result, dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(result.state.current_phase, Phase::Implement);
        assert_eq!(result.failed_phase, Some(Phase::Implement));
        assert_eq!(result.state.errors.len(), 1);
        assert_eq!(result.state.errors[0].phase, Phase::Implement);
        assert!(result.state.errors[0].error.contains("agent crashed"));
        assert_eq!(mocks.deployer.calls(), 0);

        // Earlier results survive the failure.
        assert!(result.state.research.is_some());
        let saved = StateManager::new(dir.path().join(".shipyard/state"))
            .load(&result.state.run_id)
            .unwrap();
        assert_eq!(saved.current_phase, Phase::Implement);
        assert_eq!(saved.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_build_status_is_fatal() {
        let mut mocks = Mocks::happy();
        mocks.implementer = Arc::new(MockImplementer::with_status(BuildStatus::Failed));

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(Phase::Implement));
        assert_eq!(
            result.state.implementation.unwrap().status,
            BuildStatus::Failed
        );
        assert!(result.error.unwrap().contains("tests did not pass"));
    }

    #[tokio::test]
    async fn test_partial_implementation_still_succeeds() {
        let mut mocks = Mocks::happy();
        mocks.implementer = Arc::new(MockImplementer::with_status(BuildStatus::Partial));

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(result.success);
        assert_eq!(
            result.state.implementation.as_ref().unwrap().status,
            BuildStatus::Partial
        );
        assert!(
            result
                .state
                .warnings
                .iter()
                .any(|w| w.phase == Phase::Implement)
        );
    }

    #[tokio::test]
    async fn test_dry_run_never_deploys_or_announces() {
        let mocks = Mocks::happy();
        let (result, _dir) = run_with(&mocks, |c| {
            c.dry_run = true;
            c.skip_deploy = false;
            c.skip_announce = false;
        })
        .await;

        assert!(result.success);
        assert_eq!(mocks.deployer.calls(), 0);
        assert_eq!(mocks.announcer.calls(), 0);
        assert!(result.state.deployment.is_none());
        assert!(result.repo_url.is_none());
        assert!(result.state.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_skip_deploy_also_skips_announce_with_warning() {
        let mocks = Mocks::happy();
        let (result, _dir) = run_with(&mocks, |c| c.skip_deploy = true).await;

        assert!(result.success);
        assert_eq!(mocks.deployer.calls(), 0);
        assert_eq!(mocks.announcer.calls(), 0);
        assert!(result.state.warnings[0].error.contains("nothing was deployed"));
    }

    #[tokio::test]
    async fn test_skip_announce_only() {
        let mocks = Mocks::happy();
        let (result, _dir) = run_with(&mocks, |c| c.skip_announce = true).await;
        assert!(result.success);
        assert_eq!(mocks.deployer.calls(), 1);
        assert_eq!(mocks.announcer.calls(), 0);
    }

    #[tokio::test]
    async fn test_deploy_failure_is_fatal() {
        let mut mocks = Mocks::happy();
        mocks.deployer = Arc::new(MockDeployer::unsuccessful());

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(Phase::Deploy));
        assert!(result.error.unwrap().contains("permission denied"));
        assert_eq!(mocks.announcer.calls(), 0);
        assert!(!result.state.deployment.unwrap().success);
    }

    #[tokio::test]
    async fn test_announce_failure_is_only_a_warning() {
        let mut mocks = Mocks::happy();
        mocks.announcer = Arc::new(MockAnnouncer::failing("rate limited"));

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(result.success);
        assert_eq!(result.state.current_phase, Phase::Complete);
        assert!(result.tweet_url.is_none());
        assert!(result.repo_url.is_some());
        let warning = result.state.warnings.last().unwrap();
        assert_eq!(warning.phase, Phase::Announce);
        assert!(warning.error.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_scout_widens_window_until_trends_found() {
        let mut mocks = Mocks::happy();
        mocks.scout = Arc::new(MockScout::default().on(Timeframe::Weekly, three_repos()));

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(result.success);
        let windows: Vec<Timeframe> = mocks.scout.calls().iter().map(|o| o.timeframe).collect();
        assert_eq!(windows, vec![Timeframe::Daily, Timeframe::Weekly]);
        assert_eq!(result.state.trends.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_no_trends_after_widening_fails() {
        let mut mocks = Mocks::happy();
        mocks.scout = Arc::new(MockScout::default());

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(Phase::ScoutTrends));
        assert_eq!(mocks.scout.calls().len(), 3);
        assert!(result.error.unwrap().contains("daily, weekly, monthly"));
        assert!(mocks.generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scout_error_is_fatal_and_names_oracle() {
        let mut mocks = Mocks::happy();
        mocks.scout = Arc::new(MockScout::failing("HTTP 403"));

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(mocks.scout.calls().len(), 1);
        assert_eq!(result.error.unwrap(), "scout failed: HTTP 403");
    }

    #[tokio::test]
    async fn test_zero_ideas_fails_generation() {
        let mut mocks = Mocks::happy();
        mocks.generator = Arc::new(MockGenerator::returning(vec![]));

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(Phase::GenerateIdeas));
    }

    #[tokio::test]
    async fn test_judging_exhaustion_fails_phase() {
        let mut mocks = Mocks::happy();
        mocks.judge = Arc::new(
            MockJudge::approving(&[]).regenerating(vec![sample_idea("Retry", "a/one")]),
        );

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(Phase::JudgeIdeas));
        assert!(result.error.unwrap().contains("2 judging round(s)"));
        // The regenerated set replaced the original ideas.
        let ideas = result.state.ideas.unwrap();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].name, "Retry");
        assert!(result.state.approved_ideas.is_none());
    }

    #[tokio::test]
    async fn test_regeneration_feeds_research_with_new_idea_only() {
        // Real judge over a scripted model: the two original ideas score low,
        // regeneration offers one idea that scores high.
        let llm = Arc::new(MockLlm::scripted(|req| {
            let low = r#"{"differentiationScore": 20, "axes": {"problem": "low"},
                "reasoning": "a thin wrapper", "suggestions": ["different audience"]}"#;
            let high = r#"{"differentiationScore": 70, "axes": {"problem": "high",
                "approach": "high", "runnability": "medium"}, "reasoning": "distinct"}"#;
            if req.prompt.contains("# Regenerate Idea") {
                Ok(r#"{"idea": {"name": "Fresh Angle", "sourceRepo": "a/one",
                    "features": [{"name": "core", "priority": "must"}], "estimatedHours": 5}}"#
                    .to_string())
            } else if req.prompt.contains("Name: Fresh Angle") {
                Ok(high.to_string())
            } else {
                Ok(low.to_string())
            }
        }));

        let mut mocks = Mocks::happy();
        mocks.generator = Arc::new(MockGenerator::returning(vec![
            sample_idea("Wrapper One", "a/one"),
            sample_idea("Wrapper Two", "a/one"),
        ]));
        mocks.judge = Arc::new(IdeaJudge::new(llm.clone(), Default::default()));
        mocks.researcher = Arc::new(
            MockResearcher::default()
                .with("Fresh Angle", Recommendation::Ship)
                .with("Wrapper One", Recommendation::Ship),
        );

        let (result, _dir) = run_with(&mocks, |_| {}).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(mocks.researcher.calls(), vec!["Fresh Angle"]);

        let approved = result.state.approved_ideas.as_ref().unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].name, "Fresh Angle");
        assert_eq!(result.state.ideas.as_ref().unwrap().len(), 1);

        // Two judgments, one regeneration (one source repo), one judgment.
        assert_eq!(llm.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_phase_timeout_is_fatal_and_discards_result() {
        let mut mocks = Mocks::happy();
        mocks.implementer = Arc::new(
            MockImplementer::with_status(BuildStatus::Complete)
                .with_delay(Duration::from_millis(500)),
        );

        let (result, _dir) = run_with(&mocks, |c| c.budgets.implement = 0).await;
        assert!(!result.success);
        assert_eq!(result.failed_phase, Some(Phase::Implement));
        let error = result.error.unwrap();
        assert!(error.contains("'implement' exceeded its time budget"));
        assert!(result.state.implementation.is_none());
    }

    #[tokio::test]
    async fn test_checkpoint_failure_does_not_fail_run() {
        let mocks = Mocks::happy();
        let blocker = TempDir::new().unwrap();
        let file = blocker.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let (result, _dir) = run_with(&mocks, |c| c.state_dir = file.join("state")).await;
        assert!(result.success);
    }
}
