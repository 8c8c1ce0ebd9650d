//! File-based configuration read from `.shipyard/shipyard.toml`.
//!
//! Every section and field is optional; a missing file yields defaults.
//!
//! ```toml
//! [pipeline]
//! dry_run = false
//! skip_deploy = false
//! skip_announce = false
//! state_dir = ".shipyard/state"
//! log_dir = ".shipyard/logs"
//! workspace_dir = ".shipyard/workspaces"
//!
//! [budgets]          # seconds
//! scout_trends = 120
//! generate_ideas = 300
//! judge_ideas = 900
//! research = 600     # per candidate idea
//! implement = 3600
//! deploy = 300
//! announce = 60
//!
//! [judge]
//! min_score = 50
//! min_strong_axes = 2
//! max_retry_rounds = 1
//! call_timeout_secs = 120
//!
//! [scout]
//! timeframe = "daily"
//! language = "rust"
//! min_stars = 50
//! max_age_days = 30
//! topics = []
//! limit = 10
//!
//! [llm]
//! claude_cmd = "claude"
//!
//! [deploy]
//! owner = "my-org"
//! visibility = "public"
//!
//! [logging]
//! level = "info"
//! json_dir = ".shipyard/logs/process"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Timeframe;
use crate::pipeline::Phase;

pub const CONFIG_FILE_NAME: &str = "shipyard.toml";

/// Judging can retry at most once (two rounds total).
pub const MAX_JUDGE_RETRY_ROUNDS: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub skip_deploy: bool,
    #[serde(default)]
    pub skip_announce: bool,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".shipyard/state")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".shipyard/logs")
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from(".shipyard/workspaces")
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_deploy: false,
            skip_announce: false,
            state_dir: default_state_dir(),
            log_dir: default_log_dir(),
            workspace_dir: default_workspace_dir(),
        }
    }
}

/// Per-phase wall-clock budgets, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetsSection {
    #[serde(default = "default_scout_budget")]
    pub scout_trends: u64,
    #[serde(default = "default_generate_budget")]
    pub generate_ideas: u64,
    #[serde(default = "default_judge_budget")]
    pub judge_ideas: u64,
    /// Applies to each candidate idea separately.
    #[serde(default = "default_research_budget")]
    pub research: u64,
    #[serde(default = "default_implement_budget")]
    pub implement: u64,
    #[serde(default = "default_deploy_budget")]
    pub deploy: u64,
    #[serde(default = "default_announce_budget")]
    pub announce: u64,
}

fn default_scout_budget() -> u64 {
    120
}

fn default_generate_budget() -> u64 {
    300
}

fn default_judge_budget() -> u64 {
    900
}

fn default_research_budget() -> u64 {
    600
}

fn default_implement_budget() -> u64 {
    3600
}

fn default_deploy_budget() -> u64 {
    300
}

fn default_announce_budget() -> u64 {
    60
}

impl Default for BudgetsSection {
    fn default() -> Self {
        Self {
            scout_trends: default_scout_budget(),
            generate_ideas: default_generate_budget(),
            judge_ideas: default_judge_budget(),
            research: default_research_budget(),
            implement: default_implement_budget(),
            deploy: default_deploy_budget(),
            announce: default_announce_budget(),
        }
    }
}

impl BudgetsSection {
    /// Budget for a phase. `Init` and `Complete` have none.
    pub fn for_phase(&self, phase: Phase) -> Option<Duration> {
        let secs = match phase {
            Phase::ScoutTrends => self.scout_trends,
            Phase::GenerateIdeas => self.generate_ideas,
            Phase::JudgeIdeas => self.judge_ideas,
            Phase::Research => self.research,
            Phase::Implement => self.implement,
            Phase::Deploy => self.deploy,
            Phase::Announce => self.announce,
            Phase::Init | Phase::Complete => return None,
        };
        Some(Duration::from_secs(secs))
    }

    /// Uniform budget for every phase; handy in tests.
    pub fn uniform(secs: u64) -> Self {
        Self {
            scout_trends: secs,
            generate_ideas: secs,
            judge_ideas: secs,
            research: secs,
            implement: secs,
            deploy: secs,
            announce: secs,
        }
    }
}

/// Acceptance thresholds. Score and breadth are separate gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeSection {
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    #[serde(default = "default_min_strong_axes")]
    pub min_strong_axes: usize,
    #[serde(default = "default_max_retry_rounds")]
    pub max_retry_rounds: u32,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_min_score() -> u8 {
    50
}

fn default_min_strong_axes() -> usize {
    2
}

fn default_max_retry_rounds() -> u32 {
    MAX_JUDGE_RETRY_ROUNDS
}

fn default_call_timeout_secs() -> u64 {
    120
}

impl Default for JudgeSection {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            min_strong_axes: default_min_strong_axes(),
            max_retry_rounds: default_max_retry_rounds(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl JudgeSection {
    pub fn retry_rounds(&self) -> u32 {
        self.max_retry_rounds.min(MAX_JUDGE_RETRY_ROUNDS)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutSection {
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_min_stars")]
    pub min_stars: u32,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_min_stars() -> u32 {
    50
}

fn default_max_age_days() -> u32 {
    30
}

fn default_limit() -> usize {
    10
}

impl Default for ScoutSection {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default(),
            language: None,
            min_stars: default_min_stars(),
            max_age_days: default_max_age_days(),
            topics: Vec::new(),
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    /// Claude CLI command (default: "claude", or `CLAUDE_CMD`)
    #[serde(default)]
    pub claude_cmd: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploySection {
    /// GitHub user or organisation to create repositories under.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

fn default_visibility() -> String {
    "public".to_string()
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            owner: None,
            visibility: default_visibility(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, process logs are also written as JSON here.
    #[serde(default)]
    pub json_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_dir: None,
        }
    }
}

/// The complete shipyard.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipyardToml {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub budgets: BudgetsSection,
    #[serde(default)]
    pub judge: JudgeSection,
    #[serde(default)]
    pub scout: ScoutSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub deploy: DeploySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ShipyardToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse shipyard.toml")
    }

    /// Load `<shipyard_dir>/shipyard.toml`, or defaults if it doesn't exist.
    pub fn load_or_default(shipyard_dir: &Path) -> Result<Self> {
        let path = shipyard_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize shipyard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides. `get` is the variable lookup.
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("SHIPYARD_DRY_RUN").and_then(|v| parse_flag(&v)) {
            self.pipeline.dry_run = v;
        }
        if let Some(v) = get("SHIPYARD_SKIP_DEPLOY").and_then(|v| parse_flag(&v)) {
            self.pipeline.skip_deploy = v;
        }
        if let Some(v) = get("SHIPYARD_SKIP_ANNOUNCE").and_then(|v| parse_flag(&v)) {
            self.pipeline.skip_announce = v;
        }
        if self.llm.claude_cmd.is_none()
            && let Some(cmd) = get("CLAUDE_CMD").filter(|c| !c.is_empty())
        {
            self.llm.claude_cmd = Some(cmd);
        }
    }

    pub fn claude_cmd(&self) -> String {
        self.llm
            .claude_cmd
            .clone()
            .unwrap_or_else(|| "claude".to_string())
    }

    /// Non-fatal configuration problems worth reporting.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.judge.max_retry_rounds > MAX_JUDGE_RETRY_ROUNDS {
            warnings.push(format!(
                "judge.max_retry_rounds = {} is capped at {}",
                self.judge.max_retry_rounds, MAX_JUDGE_RETRY_ROUNDS
            ));
        }
        if self.judge.min_score > 100 {
            warnings.push(format!(
                "judge.min_score = {} can never be reached (scores cap at 100)",
                self.judge.min_score
            ));
        }
        if self.judge.min_strong_axes > 5 {
            warnings.push(format!(
                "judge.min_strong_axes = {} exceeds the 5 judged axes",
                self.judge.min_strong_axes
            ));
        }
        if self.budgets.judge_ideas < self.judge.call_timeout_secs {
            warnings.push(format!(
                "budgets.judge_ideas ({}s) is shorter than one judge call ({}s)",
                self.budgets.judge_ideas, self.judge.call_timeout_secs
            ));
        }
        let zero: Vec<&str> = [
            ("scout_trends", self.budgets.scout_trends),
            ("generate_ideas", self.budgets.generate_ideas),
            ("judge_ideas", self.budgets.judge_ideas),
            ("research", self.budgets.research),
            ("implement", self.budgets.implement),
            ("deploy", self.budgets.deploy),
            ("announce", self.budgets.announce),
        ]
        .into_iter()
        .filter(|(_, secs)| *secs == 0)
        .map(|(name, _)| name)
        .collect();
        if !zero.is_empty() {
            warnings.push(format!(
                "zero-second budgets will always time out: {}",
                zero.join(", ")
            ));
        }
        warnings
    }
}

/// Parse a boolean-ish environment value.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
