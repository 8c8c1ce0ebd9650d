use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{
    DeploymentResult, Idea, ImplementationResult, ResearchReport, TrendingRepo, TweetResult,
};

/// Phase tags, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Init,
    ScoutTrends,
    GenerateIdeas,
    JudgeIdeas,
    Research,
    Implement,
    Deploy,
    Announce,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ScoutTrends => "scout-trends",
            Self::GenerateIdeas => "generate-ideas",
            Self::JudgeIdeas => "judge-ideas",
            Self::Research => "research",
            Self::Implement => "implement",
            Self::Deploy => "deploy",
            Self::Announce => "announce",
            Self::Complete => "complete",
        }
    }

    /// Name of the oracle a phase delegates to, if any.
    pub fn oracle(&self) -> Option<&'static str> {
        match self {
            Self::ScoutTrends => Some("scout"),
            Self::GenerateIdeas => Some("generator"),
            Self::JudgeIdeas => Some("judge"),
            Self::Research => Some("researcher"),
            Self::Implement => Some("implementer"),
            Self::Deploy => Some("deployer"),
            Self::Announce => Some("announcer"),
            Self::Init | Self::Complete => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded failure or warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseErrorRecord {
    pub phase: Phase,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl PhaseErrorRecord {
    pub fn new(phase: Phase, error: impl Into<String>) -> Self {
        Self {
            phase,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Everything one run has learned so far.
///
/// Owned and mutated only by the orchestrator. A phase result, once set, stays
/// set; `ideas` is the one field judging may replace (on regeneration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub current_phase: Phase,
    #[serde(default)]
    pub trends: Option<Vec<TrendingRepo>>,
    #[serde(default)]
    pub ideas: Option<Vec<Idea>>,
    #[serde(default)]
    pub approved_ideas: Option<Vec<Idea>>,
    #[serde(default)]
    pub selected_idea: Option<Idea>,
    #[serde(default)]
    pub research: Option<ResearchReport>,
    #[serde(default)]
    pub implementation: Option<ImplementationResult>,
    #[serde(default)]
    pub deployment: Option<DeploymentResult>,
    #[serde(default)]
    pub announcement: Option<TweetResult>,
    #[serde(default)]
    pub errors: Vec<PhaseErrorRecord>,
    #[serde(default)]
    pub warnings: Vec<PhaseErrorRecord>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::with_run_id(new_run_id())
    }

    pub fn with_run_id(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            current_phase: Phase::Init,
            trends: None,
            ideas: None,
            approved_ideas: None,
            selected_idea: None,
            research: None,
            implementation: None,
            deployment: None,
            announcement: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record_error(&mut self, phase: Phase, error: impl Into<String>) {
        self.errors.push(PhaseErrorRecord::new(phase, error));
    }

    pub fn record_warning(&mut self, phase: Phase, warning: impl Into<String>) {
        self.warnings.push(PhaseErrorRecord::new(phase, warning));
    }

    pub fn last_error(&self) -> Option<&PhaseErrorRecord> {
        self.errors.last()
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Sortable, unique run identifier: `YYYYMMDD-HHMMSS-xxxxxxxx`.
pub fn new_run_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().format("%Y%m%d-%H%M%S"), &uuid[..8])
}

/// Persists one JSON snapshot per run, overwritten on every checkpoint.
///
/// The running pipeline only writes. `load` and `list_runs` are for
/// inspection tooling.
pub struct StateManager {
    state_dir: PathBuf,
}

impl StateManager {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn path_for(&self, run_id: &str) -> PathBuf {
        self.state_dir.join(format!("{}.json", run_id))
    }

    /// Overwrite the snapshot for `state.run_id`.
    pub fn checkpoint(&self, state: &PipelineState) -> Result<PathBuf> {
        fs::create_dir_all(&self.state_dir).with_context(|| {
            format!("Failed to create state directory {}", self.state_dir.display())
        })?;

        let path = self.path_for(&state.run_id);
        let tmp = self.state_dir.join(format!(".{}.json.tmp", state.run_id));
        let json = serde_json::to_string_pretty(state).context("Failed to serialize pipeline state")?;
        fs::write(&tmp, json).context("Failed to write state snapshot")?;
        fs::rename(&tmp, &path).context("Failed to move state snapshot into place")?;
        Ok(path)
    }

    pub fn load(&self, run_id: &str) -> Result<PipelineState> {
        let path = self.path_for(run_id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", path.display()))
    }

    /// Run ids with a snapshot on disk, most recent first.
    pub fn list_runs(&self) -> Result<Vec<String>> {
        if !self.state_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs: Vec<String> = fs::read_dir(&self.state_dir)
            .context("Failed to read state directory")?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .filter(|stem| !stem.starts_with('.'))
            .collect();

        runs.sort();
        runs.reverse();
        Ok(runs)
    }
}
