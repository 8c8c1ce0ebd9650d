use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use super::{CompletionRequest, Implementer, LlmClient};
use crate::models::{BuildStatus, Idea, ImplementationResult, Priority, ResearchReport};
use crate::util::truncate_chars;

static STATUS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<status>\s*(complete|partial|failed)\s*</status>").unwrap()
});
static IMPLEMENTED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<implemented>(.*?)</implemented>").unwrap());
static SKIPPED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<skipped>(.*?)</skipped>").unwrap());

/// Builds the selected idea with a coding agent in its own workspace.
///
/// The agent runs in `<workspace_dir>/<slug>` with edits allowed and reports
/// its outcome through a `<status>` tag.
pub struct AgentImplementer {
    llm: Arc<dyn LlmClient>,
    workspace_dir: PathBuf,
}

impl AgentImplementer {
    pub fn new(llm: Arc<dyn LlmClient>, workspace_dir: PathBuf) -> Self {
        Self { llm, workspace_dir }
    }
}

#[async_trait]
impl Implementer for AgentImplementer {
    async fn implement(
        &self,
        idea: &Idea,
        research: &ResearchReport,
    ) -> Result<ImplementationResult> {
        let workspace = self.workspace_dir.join(idea.slug());
        std::fs::create_dir_all(&workspace)
            .with_context(|| format!("Failed to create workspace {}", workspace.display()))?;

        let start = Instant::now();
        let request =
            CompletionRequest::new(build_implementation_prompt(idea, research)).in_workspace(&workspace);
        let outcome = self.llm.complete(request).await;
        let duration_secs = start.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(output) => parse_agent_output(&output, workspace, duration_secs),
            Err(e) => ImplementationResult {
                status: BuildStatus::Failed,
                workspace,
                summary: String::new(),
                features_implemented: Vec::new(),
                features_skipped: Vec::new(),
                duration_secs,
                error: Some(format!("{:#}", e)),
            },
        };
        Ok(result)
    }
}

pub fn build_implementation_prompt(idea: &Idea, research: &ResearchReport) -> String {
    let mut features = String::new();
    for priority in [Priority::Must, Priority::Should, Priority::Could] {
        for f in idea.features.iter().filter(|f| f.priority == priority) {
            features.push_str(&format!(
                "- [{:?}] {} (~{}h): {}\n",
                priority, f.name, f.estimated_hours, f.description
            ));
        }
    }

    let polish = match idea.slop_factor {
        0..=30 => "Polish matters: tests, README, clean error handling.",
        31..=70 => "Aim for a solid MVP. A README and basic tests are enough.",
        _ => "Speed over polish. Get something runnable and demoable.",
    };

    let risks = if research.risks.is_empty() {
        "none recorded".to_string()
    } else {
        research.risks.join("; ")
    };

    format!(
        r#"You are building a new project from scratch in the current directory.

## Project: {name}

{tagline}

{description}

MVP: {mvp}
Success metric: {metric}

## Features (in priority order)

{features}
## Research notes

{summary}
Risks: {risks}

## Rules

1. Implement every Must feature before touching Should or Could.
2. {polish}
3. Leave the project runnable with a README explaining how to run it.
4. When done, list what you built and skipped, then report your status:

<implemented>feature one, feature two</implemented>
<skipped>feature three</skipped>
<status>complete|partial|failed</status>
"#,
        name = idea.name,
        tagline = idea.tagline,
        description = idea.description,
        mvp = idea.mvp,
        metric = idea.success_metric,
        features = features,
        summary = research.summary,
        risks = risks,
        polish = polish,
    )
}

/// Read status and feature tags from agent output.
///
/// A missing status tag counts as partial: the agent exited cleanly but
/// never claimed completion.
pub fn parse_agent_output(output: &str, workspace: PathBuf, duration_secs: f64) -> ImplementationResult {
    let status = STATUS_REGEX
        .captures_iter(output)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| match m.as_str().to_lowercase().as_str() {
            "complete" => BuildStatus::Complete,
            "failed" => BuildStatus::Failed,
            _ => BuildStatus::Partial,
        })
        .unwrap_or(BuildStatus::Partial);

    let list = |re: &Regex| -> Vec<String> {
        re.captures(output)
            .and_then(|c| c.get(1))
            .map(|m| {
                m.as_str()
                    .split([',', '\n'])
                    .map(|s| s.trim().trim_start_matches('-').trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    let error = (status == BuildStatus::Failed).then(|| "agent reported failure".to_string());

    ImplementationResult {
        status,
        workspace,
        summary: truncate_chars(output.trim(), 2000),
        features_implemented: list(&IMPLEMENTED_REGEX),
        features_skipped: list(&SKIPPED_REGEX),
        duration_secs,
        error,
    }
}
