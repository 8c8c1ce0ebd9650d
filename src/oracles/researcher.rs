use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::{CompletionRequest, LlmClient, Researcher};
use crate::models::{Competitor, Idea, Recommendation, ResearchReport};
use crate::util::parse_embedded_json;

/// Ideas above this many hours are too big for one unattended build.
const HEURISTIC_MAX_HOURS: f32 = 40.0;

const RESEARCHER_SYSTEM_PROMPT: &str = "You are a pragmatic market researcher. Search your \
knowledge for existing tools, judge whether a small team could ship the idea in days, and \
reply with JSON only.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    #[serde(default)]
    recommendation: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    competitors: Vec<Competitor>,
    #[serde(default)]
    market_gap: String,
    #[serde(default)]
    feasibility: String,
    #[serde(default)]
    risks: Vec<String>,
    #[serde(default)]
    summary: String,
}

/// Feasibility research through a language model.
///
/// An unreadable reply does not fail the idea; a heuristic report based on
/// scope takes its place.
pub struct LlmResearcher {
    llm: Arc<dyn LlmClient>,
}

impl LlmResearcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Researcher for LlmResearcher {
    async fn research(&self, idea: &Idea) -> Result<ResearchReport> {
        let request =
            CompletionRequest::new(build_research_prompt(idea)).system(RESEARCHER_SYSTEM_PROMPT);
        let reply = self.llm.complete(request).await?;
        Ok(parse_report(&reply, idea).unwrap_or_else(|| {
            tracing::warn!(idea = %idea.name, "research reply unparseable; using heuristic");
            heuristic_report(idea)
        }))
    }
}

fn build_research_prompt(idea: &Idea) -> String {
    let features: Vec<String> = idea
        .features
        .iter()
        .map(|f| format!("- [{:?}] {}: {}", f.priority, f.name, f.description))
        .collect();

    format!(
        r#"## Idea

Name: {name}
Tagline: {tagline}
Inspired by: {source}
Description: {description}
MVP: {mvp}
Estimated effort: {hours} hours

Features:
{features}

## Task

1. List the closest existing competitors.
2. Describe the market gap, if any.
3. Assess whether the MVP is feasible for one developer in under a week.
4. Recommend "ship", "pivot" or "abort".

Respond with a single JSON object:

{{
  "recommendation": "ship|pivot|abort",
  "confidence": 0.0-1.0,
  "competitors": [{{"name": "...", "url": "...", "notes": "..."}}],
  "marketGap": "...",
  "feasibility": "...",
  "risks": ["..."],
  "summary": "..."
}}
"#,
        name = idea.name,
        tagline = idea.tagline,
        source = idea.source_repo,
        description = idea.description,
        mvp = idea.mvp,
        hours = idea.estimated_hours,
        features = features.join("\n"),
    )
}

fn parse_report(reply: &str, idea: &Idea) -> Option<ResearchReport> {
    let raw: RawReport = parse_embedded_json(reply)?;
    let recommendation = Recommendation::parse_lenient(&raw.recommendation)?;
    Some(ResearchReport {
        idea_name: idea.name.clone(),
        recommendation,
        confidence: raw.confidence.clamp(0.0, 1.0),
        competitors: raw.competitors,
        market_gap: raw.market_gap,
        feasibility: raw.feasibility,
        risks: raw.risks,
        summary: raw.summary,
        heuristic: false,
    })
}

/// Scope-only assessment: ship small ideas that have a core feature.
pub fn heuristic_report(idea: &Idea) -> ResearchReport {
    let has_core = idea.must_have_features().next().is_some();
    let small = idea.estimated_hours <= HEURISTIC_MAX_HOURS;
    let recommendation = if has_core && small {
        Recommendation::Ship
    } else {
        Recommendation::Pivot
    };

    let mut risks = Vec::new();
    if !has_core {
        risks.push("no must-have feature defined".to_string());
    }
    if !small {
        risks.push(format!(
            "estimated {} hours exceeds the {} hour limit",
            idea.estimated_hours, HEURISTIC_MAX_HOURS
        ));
    }

    ResearchReport {
        idea_name: idea.name.clone(),
        recommendation,
        confidence: 0.3,
        competitors: Vec::new(),
        market_gap: String::new(),
        feasibility: format!("{} hours estimated", idea.estimated_hours),
        risks,
        summary: "Heuristic assessment from scope only".to_string(),
        heuristic: true,
    }
}
