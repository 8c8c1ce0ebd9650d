//! Prompt text for judging and regeneration.

use std::fmt::Write as _;

use super::RejectedIdea;
use crate::models::{Idea, TrendingRepo};

pub const JUDGE_SYSTEM_PROMPT: &str = "You are a strict reviewer deciding whether a \
proposed project is meaningfully different from the repository that inspired it. Reply \
with JSON only.";

pub const REGENERATE_SYSTEM_PROMPT: &str = "You are a product strategist. Your earlier \
ideas were rejected as too close to their source. Propose something genuinely different. \
Reply with JSON only.";

fn describe_repo(repo: &TrendingRepo) -> String {
    format!(
        "- Repository: {key}\n- Description: {desc}\n- Language: {lang}\n- Topics: {topics}\n- Stars: {stars}",
        key = repo.key(),
        desc = repo.description,
        lang = repo.language.as_deref().unwrap_or("unknown"),
        topics = if repo.topics.is_empty() {
            "none".to_string()
        } else {
            repo.topics.join(", ")
        },
        stars = repo.stars,
    )
}

pub fn build_judge_prompt(idea: &Idea, source: &TrendingRepo) -> String {
    let features: Vec<String> = idea
        .features
        .iter()
        .map(|f| format!("  - {}: {}", f.name, f.description))
        .collect();

    format!(
        r#"# Differentiation Review

## Source

{source}

## Proposed Idea

- Name: {name}
- Tagline: {tagline}
- Strategy: {strategy}
- Description: {description}
- MVP: {mvp}
- Features:
{features}

## Axes

Rate each axis none, low, medium or high:

- **problem**: does it solve a different problem than the source?
- **approach**: does it use a different technical approach?
- **audience**: does it target a different audience?
- **value**: is the value proposition distinct?
- **runnability**: can someone run and demo it within minutes?

Then give an overall differentiationScore from 0 to 100. A reskin or thin wrapper
of the source scores below 30.

## Response Format

Respond with a single JSON object:

```json
{{
  "differentiationScore": 0,
  "axes": {{
    "problem": "none|low|medium|high",
    "approach": "none|low|medium|high",
    "audience": "none|low|medium|high",
    "value": "none|low|medium|high",
    "runnability": "none|low|medium|high"
  }},
  "reasoning": "two or three sentences",
  "suggestions": ["concrete change that would increase differentiation"]
}}
```
"#,
        source = describe_repo(source),
        name = idea.name,
        tagline = idea.tagline,
        strategy = idea.strategy,
        description = idea.description,
        mvp = idea.mvp,
        features = features.join("\n"),
    )
}

/// One new idea for `source`, informed by every rejection against it.
pub fn build_regeneration_prompt(source: &TrendingRepo, rejected: &[&RejectedIdea]) -> String {
    let mut feedback = String::new();
    for (i, r) in rejected.iter().enumerate() {
        let _ = writeln!(
            feedback,
            "{}. {} (score {}/100)\n   Reasoning: {}",
            i + 1,
            r.idea.name,
            r.verdict.adjusted_score,
            r.verdict.reasoning
        );
        for s in &r.verdict.suggestions {
            let _ = writeln!(feedback, "   Suggestion: {}", s);
        }
    }

    format!(
        r#"# Regenerate Idea

## Source

{source}

## Rejected Ideas

{feedback}
## Instructions

Propose ONE new idea inspired by {key} that:

1. Solves a different problem than the source and the rejected ideas.
2. Uses a different technical approach.
3. Closes the differentiation gap described in the feedback above.

Respond with a single JSON object:

```json
{{
  "idea": {{
    "name": "...",
    "tagline": "...",
    "description": "...",
    "sourceRepo": "{key}",
    "strategy": "adjacent|complementary|abstraction|inverse|transfer|niche",
    "features": [{{"name": "...", "description": "...", "priority": "must|should|could", "estimatedHours": 2}}],
    "complexity": "simple|moderate|complex",
    "slopFactor": 50,
    "estimatedHours": 8,
    "mvp": "...",
    "successMetric": "..."
  }}
}}
```
"#,
        source = describe_repo(source),
        feedback = feedback,
        key = source.key(),
    )
}
