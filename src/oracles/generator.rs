use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

use super::{CompletionRequest, Generator, LlmClient};
use crate::models::{Idea, Strategy, TrendingRepo, canonical_repo_key};
use crate::util::parse_embedded_json;

const GENERATOR_SYSTEM_PROMPT: &str = "You are a product strategist who turns trending \
open-source projects into original, shippable side projects. You never clone the source; \
you find the gap next to it. Reply with JSON only.";

#[derive(Debug, Deserialize)]
struct IdeasResponse {
    #[serde(default)]
    ideas: Vec<serde_json::Value>,
}

/// Idea synthesis through a language model.
///
/// The whole trend set goes into one prompt so the model can combine repos.
pub struct LlmGenerator {
    llm: Arc<dyn LlmClient>,
}

impl LlmGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate_ideas(&self, trends: &[TrendingRepo]) -> Result<Vec<Idea>> {
        if trends.is_empty() {
            return Ok(Vec::new());
        }
        let request = CompletionRequest::new(build_generation_prompt(trends))
            .system(GENERATOR_SYSTEM_PROMPT);
        let reply = self.llm.complete(request).await?;
        Ok(parse_ideas(&reply, trends))
    }
}

pub fn build_generation_prompt(trends: &[TrendingRepo]) -> String {
    let mut prompt = String::from("## Trending repositories\n\n");
    for repo in trends {
        let _ = writeln!(
            prompt,
            "- {} ({} stars, {}): {}\n  topics: {}\n  idea potential {}/100, {} complexity; {}",
            repo.key(),
            repo.stars,
            repo.language.as_deref().unwrap_or("unknown language"),
            repo.description,
            if repo.topics.is_empty() {
                "none".to_string()
            } else {
                repo.topics.join(", ")
            },
            repo.idea_potential,
            repo.complexity,
            repo.reasoning,
        );
    }

    prompt.push_str("\n## Strategies\n\n");
    for strategy in Strategy::ALL {
        let _ = writeln!(prompt, "- {}: {}", strategy, strategy.describe());
    }

    prompt.push_str(
        r#"
## Task

Propose 2 to 4 original project ideas inspired by the repositories above. Each idea
must name exactly one repository as its source using the `owner/name` form shown.
An idea may combine repositories, but it still names the main one as source.

Respond with a single JSON object:

{
  "ideas": [
    {
      "name": "Short Name",
      "tagline": "one line pitch",
      "description": "what it is and who it is for",
      "sourceRepo": "owner/name",
      "strategy": "adjacent|complementary|abstraction|inverse|transfer|niche",
      "features": [
        {"name": "...", "description": "...", "priority": "must|should|could", "estimatedHours": 2}
      ],
      "complexity": "simple|moderate|complex",
      "slopFactor": 0-100,
      "estimatedHours": 8,
      "mvp": "smallest demoable version",
      "successMetric": "how we know it worked"
    }
  ]
}
"#,
    );
    prompt
}

/// Parse a generator reply. Unparseable replies yield no ideas.
///
/// Each idea is read on its own so one malformed entry does not sink the
/// batch. Sources are rewritten to the matching trend's `owner/name`;
/// ideas without a source are attributed to the first trend.
pub fn parse_ideas(reply: &str, trends: &[TrendingRepo]) -> Vec<Idea> {
    let Some(response) = parse_embedded_json::<IdeasResponse>(reply) else {
        tracing::warn!(reply_chars = reply.len(), "generator reply had no parseable ideas");
        return Vec::new();
    };

    let fallback = trends.first().map(|t| t.key()).unwrap_or_default();
    response
        .ideas
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match serde_json::from_value::<Idea>(raw) {
            Ok(idea) => Some(idea),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed idea");
                None
            }
        })
        .filter(|idea| !idea.name.trim().is_empty())
        .map(|mut idea| {
            let source = idea.source_repo.trim();
            idea.source_repo = if source.is_empty() {
                fallback.clone()
            } else {
                canonical_repo_key(trends, source).unwrap_or_else(|| source.to_string())
            };
            idea
        })
        .collect()
}
