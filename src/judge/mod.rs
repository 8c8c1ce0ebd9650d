//! Differentiation judging and the regenerate-on-rejection loop.
//!
//! Each idea is compared against the repository it names as its source.
//! Two separate gates decide approval: the adjusted score and the number of
//! strong axes. If a whole batch is rejected, the rejection feedback is fed
//! back into one regeneration round before judging gives up.

pub mod parse;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::budget::TimeBudget;
use crate::errors::PipelineError;
use crate::models::{
    AxisRating, Idea, JudgeAxes, JudgeVerdict, RepoLookup, TrendingRepo, find_repo,
    normalize_repo_ref,
};
use crate::oracles::{CompletionRequest, LlmClient};
use crate::shipyard_config::{JudgeSection, MAX_JUDGE_RETRY_ROUNDS};

/// An idea together with the verdict that turned it down.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedIdea {
    pub idea: Idea,
    pub verdict: JudgeVerdict,
}

/// Every input idea lands in exactly one of the two lists, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub approved: Vec<Idea>,
    pub rejected: Vec<RejectedIdea>,
}

impl FilterOutcome {
    pub fn len(&self) -> usize {
        self.approved.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Real implementation: `IdeaJudge`. Test double: `MockJudge`.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Never fails: anything that prevents a trustworthy judgment yields a
    /// rejecting verdict.
    async fn judge(&self, idea: &Idea, source: &TrendingRepo) -> JudgeVerdict;

    /// Judge ideas one at a time. Ideas whose source is not in `repos` are
    /// approved without a call.
    async fn filter_ideas(&self, ideas: &[Idea], repos: &RepoLookup) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for idea in ideas {
            let Some(source) = find_repo(repos, &idea.source_repo) else {
                tracing::info!(
                    idea = %idea.name,
                    source = %idea.source_repo,
                    "source repo unknown; approving without judgment"
                );
                outcome.approved.push(idea.clone());
                continue;
            };

            let verdict = self.judge(idea, source).await;
            tracing::info!(
                idea = %idea.name,
                approved = verdict.approved,
                score = verdict.adjusted_score,
                strong_axes = verdict.strong_axes(),
                "judged idea"
            );
            if verdict.approved {
                outcome.approved.push(idea.clone());
            } else {
                outcome.rejected.push(RejectedIdea {
                    idea: idea.clone(),
                    verdict,
                });
            }
        }
        outcome
    }

    /// Produce replacement ideas from rejection feedback, at most one per
    /// source repository.
    async fn regenerate(&self, rejected: &[RejectedIdea], repos: &RepoLookup) -> Result<Vec<Idea>>;
}

/// Bonus added to the raw score for ideas that are quick to demo.
pub fn runnability_bonus(rating: AxisRating) -> u8 {
    match rating {
        AxisRating::High => 10,
        AxisRating::Medium => 5,
        AxisRating::Low | AxisRating::None => 0,
    }
}

/// Apply the acceptance rule. Returns `(adjusted_score, approved)`.
pub fn evaluate(score: u8, axes: &JudgeAxes, thresholds: &JudgeSection) -> (u8, bool) {
    let adjusted = score
        .min(100)
        .saturating_add(runnability_bonus(axes.runnability))
        .min(100);
    let approved =
        adjusted >= thresholds.min_score && axes.strong_count() >= thresholds.min_strong_axes;
    (adjusted, approved)
}

/// Judge backed by a language model.
pub struct IdeaJudge {
    llm: Arc<dyn LlmClient>,
    thresholds: JudgeSection,
}

impl IdeaJudge {
    pub fn new(llm: Arc<dyn LlmClient>, thresholds: JudgeSection) -> Self {
        Self { llm, thresholds }
    }

    async fn ask(&self, label: &str, request: CompletionRequest) -> Result<String, PipelineError> {
        let budget = TimeBudget::new(label, self.thresholds.call_timeout());
        let llm = &self.llm;
        budget
            .run(|| async move {
                llm.complete(request)
                    .await
                    .map_err(|e| PipelineError::oracle("judge", e))
            })
            .await
    }
}

#[async_trait]
impl Judge for IdeaJudge {
    async fn judge(&self, idea: &Idea, source: &TrendingRepo) -> JudgeVerdict {
        let request = CompletionRequest::new(prompts::build_judge_prompt(idea, source))
            .system(prompts::JUDGE_SYSTEM_PROMPT);

        let reply = match self.ask(&format!("judge:{}", idea.name), request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(idea = %idea.name, error = %e, "judge call failed; rejecting");
                return JudgeVerdict::fail_closed(e.to_string());
            }
        };

        match parse::parse_verdict(&reply, &self.thresholds) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(idea = %idea.name, error = %e, "judge reply unusable; rejecting");
                JudgeVerdict::fail_closed(e.to_string())
            }
        }
    }

    async fn regenerate(&self, rejected: &[RejectedIdea], repos: &RepoLookup) -> Result<Vec<Idea>> {
        let mut ideas = Vec::new();
        for (key, group) in group_by_source(rejected) {
            let Some(source) = find_repo(repos, &key) else {
                continue;
            };
            let request = CompletionRequest::new(prompts::build_regeneration_prompt(source, &group))
                .system(prompts::REGENERATE_SYSTEM_PROMPT);

            let reply = match self.ask(&format!("regenerate:{}", key), request).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(source = %key, error = %e, "regeneration call failed");
                    continue;
                }
            };

            match parse::parse_regenerated_idea(&reply) {
                Some(mut idea) => {
                    idea.source_repo = source.key();
                    ideas.push(idea);
                }
                None => tracing::warn!(source = %key, "regeneration reply had no usable idea"),
            }
        }
        Ok(ideas)
    }
}

/// Group rejections by source repository, in first-seen order. References
/// that differ only in case or URL form share a group.
pub fn group_by_source(rejected: &[RejectedIdea]) -> Vec<(String, Vec<&RejectedIdea>)> {
    let mut groups: Vec<(String, Vec<&RejectedIdea>)> = Vec::new();
    for r in rejected {
        let wanted = normalize_repo_ref(&r.idea.source_repo);
        match groups
            .iter_mut()
            .find(|(key, _)| normalize_repo_ref(key) == wanted)
        {
            Some((_, members)) => members.push(r),
            None => groups.push((r.idea.source_repo.clone(), vec![r])),
        }
    }
    groups
}

/// Result of the judge phase. `approved` is empty when judging is exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgingOutcome {
    pub approved: Vec<Idea>,
    pub rejected: Vec<RejectedIdea>,
    pub rounds: u32,
    /// Set when a regeneration round replaced the working idea set.
    pub regenerated: Option<Vec<Idea>>,
}

impl JudgingOutcome {
    pub fn is_exhausted(&self) -> bool {
        self.approved.is_empty()
    }
}

/// Run judging rounds until something is approved or retries run out.
///
/// A round that approves nothing triggers regeneration when a retry remains;
/// the next round judges only the regenerated ideas. At most
/// `1 + MAX_JUDGE_RETRY_ROUNDS` rounds run.
pub async fn judge_with_feedback(
    judge: &dyn Judge,
    ideas: Vec<Idea>,
    repos: &RepoLookup,
    max_retry_rounds: u32,
) -> JudgingOutcome {
    let retries = max_retry_rounds.min(MAX_JUDGE_RETRY_ROUNDS);
    let mut working = ideas;
    let mut regenerated = None;
    let mut round = 1;

    loop {
        let outcome = judge.filter_ideas(&working, repos).await;
        tracing::info!(
            round,
            approved = outcome.approved.len(),
            rejected = outcome.rejected.len(),
            "judging round finished"
        );

        if !outcome.approved.is_empty() || round > retries {
            return JudgingOutcome {
                approved: outcome.approved,
                rejected: outcome.rejected,
                rounds: round,
                regenerated,
            };
        }

        let fresh = match judge.regenerate(&outcome.rejected, repos).await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!(error = %e, "regeneration failed");
                Vec::new()
            }
        };
        if fresh.is_empty() {
            return JudgingOutcome {
                approved: Vec::new(),
                rejected: outcome.rejected,
                rounds: round,
                regenerated,
            };
        }

        working = fresh.clone();
        regenerated = Some(fresh);
        round += 1;
    }
}
