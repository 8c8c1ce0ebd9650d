use serde::Deserialize;
use thiserror::Error;

use super::evaluate;
use crate::models::{Idea, JudgeAxes, JudgeVerdict};
use crate::shipyard_config::JudgeSection;
use crate::util::extract_json_object;

#[derive(Debug, Error, PartialEq)]
pub enum VerdictParseError {
    #[error("judge reply contained no JSON object")]
    NoJson,

    #[error("judge reply was not a valid verdict: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    differentiation_score: f64,
    #[serde(default)]
    axes: JudgeAxes,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Parse a judge reply and apply the acceptance rule.
pub fn parse_verdict(
    reply: &str,
    thresholds: &JudgeSection,
) -> Result<JudgeVerdict, VerdictParseError> {
    let json = extract_json_object(reply).ok_or(VerdictParseError::NoJson)?;
    let raw: RawVerdict =
        serde_json::from_str(json).map_err(|e| VerdictParseError::Malformed(e.to_string()))?;
    if !raw.differentiation_score.is_finite() {
        return Err(VerdictParseError::Malformed(
            "differentiationScore is not a number".to_string(),
        ));
    }

    let score = raw.differentiation_score.clamp(0.0, 100.0).round() as u8;
    let (adjusted_score, approved) = evaluate(score, &raw.axes, thresholds);

    Ok(JudgeVerdict {
        approved,
        differentiation_score: score,
        adjusted_score,
        axes: raw.axes,
        reasoning: raw.reasoning,
        suggestions: raw.suggestions,
    })
}

#[derive(Debug, Deserialize)]
struct Wrapped {
    idea: Idea,
}

/// Accepts `{"idea": {...}}` or a bare idea object.
pub fn parse_regenerated_idea(reply: &str) -> Option<Idea> {
    let json = extract_json_object(reply)?;
    let idea = serde_json::from_str::<Wrapped>(json)
        .map(|w| w.idea)
        .or_else(|_| serde_json::from_str::<Idea>(json))
        .ok()?;
    (!idea.name.trim().is_empty()).then_some(idea)
}
