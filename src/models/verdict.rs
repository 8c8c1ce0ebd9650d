use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Ordinal rating for one evaluation axis. Ordering is `None < Low < Medium < High`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisRating {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl AxisRating {
    /// Medium or high.
    pub fn is_strong(self) -> bool {
        self >= AxisRating::Medium
    }

    /// Lenient parse: unknown labels rate as `None`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "medium" | "med" | "moderate" => Self::Medium,
            "low" => Self::Low,
            _ => Self::None,
        }
    }
}

impl<'de> Deserialize<'de> for AxisRating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

impl fmt::Display for AxisRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// The five axes an idea is compared against its source on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeAxes {
    /// Does it solve a different problem?
    #[serde(default)]
    pub problem: AxisRating,
    /// Does it take a different technical approach?
    #[serde(default)]
    pub approach: AxisRating,
    /// Does it target a different audience?
    #[serde(default)]
    pub audience: AxisRating,
    /// Is the value proposition distinct?
    #[serde(default)]
    pub value: AxisRating,
    /// Can it be run and demoed quickly?
    #[serde(default)]
    pub runnability: AxisRating,
}

impl JudgeAxes {
    pub fn all(&self) -> [AxisRating; 5] {
        [
            self.problem,
            self.approach,
            self.audience,
            self.value,
            self.runnability,
        ]
    }

    pub fn strong_count(&self) -> usize {
        self.all().iter().filter(|r| r.is_strong()).count()
    }
}

/// The judge's structured decision for a single idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeVerdict {
    pub approved: bool,
    /// Raw 0-100 score as reported, clamped.
    pub differentiation_score: u8,
    /// Score after the runnability bonus, capped at 100.
    pub adjusted_score: u8,
    pub axes: JudgeAxes,
    pub reasoning: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl JudgeVerdict {
    /// Rejection used whenever a judgment cannot be obtained or trusted.
    pub fn fail_closed(cause: impl Into<String>) -> Self {
        Self {
            approved: false,
            differentiation_score: 0,
            adjusted_score: 0,
            axes: JudgeAxes::default(),
            reasoning: cause.into(),
            suggestions: Vec::new(),
        }
    }

    /// Approval for an idea that has no comparable source.
    pub fn unjudged(reason: impl Into<String>) -> Self {
        Self {
            approved: true,
            differentiation_score: 0,
            adjusted_score: 0,
            axes: JudgeAxes::default(),
            reasoning: reason.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn strong_axes(&self) -> usize {
        self.axes.strong_count()
    }
}
