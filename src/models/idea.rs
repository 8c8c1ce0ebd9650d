use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::trend::Complexity;

/// How an idea relates to the repository that inspired it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Adjacent,
    Complementary,
    Abstraction,
    Inverse,
    Transfer,
    Niche,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Adjacent,
        Strategy::Complementary,
        Strategy::Abstraction,
        Strategy::Inverse,
        Strategy::Transfer,
        Strategy::Niche,
    ];

    /// Unknown labels fall back to the default strategy.
    pub fn parse_lenient(s: &str) -> Self {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.to_string() == s)
            .unwrap_or_default()
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Adjacent => "solve a neighbouring problem for the same users",
            Self::Complementary => "build something that works alongside the source",
            Self::Abstraction => "generalise the source's core idea into a reusable layer",
            Self::Inverse => "flip the source's assumption or workflow",
            Self::Transfer => "apply the source's technique to a different domain",
            Self::Niche => "serve an underserved audience the source ignores",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Adjacent => "adjacent",
            Self::Complementary => "complementary",
            Self::Abstraction => "abstraction",
            Self::Inverse => "inverse",
            Self::Transfer => "transfer",
            Self::Niche => "niche",
        };
        write!(f, "{}", s)
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(super::lenient_label(deserializer)?
            .map(|label| Self::parse_lenient(&label))
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Must,
    #[default]
    Should,
    Could,
}

impl Priority {
    /// Lenient parse: unknown labels rate as `Should`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "must" | "must-have" | "required" | "critical" | "high" => Self::Must,
            "could" | "could-have" | "nice-to-have" | "optional" | "low" => Self::Could,
            _ => Self::Should,
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(super::lenient_label(deserializer)?
            .map(|label| Self::parse_lenient(&label))
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimated_hours: f32,
}

/// A candidate project produced by the generator.
///
/// Ideas are replaced wholesale on regeneration, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    /// `owner/name` of the inspiring repository.
    #[serde(default)]
    pub source_repo: String,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub complexity: Complexity,
    /// 0-100; higher means a scrappier implementation is acceptable.
    #[serde(default = "default_slop_factor", deserialize_with = "deserialize_slop")]
    pub slop_factor: u8,
    #[serde(default)]
    pub estimated_hours: f32,
    #[serde(default)]
    pub mvp: String,
    #[serde(default)]
    pub success_metric: String,
}

fn default_slop_factor() -> u8 {
    50
}

fn deserialize_slop<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

impl Idea {
    pub fn must_have_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.priority == Priority::Must)
    }

    /// Filesystem and repository friendly name.
    pub fn slug(&self) -> String {
        let slug: String = self
            .name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            "untitled".to_string()
        } else {
            slug.chars().take(60).collect::<String>().trim_end_matches('-').to_string()
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_idea(name: &str, source_repo: &str) -> Idea {
    Idea {
        name: name.to_string(),
        tagline: format!("{} in one line", name),
        description: format!("{} description", name),
        source_repo: source_repo.to_string(),
        strategy: Strategy::Adjacent,
        features: vec![Feature {
            name: "core".to_string(),
            description: "the core loop".to_string(),
            priority: Priority::Must,
            estimated_hours: 3.0,
        }],
        complexity: Complexity::Simple,
        slop_factor: 40,
        estimated_hours: 6.0,
        mvp: "works end to end".to_string(),
        success_metric: "100 stars".to_string(),
    }
}
