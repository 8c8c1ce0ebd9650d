use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How much effort a repository (or an idea derived from it) implies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

impl Complexity {
    /// Lenient parse: unknown labels rate as `Moderate`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "simple" | "easy" | "low" | "small" => Self::Simple,
            "complex" | "hard" | "high" | "large" => Self::Complex,
            _ => Self::Moderate,
        }
    }
}

impl<'de> Deserialize<'de> for Complexity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(super::lenient_label(deserializer)?
            .map(|label| Self::parse_lenient(&label))
            .unwrap_or_default())
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Moderate => write!(f, "moderate"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

/// Trend discovery window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
        }
    }

    /// This window followed by every wider one, narrowest first.
    pub fn widening(self) -> Vec<Timeframe> {
        [Self::Daily, Self::Weekly, Self::Monthly]
            .into_iter()
            .filter(|t| *t >= self)
            .collect()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => anyhow::bail!(
                "Invalid timeframe '{}'. Valid values: daily, weekly, monthly",
                s
            ),
        }
    }
}

/// Places where a trending repository leaves room for a new project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdeaSurface {
    DeveloperTooling,
    Integration,
    Visualization,
    Automation,
    Education,
    Performance,
}

/// A repository snapshot from the trend source plus derived scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingRepo {
    pub url: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub description: String,
    pub stars: u32,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    /// 0-100 estimate of how fertile this repo is as inspiration.
    #[serde(default)]
    pub idea_potential: u8,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub idea_surfaces: Vec<IdeaSurface>,
    #[serde(default)]
    pub reasoning: String,
}

impl TrendingRepo {
    /// Lookup key used by ideas to reference their source: `owner/name`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Known repositories keyed by the normalized form of [`TrendingRepo::key`].
/// Look entries up with [`find_repo`].
pub type RepoLookup = HashMap<String, TrendingRepo>;

/// Build a lookup table from a trend list.
pub fn repo_lookup(repos: &[TrendingRepo]) -> RepoLookup {
    repos
        .iter()
        .map(|r| (normalize_repo_ref(&r.key()), r.clone()))
        .collect()
}

/// Reduce a repository reference to lowercase `owner/name`.
///
/// Accepts GitHub URLs, a `.git` suffix and trailing slashes.
pub fn normalize_repo_ref(reference: &str) -> String {
    let mut r = reference.trim();
    for prefix in ["https://", "http://", "www.", "github.com/"] {
        if let Some(rest) = r.strip_prefix(prefix) {
            r = rest;
        }
    }
    let r = r.trim_end_matches('/');
    let r = r.strip_suffix(".git").unwrap_or(r);
    r.trim_end_matches('/').to_lowercase()
}

pub fn find_repo<'a>(repos: &'a RepoLookup, reference: &str) -> Option<&'a TrendingRepo> {
    repos.get(&normalize_repo_ref(reference))
}

/// The canonical key of the trend `reference` points at, if any.
pub fn canonical_repo_key(trends: &[TrendingRepo], reference: &str) -> Option<String> {
    let wanted = normalize_repo_ref(reference);
    trends
        .iter()
        .find(|t| normalize_repo_ref(&t.key()) == wanted)
        .map(|t| t.key())
}

#[cfg(test)]
pub(crate) fn sample_repo(owner: &str, name: &str) -> TrendingRepo {
    TrendingRepo {
        url: format!("https://github.com/{}/{}", owner, name),
        name: name.to_string(),
        owner: owner.to_string(),
        description: format!("{} does things", name),
        stars: 1200,
        language: Some("Rust".to_string()),
        topics: vec!["cli".to_string()],
        created_at: Utc::now(),
        pushed_at: None,
        idea_potential: 70,
        complexity: Complexity::Moderate,
        idea_surfaces: vec![IdeaSurface::DeveloperTooling],
        reasoning: "test fixture".to_string(),
    }
}
