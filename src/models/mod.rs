//! Domain records flowing between pipeline phases.

pub mod idea;
pub mod reports;
pub mod trend;
pub mod verdict;

pub use idea::{Feature, Idea, Priority, Strategy};
pub use reports::{
    BuildStatus, Competitor, DeploymentResult, ImplementationResult, Recommendation,
    ResearchReport, TweetResult,
};
pub use trend::{
    Complexity, IdeaSurface, RepoLookup, Timeframe, TrendingRepo, canonical_repo_key, find_repo,
    normalize_repo_ref, repo_lookup,
};
pub use verdict::{AxisRating, JudgeAxes, JudgeVerdict};

use serde::{Deserialize, Deserializer};

/// Read an enum label without failing: anything that isn't a string
/// (null, a number, an object) comes back as `None`.
pub(crate) fn lenient_label<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(|s| s.trim().to_lowercase()))
}
