use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::{Scout, ScoutOptions};
use crate::models::{Complexity, IdeaSurface, TrendingRepo};

const GITHUB_SEARCH_URL: &str = "https://api.github.com/search/repositories";
const USER_AGENT: &str = "shipyard-scout";

/// Known GitHub token prefixes.
const GITHUB_TOKEN_PREFIXES: &[&str] = &["ghp_", "github_pat_", "gho_", "ghu_", "ghs_", "ghr_"];

/// Format check only; says nothing about scopes or expiry.
pub fn is_valid_github_token(token: &str) -> bool {
    !token.is_empty() && GITHUB_TOKEN_PREFIXES.iter().any(|p| token.starts_with(p))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchItem {
    name: String,
    owner: SearchOwner,
    html_url: String,
    description: Option<String>,
    stargazers_count: u32,
    #[serde(default)]
    forks_count: u32,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    created_at: DateTime<Utc>,
    pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchOwner {
    login: String,
}

/// Trend discovery through the GitHub repository search API.
///
/// "Trending" is approximated as repositories created inside the window,
/// sorted by stars. Each hit is scored locally; no LLM is involved.
pub struct GithubScout {
    client: reqwest::Client,
    token: Option<String>,
}

impl GithubScout {
    pub fn new(token: Option<String>) -> Result<Self> {
        if let Some(ref t) = token
            && !is_valid_github_token(t)
        {
            tracing::warn!("GITHUB_TOKEN does not look like a GitHub token; using it anyway");
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, token })
    }
}

#[async_trait]
impl Scout for GithubScout {
    async fn scout_trends(&self, options: &ScoutOptions) -> Result<Vec<TrendingRepo>> {
        let now = Utc::now();
        let query = build_query(options, now);
        let per_page = options.limit.clamp(1, 100).to_string();

        let mut request = self
            .client
            .get(GITHUB_SEARCH_URL)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ]);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let resp: SearchResponse = request
            .send()
            .await
            .context("Failed to send search request to GitHub")?
            .error_for_status()
            .context("GitHub search API returned error status")?
            .json()
            .await
            .context("Failed to parse search response from GitHub")?;

        tracing::debug!(query = %query, hits = resp.items.len(), "github search");

        let repos = resp
            .items
            .into_iter()
            .filter(|item| within_max_age(item.created_at, now, options.max_age_days))
            .map(|item| score_repo(item, now))
            .take(options.limit)
            .collect();
        Ok(repos)
    }
}

fn build_query(options: &ScoutOptions, now: DateTime<Utc>) -> String {
    let since = (now - Duration::days(options.timeframe.days())).format("%Y-%m-%d");
    let mut parts = vec![
        format!("created:>={}", since),
        format!("stars:>={}", options.min_stars),
    ];
    if let Some(ref language) = options.language {
        parts.push(format!("language:{}", language));
    }
    for topic in &options.topics {
        parts.push(format!("topic:{}", topic));
    }
    parts.join(" ")
}

/// Repository age gate. Age counts from creation, not the last push, so an
/// old project with fresh commits is still dropped. Zero disables the gate.
fn within_max_age(created_at: DateTime<Utc>, now: DateTime<Utc>, max_age_days: u32) -> bool {
    max_age_days == 0 || now - created_at <= Duration::days(i64::from(max_age_days))
}

/// Derive idea potential, complexity and surfaces from repository metadata.
fn score_repo(item: SearchItem, now: DateTime<Utc>) -> TrendingRepo {
    let age_days = (now - item.created_at).num_days().max(1) as f64;
    let stars_per_day = f64::from(item.stargazers_count) / age_days;
    let description = item.description.clone().unwrap_or_default();
    let haystack = format!("{} {} {}", item.name, description, item.topics.join(" ")).to_lowercase();

    let surfaces = detect_surfaces(&haystack);

    let mut potential = (stars_per_day.ln_1p() * 12.0).min(60.0);
    potential += (surfaces.len() as f64 * 8.0).min(24.0);
    if !description.is_empty() {
        potential += 6.0;
    }
    if item.forks_count > item.stargazers_count / 4 {
        // Heavily forked projects tend to be templates, not inspiration.
        potential -= 10.0;
    }
    let idea_potential = potential.clamp(0.0, 100.0).round() as u8;

    let complexity = match item.size {
        0..=2_000 => Complexity::Simple,
        2_001..=20_000 => Complexity::Moderate,
        _ => Complexity::Complex,
    };

    let reasoning = format!(
        "{:.1} stars/day over {} days; {} idea surface(s); {} codebase",
        stars_per_day,
        age_days as u64,
        surfaces.len(),
        complexity
    );

    TrendingRepo {
        url: item.html_url,
        name: item.name,
        owner: item.owner.login,
        description,
        stars: item.stargazers_count,
        language: item.language,
        topics: item.topics,
        created_at: item.created_at,
        pushed_at: item.pushed_at,
        idea_potential,
        complexity,
        idea_surfaces: surfaces,
        reasoning,
    }
}

fn detect_surfaces(haystack: &str) -> Vec<IdeaSurface> {
    const KEYWORDS: &[(IdeaSurface, &[&str])] = &[
        (IdeaSurface::DeveloperTooling, &["cli", "sdk", "devtool", "lint", "debug", "editor"]),
        (IdeaSurface::Integration, &["api", "plugin", "integration", "webhook", "bridge"]),
        (IdeaSurface::Visualization, &["dashboard", "chart", "visual", "graph", "ui"]),
        (IdeaSurface::Automation, &["automat", "workflow", "agent", "bot", "pipeline"]),
        (IdeaSurface::Education, &["tutorial", "learn", "course", "example", "guide"]),
        (IdeaSurface::Performance, &["fast", "performance", "benchmark", "optimi", "speed"]),
    ];

    KEYWORDS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| haystack.contains(w)))
        .map(|(surface, _)| *surface)
        .collect()
}
