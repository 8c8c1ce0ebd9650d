use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::Announcer;
use crate::models::{DeploymentResult, Idea, ImplementationResult, TweetResult};
use crate::util::truncate_chars;

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";
pub const MAX_TWEET_CHARS: usize = 280;

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Posts a launch tweet through the X/Twitter v2 API.
pub struct TwitterAnnouncer {
    client: reqwest::Client,
    bearer_token: Option<String>,
}

impl TwitterAnnouncer {
    pub fn new(bearer_token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            bearer_token,
        })
    }

    async fn post(&self, token: &str, text: &str) -> Result<String> {
        let resp: CreateTweetResponse = self
            .client
            .post(TWEETS_URL)
            .bearer_auth(token)
            .json(&json!({ "text": text }))
            .send()
            .await
            .context("Failed to send tweet request")?
            .error_for_status()
            .context("Twitter API returned error status")?
            .json()
            .await
            .context("Failed to parse tweet response")?;
        Ok(format!("https://x.com/i/web/status/{}", resp.data.id))
    }
}

#[async_trait]
impl Announcer for TwitterAnnouncer {
    async fn announce(
        &self,
        deployment: &DeploymentResult,
        idea: &Idea,
        implementation: &ImplementationResult,
    ) -> Result<TweetResult> {
        let text = compose_tweet(idea, deployment, implementation);

        let Some(ref token) = self.bearer_token else {
            return Ok(TweetResult {
                success: false,
                tweet_url: None,
                text,
                error: Some("TWITTER_BEARER_TOKEN is not set".to_string()),
            });
        };

        let result = match self.post(token, &text).await {
            Ok(url) => TweetResult {
                success: true,
                tweet_url: Some(url),
                text,
                error: None,
            },
            Err(e) => TweetResult {
                success: false,
                tweet_url: None,
                text,
                error: Some(format!("{:#}", e)),
            },
        };
        Ok(result)
    }
}

/// Launch text, never longer than [`MAX_TWEET_CHARS`]. The link is kept whole.
pub fn compose_tweet(
    idea: &Idea,
    deployment: &DeploymentResult,
    implementation: &ImplementationResult,
) -> String {
    let link = deployment
        .repo_url
        .as_deref()
        .map(|u| format!("\n\n{}", u))
        .unwrap_or_default();

    let mut body = format!("Just shipped {}: {}", idea.name, idea.tagline);
    if !implementation.features_implemented.is_empty() {
        body.push_str(&format!(
            "\n\nIncludes {}",
            implementation.features_implemented.join(", ")
        ));
    }
    body.push_str(&format!("\n\nInspired by {}", idea.source_repo));

    let budget = MAX_TWEET_CHARS.saturating_sub(link.chars().count());
    format!("{}{}", truncate_chars(&body, budget), link)
}
