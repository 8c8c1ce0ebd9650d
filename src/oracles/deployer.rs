use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::Deployer;
use crate::models::{DeploymentResult, Idea, ImplementationResult};

/// Publishes the workspace as a new GitHub repository through the `gh` CLI.
pub struct GhDeployer {
    owner: Option<String>,
    visibility: String,
}

impl GhDeployer {
    pub fn new(owner: Option<String>, visibility: String) -> Self {
        Self { owner, visibility }
    }

    fn repo_name(&self, idea: &Idea) -> String {
        match self.owner {
            Some(ref owner) => format!("{}/{}", owner, idea.slug()),
            None => idea.slug(),
        }
    }

    fn create_args(&self, idea: &Idea, workspace: &Path) -> Vec<String> {
        vec![
            "repo".to_string(),
            "create".to_string(),
            self.repo_name(idea),
            format!("--{}", self.visibility),
            "--source".to_string(),
            workspace.display().to_string(),
            "--description".to_string(),
            idea.tagline.clone(),
            "--push".to_string(),
        ]
    }
}

#[async_trait]
impl Deployer for GhDeployer {
    async fn deploy(
        &self,
        implementation: &ImplementationResult,
        idea: &Idea,
    ) -> Result<DeploymentResult> {
        let workspace = implementation.workspace.as_path();
        if !workspace.is_dir() {
            return Ok(DeploymentResult {
                success: false,
                repo_url: None,
                error: Some(format!("workspace {} does not exist", workspace.display())),
            });
        }

        if let Err(e) = ensure_committed(workspace, idea).await {
            return Ok(DeploymentResult {
                success: false,
                repo_url: None,
                error: Some(format!("{:#}", e)),
            });
        }

        let result = match run("gh", &self.create_args(idea, workspace), workspace).await {
            Ok(stdout) => DeploymentResult {
                success: true,
                repo_url: extract_repo_url(&stdout),
                error: None,
            },
            Err(e) => DeploymentResult {
                success: false,
                repo_url: None,
                error: Some(format!("{:#}", e)),
            },
        };
        Ok(result)
    }
}

/// `gh repo create --source` needs a repository with at least one commit.
async fn ensure_committed(workspace: &Path, idea: &Idea) -> Result<()> {
    if !workspace.join(".git").exists() {
        run("git", &["init", "-q"], workspace).await?;
    }
    run("git", &["add", "-A"], workspace).await?;
    let message = format!("Initial commit: {}", idea.name);
    // Nothing to commit is fine when the agent already committed.
    let _ = run("git", &["commit", "-q", "-m", message.as_str()], workspace).await;
    Ok(())
}

async fn run<S: AsRef<str>>(program: &str, args: &[S], cwd: &Path) -> Result<String> {
    let output = Command::new(program)
        .args(args.iter().map(|a| a.as_ref()))
        .current_dir(cwd)
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to run {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{} failed: {}", program, stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn extract_repo_url(stdout: &str) -> Option<String> {
    stdout
        .split_whitespace()
        .find(|w| w.starts_with("https://github.com/"))
        .map(|w| w.trim_end_matches(['.', ',']).to_string())
}
