use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{CompletionRequest, LlmClient};

/// Language model access through the `claude` CLI in print mode.
///
/// The prompt goes in on stdin and the reply is read from stdout. The child
/// is killed if the future is dropped, so a blown time budget does not leave
/// a process behind.
pub struct ClaudeCli {
    claude_cmd: String,
    model: Option<String>,
    project_dir: PathBuf,
}

impl ClaudeCli {
    pub fn new(claude_cmd: String, model: Option<String>, project_dir: PathBuf) -> Self {
        Self {
            claude_cmd,
            model,
            project_dir,
        }
    }

    fn build_args(&self, request: &CompletionRequest) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "text".to_string(),
        ];
        if let Some(ref model) = self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        if let Some(ref system) = request.system {
            args.push("--append-system-prompt".to_string());
            args.push(system.clone());
        }
        if request.workspace.is_some() {
            args.push("--dangerously-skip-permissions".to_string());
        }
        args
    }
}

#[async_trait]
impl LlmClient for ClaudeCli {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let start = Instant::now();
        let cwd = request
            .workspace
            .clone()
            .unwrap_or_else(|| self.project_dir.clone());

        let mut child = Command::new(&self.claude_cmd)
            .args(self.build_args(&request))
            .current_dir(&cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", self.claude_cmd))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.prompt.as_bytes())
                .await
                .context("Failed to write prompt")?;
            stdin.shutdown().await.context("Failed to close stdin")?;
        }

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for claude process")?;

        tracing::debug!(
            prompt_chars = request.prompt.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            exit = output.status.code().unwrap_or(-1),
            "claude call finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "claude exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
