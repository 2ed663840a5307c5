//! git-backed durable commit

use super::{CommitError, CommitOutcome, DurableCommit};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use tokio::process::Command;

/// Options for the git committer
#[derive(Debug, Clone)]
pub struct GitOptions {
    /// Working tree to run git in
    pub repo_dir: PathBuf,
    /// Paths to stage, relative to `repo_dir`
    pub paths: Vec<PathBuf>,
    /// Push after committing
    pub push: bool,
    /// Committer name set with `git config` before committing
    pub author_name: Option<String>,
    /// Committer email set with `git config` before committing
    pub author_email: Option<String>,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            paths: vec![PathBuf::from("state")],
            push: true,
            author_name: None,
            author_email: None,
        }
    }
}

/// Stages snapshot paths and commits them when the index differs from HEAD
pub struct GitCommitter {
    options: GitOptions,
}

impl GitCommitter {
    pub fn new(options: GitOptions) -> Self {
        Self { options }
    }

    async fn git(&self, args: &[&str]) -> Result<Output, CommitError> {
        Command::new("git")
            .args(args)
            .current_dir(&self.options.repo_dir)
            .output()
            .await
            .map_err(|source| CommitError::Spawn {
                command: display_command(args),
                source,
            })
    }

    /// Run git and require success
    async fn git_checked(&self, args: &[&str]) -> Result<Output, CommitError> {
        let output = self.git(args).await?;
        if !output.status.success() {
            return Err(CommitError::Failed {
                command: display_command(args),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    async fn configure_identity(&self) -> Result<(), CommitError> {
        if let Some(name) = &self.options.author_name {
            self.git_checked(&["config", "user.name", name.as_str()]).await?;
        }
        if let Some(email) = &self.options.author_email {
            self.git_checked(&["config", "user.email", email.as_str()]).await?;
        }
        Ok(())
    }

    async fn stage(&self) {
        let paths: Vec<String> = self
            .options
            .paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));

        // A failed add leaves nothing staged; the diff check below decides
        match self.git(&args).await {
            Ok(output) if !output.status.success() => {
                tracing::warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "git add failed"
                );
            }
            Err(e) => tracing::warn!(error = %e, "git add failed"),
            Ok(_) => {}
        }
    }

    /// Whether the index differs from HEAD
    async fn has_staged_changes(&self) -> Result<bool, CommitError> {
        let args = ["diff", "--cached", "--quiet"];
        let output = self.git(&args).await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(CommitError::Failed {
                command: display_command(&args),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

#[async_trait]
impl DurableCommit for GitCommitter {
    async fn commit_if_changed(&self, message: &str) -> Result<CommitOutcome, CommitError> {
        self.configure_identity().await?;
        self.stage().await;

        if !self.has_staged_changes().await? {
            tracing::info!("No state changes to commit");
            return Ok(CommitOutcome::Unchanged);
        }

        self.git_checked(&["commit", "-m", message]).await?;
        tracing::info!(commit_message = message, "Committed state");

        if self.options.push {
            self.git_checked(&["push"]).await?;
            tracing::info!("Pushed state");
        }

        Ok(CommitOutcome::Committed)
    }
}

fn display_command(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}
