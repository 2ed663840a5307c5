//! Durable commit of snapshot files
//!
//! Snapshot files live in a git checkout when the watcher runs from a
//! scheduled CI job; committing them makes the next run see this run's
//! prices and keeps their history.

mod git;

pub use git::{GitCommitter, GitOptions};

use async_trait::async_trait;
use thiserror::Error;

/// Result of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new revision was recorded (and pushed, if enabled)
    Committed,
    /// Nothing differed from the last revision
    Unchanged,
}

/// Commit errors
#[derive(Debug, Error)]
pub enum CommitError {
    /// Command could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// Command ran and failed
    #[error("`{command}` failed with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Trait for durable snapshot commit backends
#[async_trait]
pub trait DurableCommit: Send + Sync {
    /// Record the current snapshot files if they changed
    async fn commit_if_changed(&self, message: &str) -> Result<CommitOutcome, CommitError>;
}

/// Commit backend that records nothing
#[derive(Debug, Default)]
pub struct NoopCommitter;

#[async_trait]
impl DurableCommit for NoopCommitter {
    async fn commit_if_changed(&self, message: &str) -> Result<CommitOutcome, CommitError> {
        tracing::debug!(commit_message = message, "Commit disabled, skipping");
        Ok(CommitOutcome::Unchanged)
    }
}
