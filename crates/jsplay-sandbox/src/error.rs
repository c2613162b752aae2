//! Errors raised by the sandbox outside of script execution.
//!
//! Script failures are not errors at this level: they become a
//! [`RunResult::Failed`](crate::RunResult::Failed).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// `run` was requested while the session is still running.
    #[error("a run is already in progress")]
    Busy,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
