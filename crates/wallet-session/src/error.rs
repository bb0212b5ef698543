//! Errors raised while driving the wallet tool.
//!
//! I/O errors are wrapped in `Arc` so the enum stays small and cloneable.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failures of the process layer.
///
/// Malformed tool output is not an error here; parsers report it through
/// [`ParseOutcome`](wallet_output::ParseOutcome).
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The configured tool executable does not exist. Not retried.
    #[error("wallet tool not found at {path}")]
    ToolNotFound {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The tool process could not be started.
    #[error("failed to spawn wallet tool: {message}")]
    SpawnFailed {
        /// Description of the spawn failure.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A pooled command produced no parseable response before its deadline.
    #[error("command '{command}' timed out after {timeout_ms}ms")]
    CommandTimeout {
        /// The command that was sent.
        command: String,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The pooled process exited while a command was pending.
    #[error("wallet tool process for {identity} exited")]
    ProcessExited {
        /// The identity whose process exited.
        identity: String,
    },

    /// A one-shot invocation exited with a non-zero status.
    #[error("wallet tool exited with status {status}: {stderr}")]
    ToolExecutionFailed {
        /// Exit status, or -1 when terminated by a signal.
        status: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// A one-shot invocation did not exit before its deadline.
    #[error("wallet tool command '{command}' timed out after {timeout_secs}s")]
    OneShotTimeout {
        /// The sub-command that was run.
        command: String,
        /// The deadline in seconds.
        timeout_secs: u64,
    },

    /// Communication with the tool process failed.
    #[error("I/O error while {operation}: {source}")]
    Io {
        /// What was being attempted.
        operation: &'static str,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl SessionError {
    /// Whether the caller may retry; a retry after `ProcessExited` respawns.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CommandTimeout { .. } | Self::ProcessExited { .. }
        )
    }

    pub(crate) fn io(operation: &'static str, error: io::Error) -> Self {
        Self::Io {
            operation,
            source: Arc::new(error),
        }
    }
}
