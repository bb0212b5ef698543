//! Errors surfaced by wallet operations.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use wallet_output::OutputError;
use wallet_session::SessionError;

/// Failures of a wallet operation.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The tool could not be run or did not answer.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The tool answered with nothing that could be parsed.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// A parsed report lacked a field the operation needs.
    #[error("tool output has no '{key}' field")]
    MissingField {
        /// The missing key.
        key: String,
    },

    /// The caller supplied an unusable argument.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
    },

    /// The payment list could not be encoded for the tool.
    #[error("failed to encode payments: {0}")]
    EncodePayments(#[source] serde_json::Error),

    /// A wallet data directory could not be created or removed.
    #[error("failed to {operation} wallet directory {path}: {source}")]
    Filesystem {
        /// What was being attempted.
        operation: &'static str,
        /// The directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl WalletError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
