//! Best-effort parse results.

use thiserror::Error;

use crate::response::Response;

/// Result of running a grammar over captured output.
///
/// Parsers never return `Err`; they report how much of the text they
/// understood and leave the decision to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Every meaningful part of the text was interpreted.
    Complete(Response),
    /// A usable response was recovered, but some text was not interpreted.
    Partial {
        /// The recovered response.
        response: Response,
        /// Text the parser could not interpret.
        residue: String,
    },
    /// Nothing usable was found.
    Failed {
        /// Why nothing could be recovered.
        reason: String,
    },
}

impl ParseOutcome {
    /// Builds `Complete` when nothing was left over, otherwise `Partial`.
    pub(crate) fn with_residue(response: Response, residue: &[String]) -> Self {
        if residue.is_empty() {
            Self::Complete(response)
        } else {
            Self::Partial {
                response,
                residue: residue.join("\n"),
            }
        }
    }

    pub(crate) fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// The recovered response, if any.
    #[must_use]
    pub const fn response(&self) -> Option<&Response> {
        match self {
            Self::Complete(response) | Self::Partial { response, .. } => Some(response),
            Self::Failed { .. } => None,
        }
    }

    /// Whether the text was fully interpreted.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Text left uninterpreted by a partial parse.
    #[must_use]
    pub fn residue(&self) -> Option<&str> {
        match self {
            Self::Partial { residue, .. } => Some(residue.as_str()),
            Self::Complete(_) | Self::Failed { .. } => None,
        }
    }

    /// Accepts complete and partial parses; rejects failed ones.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Unparseable`] when nothing was recovered.
    pub fn into_result(self) -> Result<Response, OutputError> {
        match self {
            Self::Complete(response) | Self::Partial { response, .. } => Ok(response),
            Self::Failed { reason } => Err(OutputError::Unparseable { reason }),
        }
    }
}

/// Raised when a caller insists on a response and the output held none.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// No structured data could be recovered.
    #[error("tool output could not be parsed: {reason}")]
    Unparseable {
        /// Why nothing could be recovered.
        reason: String,
    },
}
