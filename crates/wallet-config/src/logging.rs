//! Log output settings consumed by the `walletd` telemetry layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{DEFAULT_LOG_FILTER, default_log_format};

/// How log events are rendered on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with event fields flattened.
    #[default]
    Json,
    /// Single-line text for people watching a terminal.
    Compact,
}

impl LogFormat {
    /// Whether events are emitted as machine-readable JSON.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when a log format name is not recognised.
pub type LogFormatParseError = strum::ParseError;

/// Resolved filter and format for the wallet service's log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings<'a> {
    filter: &'a str,
    format: LogFormat,
}

impl<'a> LogSettings<'a> {
    /// Pairs a filter expression with an output format.
    #[must_use]
    pub const fn new(filter: &'a str, format: LogFormat) -> Self {
        Self { filter, format }
    }

    /// `tracing_subscriber::EnvFilter` directive string.
    #[must_use]
    pub const fn filter(&self) -> &'a str {
        self.filter
    }

    /// Output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

impl Default for LogSettings<'_> {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILTER, default_log_format())
    }
}
