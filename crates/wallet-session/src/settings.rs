//! Session timing and tool location.

use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_STALE_GRACE: Duration = Duration::from_millis(500);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings shared by pooled and one-shot invocations.
///
/// The poll interval is only a fallback: waiters are woken as soon as new
/// output arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    tool_path: PathBuf,
    command_timeout: Duration,
    stale_grace: Duration,
    poll_interval: Duration,
    one_shot_timeout: Duration,
}

impl SessionSettings {
    /// Creates settings for the tool at `tool_path` with default timings.
    #[must_use]
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            stale_grace: DEFAULT_STALE_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            one_shot_timeout: DEFAULT_ONE_SHOT_TIMEOUT,
        }
    }

    /// Overrides the pooled command deadline.
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Overrides how long a late response from a timed-out command is awaited.
    #[must_use]
    pub const fn with_stale_grace(mut self, grace: Duration) -> Self {
        self.stale_grace = grace;
        self
    }

    /// Overrides the fallback wake-up interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the one-shot deadline.
    #[must_use]
    pub const fn with_one_shot_timeout(mut self, timeout: Duration) -> Self {
        self.one_shot_timeout = timeout;
        self
    }

    /// Wallet tool executable.
    #[must_use]
    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Deadline for a pooled command, measured from when it is written.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Grace period for a late response.
    #[must_use]
    pub const fn stale_grace(&self) -> Duration {
        self.stale_grace
    }

    /// Fallback wake-up interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Deadline for a one-shot invocation.
    #[must_use]
    pub const fn one_shot_timeout(&self) -> Duration {
        self.one_shot_timeout
    }
}
