use std::time::Duration;

use camino::Utf8PathBuf;

/// Executable used when no tool path is configured.
pub const DEFAULT_TOOL_PATH: &str = "zingo-cli";

/// Chain selected when an account does not name one.
pub const DEFAULT_CHAIN: &str = "mainnet";

/// Light wallet server used when an account does not name one.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8137";

/// Directory under which per-account wallet data directories live.
pub const DEFAULT_WALLETS_ROOT: &str = "wallets";

/// Deadline applied to a pooled command.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

/// How long a command waits for a late response from a timed-out predecessor.
pub const DEFAULT_STALE_GRACE_MS: u64 = 500;

/// Safety-net wake-up interval for waiters that missed a notification.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Deadline applied to a one-shot invocation.
pub const DEFAULT_ONE_SHOT_TIMEOUT_SECS: u64 = 120;

/// Memo attached to payments that do not carry their own.
pub const DEFAULT_MEMO: &str = "Sent from the ZEC bounty app!";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default wallet tool executable.
#[must_use]
pub fn default_tool_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_TOOL_PATH)
}

/// Default pooled command deadline.
#[must_use]
pub const fn default_command_timeout() -> Duration {
    Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS)
}
