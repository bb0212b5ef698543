//! Shared configuration for the wallet service.
//!
//! [`Config`] is loaded through `ortho_config`, which layers compiled
//! defaults, an optional configuration file, `WALLETD_*` environment
//! variables and command-line flags (highest precedence). Every field is
//! optional so a partially specified layer never masks a lower one; the
//! accessor methods fill in the defaults from [`defaults`]. The timing
//! fields also carry `ortho_config` defaults so the lowest layer is never
//! empty and a bare `walletd` invocation still loads.

mod defaults;
mod logging;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CHAIN, DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_MEMO,
    DEFAULT_ONE_SHOT_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERVER,
    DEFAULT_STALE_GRACE_MS, DEFAULT_TOOL_PATH, DEFAULT_WALLETS_ROOT, default_command_timeout,
    default_log_filter, default_log_format, default_tool_path,
};
pub use logging::{LogFormat, LogFormatParseError, LogSettings};

/// Resolved wallet service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WALLETD")]
#[serde(default)]
pub struct Config {
    /// Path to the wallet command-line tool.
    pub tool_path: Option<Utf8PathBuf>,
    /// Chain used when an account does not specify one.
    pub default_chain: Option<String>,
    /// Light wallet server used when an account does not specify one.
    pub default_server: Option<String>,
    /// Root directory for per-account wallet data.
    pub wallets_root: Option<Utf8PathBuf>,
    /// Data directory used by the `walletd` binary's own session.
    pub data_dir: Option<Utf8PathBuf>,
    /// Deadline for a pooled command, in milliseconds.
    #[ortho_config(default = DEFAULT_COMMAND_TIMEOUT_MS)]
    pub command_timeout_ms: Option<u64>,
    /// Grace period for draining a late response after a timeout, in milliseconds.
    #[ortho_config(default = DEFAULT_STALE_GRACE_MS)]
    pub stale_grace_ms: Option<u64>,
    /// Fallback wake-up interval for pending commands, in milliseconds.
    #[ortho_config(default = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: Option<u64>,
    /// Deadline for a one-shot invocation, in seconds.
    #[ortho_config(default = DEFAULT_ONE_SHOT_TIMEOUT_SECS)]
    pub one_shot_timeout_secs: Option<u64>,
    /// Memo attached to payments without one.
    pub default_memo: Option<String>,
    /// Tracing filter expression.
    pub log_filter: Option<String>,
    /// Tracing output format.
    pub log_format: Option<LogFormat>,
}

impl Config {
    /// Wallet tool executable.
    #[must_use]
    pub fn tool_path(&self) -> Utf8PathBuf {
        self.tool_path.clone().unwrap_or_else(default_tool_path)
    }

    /// Chain used when an account does not name one.
    #[must_use]
    pub fn default_chain(&self) -> &str {
        self.default_chain.as_deref().unwrap_or(DEFAULT_CHAIN)
    }

    /// Server endpoint used when an account does not name one.
    #[must_use]
    pub fn default_server(&self) -> &str {
        self.default_server.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    /// Root directory holding wallet data directories.
    #[must_use]
    pub fn wallets_root(&self) -> &Utf8Path {
        self.wallets_root
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_WALLETS_ROOT))
    }

    /// Data directory for the binary's own session; falls back to the wallets root.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        self.data_dir
            .as_deref()
            .unwrap_or_else(|| self.wallets_root())
    }

    /// Deadline applied to each pooled command.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout_ms
            .map_or_else(default_command_timeout, Duration::from_millis)
    }

    /// Grace period for draining a late response left by a timed-out command.
    #[must_use]
    pub fn stale_grace(&self) -> Duration {
        Duration::from_millis(self.stale_grace_ms.unwrap_or(DEFAULT_STALE_GRACE_MS))
    }

    /// Fallback wake-up interval for pending commands.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Deadline applied to one-shot invocations.
    #[must_use]
    pub fn one_shot_timeout(&self) -> Duration {
        Duration::from_secs(
            self.one_shot_timeout_secs
                .unwrap_or(DEFAULT_ONE_SHOT_TIMEOUT_SECS),
        )
    }

    /// Memo attached to payments without one.
    #[must_use]
    pub fn default_memo(&self) -> &str {
        self.default_memo.as_deref().unwrap_or(DEFAULT_MEMO)
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Tracing output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Filter and format for the telemetry subscriber.
    #[must_use]
    pub fn logging(&self) -> LogSettings<'_> {
        LogSettings::new(self.log_filter(), self.log_format())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn empty_config_uses_defaults() {
        let config = Config::default();

        assert_eq!(config.tool_path(), Utf8PathBuf::from("zingo-cli"));
        assert_eq!(config.default_chain(), "mainnet");
        assert_eq!(config.default_server(), "http://127.0.0.1:8137");
        assert_eq!(config.wallets_root(), Utf8Path::new("wallets"));
        assert_eq!(config.command_timeout(), Duration::from_secs(10));
        assert_eq!(config.stale_grace(), Duration::from_millis(500));
        assert_eq!(config.one_shot_timeout(), Duration::from_secs(120));
        assert_eq!(config.default_memo(), DEFAULT_MEMO);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[rstest]
    fn data_dir_falls_back_to_wallets_root() {
        let config = Config {
            wallets_root: Some(Utf8PathBuf::from("/srv/wallets")),
            ..Config::default()
        };

        assert_eq!(config.data_dir(), Utf8Path::new("/srv/wallets"));
    }

    #[rstest]
    #[case(Some(250), Duration::from_millis(250))]
    #[case(None, Duration::from_millis(10_000))]
    fn command_timeout_honours_override(#[case] millis: Option<u64>, #[case] expected: Duration) {
        let config = Config {
            command_timeout_ms: millis,
            ..Config::default()
        };

        assert_eq!(config.command_timeout(), expected);
    }
}
