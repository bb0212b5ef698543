//! The key identifying one wallet session.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::chain::Chain;

/// The chain, server endpoint and data directory of one wallet.
///
/// Two identities are the same session only when all three parts match
/// exactly; the pool keys its handles on this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletIdentity {
    chain: Chain,
    server: String,
    data_dir: PathBuf,
}

impl WalletIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(chain: Chain, server: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            chain,
            server: server.into(),
            data_dir: data_dir.into(),
        }
    }

    /// The network the wallet lives on.
    #[must_use]
    pub const fn chain(&self) -> Chain {
        self.chain
    }

    /// The light wallet server endpoint.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// The directory holding the wallet's on-disk state.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Arguments selecting this wallet, passed ahead of any sub-command.
    #[must_use]
    pub fn tool_args(&self) -> Vec<OsString> {
        vec![
            OsString::from("--chain"),
            OsString::from(self.chain.as_str()),
            OsString::from("--server"),
            OsString::from(&self.server),
            OsString::from("--data-dir"),
            self.data_dir.clone().into_os_string(),
        ]
    }
}

impl fmt::Display for WalletIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}::{}::{}",
            self.chain,
            self.server,
            self.data_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn renders_selection_arguments() {
        let identity = WalletIdentity::new(Chain::Testnet, "http://localhost:9067", "/data/w1");

        assert_eq!(
            identity.tool_args(),
            [
                "--chain",
                "testnet",
                "--server",
                "http://localhost:9067",
                "--data-dir",
                "/data/w1"
            ]
            .map(OsString::from)
        );
    }

    #[rstest]
    fn equality_requires_every_part() {
        let base = WalletIdentity::new(Chain::Mainnet, "http://a", "/w");
        let mut seen = HashSet::new();
        seen.insert(base.clone());

        assert!(seen.contains(&WalletIdentity::new(Chain::Mainnet, "http://a", "/w")));
        assert!(!seen.contains(&WalletIdentity::new(Chain::Testnet, "http://a", "/w")));
        assert!(!seen.contains(&WalletIdentity::new(Chain::Mainnet, "http://b", "/w")));
        assert!(!seen.contains(&WalletIdentity::new(Chain::Mainnet, "http://a", "/x")));
    }

    #[rstest]
    fn displays_as_composite_key() {
        let identity = WalletIdentity::new(Chain::Mainnet, "http://127.0.0.1:8137", "/w");
        assert_eq!(identity.to_string(), "mainnet::http://127.0.0.1:8137::/w");
    }
}
