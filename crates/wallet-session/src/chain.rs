//! Networks the wallet tool can operate on.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Zcash networks understood by the wallet tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// A local regression-test network.
    Regtest,
}

impl Chain {
    /// Returns the identifier passed to the tool's `--chain` flag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Regtest => "regtest",
        }
    }

    /// Balance report key holding the funds a wallet may spend on this chain.
    #[must_use]
    pub const fn spendable_balance_key(self) -> &'static str {
        match self {
            Self::Mainnet => "confirmed_sapling_balance",
            Self::Testnet | Self::Regtest => "confirmed_orchard_balance",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors raised when parsing chain identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported chain '{0}'")]
pub struct ChainParseError(String);

impl ChainParseError {
    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Chain {
    type Err = ChainParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "regtest" => Ok(Self::Regtest),
            other => Err(ChainParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("mainnet", Chain::Mainnet)]
    #[case(" TESTNET ", Chain::Testnet)]
    #[case("main", Chain::Mainnet)]
    #[case("regtest", Chain::Regtest)]
    fn parses_identifiers(#[case] input: &str, #[case] expected: Chain) {
        assert_eq!(input.parse::<Chain>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_chain() {
        let error = "signet".parse::<Chain>().expect_err("signet is unsupported");
        assert_eq!(error.input(), "signet");
    }

    #[rstest]
    #[case(Chain::Mainnet, "confirmed_sapling_balance")]
    #[case(Chain::Testnet, "confirmed_orchard_balance")]
    #[case(Chain::Regtest, "confirmed_orchard_balance")]
    fn selects_spendable_balance_key(#[case] chain: Chain, #[case] key: &str) {
        assert_eq!(chain.spendable_balance_key(), key);
    }
}
