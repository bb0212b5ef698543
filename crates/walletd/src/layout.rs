//! Where wallet data lives on disk.

use camino::{Utf8Path, Utf8PathBuf};
use wallet_session::{Chain, WalletIdentity};

use crate::error::WalletError;

/// An application account whose wallet the service manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    /// Owning user.
    pub owner_id: String,
    /// Account name, unique per owner.
    pub account_name: String,
    /// Network the account's wallet lives on.
    pub chain: Chain,
    /// Light wallet server the account syncs from.
    pub server: String,
}

/// Maps accounts to wallet data directories below a root.
///
/// An account's wallet lives at `<root>/<owner>/<account>/<chain>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletLayout {
    root: Utf8PathBuf,
}

impl WalletLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding every wallet.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The data directory for `account`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidArgument`] when the owner or account
    /// name would escape its directory.
    pub fn data_dir(&self, account: &AccountRef) -> Result<Utf8PathBuf, WalletError> {
        let owner = path_component("owner id", &account.owner_id)?;
        let name = path_component("account name", &account.account_name)?;
        Ok(self
            .root
            .join(owner)
            .join(name)
            .join(account.chain.as_str()))
    }

    /// The wallet identity for `account`.
    ///
    /// # Errors
    ///
    /// As for [`WalletLayout::data_dir`].
    pub fn identity(&self, account: &AccountRef) -> Result<WalletIdentity, WalletError> {
        let data_dir = self.data_dir(account)?;
        Ok(WalletIdentity::new(
            account.chain,
            account.server.clone(),
            data_dir.into_std_path_buf(),
        ))
    }
}

fn path_component<'a>(what: &str, value: &'a str) -> Result<&'a str, WalletError> {
    let trimmed = value.trim();
    let escapes = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\']);
    if escapes {
        return Err(WalletError::invalid(format!(
            "{what} '{value}' is not a usable directory name"
        )));
    }
    Ok(trimmed)
}
