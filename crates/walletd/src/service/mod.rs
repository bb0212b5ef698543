//! Wallet operations mapped onto tool commands.
//!
//! Commands that benefit from a warm, already-synced wallet go through the
//! pooled [`CommandDispatcher`]; reports the tool prints once and exits
//! after go through a [`OneShotRunner`].

use std::fs;
use std::io;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use wallet_config::Config;
use wallet_output::{Grammar, ParseOutcome, Response};
use wallet_session::{
    CommandDispatcher, OneShotRunner, ProcessOneShot, ProcessPool, SessionSettings, ToolCommand,
    WalletIdentity,
};

use crate::error::WalletError;
use crate::payment::{Payment, PaymentRequest};

const SERVICE_TARGET: &str = "walletd::service";

/// Converts loaded configuration into session settings.
#[must_use]
pub fn session_settings(config: &Config) -> SessionSettings {
    SessionSettings::new(config.tool_path().into_std_path_buf())
        .with_command_timeout(config.command_timeout())
        .with_stale_grace(config.stale_grace())
        .with_poll_interval(config.poll_interval())
        .with_one_shot_timeout(config.one_shot_timeout())
}

/// Wallet operations for any number of wallets.
pub struct WalletService<R> {
    dispatcher: CommandDispatcher,
    runner: R,
    default_memo: String,
}

impl WalletService<ProcessOneShot> {
    /// Builds a service that runs the configured wallet tool.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let settings = session_settings(config);
        Self::new(
            CommandDispatcher::new(ProcessPool::new(settings.clone())),
            ProcessOneShot::new(settings),
            config.default_memo(),
        )
    }
}

impl<R: OneShotRunner> WalletService<R> {
    /// Creates a service from its parts.
    #[must_use]
    pub fn new(dispatcher: CommandDispatcher, runner: R, default_memo: impl Into<String>) -> Self {
        Self {
            dispatcher,
            runner,
            default_memo: default_memo.into(),
        }
    }

    /// The pool holding live sessions.
    #[must_use]
    pub const fn sessions(&self) -> &ProcessPool {
        self.dispatcher.pool()
    }

    /// Reports sync progress from the wallet's pooled session.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Session`] when the session fails and
    /// [`WalletError::Output`] when the answer cannot be parsed.
    pub fn sync_status(&self, identity: &WalletIdentity) -> Result<Response, WalletError> {
        self.execute(identity, "sync status")
    }

    /// Sends an arbitrary command line to the wallet's pooled session.
    ///
    /// # Errors
    ///
    /// As for [`WalletService::sync_status`].
    pub fn execute(&self, identity: &WalletIdentity, line: &str) -> Result<Response, WalletError> {
        let outcome = self.dispatcher.send(identity, line, Grammar::Object)?;
        accept(line, outcome)
    }

    /// Returns the full balance report.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Session`] when the tool fails and
    /// [`WalletError::Output`] when its report cannot be parsed.
    pub fn balance(&self, identity: &WalletIdentity) -> Result<Response, WalletError> {
        self.one_shot(identity, &ToolCommand::new("balance"), Grammar::KeyValue)
    }

    /// Returns the spendable balance for the wallet's chain, in zatoshis.
    ///
    /// # Errors
    ///
    /// As for [`WalletService::balance`], plus [`WalletError::MissingField`]
    /// when the report has no numeric value under the chain's balance key.
    pub fn spendable_balance(&self, identity: &WalletIdentity) -> Result<u64, WalletError> {
        let key = identity.chain().spendable_balance_key();
        let report = self.balance(identity)?;
        report
            .as_one()
            .and_then(|record| record.get(key))
            .and_then(Value::as_u64)
            .ok_or_else(|| WalletError::MissingField {
                key: key.to_owned(),
            })
    }

    /// Lists the wallet's transactions.
    ///
    /// # Errors
    ///
    /// As for [`WalletService::balance`].
    pub fn transactions(&self, identity: &WalletIdentity) -> Result<Response, WalletError> {
        self.one_shot(identity, &ToolCommand::new("transactions"), Grammar::Ledger)
    }

    /// Lists the wallet's addresses.
    ///
    /// # Errors
    ///
    /// As for [`WalletService::balance`].
    pub fn addresses(&self, identity: &WalletIdentity) -> Result<Response, WalletError> {
        self.one_shot(identity, &ToolCommand::new("addresses"), Grammar::Objects)
    }

    /// Describes `address` as the tool understands it.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidArgument`] for an empty address, and
    /// otherwise as for [`WalletService::balance`].
    pub fn parse_address(
        &self,
        identity: &WalletIdentity,
        address: &str,
    ) -> Result<Response, WalletError> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(WalletError::invalid("address is empty"));
        }
        let command = ToolCommand::new("parse_address").arg(trimmed);
        self.one_shot(identity, &command, Grammar::Objects)
    }

    /// Sends `payments` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidArgument`] when there are no payments
    /// or one is unusable, and otherwise as for [`WalletService::balance`].
    pub fn quicksend(
        &self,
        identity: &WalletIdentity,
        payments: &[PaymentRequest],
    ) -> Result<Response, WalletError> {
        if payments.is_empty() {
            return Err(WalletError::invalid("no payments to send"));
        }
        let normalised = payments
            .iter()
            .map(|request| Payment::from_request(request, &self.default_memo))
            .collect::<Result<Vec<_>, _>>()?;
        let encoded = serde_json::to_string(&normalised).map_err(WalletError::EncodePayments)?;

        debug!(
            target: SERVICE_TARGET,
            identity = %identity,
            payments = normalised.len(),
            "sending payments"
        );
        let command = ToolCommand::new("quicksend").arg(encoded);
        self.one_shot(identity, &command, Grammar::Objects)
    }

    /// Creates the wallet's data directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Filesystem`] when the directory cannot be created.
    pub fn prepare_wallet(&self, identity: &WalletIdentity) -> Result<(), WalletError> {
        let path = identity.data_dir();
        fs::create_dir_all(path).map_err(|error| WalletError::Filesystem {
            operation: "create",
            path: path.to_path_buf(),
            source: Arc::new(error),
        })
    }

    /// Stops the wallet's pooled session, then deletes its data directory.
    ///
    /// Returns whether a directory was removed; a missing directory is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Filesystem`] when the directory cannot be removed.
    pub fn remove_wallet(&self, identity: &WalletIdentity) -> Result<bool, WalletError> {
        let evicted = self.sessions().evict(identity);
        let path = identity.data_dir();
        debug!(
            target: SERVICE_TARGET,
            identity = %identity,
            evicted,
            "removing wallet directory"
        );
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(WalletError::Filesystem {
                operation: "remove",
                path: path.to_path_buf(),
                source: Arc::new(error),
            }),
        }
    }

    fn one_shot(
        &self,
        identity: &WalletIdentity,
        command: &ToolCommand,
        grammar: Grammar,
    ) -> Result<Response, WalletError> {
        let outcome = self.runner.run(identity, command, grammar)?;
        accept(command.name(), outcome)
    }
}

/// Accepts complete and partial parses, logging what a partial one skipped.
fn accept(command: &str, outcome: ParseOutcome) -> Result<Response, WalletError> {
    if let Some(residue) = outcome.residue() {
        warn!(
            target: SERVICE_TARGET,
            command,
            residue,
            "tool output was only partly understood"
        );
    }
    outcome.into_result().map_err(WalletError::from)
}
