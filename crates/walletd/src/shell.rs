//! Line-oriented front end used by the `walletd` binary.
//!
//! Each input line is sent to the pooled session of the configured wallet
//! and answered with one JSON document on stdout. Failures are reported as
//! `{"error": ..., "retryable": ...}` documents so the loop keeps going.

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use serde_json::json;
use tracing::{debug, info};
use wallet_config::Config;
use wallet_session::{Chain, OneShotRunner, WalletIdentity};

use crate::error::WalletError;
use crate::service::WalletService;
use crate::telemetry;

const SHELL_TARGET: &str = "walletd::shell";

/// Line that ends the loop and stops the session.
const QUIT: &str = "quit";

/// Loads configuration from `args` and the environment, then serves lines
/// from `stdin` until end of input or `quit`.
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    let config = match Config::load_from_iter(args) {
        Ok(config) => config,
        Err(error) => {
            drop(writeln!(stderr, "walletd: failed to load configuration: {error}"));
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = telemetry::initialise(&config) {
        drop(writeln!(stderr, "walletd: {error}"));
        return ExitCode::FAILURE;
    }

    let chain = match config.default_chain().parse::<Chain>() {
        Ok(chain) => chain,
        Err(error) => {
            drop(writeln!(stderr, "walletd: {error}"));
            return ExitCode::FAILURE;
        }
    };
    let identity = WalletIdentity::new(
        chain,
        config.default_server(),
        config.data_dir().as_std_path(),
    );
    let service = WalletService::from_config(&config);
    if let Err(error) = service.prepare_wallet(&identity) {
        drop(writeln!(stderr, "walletd: {error}"));
        return ExitCode::FAILURE;
    }

    info!(target: SHELL_TARGET, identity = %identity, "serving wallet commands");
    match serve(&service, &identity, stdin, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            drop(writeln!(stderr, "walletd: {error}"));
            ExitCode::FAILURE
        }
    }
}

/// Answers each line of `input` through the pooled session for `identity`.
///
/// Blank lines are skipped. The session is evicted when the loop ends.
///
/// # Errors
///
/// Returns an error when reading input or writing output fails.
pub fn serve<R, In, Out>(
    service: &WalletService<R>,
    identity: &WalletIdentity,
    input: In,
    output: &mut Out,
) -> io::Result<()>
where
    R: OneShotRunner,
    In: BufRead,
    Out: Write,
{
    for entry in input.lines() {
        let line = entry?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command == QUIT {
            break;
        }

        let document = match service.execute(identity, command) {
            Ok(response) => response.into_value(),
            Err(error) => error_document(&error),
        };
        writeln!(output, "{document}")?;
        output.flush()?;
    }

    let evicted = service.sessions().evict(identity);
    debug!(target: SHELL_TARGET, identity = %identity, evicted, "session closed");
    Ok(())
}

fn error_document(error: &WalletError) -> serde_json::Value {
    let retryable = matches!(error, WalletError::Session(session) if session.is_retryable());
    json!({ "error": error.to_string(), "retryable": retryable })
}
