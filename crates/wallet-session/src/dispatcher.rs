//! Command/response correlation over a pooled process.
//!
//! The tool answers commands in the order they are written but gives no
//! marker of where one answer ends, so a command's response is taken to be
//! the first balanced `{...}` region printed after the command was sent
//! that parses under the command's grammar. Commands on one handle are
//! serialised; interleaving two would make responses ambiguous.
//!
//! A command that times out leaves its response in flight. The handle
//! remembers where that command was sent, and the next command first waits
//! briefly for the late response so it can be skipped instead of being
//! mistaken for the new command's answer.

use std::borrow::Cow;
use std::time::Instant;

use tracing::{debug, warn};
use wallet_output::{Grammar, ParseOutcome, extract_object, strip_ansi};

use crate::error::SessionError;
use crate::identity::WalletIdentity;
use crate::pool::ProcessPool;
use crate::supervisor::{CommandGate, ProcessHandle, WaitOutcome};

const DISPATCH_TARGET: &str = "wallet_session::dispatcher";

/// Sends commands to pooled processes and waits for their responses.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    pool: ProcessPool,
}

impl CommandDispatcher {
    /// Creates a dispatcher over `pool`.
    #[must_use]
    pub const fn new(pool: ProcessPool) -> Self {
        Self { pool }
    }

    /// The pool commands are dispatched to.
    #[must_use]
    pub const fn pool(&self) -> &ProcessPool {
        &self.pool
    }

    /// Sends `command` to the process for `identity`, spawning it if needed.
    ///
    /// # Errors
    ///
    /// Returns spawn errors from [`ProcessPool::acquire`],
    /// [`SessionError::CommandTimeout`] when no parseable response arrives in
    /// time and [`SessionError::ProcessExited`] when the process dies first.
    pub fn send(
        &self,
        identity: &WalletIdentity,
        command: &str,
        grammar: Grammar,
    ) -> Result<ParseOutcome, SessionError> {
        let handle = self.pool.acquire(identity)?;
        self.send_on(&handle, command, grammar)
    }

    /// Sends `command` to `handle`, queueing behind any command in flight.
    ///
    /// # Errors
    ///
    /// As for [`CommandDispatcher::send`], without the spawn errors.
    pub fn send_on(
        &self,
        handle: &ProcessHandle,
        command: &str,
        grammar: Grammar,
    ) -> Result<ParseOutcome, SessionError> {
        let mut gate = handle.command_gate();
        self.skip_late_response(handle, &mut gate);

        let settings = self.pool.settings();
        let offset = handle.buffer_len();
        debug!(
            target: DISPATCH_TARGET,
            identity = %handle.identity(),
            command,
            offset,
            %grammar,
            "sending command"
        );
        handle.write_line(command)?;

        let deadline = Instant::now() + settings.command_timeout();
        match handle.wait_for(offset, deadline, settings.poll_interval(), |delta| {
            match_response(delta, grammar)
        }) {
            WaitOutcome::Matched(outcome) => {
                debug!(
                    target: DISPATCH_TARGET,
                    identity = %handle.identity(),
                    command,
                    complete = outcome.is_complete(),
                    "command resolved"
                );
                Ok(outcome)
            }
            WaitOutcome::Exited => Err(handle.exited_error()),
            WaitOutcome::TimedOut => {
                gate.stale_from = Some(offset);
                let timeout_ms =
                    u64::try_from(settings.command_timeout().as_millis()).unwrap_or(u64::MAX);
                warn!(
                    target: DISPATCH_TARGET,
                    identity = %handle.identity(),
                    command,
                    timeout_ms,
                    "command timed out"
                );
                Err(SessionError::CommandTimeout {
                    command: command.to_owned(),
                    timeout_ms,
                })
            }
        }
    }

    /// Waits up to the stale grace period for the response of a timed-out
    /// command so it is not attributed to the next one.
    fn skip_late_response(&self, handle: &ProcessHandle, gate: &mut CommandGate) {
        let Some(stale_from) = gate.stale_from.take() else {
            return;
        };

        let settings = self.pool.settings();
        let deadline = Instant::now() + settings.stale_grace();
        let outcome = handle.wait_for(stale_from, deadline, settings.poll_interval(), |delta| {
            let text = String::from_utf8_lossy(delta);
            extract_object(&text).map(str::len)
        });
        match outcome {
            WaitOutcome::Matched(bytes) => warn!(
                target: DISPATCH_TARGET,
                identity = %handle.identity(),
                bytes,
                "discarded late response from a timed-out command"
            ),
            WaitOutcome::TimedOut => debug!(
                target: DISPATCH_TARGET,
                identity = %handle.identity(),
                "no late response arrived within the grace period"
            ),
            WaitOutcome::Exited => {}
        }
    }
}

/// Returns the parse of the first balanced region in `delta` when it
/// yields a usable response.
fn match_response(delta: &[u8], grammar: Grammar) -> Option<ParseOutcome> {
    let decoded: Cow<'_, str> = String::from_utf8_lossy(delta);
    let text = strip_ansi(&decoded);
    let region = extract_object(&text)?;
    let outcome = grammar.parse(region);
    outcome.response().is_some().then_some(outcome)
}
