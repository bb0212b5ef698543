//! Single-command invocations of the wallet tool.
//!
//! [`ProcessOneShot`] spawns the tool with the wallet selection arguments
//! followed by one sub-command, collects everything it prints until it
//! exits and parses the whole of stdout with the requested grammar. There
//! is no pooling and no correlation: all output belongs to the command.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wallet_output::{Grammar, ParseOutcome, strip_ansi};

use crate::error::SessionError;
use crate::identity::WalletIdentity;
use crate::settings::SessionSettings;

const ONESHOT_TARGET: &str = "wallet_session::oneshot";

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A tool sub-command and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    name: String,
    args: Vec<String>,
}

impl ToolCommand {
    /// Creates a command without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// The sub-command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional arguments, passed verbatim.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Runs a single tool command to completion.
///
/// [`ProcessOneShot`] is the process-backed implementation; tests can
/// substitute their own.
pub trait OneShotRunner {
    /// Runs `command` for `identity` and parses its output with `grammar`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the tool is missing, cannot be started,
    /// exits non-zero or does not finish in time.
    fn run(
        &self,
        identity: &WalletIdentity,
        command: &ToolCommand,
        grammar: Grammar,
    ) -> Result<ParseOutcome, SessionError>;
}

/// Runs commands by spawning the wallet tool once per call.
#[derive(Debug, Clone)]
pub struct ProcessOneShot {
    settings: SessionSettings,
}

impl ProcessOneShot {
    /// Creates a runner using the tool path and one-shot timeout in `settings`.
    #[must_use]
    pub const fn new(settings: SessionSettings) -> Self {
        Self { settings }
    }
}

impl OneShotRunner for ProcessOneShot {
    fn run(
        &self,
        identity: &WalletIdentity,
        command: &ToolCommand,
        grammar: Grammar,
    ) -> Result<ParseOutcome, SessionError> {
        let tool_path = self.settings.tool_path();
        if !tool_path.exists() {
            return Err(SessionError::ToolNotFound {
                path: tool_path.to_path_buf(),
            });
        }

        debug!(
            target: ONESHOT_TARGET,
            identity = %identity,
            command = command.name(),
            args = command.args().len(),
            "running one-shot command"
        );

        let mut child = Command::new(tool_path)
            .args(identity.tool_args())
            .arg(command.name())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| SessionError::SpawnFailed {
                message: format!("failed to start {}", tool_path.display()),
                source: Arc::new(error),
            })?;

        let stdout = collect(child.stdout.take());
        let stderr = collect(child.stderr.take());
        let timeout = self.settings.one_shot_timeout();
        wait_for_exit(command.name(), &mut child, timeout).and_then(|status| {
            let output = join_output(stdout, "reading tool stdout")?;
            let errors = join_output(stderr, "reading tool stderr")?;
            finish(command.name(), status, &output, &errors, grammar)
        })
    }
}

/// Reads a pipe to the end on a background thread so neither pipe can fill
/// up and stall the child.
fn collect<R>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).map(|_| bytes)
        })
    })
}

fn join_output(
    reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    operation: &'static str,
) -> Result<Vec<u8>, SessionError> {
    let Some(handle) = reader else {
        return Ok(Vec::new());
    };
    handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("reader thread panicked")))
        .map_err(|error| SessionError::io(operation, error))
}

/// Waits for the child to exit, killing it once `timeout` has elapsed.
fn wait_for_exit(
    name: &str,
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<i32>, SessionError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(target: ONESHOT_TARGET, command = name, ?status, "tool exited");
                return Ok(status.code());
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    warn!(
                        target: ONESHOT_TARGET,
                        command = name,
                        timeout_secs = timeout.as_secs(),
                        "tool timed out, killing process"
                    );
                    drop(child.kill());
                    drop(child.wait());
                    return Err(SessionError::OneShotTimeout {
                        command: name.to_owned(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                thread::sleep(EXIT_POLL_INTERVAL);
            }
            Err(error) => return Err(SessionError::io("waiting for the tool", error)),
        }
    }
}

fn finish(
    name: &str,
    status: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
    grammar: Grammar,
) -> Result<ParseOutcome, SessionError> {
    let errors = String::from_utf8_lossy(stderr);
    if status != Some(0) {
        return Err(SessionError::ToolExecutionFailed {
            status: status.unwrap_or(-1),
            stderr: errors.trim().to_owned(),
        });
    }
    if !errors.trim().is_empty() {
        debug!(target: ONESHOT_TARGET, command = name, stderr = %errors.trim(), "tool stderr");
    }

    let text = strip_ansi(&String::from_utf8_lossy(stdout));
    let outcome = grammar.parse(&text);
    debug!(
        target: ONESHOT_TARGET,
        command = name,
        %grammar,
        complete = outcome.is_complete(),
        "parsed one-shot output"
    );
    Ok(outcome)
}
