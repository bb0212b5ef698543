//! Supervision of one long-lived wallet tool process.
//!
//! A [`ProcessHandle`] spawns the tool for a [`WalletIdentity`], appends
//! everything it writes to stdout to an append-only buffer and forwards its
//! stderr to diagnostics. Waiters block on a condition variable that is
//! signalled for every new chunk and on exit, with a fallback timer so a
//! missed wake-up can only delay, never hang, a waiter.

mod lifecycle;
mod state;

use std::io::Write;
use std::process::{ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::SessionError;
use crate::identity::WalletIdentity;
use crate::settings::SessionSettings;

use self::lifecycle::{ChildSlot, kill_and_wait, pump_stderr, pump_stdout, spawn_named};
pub use self::state::ProcessState;
use self::state::Shared;

/// Log target for supervisor operations.
pub(crate) const SUPERVISOR_TARGET: &str = "wallet_session::supervisor";

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Per-handle command bookkeeping, held for the duration of one command.
#[derive(Debug, Default)]
pub(crate) struct CommandGate {
    /// Send offset of a command that timed out before its response arrived.
    pub(crate) stale_from: Option<usize>,
}

/// How a wait on the output buffer ended.
#[derive(Debug)]
pub(crate) enum WaitOutcome<T> {
    /// The check matched the data appended since the offset.
    Matched(T),
    /// The process exited without producing matching data.
    Exited,
    /// The deadline passed first.
    TimedOut,
}

/// One supervised wallet tool process.
///
/// Dropping the handle destroys the process.
pub struct ProcessHandle {
    id: u64,
    identity: WalletIdentity,
    label: String,
    shared: Arc<Shared>,
    stdin: Mutex<Option<ChildStdin>>,
    child: ChildSlot,
    gate: Mutex<CommandGate>,
}

impl ProcessHandle {
    /// Spawns the tool for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ToolNotFound`] when the configured executable
    /// does not exist, checked before anything is launched, and
    /// [`SessionError::SpawnFailed`] when the process or its reader threads
    /// cannot be started.
    pub fn spawn(identity: WalletIdentity, settings: &SessionSettings) -> Result<Self, SessionError> {
        let tool_path = settings.tool_path();
        if !tool_path.exists() {
            return Err(SessionError::ToolNotFound {
                path: tool_path.to_path_buf(),
            });
        }

        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        let label = identity.to_string();
        debug!(
            target: SUPERVISOR_TARGET,
            identity = %label,
            handle = id,
            tool = %tool_path.display(),
            "spawning wallet tool"
        );

        let mut child = Command::new(tool_path)
            .args(identity.tool_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                if error.kind() == std::io::ErrorKind::NotFound {
                    SessionError::ToolNotFound {
                        path: tool_path.to_path_buf(),
                    }
                } else {
                    SessionError::SpawnFailed {
                        message: format!("failed to start {}", tool_path.display()),
                        source: Arc::new(error),
                    }
                }
            })?;

        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let handle = Self {
            id,
            identity,
            label,
            shared: Arc::new(Shared::new()),
            stdin: Mutex::new(stdin),
            child: Arc::new(Mutex::new(Some(child))),
            gate: Mutex::new(CommandGate::default()),
        };

        let (Some(stdout), Some(stderr)) = (stdout_pipe, stderr_pipe) else {
            return Err(missing_pipe("failed to capture tool output"));
        };
        handle.start_readers(stdout, stderr)?;
        let state = handle.shared.mark_ready();

        debug!(
            target: SUPERVISOR_TARGET,
            identity = %handle.label,
            handle = id,
            pid,
            ?state,
            "wallet tool spawned"
        );
        Ok(handle)
    }

    fn start_readers(
        &self,
        stdout: std::process::ChildStdout,
        stderr: std::process::ChildStderr,
    ) -> Result<(), SessionError> {
        let shared = Arc::clone(&self.shared);
        let child = Arc::clone(&self.child);
        let stdout_label = self.label.clone();
        spawn_named(format!("wallet-stdout-{}", self.id), move || {
            pump_stdout(&stdout_label, stdout, &shared, &child);
        })
        .map_err(|error| SessionError::SpawnFailed {
            message: "failed to start stdout reader".to_owned(),
            source: Arc::new(error),
        })?;

        let stderr_label = self.label.clone();
        spawn_named(format!("wallet-stderr-{}", self.id), move || {
            pump_stderr(&stderr_label, stderr);
        })
        .map_err(|error| SessionError::SpawnFailed {
            message: "failed to start stderr reader".to_owned(),
            source: Arc::new(error),
        })?;
        Ok(())
    }

    /// Unique number distinguishing this handle from any other, including
    /// later handles for the same identity.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The wallet this process serves.
    #[must_use]
    pub const fn identity(&self) -> &WalletIdentity {
        &self.identity
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.shared.lock().state
    }

    /// Whether the process has terminated.
    #[must_use]
    pub fn is_exited(&self) -> bool {
        self.state().is_exited()
    }

    /// Number of bytes printed since spawn.
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.shared.lock().bytes.len()
    }

    /// Copies the output printed at or after `offset`.
    #[must_use]
    pub fn output_since(&self, offset: usize) -> Vec<u8> {
        self.shared
            .lock()
            .bytes
            .get(offset..)
            .map(<[u8]>::to_vec)
            .unwrap_or_default()
    }

    /// Registers `listener` to run once when the process exits. Runs it
    /// immediately when the process has already exited.
    pub fn on_exit(&self, listener: impl FnOnce() + Send + 'static) {
        let mut buffer = self.shared.lock();
        if buffer.state.is_exited() {
            drop(buffer);
            listener();
        } else {
            buffer.exit_listeners.push(Box::new(listener));
        }
    }

    /// Writes `line` and a line terminator to the process's input.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ProcessExited`] when the input is closed and
    /// [`SessionError::Io`] for other write failures.
    pub fn write_line(&self, line: &str) -> Result<(), SessionError> {
        let mut stdin = self.stdin.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pipe) = stdin.as_mut() else {
            return Err(self.exited_error());
        };

        let result = pipe
            .write_all(line.as_bytes())
            .and_then(|()| pipe.write_all(b"\n"))
            .and_then(|()| pipe.flush());
        match result {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::BrokenPipe => {
                Err(self.exited_error())
            }
            Err(error) => Err(SessionError::io("writing a command", error)),
        }
    }

    /// Blocks until `check` matches the output appended after `offset`, the
    /// process exits, or `deadline` passes.
    ///
    /// `check` is re-run on every new chunk and at least every `poll`.
    pub(crate) fn wait_for<T>(
        &self,
        offset: usize,
        deadline: Instant,
        poll: Duration,
        mut check: impl FnMut(&[u8]) -> Option<T>,
    ) -> WaitOutcome<T> {
        let mut buffer = self.shared.lock();
        loop {
            let delta = buffer.bytes.get(offset..).unwrap_or_default();
            if let Some(found) = check(delta) {
                return WaitOutcome::Matched(found);
            }
            if buffer.state.is_exited() {
                return WaitOutcome::Exited;
            }

            let now = Instant::now();
            let Some(remaining) = deadline
                .checked_duration_since(now)
                .filter(|left| !left.is_zero())
            else {
                return WaitOutcome::TimedOut;
            };
            buffer = match self.shared.changed.wait_timeout(buffer, remaining.min(poll)) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Locks the handle for one command. Callers queue here, so at most one
    /// command is in flight per process.
    pub(crate) fn command_gate(&self) -> MutexGuard<'_, CommandGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn exited_error(&self) -> SessionError {
        SessionError::ProcessExited {
            identity: self.label.clone(),
        }
    }

    /// Terminates the process if it is still running. Safe to call more
    /// than once and after the process has exited.
    pub fn destroy(&self) {
        drop(self.stdin.lock().unwrap_or_else(PoisonError::into_inner).take());

        let taken = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut child) = taken else {
            return;
        };

        debug!(
            target: SUPERVISOR_TARGET,
            identity = %self.label,
            handle = self.id,
            pid = child.id(),
            "destroying wallet tool process"
        );
        let code = match child.try_wait() {
            Ok(Some(status)) => status.code(),
            Ok(None) | Err(_) => kill_and_wait(&self.label, &mut child),
        };
        debug!(
            target: SUPERVISOR_TARGET,
            identity = %self.label,
            ?code,
            "wallet tool process destroyed"
        );
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id)
            .field("identity", &self.label)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn missing_pipe(message: &str) -> SessionError {
    SessionError::SpawnFailed {
        message: message.to_owned(),
        source: Arc::new(std::io::Error::other("pipe not captured")),
    }
}
