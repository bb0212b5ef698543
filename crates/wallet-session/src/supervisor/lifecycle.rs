//! Reader threads and process termination.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStderr, ChildStdout};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::SUPERVISOR_TARGET;
use super::state::Shared;

/// How long a process whose output has closed is given to exit on its own.
const EXIT_GRACE: Duration = Duration::from_millis(200);

const READ_CHUNK: usize = 4096;

/// Copies stdout into the shared buffer until end of file, then reaps the
/// process and marks the handle exited.
pub(super) fn pump_stdout(
    label: &str,
    mut stdout: ChildStdout,
    shared: &Shared,
    child: &Mutex<Option<Child>>,
) {
    let mut chunk = [0_u8; READ_CHUNK];
    loop {
        match stdout.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                if let Some(bytes) = chunk.get(..read) {
                    shared.append(bytes);
                }
            }
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {}
            Err(error) => {
                debug!(
                    target: SUPERVISOR_TARGET,
                    identity = label,
                    error = %error,
                    "stdout read failed"
                );
                break;
            }
        }
    }

    let code = reap(label, child);
    debug!(
        target: SUPERVISOR_TARGET,
        identity = label,
        ?code,
        "wallet tool output closed"
    );
    shared.mark_exited(code);
}

/// Forwards each stderr line to diagnostics. Never parsed.
pub(super) fn pump_stderr(label: &str, stderr: ChildStderr) {
    for line in BufReader::new(stderr).lines() {
        match line {
            Ok(text) if text.trim().is_empty() => {}
            Ok(text) => warn!(
                target: SUPERVISOR_TARGET,
                identity = label,
                stderr = %text.trim_end(),
                "wallet tool stderr"
            ),
            Err(_) => break,
        }
    }
}

/// Collects the exit status of a process whose stdout has closed.
fn reap(label: &str, child: &Mutex<Option<Child>>) -> Option<i32> {
    let mut slot = child.lock().unwrap_or_else(PoisonError::into_inner);
    let mut process = slot.take()?;
    terminate_child(label, &mut process)
}

/// Waits briefly for the child to exit, killing it if it does not.
fn terminate_child(label: &str, child: &mut Child) -> Option<i32> {
    match child.try_wait() {
        Ok(Some(status)) => return status.code(),
        Ok(None) => {}
        Err(error) => {
            warn!(
                target: SUPERVISOR_TARGET,
                identity = label,
                error = %error,
                "failed to check process status, waiting before killing"
            );
        }
    }

    thread::sleep(EXIT_GRACE);
    if let Ok(Some(status)) = child.try_wait() {
        return status.code();
    }

    warn!(
        target: SUPERVISOR_TARGET,
        identity = label,
        "wallet tool did not exit, killing"
    );
    kill_and_wait(label, child)
}

/// Kills the child and collects its status.
pub(super) fn kill_and_wait(label: &str, child: &mut Child) -> Option<i32> {
    if let Err(error) = child.kill() {
        debug!(
            target: SUPERVISOR_TARGET,
            identity = label,
            error = %error,
            "kill failed; process has probably exited"
        );
    }
    child.wait().ok().and_then(|status| status.code())
}

/// Starts a named background thread.
pub(super) fn spawn_named<F>(name: String, body: F) -> std::io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name).spawn(body)
}

/// Shares a child slot between the handle and its stdout thread.
pub(super) type ChildSlot = Arc<Mutex<Option<Child>>>;
