//! Lifecycle state and shared output buffer of a supervised process.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Lifecycle of a supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// The process has been launched but its output is not yet being read.
    Starting,
    /// Output is being collected and commands may be written.
    Ready,
    /// The process has terminated; the handle is never reused.
    Exited {
        /// Exit status, when the process exited normally.
        code: Option<i32>,
    },
}

impl ProcessState {
    /// Whether the process has terminated.
    #[must_use]
    pub const fn is_exited(self) -> bool {
        matches!(self, Self::Exited { .. })
    }
}

pub(super) type ExitListener = Box<dyn FnOnce() + Send>;

/// Everything printed since spawn plus the lifecycle state.
pub(super) struct OutputBuffer {
    pub(super) bytes: Vec<u8>,
    pub(super) state: ProcessState,
    pub(super) exit_listeners: Vec<ExitListener>,
}

/// Buffer shared between the handle and its reader threads.
pub(super) struct Shared {
    buffer: Mutex<OutputBuffer>,
    pub(super) changed: Condvar,
}

impl Shared {
    pub(super) fn new() -> Self {
        Self {
            buffer: Mutex::new(OutputBuffer {
                bytes: Vec::new(),
                state: ProcessState::Starting,
                exit_listeners: Vec::new(),
            }),
            changed: Condvar::new(),
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, OutputBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a chunk and wakes every waiter.
    pub(super) fn append(&self, chunk: &[u8]) {
        self.lock().bytes.extend_from_slice(chunk);
        self.changed.notify_all();
    }

    /// Moves a starting process to `Ready`. A process that already exited
    /// stays `Exited`, so its exit listeners are not lost.
    pub(super) fn mark_ready(&self) -> ProcessState {
        let mut buffer = self.lock();
        if buffer.state == ProcessState::Starting {
            buffer.state = ProcessState::Ready;
        }
        buffer.state
    }

    /// Marks the process exited, wakes every waiter and runs the exit
    /// listeners outside the lock.
    pub(super) fn mark_exited(&self, code: Option<i32>) {
        let listeners = {
            let mut buffer = self.lock();
            buffer.state = ProcessState::Exited { code };
            std::mem::take(&mut buffer.exit_listeners)
        };
        self.changed.notify_all();
        for listener in listeners {
            listener();
        }
    }
}
