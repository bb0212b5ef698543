//! Process sessions for the wallet command-line tool.
//!
//! The wallet tool keeps its state on disk and is driven over standard
//! input and output. This crate owns that conversation:
//!
//! - [`ProcessHandle`] supervises one long-lived tool process, accumulating
//!   everything it prints in an append-only buffer.
//! - [`ProcessPool`] keeps at most one live handle per [`WalletIdentity`],
//!   spawning lazily and dropping handles whose process has exited.
//! - [`CommandDispatcher`] writes one command at a time to a pooled handle
//!   and waits for a balanced response region that parses under the
//!   command's [`Grammar`](wallet_output::Grammar).
//! - [`ProcessOneShot`] runs the tool once for a single command and parses
//!   everything it printed; it implements [`OneShotRunner`] so callers can
//!   substitute a test double.
//!
//! Process and timeout failures surface as [`SessionError`]; malformed
//! output never does, since parsing is best effort and reported through
//! [`ParseOutcome`](wallet_output::ParseOutcome).

mod chain;
mod dispatcher;
mod error;
mod identity;
mod oneshot;
mod pool;
mod settings;
mod supervisor;

#[cfg(test)]
mod tests;

pub use chain::{Chain, ChainParseError};
pub use dispatcher::CommandDispatcher;
pub use error::SessionError;
pub use identity::WalletIdentity;
pub use oneshot::{OneShotRunner, ProcessOneShot, ToolCommand};
pub use pool::ProcessPool;
pub use settings::SessionSettings;
pub use supervisor::{ProcessHandle, ProcessState};
