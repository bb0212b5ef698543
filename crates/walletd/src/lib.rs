//! Wallet operations built on pooled and one-shot wallet tool sessions.
//!
//! [`WalletService`] is the entry point for application code. It maps each
//! wallet operation onto the invocation path and output grammar that suits
//! the tool command behind it, and owns the wallet data directory
//! lifecycle so a directory is never removed while a process still uses it.
//! [`WalletLayout`] resolves account references to wallet identities.
//!
//! The `walletd` binary wraps the service in a line-oriented loop; see
//! [`run`].

mod error;
mod layout;
mod payment;
mod service;
mod shell;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use error::WalletError;
pub use layout::{AccountRef, WalletLayout};
pub use payment::{Payment, PaymentRequest};
pub use service::{WalletService, session_settings};
pub use shell::{run, serve};
