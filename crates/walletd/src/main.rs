//! Entry point for the `walletd` binary.
//!
//! Delegates to [`walletd::run`] with the process's own streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    walletd::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
