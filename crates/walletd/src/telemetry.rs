//! Process-wide `tracing` subscriber for the wallet service.
//!
//! Events go to stderr; stdout carries the JSON answers written by
//! [`crate::serve`].

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{EnvFilter, fmt};
use wallet_config::{Config, LogSettings};

static INSTALLED: OnceCell<()> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Proof that the wallet service's subscriber is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Failure to install the wallet service's subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `EnvFilter` directive list.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// The rejected directive list.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// A global subscriber was installed by someone else first.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the subscriber described by `config` once per process.
///
/// Repeated calls succeed without reinstalling.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for a malformed `log_filter` and
/// [`TelemetryError::Subscriber`] when another global subscriber exists.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config.logging())?;
            tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
        })
        .map(|()| TelemetryHandle)
}

fn build_subscriber(settings: LogSettings<'_>) -> Result<BoxedSubscriber, TelemetryError> {
    let filter =
        EnvFilter::try_new(settings.filter()).map_err(|error| TelemetryError::Filter {
            filter: settings.filter().to_owned(),
            message: error.to_string(),
        })?;

    let base = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(!settings.format().is_structured() && io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let subscriber: BoxedSubscriber = if settings.format().is_structured() {
        Box::new(base.json().flatten_event(true).finish())
    } else {
        Box::new(base.compact().finish())
    };
    Ok(subscriber)
}
