//! Tracing setup
//!
//! Logging starts before the configuration is read, so the filter sits
//! behind a reload handle and the configured level is applied afterwards.
//! `RUST_LOG` wins over `--verbose`, which wins over the config file.

use holdkeys_config::LogLevel;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    overridden: bool,
}

/// Install the global subscriber. Logs go to stderr so that monitor output
/// on stdout stays clean.
pub fn init(verbose: bool) -> Logging {
    let (filter, overridden) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) if verbose => (EnvFilter::new("debug"), true),
        Err(_) => (EnvFilter::new("info"), false),
    };

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Logging { handle, overridden }
}

impl Logging {
    /// Switch to the level from the config file, unless the environment or
    /// the command line already chose one.
    pub fn apply_config_level(&self, level: LogLevel) {
        if self.overridden {
            return;
        }
        if let Err(e) = self.handle.reload(EnvFilter::new(level.as_directive())) {
            tracing::warn!("Could not change log level: {}", e);
        }
    }
}
