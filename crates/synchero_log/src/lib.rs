//! `synchero_log` v1:
//! `tracing` subscriber setup shared by the `synchero` binaries.
//!
//! Diagnostics go to stderr so stdout stays reserved for per-file narration
//! and summaries.

use std::fmt;

use tracing_subscriber::{EnvFilter, fmt as fmt_subscriber};

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLogLevel {
    /// Errors only.
    Quiet,
    /// Warnings and errors.
    #[default]
    Normal,
    /// Adds per-pair progress.
    Verbose,
    /// Adds per-directory traversal.
    Debug,
}

impl EnumLogLevel {
    /// Map `-v` count and `-q` to a level; `-q` wins.
    pub fn from_flags(n_verbose: u8, if_quiet: bool) -> Self {
        if if_quiet {
            return Self::Quiet;
        }
        match n_verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// `EnvFilter` directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Subscriber installation failed (usually: one is already installed).
#[derive(Debug)]
pub struct LogInitError(String);

impl fmt::Display for LogInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to initialize logging: {}", self.0)
    }
}

impl std::error::Error for LogInitError {}

/// `RUST_LOG` when set and valid, otherwise the level's directive.
pub fn derive_env_filter(level: EnumLogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

/// Install the global stderr subscriber.
pub fn init_logging(level: EnumLogLevel) -> Result<(), LogInitError> {
    fmt_subscriber()
        .with_env_filter(derive_env_filter(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| LogInitError(e.to_string()))
}
