//! Per-stage logging
//!
//! Each stage builds one [`Logger`] from a [`LogConfig`] and runs inside it.
//! The logger owns its own `tracing` dispatcher, so nothing is installed as
//! the process-wide default subscriber.

use crate::error::{HousingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::layer::SubscriberExt;

/// Log levels accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    /// `tracing` has no CRITICAL level; it maps onto ERROR
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = HousingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            other => Err(HousingError::InvalidParameter {
                name: "log_level".to_string(),
                value: other.to_string(),
                reason: "expected one of DEBUG, INFO, WARNING, ERROR, CRITICAL".to_string(),
            }),
        }
    }
}

/// Where and how much a stage logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Log file, truncated on open
    pub file: Option<PathBuf>,
    /// Also write log lines to stdout
    pub console: bool,
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }
}

/// A scoped `tracing` dispatcher for one stage run
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

impl Logger {
    /// Build a logger, creating (or truncating) the log file if one is set
    pub fn new(config: &LogConfig) -> Result<Self> {
        let file_layer = match &config.file {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let file = File::create(path)?;
                Some(
                    tracing_fmt::layer()
                        .with_writer(Arc::new(file))
                        .with_ansi(false)
                        .with_target(false),
                )
            }
            None => None,
        };

        let console_layer = config.console.then(|| {
            tracing_fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
        });

        let subscriber = tracing_subscriber::registry()
            .with(config.level.to_level_filter())
            .with(file_layer)
            .with(console_layer);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// Run `f` with this logger as the current dispatcher
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Run a fallible stage, logging its error before returning it
    pub fn run<T>(&self, stage: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.in_scope(|| {
            tracing::info!(stage, "Stage started");
            let result = f();
            match &result {
                Ok(_) => tracing::info!(stage, "Stage finished"),
                Err(e) => tracing::error!(stage, error = %e, "Stage failed"),
            }
            result
        })
    }
}
