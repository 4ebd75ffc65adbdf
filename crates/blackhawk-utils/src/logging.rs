//! # Logging Utilities
//!
//! `tracing` subscriber setup for Blackhawk programs.
//!
//! Console output goes to stderr, so a program can print scan results on
//! stdout and still log freely. Output can additionally be written to a file,
//! either rolling daily next to a path given in the environment or as a single
//! dated file for long polling sessions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blackhawk_utils::init_logging;
//!
//! // Keep the guard alive for as long as logs should be flushed to file
//! let _guard = init_logging().expect("Failed to initialize logging");
//! tracing::info!("scanner started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Filter directives (e.g., `RUST_LOG=blackhawk_core=debug`)
//! - `BLACKHAWK_LOG_LEVEL`: Default level when `RUST_LOG` is not set (default: `info`)
//! - `BLACKHAWK_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `BLACKHAWK_LOG_FILE`: Optional log file path, rotated daily

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs, io};

use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level, one event per scanned region
    Debug,
    /// Trace level, one event per lens read
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Logging settings resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogSettings
{
    /// Output format
    pub format: LogFormat,
    /// Level used when `RUST_LOG` is not set
    pub level: LogLevel,
    /// Optional daily-rotated log file
    pub file: Option<PathBuf>,
}

impl LogSettings
{
    /// Read settings from the process environment.
    ///
    /// ## Errors
    ///
    /// See [`LogSettings::from_lookup`].
    pub fn from_env() -> Result<Self, LoggingError>
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// ## Errors
    ///
    /// - `InvalidFormat`: `BLACKHAWK_LOG_FORMAT` is not a known format
    /// - `InvalidLevel`: `BLACKHAWK_LOG_LEVEL` is not a known level
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = lookup("BLACKHAWK_LOG_FORMAT")
            .map(|value| value.parse::<LogFormat>().map_err(LoggingError::InvalidFormat))
            .transpose()?
            .unwrap_or_default();
        let level = lookup("BLACKHAWK_LOG_LEVEL")
            .map(|value| value.parse::<LogLevel>().map_err(LoggingError::InvalidLevel))
            .transpose()?
            .unwrap_or_default();
        let file = lookup("BLACKHAWK_LOG_FILE")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Ok(Self { format, level, file })
    }
}

/// Keeps the background file writer running
///
/// Buffered events are flushed when the guard is dropped, so hold it until
/// the program exits.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard
{
    #[allow(dead_code)] // held for its Drop
    worker: Option<WorkerGuard>,
}

/// Initialize logging from the environment
///
/// ## Example
///
/// ```rust,no_run
/// use blackhawk_utils::init_logging;
///
/// let _guard = init_logging().expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
///
/// ## Errors
///
/// Returns an error if:
/// - An environment variable holds an invalid value
/// - Logging is already initialized
/// - The log file directory cannot be created
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_with_settings(&LogSettings::from_env()?)
}

/// Initialize console logging with an explicit level and format
///
/// `RUST_LOG` still overrides `level` when set. `BLACKHAWK_LOG_FILE` is ignored.
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_with_settings(&LogSettings {
        format,
        level,
        file: None,
    })
}

/// Initialize file-only logging into `dir`
///
/// Events go to `dir/YYYY-MM-DD-blackhawk.log` (local date) and nothing is
/// written to the console. Returns the guard and the log file path.
///
/// ## Arguments
///
/// * `level` - Explicit level. If `None`, `RUST_LOG` is used, or `INFO`.
///
/// ## Errors
///
/// Returns an error if `dir` cannot be created or logging is already initialized.
pub fn init_logging_to_file(dir: &Path, level: Option<LogLevel>) -> Result<(LoggingGuard, PathBuf), LoggingError>
{
    fs::create_dir_all(dir)?;
    let file_name = dated_file_name(&Local::now().format("%Y-%m-%d").to_string());

    let filter = match level {
        Some(level) => EnvFilter::new(Level::from(level).to_string()),
        None => build_filter(LogLevel::Info),
    };

    // The date is already in the name, so never rotate.
    let appender = tracing_appender::rolling::never(dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    try_init(vec![build_layer(LogFormat::Pretty, writer, false, filter)])?;

    Ok((LoggingGuard { worker: Some(guard) }, dir.join(file_name)))
}

fn init_with_settings(settings: &LogSettings) -> Result<LoggingGuard, LoggingError>
{
    let mut layers = vec![build_layer(
        settings.format,
        io::stderr,
        true,
        build_filter(settings.level),
    )];

    let mut guard = LoggingGuard::default();
    if let Some(path) = &settings.file {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .ok_or_else(|| LoggingError::InitializationFailed(format!("{} has no file name", path.display())))?;
        fs::create_dir_all(&dir)?;

        let appender = tracing_appender::rolling::daily(&dir, name);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(build_layer(settings.format, writer, false, build_filter(settings.level)));
        guard.worker = Some(file_guard);
    }

    try_init(layers)?;
    Ok(guard)
}

/// `RUST_LOG` if set and valid, otherwise `default_level`.
fn build_filter(default_level: LogLevel) -> EnvFilter
{
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::from(default_level).to_string()))
}

fn build_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn try_init(layers: Vec<BoxedLayer>) -> Result<(), LoggingError>
{
    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

fn dated_file_name(date: &str) -> String
{
    format!("{date}-blackhawk.log")
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
