//! Tracing setup
//!
//! Diagnostics always go to stderr; `swisscv sample` writes its persona JSON
//! to stdout and must stay machine-readable. A `[logging] file` adds a
//! daily-rolling copy written on a background thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Crates whose debug output drowns the generator's own events
const NOISY_DEPENDENCIES: &[&str] = &["hyper", "reqwest", "rustls"];

/// Least to most verbose
const LADDER: [Level; 5] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];

/// Keeps the file writer's worker thread alive; drop it last.
pub struct LogGuards {
    _file: Option<WorkerGuard>,
}

/// Where a rolling log file lives: `<dir>/<prefix>.<date>.log`
#[derive(Debug, PartialEq, Eq)]
struct RollingTarget {
    dir: PathBuf,
    prefix: String,
}

impl RollingTarget {
    fn from_setting(file: &str) -> Self {
        let path = Path::new(file);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("swisscv")
            .to_string();
        Self { dir, prefix }
    }

    fn open(&self, keep: u32) -> Result<RollingFileAppender> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::IoWrite {
            path: self.dir.clone(),
            source: e,
        })?;

        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(&self.prefix)
            .filename_suffix("log")
            .max_log_files(keep.max(1) as usize)
            .build(&self.dir)
            .map_err(|e| Error::Config(format!("Cannot open log file in {}: {}", self.dir.display(), e)))
    }
}

/// Install the global subscriber for a generator run.
///
/// `-q` wins over `-v`; otherwise each `-v` lowers the threshold one step
/// below the configured level. `RUST_LOG`, when set, replaces the base filter.
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = threshold(&settings.level, verbose, quiet);

    let (file_output, guard) = match settings.file.as_deref() {
        Some(file) => {
            let target = RollingTarget::from_setting(file);
            let (writer, guard) = tracing_appender::non_blocking(target.open(settings.max_files)?);
            (Some(file_layer(writer, settings.json_format)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(stderr_layer(settings.json_format))
        .with(file_output)
        .try_init()
        .map_err(|e| Error::Internal(format!("Logging already initialized: {}", e)))?;

    tracing::debug!(%level, file = ?settings.file, json = settings.json_format, "Logging ready");
    Ok(LogGuards { _file: guard })
}

/// Warnings-only stderr logging for `config` subcommands, which print their
/// own results and never read reference data.
pub fn init_simple(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(fmt::layer().with_writer(std::io::stderr).without_time().compact())
        .try_init()
        .map_err(|e| Error::Internal(format!("Logging already initialized: {}", e)))
}

fn threshold(configured: &str, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    let base = Level::from_str(configured).unwrap_or(Level::INFO);
    let start = LADDER.iter().position(|l| *l == base).unwrap_or(2);
    LADDER[(start + verbose as usize).min(LADDER.len() - 1)]
}

fn filter_for(level: Level) -> EnvFilter {
    let base = level.as_str().to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base));

    NOISY_DEPENDENCIES
        .iter()
        .map(|name| format!("{}=warn", name))
        .chain(std::iter::once(format!("swisscv={}", base)))
        .filter_map(|directive| directive.parse().ok())
        .fold(filter, |filter, directive| filter.add_directive(directive))
}

fn stderr_layer<S>(json: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .boxed()
    }
}

fn file_layer<S>(writer: NonBlocking, json: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if json {
        fmt::layer().json().with_writer(writer).with_ansi(false).boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_ids(true)
            .boxed()
    }
}
