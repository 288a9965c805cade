//! Tracing subscriber setup for the command-line tool

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Logs go to stderr unless
/// `log_file` is given; stdout is reserved for resolved output. The returned
/// guard flushes buffered lines when dropped and must be held until exit.
pub fn init_logging(
    default_level: &str,
    format: LogFormat,
    log_file: Option<&Path>,
) -> std::io::Result<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (writer, guard) = match log_file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(directory)?;
            let file_name = path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("setup-edgedb.log"));
            tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none());

    match format {
        LogFormat::Json => builder.json().with_target(true).init(),
        LogFormat::Text => builder.with_target(false).init(),
    }

    Ok(guard)
}

/// Map `-v` occurrences to a default filter level
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
