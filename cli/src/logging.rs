//! Tracing setup for the treecomplete binary
//!
//! Suggestions go to stdout, so logs go either to a file or to stderr.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber. Keep the returned guard alive for as long
/// as logs should be flushed to the file.
pub fn init_logging(log_file: Option<&Path>, default_filter: &str) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let Some(path) = log_file else {
        init_stderr_logging(filter);
        return None;
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("[treecomplete] Failed to create log directory {:?}: {}", parent, e);
        }
    }

    let file = std::fs::OpenOptions::new().create(true).append(true).open(path);
    match file {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            );

            match tracing::subscriber::set_global_default(subscriber) {
                Ok(()) => tracing::info!("Logging initialized, writing to {:?}", path),
                Err(e) => eprintln!("[treecomplete] Failed to set tracing subscriber: {}", e),
            }
            Some(guard)
        }
        Err(e) => {
            eprintln!("[treecomplete] Failed to open log file {:?}: {}", path, e);
            init_stderr_logging(filter);
            None
        }
    }
}

fn init_stderr_logging(filter: EnvFilter) {
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}
