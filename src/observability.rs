// SPDX-License-Identifier: Apache-2.0

//! Logging and observability helpers.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "gldb.log";
pub const LOG_RETENTION_DAYS: u64 = 14;
const DEFAULT_FILTER: &str = "gldb=info,gldb_core=info,gldb_stores=info";

/// Where and how much to log
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Directory for daily rolling JSON logs; `None` logs to stderr
    pub log_dir: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    pub retention_days: u64,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_filter: DEFAULT_FILTER.to_string(),
            retention_days: LOG_RETENTION_DAYS,
        }
    }
}

impl TracingOptions {
    /// Log to files under [`default_log_dir`].
    pub fn with_default_log_dir() -> Self {
        Self {
            log_dir: default_log_dir(),
            ..Self::default()
        }
    }
}

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init_tracing(options: &TracingOptions) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let Some(log_dir) = options.log_dir.as_deref() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
        return;
    };

    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
    }

    // 1. Clean up old logs
    if let Err(e) = cleanup_old_logs(log_dir, options.retention_days) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    // 2. Setup file appender + subscriber
    let file_appender: RollingFileAppender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .json()
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    tracing::info!("Tracing initialized. Logs directory: {:?}", log_dir);
}

/// Platform data directory for logs (`<data_dir>/gldb/logs`)
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("gldb").join("logs"))
}

/// Removes rolled log files older than `retention_days`.
///
/// Only files named after [`LOG_FILE_PREFIX`] are considered. Returns how
/// many files were removed.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX))
            .unwrap_or(false);
        if !is_log || !path.is_file() {
            continue;
        }

        let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
            continue;
        };
        if let Ok(age) = now.duration_since(modified) {
            if age > retention {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => eprintln!("Failed to remove old log file {:?}: {}", path, e),
                }
            }
        }
    }
    Ok(removed)
}
