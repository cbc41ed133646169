//! Logging setup for the command line tool
//!
//! Human-readable output goes to stderr so that stdout stays free for
//! documents. A JSON log file can be added for bug reports.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for JSON log files, `None` disables them
    pub log_dir: Option<PathBuf>,

    /// Whether to log to stderr
    pub enable_console_logs: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close (for performance tracing)
    pub enable_spans: bool,

    /// Default log level filter, overridden by RUST_LOG
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LoggingConfig {
    /// Warnings and collection summaries only
    pub fn production() -> Self {
        Self {
            log_dir: None,
            enable_console_logs: true,
            include_location: false,
            enable_spans: false,
            default_filter: "warn,schemagram=info,schemagram_diagram=info,schemagram_core=warn"
                .to_string(),
        }
    }

    /// Verbose output with source locations
    pub fn development() -> Self {
        Self {
            log_dir: None,
            enable_console_logs: true,
            include_location: true,
            enable_spans: true,
            default_filter: "info,schemagram=debug,schemagram_diagram=debug,schemagram_core=debug"
                .to_string(),
        }
    }

    /// Everything, including attribute filling
    pub fn testing() -> Self {
        Self {
            log_dir: None,
            enable_console_logs: true,
            include_location: true,
            enable_spans: true,
            default_filter: "trace".to_string(),
        }
    }

    /// Pick a preset from the number of `-v` flags
    pub fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => Self::production(),
            1 => Self::development(),
            _ => Self::testing(),
        }
    }

    pub fn with_json_logs(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }
}

/// Initialize the global subscriber.
///
/// The returned guard flushes the JSON log file when dropped and must be
/// kept alive until the program exits.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(span_events.clone())
            .with_writer(std::io::stderr)
            .compact()
            .with_filter(env_filter.clone())
            .boxed();

        layers.push(console_layer);
    }

    let mut guard = None;
    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;
        let file_appender = tracing_appender::rolling::daily(log_dir, "schemagram.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();

        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        json_enabled = config.log_dir.is_some(),
        console_enabled = config.enable_console_logs,
        "logging initialized"
    );

    Ok(guard)
}
