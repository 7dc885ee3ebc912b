//! Logging setup
//!
//! Logs go to stderr, to a daily rolling file, or both, so stdout stays
//! reserved for reports. `RUST_LOG` takes precedence over the configured
//! level.

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "billing-usage.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Targets {
    console: bool,
    file: bool,
}

impl Targets {
    /// Unknown outputs fall back to the console.
    fn from_output(output: &str) -> Self {
        match output {
            "file" => Self { console: false, file: true },
            "both" => Self { console: true, file: true },
            _ => Self { console: true, file: false },
        }
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit when file output is enabled;
/// dropping it stops the background writer.
pub fn init_logging(config: &LoggingConfig, log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let targets = Targets::from_output(&config.output);
    let json = config.format == "json";

    let (file_writer, guard) = if targets.file {
        let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    let console_json = (targets.console && json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
    });
    let console_pretty = (targets.console && !json).then(|| fmt::layer().pretty().with_writer(std::io::stderr));
    let file_json = file_writer
        .clone()
        .filter(|_| json)
        .map(|writer| fmt::layer().json().with_current_span(true).with_writer(writer));
    let file_plain = file_writer
        .filter(|_| !json)
        .map(|writer| fmt::layer().with_ansi(false).with_writer(writer));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_pretty)
        .with(file_json)
        .with(file_plain)
        .try_init();

    guard
}

/// Root span for one CLI invocation, tagged with a fresh run id.
pub fn run_span(command: &str) -> tracing::Span {
    tracing::info_span!("run", run_id = %uuid::Uuid::new_v4(), command = %command)
}
