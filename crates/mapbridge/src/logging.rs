use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter, e.g. `mapbridge_listener=debug`.
pub const LOG_FILTER_ENV: &str = "MAPBRIDGE_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Pick the filter directive: a valid `MAPBRIDGE_LOG` wins, otherwise the
/// level flag. Also returns why the variable was rejected, if it was.
fn filter_directive(level: LogLevel, env_filter: Option<&str>) -> (String, Option<String>) {
    match env_filter.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => match EnvFilter::try_new(raw) {
            Ok(_) => (raw.to_string(), None),
            Err(err) => (
                level.directive().to_string(),
                Some(format!("ignoring invalid {LOG_FILTER_ENV}={raw:?}: {err}")),
            ),
        },
        None => (level.directive().to_string(), None),
    }
}

/// Logs go to stderr so stdout stays reserved for command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env_filter = std::env::var(LOG_FILTER_ENV).ok();
    let (directive, rejected) = filter_directive(level, env_filter.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };

    if let Some(reason) = rejected {
        tracing::warn!("{reason}");
    }
}
