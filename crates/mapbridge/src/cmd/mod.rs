use std::time::Duration;

use clap::{Args, Subcommand};
use mapbridge_transport::{DEFAULT_HOST, DEFAULT_PORT};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod commands;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a standalone listener answering `ping` and `get_info`.
    Serve(ServeArgs),
    /// Send one command and print the response envelope.
    Send(SendArgs),
    /// Check that a listener is answering.
    Ping(PingArgs),
    /// List the command names a host can understand.
    Commands,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, endpoint),
        Command::Send(args) => send::run(args, endpoint, format),
        Command::Ping(args) => send::ping(args, endpoint, format),
        Command::Commands => commands::run(format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the listener lives, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Endpoint {
    /// Listener host.
    #[arg(long, env = "MAPBRIDGE_HOST", default_value = DEFAULT_HOST, global = true)]
    pub host: String,
    /// Listener port.
    #[arg(long, env = "MAPBRIDGE_PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Pause between idle ticks (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub tick_interval: String,
    /// Largest request accepted, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_request_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Command name, e.g. `get_project_info`.
    pub command: String,
    /// Command arguments as a JSON object.
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,
    /// Response timeout for this command (e.g. 30s, 500ms). Default: 120s.
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Response timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }
}
