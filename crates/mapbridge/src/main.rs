mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, Endpoint};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mapbridge", version, about = "GIS host command bridge CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    endpoint: Endpoint,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.endpoint, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "mapbridge",
            "send",
            "get_layer_features",
            "--params",
            r#"{"layer_id":"rivers_123"}"#,
            "--timeout",
            "30s",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.command, "get_layer_features");
                assert_eq!(args.timeout.as_deref(), Some("30s"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn endpoint_flags_are_global() {
        let cli = Cli::try_parse_from(["mapbridge", "ping", "--host", "127.0.0.1", "--port", "9000"])
            .expect("ping args should parse");
        assert_eq!(cli.endpoint.host, "127.0.0.1");
        assert_eq!(cli.endpoint.port, 9000);
        assert!(matches!(cli.command, Command::Ping(_)));
    }

    #[test]
    fn rejects_missing_command_name() {
        let err = Cli::try_parse_from(["mapbridge", "send"]).expect_err("send needs a command");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn parses_serve_subcommand() {
        let cli = Cli::try_parse_from(["mapbridge", "serve", "--tick-interval", "10ms"])
            .expect("serve args should parse");
        assert!(matches!(cli.command, Command::Serve(_)));
    }
}
