use std::time::{Duration, Instant};

use mapbridge_client::{Bridge, ClientConfig};
use mapbridge_dispatch::names;
use mapbridge_frame::{Command, Params, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cmd::{parse_duration, Endpoint, PingArgs, SendArgs};
use crate::exit::{client_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let params = match &args.params {
        Some(json) => parse_params(json)?,
        None => Params::new(),
    };
    let timeout = args.timeout.as_deref().map(parse_duration).transpose()?;

    if !names::is_known(&args.command) {
        warn!(command = %args.command, "not a standard command name; sending anyway");
    }

    let command = Command::with_params(args.command, params);
    let response = exchange(endpoint, &command, timeout)?;
    print_response(&response, format);
    Ok(exit_code(&response))
}

pub fn ping(args: PingArgs, endpoint: &Endpoint, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let response = exchange(endpoint, &Command::new(names::PING), Some(timeout))?;
    print_response(&response, format);
    Ok(exit_code(&response))
}

fn exchange(endpoint: &Endpoint, command: &Command, timeout: Option<Duration>) -> CliResult<Response> {
    let mut config = ClientConfig::default()
        .with_host(endpoint.host.clone())
        .with_port(endpoint.port);
    if let Some(timeout) = timeout {
        config = config.with_default_timeout(timeout);
    }
    let mut bridge = Bridge::new(config);

    let started = Instant::now();
    let response = bridge
        .call(command)
        .map_err(|err| client_error(&format!("{} failed", command.name), err))?;
    debug!(
        command = %command.name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        success = response.is_success(),
        "response received"
    );
    Ok(response)
}

fn parse_params(json: &str) -> CliResult<Params> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(other) => Err(CliError::new(
            USAGE,
            format!("--params must be a JSON object, got {other}"),
        )),
        Err(err) => Err(CliError::new(
            USAGE,
            format!("--params is not valid JSON: {err}"),
        )),
    }
}

fn exit_code(response: &Response) -> i32 {
    if response.is_success() {
        SUCCESS
    } else {
        FAILURE
    }
}
