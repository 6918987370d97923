use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mapbridge_dispatch::{names, CommandTable};
use mapbridge_frame::Params;
use mapbridge_listener::{run_until, EmbeddedListener, ListenerConfig};
use serde_json::{json, Value};
use tracing::info;

use crate::cmd::{parse_duration, Endpoint, ServeArgs};
use crate::exit::{listener_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: ServeArgs, endpoint: &Endpoint) -> CliResult<i32> {
    let mut config = ListenerConfig::default()
        .with_host(endpoint.host.clone())
        .with_port(endpoint.port)
        .with_tick_interval(parse_duration(&args.tick_interval)?);
    if let Some(max) = args.max_request_size {
        config = config.with_max_request_size(max);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&shutdown))?;

    let mut listener = EmbeddedListener::new(config, standalone_table());
    info!(host = %endpoint.host, port = endpoint.port, "serving; press Ctrl-C to stop");
    run_until(&mut listener, &shutdown).map_err(|err| listener_error("serve failed", err))?;
    info!("listener stopped");

    Ok(SUCCESS)
}

/// Commands a standalone listener can answer without a GIS host behind it.
fn standalone_table() -> CommandTable {
    CommandTable::with_builtins().with(names::GET_INFO, get_info)
}

fn get_info(_params: &Params) -> mapbridge_dispatch::Result<Value> {
    Ok(json!({
        "name": "mapbridge",
        "version": env!("CARGO_PKG_VERSION"),
        "host": "standalone",
        "platform": std::env::consts::OS,
        "commands": [names::GET_INFO, names::PING],
    }))
}

fn install_ctrlc_handler(shutdown: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use mapbridge_frame::Command;

    use super::*;

    #[test]
    fn standalone_table_answers_ping_and_get_info() {
        let table = standalone_table();
        assert_eq!(table.names(), vec![names::GET_INFO, names::PING]);

        let info = table
            .dispatch(&Command::new(names::GET_INFO))
            .into_result()
            .unwrap();
        assert_eq!(info["name"], json!("mapbridge"));
        assert_eq!(info["version"], json!(env!("CARGO_PKG_VERSION")));

        let response = table.dispatch(&Command::new(names::LOAD_PROJECT));
        assert_eq!(
            response.message(),
            Some("Unknown command type: load_project")
        );
    }
}
