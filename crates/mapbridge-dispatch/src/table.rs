use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use mapbridge_frame::{Command, Params, Response};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::names;

/// One named unit of host work.
///
/// Implemented for any `Fn(&Params) -> Result<Value>` closure, so most
/// operations are registered as plain functions.
pub trait Operation: Send {
    fn call(&self, params: &Params) -> Result<Value>;
}

impl<F> Operation for F
where
    F: Fn(&Params) -> Result<Value> + Send,
{
    fn call(&self, params: &Params) -> Result<Value> {
        self(params)
    }
}

/// Name-keyed table of operations.
///
/// Built once at startup and then only read. Dispatching never fails: every
/// outcome, including an unknown name or a panicking operation, becomes a
/// [`Response`].
#[derive(Default)]
pub struct CommandTable {
    operations: HashMap<String, Box<dyn Operation>>,
}

impl CommandTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding the built-in `ping` operation.
    pub fn with_builtins() -> Self {
        Self::new().with(names::PING, ping)
    }

    /// Register an operation, replacing any previous one under the same name.
    ///
    /// Returns `true` if a previous operation was replaced.
    pub fn register<O>(&mut self, name: impl Into<String>, operation: O) -> bool
    where
        O: Operation + 'static,
    {
        let name = name.into();
        let replaced = self
            .operations
            .insert(name.clone(), Box::new(operation))
            .is_some();
        if replaced {
            warn!(command = %name, "operation replaced");
        }
        replaced
    }

    /// Builder form of [`CommandTable::register`].
    pub fn with<O>(mut self, name: impl Into<String>, operation: O) -> Self
    where
        O: Operation + 'static,
    {
        self.register(name, operation);
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Run the operation named by `command` and wrap its outcome.
    pub fn dispatch(&self, command: &Command) -> Response {
        let Some(operation) = self.operations.get(&command.name) else {
            warn!(command = %command.name, "unknown command");
            return Response::failure(format!("Unknown command type: {}", command.name));
        };

        debug!(command = %command.name, args = command.params.len(), "dispatching");
        match panic::catch_unwind(AssertUnwindSafe(|| operation.call(&command.params))) {
            Ok(Ok(result)) => Response::success(result),
            Ok(Err(err)) => {
                error!(command = %command.name, error = %err, "operation failed");
                Response::failure(err.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(command = %command.name, panic = %message, "operation panicked");
                Response::failure(format!("operation {} panicked: {message}", command.name))
            }
        }
    }

    /// Decode a raw message as a command and dispatch it.
    ///
    /// A value that does not have the command shape gets a failure envelope.
    pub fn dispatch_value(&self, message: Value) -> Response {
        match serde_json::from_value::<Command>(message) {
            Ok(command) => self.dispatch(&command),
            Err(err) => {
                warn!(error = %err, "invalid command shape");
                Response::failure(format!("Invalid command: {err}"))
            }
        }
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("operations", &self.names())
            .finish()
    }
}

/// Built-in liveness operation.
pub fn ping(_params: &Params) -> Result<Value> {
    Ok(json!({"pong": true}))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::OperationError;
    use crate::params::ParamsExt;

    fn sample_table() -> CommandTable {
        CommandTable::with_builtins()
            .with(names::SAVE_PROJECT, |_: &Params| -> Result<Value> {
                Err(OperationError::failed("no current project path"))
            })
            .with(names::GET_LAYER_FIELDS, |params: &Params| -> Result<Value> {
                let layer = params.required_str("layer_name")?;
                Ok(json!({"layer": layer, "fields": ["id", "name"]}))
            })
            .with("explode", |_: &Params| -> Result<Value> { panic!("kaboom") })
    }

    #[test]
    fn ping_returns_pong() {
        let table = sample_table();
        let response = table.dispatch(&Command::new("ping"));
        assert_eq!(response, Response::success(json!({"pong": true})));
    }

    #[test]
    fn unknown_command_names_the_command() {
        let table = sample_table();
        let response = table.dispatch_value(json!({"type": "nonexistent", "params": {}}));
        assert_eq!(
            response,
            Response::failure("Unknown command type: nonexistent")
        );
        assert!(table.dispatch(&Command::new("ping")).is_success());
    }

    #[test]
    fn operation_failure_becomes_envelope() {
        let table = sample_table();
        let cmd = Command::new("save_project").arg("path", "/tmp/x.proj");
        assert_eq!(
            table.dispatch(&cmd),
            Response::failure("no current project path")
        );
    }

    #[test]
    fn failure_does_not_affect_next_command() {
        let table = sample_table();
        assert!(!table.dispatch(&Command::new("save_project")).is_success());
        assert!(!table.dispatch(&Command::new("explode")).is_success());
        let cmd = Command::new("get_layer_fields").arg("layer_name", "rivers");
        assert!(table.dispatch(&cmd).is_success());
    }

    #[test]
    fn panic_is_caught() {
        let table = sample_table();
        let response = table.dispatch(&Command::new("explode"));
        let message = response.message().unwrap();
        assert!(message.contains("explode"));
        assert!(message.contains("kaboom"));
    }

    #[test]
    fn extra_arguments_are_accepted() {
        let table = sample_table();
        let cmd = Command::new("get_layer_fields")
            .arg("layer_name", "rivers")
            .arg("added_in_a_later_version", true);
        assert_eq!(
            table.dispatch(&cmd),
            Response::success(json!({"layer": "rivers", "fields": ["id", "name"]}))
        );
    }

    #[test]
    fn missing_argument_is_reported() {
        let table = sample_table();
        assert_eq!(
            table.dispatch(&Command::new("get_layer_fields")),
            Response::failure("missing required argument: layer_name")
        );
    }

    #[test]
    fn invalid_shape_is_reported() {
        let table = sample_table();
        let response = table.dispatch_value(json!({"params": {}}));
        assert!(response.message().unwrap().starts_with("Invalid command: "));
        let response = table.dispatch_value(json!([1, 2, 3]));
        assert!(response.message().unwrap().starts_with("Invalid command: "));
    }

    #[test]
    fn registration_replaces_and_lists_sorted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut table = CommandTable::with_builtins();
        assert!(!table.register("zoom_to_layer", |_: &Params| -> Result<Value> {
            Ok(Value::Null)
        }));
        assert!(table.register("ping", move |_: &Params| -> Result<Value> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!("custom"))
        }));

        assert_eq!(table.names(), vec!["ping", "zoom_to_layer"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.dispatch(&Command::new("ping")),
            Response::success(json!("custom"))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
