use mapbridge_frame::Params;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{OperationError, Result};

/// Typed access to a command's argument map.
///
/// Keys an operation does not ask for are ignored, so callers may send
/// arguments that only newer operations understand.
pub trait ParamsExt {
    /// Fetch and convert a required argument.
    fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T>;

    /// Fetch and convert an optional argument. `null` counts as absent.
    fn optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>>;

    /// Fetch a required string argument without copying it.
    fn required_str(&self, name: &str) -> Result<&str>;

    /// Bind the whole map to a parameter struct.
    fn bind<T: DeserializeOwned>(&self) -> Result<T>;
}

impl ParamsExt for Params {
    fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.optional(name)?
            .ok_or_else(|| OperationError::MissingArgument(name.to_string()))
    }

    fn optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|err| OperationError::invalid(name, err.to_string())),
        }
    }

    fn required_str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            None | Some(Value::Null) => Err(OperationError::MissingArgument(name.to_string())),
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(OperationError::invalid(name, "expected a string")),
        }
    }

    fn bind<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.clone()))
            .map_err(OperationError::InvalidArguments)
    }
}
