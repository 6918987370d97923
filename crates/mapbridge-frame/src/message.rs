use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named arguments carried by a [`Command`].
pub type Params = Map<String, Value>;

/// A named request for one host operation.
///
/// Wire form: `{"type": "<name>", "params": {...}}`. Commands carry no
/// identifier; a connection has at most one in flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(default)]
    pub params: Params,
}

impl Command {
    /// Create a command with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    /// Create a command with an argument map.
    pub fn with_params(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Add one argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Tagged result envelope returned for every command.
///
/// Wire form: `{"status": "success", "result": ...}` or
/// `{"status": "error", "message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        #[serde(default)]
        result: Value,
    },
    #[serde(rename = "error")]
    Failure { message: String },
}

impl Response {
    /// Wrap an operation result.
    pub fn success(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    /// Wrap a human-readable failure description.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure message, if this is a failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message } => Some(message),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> std::result::Result<Value, String> {
        match self {
            Self::Success { result } => Ok(result),
            Self::Failure { message } => Err(message),
        }
    }
}
