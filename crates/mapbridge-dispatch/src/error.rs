/// Errors an operation can report back to the dispatch table.
///
/// The `Display` form of each variant is what the client sees as the
/// failure message.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// A required argument was not supplied.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// An argument was supplied with an unusable value.
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// The argument map could not be bound to the operation's parameter type.
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[source] serde_json::Error),

    /// The operation ran and failed.
    #[error("{0}")]
    Failed(String),
}

impl OperationError {
    /// Domain failure with a free-form message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OperationError>;
