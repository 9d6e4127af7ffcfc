use thiserror::Error;

/// Raised when a tool's signature cannot be turned into a descriptor.
/// Fatal to registering that tool only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("tool name must not be empty")]
    EmptyName,

    #[error("parameter '{param}' of tool '{tool}' has no type annotation")]
    MissingAnnotation { tool: String, param: String },

    #[error("parameter '{param}' of tool '{tool}' has unsupported type '{annotation}'")]
    UnsupportedType {
        tool: String,
        param: String,
        annotation: String,
    },

    #[error("parameter '{param}' is declared more than once on tool '{tool}'")]
    DuplicateParameter { tool: String, param: String },

    #[error("default for parameter '{param}' of tool '{tool}' is not a valid {expected}")]
    InvalidDefault {
        tool: String,
        param: String,
        expected: &'static str,
    },
}

/// Failure of the remote completion service. Ends the current run.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request to completion service failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("completion service timed out")]
    Timeout,

    #[error("completion service rate limited the request: {body}")]
    RateLimited { body: String },

    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("completion service returned neither text nor tool calls")]
    Empty,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

/// Tool-side failures. These never escape a run: the loop renders them
/// into the result text sent back to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    NotFound(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{0:#}")]
    Execution(#[from] anyhow::Error),
}

/// Errors that end an agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("run cancelled")]
    Cancelled,
}
