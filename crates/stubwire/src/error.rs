//! Error types for stubwire.
//!
//! Construction problems (bad templates, bad base addresses, duplicate names)
//! surface while a mock is being set up. Responder failures never show up
//! here: the dispatcher turns them into `500` responses.

/// Malformed route template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Invalid variable format: {0}")]
    InvalidVariable(String),

    #[error("Missing closing bracket: {0}")]
    UnterminatedVariable(String),

    #[error("Variable name cannot contain reserved characters: {0}")]
    ReservedCharacter(String),

    #[error("Query key '{key}' is declared more than once in template '{template}'")]
    DuplicateQueryKey { key: String, template: String },

    #[error("Cannot parse template '{template}': {reason}")]
    Unparsable { template: String, reason: String },
}

/// Errors raised by the mock server and its registration API.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid base address '{address}': {reason}")]
    InvalidBaseAddress { address: String, reason: String },

    #[error("Invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("A handler named \"{0}\" is already registered")]
    DuplicateName(String),

    #[error(
        "Cannot find a handler called \"{0}\". Please make sure you have provided a name when defining the API."
    )]
    HandlerNotFound(String),

    #[error("The absolute path should start with \"/\": {0}")]
    InvalidPath(String),

    #[error("Failed to serialize response payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Invalid mock configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised by tracer assertions when an expectation is not met.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Verification failed for handler \"{handler}\": {message}")]
pub struct VerifyError {
    pub handler: String,
    pub message: String,
}

impl VerifyError {
    pub fn new(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = MockError> = std::result::Result<T, E>;
