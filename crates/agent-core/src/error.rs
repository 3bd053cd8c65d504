//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// The model could not be reached, timed out, or answered with an error
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model produced no visible text where a reply was expected
    #[error("LLM returned empty content")]
    EmptyModelOutput,

    /// The model requested a tool call whose arguments did not validate.
    ///
    /// Never escapes [`crate::Agent::respond`]; it is folded into a
    /// rephrase reply there and into an error event in progressive mode.
    #[error("malformed tool arguments: {0}")]
    MalformedToolArguments(String),

    /// Provider returned a payload we could not interpret
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

/// Reply used by the collecting mode when tool arguments are malformed.
pub const REPHRASE_REPLY: &str = "I encountered an issue. Could you rephrase it?";

/// Generic text for faults whose details must not reach the caller.
pub const UNEXPECTED_ERROR_REPLY: &str = "An unexpected error occurred.";

impl AgentError {
    /// Whether this error is one the orchestrator declares as a request failure.
    ///
    /// Only these kinds may surface their own text to a caller; everything
    /// else is reported generically.
    pub const fn is_declared(&self) -> bool {
        matches!(
            self,
            Self::ModelUnavailable(_) | Self::EmptyModelOutput | Self::MalformedToolArguments(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::ModelUnavailable(_) => {
                "The weather service is currently unavailable. Please try again.".into()
            }
            Self::EmptyModelOutput => {
                "The model returned an empty response. Please try again.".into()
            }
            Self::MalformedToolArguments(_) => {
                "I encountered an issue parsing the request. Could you rephrase it?".into()
            }
            _ => UNEXPECTED_ERROR_REPLY.into(),
        }
    }
}
