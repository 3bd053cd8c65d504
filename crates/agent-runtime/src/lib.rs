//! # agent-runtime
//!
//! Runtime providers for the weather agent.
//!
//! ## Providers
//!
//! - **Chat Completions** (default): Azure OpenAI deployments, or any
//!   OpenAI-compatible `/chat/completions` endpoint, with function calling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::ChatCompletionsProvider;
//!
//! let provider = ChatCompletionsProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .tool(weather_tool)
//!     .build()?;
//! ```

#[cfg(feature = "chat-completions")]
pub mod chat_completions;

#[cfg(feature = "chat-completions")]
pub use chat_completions::{ApiStyle, ChatCompletionsConfig, ChatCompletionsProvider};

// Re-export core types for convenience
pub use agent_core::{Agent, AgentError, LlmProvider, Message, Result, Role, Tool};
