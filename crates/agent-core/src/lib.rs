//! # agent-core
//!
//! Two-round tool-calling orchestrator with a provider-agnostic LLM
//! abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent<T: Tool>                        │
//! │  ┌──────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Conversation │  │  Two-round  │  │   LlmProvider       │  │
//! │  │   Builder    │──│   state     │──│   (Strategy)        │  │
//! │  └──────────────┘  │   machine   │  └─────────────────────┘  │
//! │                    └──────┬──────┘                           │
//! │                      EventSink (null / vec / channel)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Azure OpenAI, any
//! OpenAI-compatible server, or a test double without changing agent logic.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, Result, REPHRASE_REPLY, UNEXPECTED_ERROR_REPLY};
pub use event::{AgentReply, ChannelSink, EventSink, NullSink, StreamEvent};
pub use message::{Conversation, ConversationTurn, Message, Role};
pub use provider::{Completion, FinishReason, GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use tool::{ArgumentError, Tool, ToolCall, ToolSchema};
