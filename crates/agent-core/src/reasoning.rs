//! Tool-Calling Orchestrator
//!
//! Drives the two-round protocol for one user turn:
//!
//! ```text
//! Start ─► Round1Sent ─┬─ text ───────────────────────────────────────► Done
//!                      └─ tool call ─► ToolRequested ─► ToolExecuted ─► Round2Sent ─► Done
//! ```
//!
//! Round 1 offers the tool schema; round 2 does not, so the model cannot ask
//! for a second tool round. Both the collecting and progressive modes run the
//! same state machine and differ only in the [`EventSink`] they pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{AgentError, Result, REPHRASE_REPLY, UNEXPECTED_ERROR_REPLY};
use crate::event::{AgentReply, ChannelSink, EventSink, NullSink, StreamEvent};
use crate::message::{Conversation, ConversationTurn, Message};
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolSchema};

const STATUS_ANALYZING: &str = "Analyzing your question...";
const STATUS_GENERATING: &str = "Generating response...";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Fixed system instruction placed first in every conversation
    pub system_prompt: String,

    /// Generation options shared by both rounds
    pub generation: GenerationOptions,

    /// Upper bound on each model round
    pub model_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            generation: GenerationOptions::default(),
            model_timeout: Duration::from_secs(60),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the provided tool when it \
is needed to answer, and never make up data the tool did not return.";

/// The main Agent struct
pub struct Agent<T: Tool> {
    provider: Arc<dyn LlmProvider>,
    tool: Arc<T>,
    config: AgentConfig,
}

impl<T: Tool + 'static> Agent<T> {
    /// Create a new agent
    pub fn new(provider: Arc<dyn LlmProvider>, tool: Arc<T>, config: AgentConfig) -> Self {
        Self {
            provider,
            tool,
            config,
        }
    }

    /// Collecting mode: run to completion and return the reply.
    ///
    /// Only [`AgentError::ModelUnavailable`] and [`AgentError::EmptyModelOutput`]
    /// are returned as errors; malformed tool arguments become a rephrase
    /// request with `tool_used = false`.
    pub async fn respond(&self, message: &str, history: &[ConversationTurn]) -> Result<AgentReply> {
        match self.run(message, history, &mut NullSink).await {
            Err(AgentError::MalformedToolArguments(_)) => Ok(AgentReply::new(REPHRASE_REPLY, false)),
            other => other,
        }
    }

    /// Progressive mode: emit status events, then exactly one terminal event.
    pub async fn respond_events<S>(&self, message: &str, history: &[ConversationTurn], sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let terminal = match self.run(message, history, sink).await {
            Ok(reply) => StreamEvent::Result(reply),
            Err(e) => {
                if !e.is_declared() {
                    tracing::error!(error = %e, "Unexpected agent failure");
                }
                StreamEvent::error(e.user_message())
            }
        };
        sink.emit(terminal).await;
    }

    /// Progressive mode on a background task.
    ///
    /// The run is abandoned as soon as the receiver is dropped; model or tool
    /// calls already in flight are cancelled with it. A panic inside the run
    /// still ends the stream with a generic error event.
    pub fn respond_stream(
        self: Arc<Self>,
        message: String,
        history: Vec<ConversationTurn>,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(16);

        let mut sink = ChannelSink::new(tx.clone());
        let run = tokio::spawn(async move {
            self.respond_events(&message, &history, &mut sink).await;
        });
        let abort = run.abort_handle();

        tokio::spawn(async move {
            tokio::select! {
                joined = run => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Agent run panicked");
                            let _ = tx.send(StreamEvent::error(UNEXPECTED_ERROR_REPLY)).await;
                        }
                    }
                }
                () = tx.closed() => {
                    tracing::info!("Client disconnected, abandoning agent run");
                    abort.abort();
                }
            }
        });

        rx
    }

    /// The state machine shared by both modes. Emits status events only;
    /// the caller decides how the outcome is reported.
    pub async fn run<S>(
        &self,
        message: &str,
        history: &[ConversationTurn],
        sink: &mut S,
    ) -> Result<AgentReply>
    where
        S: EventSink + ?Sized,
    {
        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            message = %preview(message, 80),
            history_turns = history.len(),
            "Agent invoked"
        );

        sink.emit(StreamEvent::status(STATUS_ANALYZING)).await;

        let mut conversation = Conversation::build(&self.config.system_prompt, history, message);
        let schema = self.tool.schema();

        // Round 1
        let first = self
            .complete(&conversation, std::slice::from_ref(&schema), 1)
            .await?;

        if !first.wants_tool() {
            return finish(run_id, first.content, false);
        }

        let Completion {
            content,
            tool_calls,
            ..
        } = first;

        let mut calls = tool_calls.into_iter();
        let call = calls.next().ok_or_else(|| {
            tracing::error!(%run_id, "Model signaled a tool call but sent none");
            AgentError::MalformedToolArguments("tool call signaled without a call".into())
        })?;

        let ignored = calls.count();
        if ignored > 0 {
            tracing::warn!(%run_id, ignored, "Model requested several tool calls, honoring the first");
        }

        if call.name != schema.name {
            tracing::error!(%run_id, tool = %call.name, "Model called an undeclared tool");
            return Err(AgentError::MalformedToolArguments(format!(
                "unknown tool '{}'",
                call.name
            )));
        }

        let args = self.tool.parse_arguments(&call.arguments).map_err(|e| {
            tracing::error!(
                %run_id,
                arguments = %call.arguments,
                error = %e,
                "Malformed tool arguments"
            );
            AgentError::MalformedToolArguments(e.to_string())
        })?;

        sink.emit(StreamEvent::status(self.tool.progress_message(&args)))
            .await;

        tracing::info!(%run_id, tool = %call.name, call_id = %call.id, "Tool invocation");
        let output = self.tool.execute(&args).await;
        tracing::info!(%run_id, body = %output, "Tool result");

        let call_id = call.id.clone();
        conversation.push(Message::assistant_tool_calls(content, vec![call]));
        conversation.push(Message::tool(output, call_id));

        sink.emit(StreamEvent::status(STATUS_GENERATING)).await;

        // Round 2: no tools on offer
        let second: Completion = self.complete(&conversation, &[], 2).await?;
        finish(run_id, second.content, true)
    }

    /// One bounded model round. Any failure, including the timeout, is fatal.
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolSchema],
        round: u8,
    ) -> Result<Completion> {
        let call = self
            .provider
            .complete(conversation.messages(), tools, &self.config.generation);

        match tokio::time::timeout(self.config.model_timeout, call).await {
            Ok(Ok(completion)) => {
                if let Some(usage) = &completion.usage {
                    tracing::debug!(
                        round,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Model round complete"
                    );
                }
                Ok(completion)
            }
            Ok(Err(e)) => {
                tracing::error!(round, provider = self.provider.name(), error = %e, "LLM call failed");
                Err(AgentError::ModelUnavailable(e.to_string()))
            }
            Err(_) => {
                tracing::error!(
                    round,
                    provider = self.provider.name(),
                    timeout_secs = self.config.model_timeout.as_secs(),
                    "LLM call timed out"
                );
                Err(AgentError::ModelUnavailable("model call timed out".into()))
            }
        }
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Get the tool
    pub fn tool(&self) -> &T {
        &self.tool
    }
}

fn finish(run_id: Uuid, content: String, tool_used: bool) -> Result<AgentReply> {
    let reply = content.trim();
    if reply.is_empty() {
        tracing::error!(%run_id, tool_used, "LLM returned empty content");
        return Err(AgentError::EmptyModelOutput);
    }

    tracing::info!(%run_id, tool_used, reply = %preview(reply, 120), "Agent reply");
    Ok(AgentReply::new(reply, tool_used))
}

/// First `max` characters, for logs
fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Builder for Agent configuration
pub struct AgentBuilder<T: Tool> {
    provider: Option<Arc<dyn LlmProvider>>,
    tool: Option<Arc<T>>,
    config: AgentConfig,
}

impl<T: Tool + 'static> Default for AgentBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tool + 'static> AgentBuilder<T> {
    pub fn new() -> Self {
        Self {
            provider: None,
            tool: None,
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool(mut self, tool: T) -> Self {
        self.tool = Some(Arc::new(tool));
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn model_timeout(mut self, timeout: Duration) -> Self {
        self.config.model_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Agent<T>> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let tool = self
            .tool
            .ok_or_else(|| AgentError::Config("Tool is required".into()))?;

        Ok(Agent::new(provider, tool, self.config))
    }
}
