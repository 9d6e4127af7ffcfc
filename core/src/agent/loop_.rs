use crate::agent::{Conversation, ToolRegistry};
use crate::config::{Config, DEFAULT_MAX_ROUND_TRIPS};
use crate::error::AgentError;
use crate::traits::{ChatRequest, Completion, Provider, ToolCall, ToolCallResult};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FinalAnswer,
    RoundTripLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub answer: String,
    pub round_trips: usize,
    pub stop: StopReason,
}

/// Drives one conversation: asks the model, runs whatever tools it
/// requests, feeds the results back, and stops on a plain answer or when
/// the round-trip limit is hit.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tool_registry: Arc<ToolRegistry>,
    system_prompt: Option<String>,
    max_round_trips: usize,
    parallel_tool_calls: bool,
    conversation: Conversation,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tool_registry,
            system_prompt: None,
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
            parallel_tool_calls: false,
            conversation: Conversation::new(),
        }
    }

    pub fn from_config(
        provider: Arc<dyn Provider>,
        tool_registry: Arc<ToolRegistry>,
        config: &Config,
    ) -> Self {
        let agent = Self::new(provider, tool_registry)
            .with_max_round_trips(config.max_round_trips)
            .with_parallel_tool_calls(config.parallel_tool_calls);

        match &config.system_prompt {
            Some(prompt) => agent.with_system_prompt(prompt.clone()),
            None => agent,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self.conversation = Conversation::with_system(self.system_prompt.as_deref());
        self
    }

    pub fn with_max_round_trips(mut self, max: usize) -> Self {
        self.max_round_trips = max.max(1);
        self
    }

    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = enabled;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    pub fn reset(&mut self) {
        self.conversation.reset();
    }

    pub async fn run(&mut self, message: &str) -> Result<String, AgentError> {
        self.run_with_cancel(message, CancellationToken::new())
            .await
            .map(|report| report.answer)
    }

    pub async fn run_with_cancel(
        &mut self,
        message: &str,
        cancel: CancellationToken,
    ) -> Result<RunReport, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        self.conversation.push_user(message);

        let specs = self.tool_registry.specs();
        let mut round_trips = 0;

        loop {
            if cancel.is_cancelled() {
                info!(round_trips, "Run cancelled before completion request");
                return Err(AgentError::Cancelled);
            }

            debug_assert!(self.conversation.unanswered_calls().is_empty());

            let request = ChatRequest {
                messages: self.conversation.messages(),
                tools: (!specs.is_empty()).then_some(specs.as_slice()),
            };

            debug!(
                provider = self.provider.name(),
                round_trip = round_trips + 1,
                messages = request.messages.len(),
                "Requesting completion"
            );

            let completion = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(round_trips, "Run cancelled during completion request");
                    return Err(AgentError::Cancelled);
                }
                completion = self.provider.complete(request) => completion?,
            };

            let (text, calls) = match completion {
                Completion::FinalAnswer(text) => (text, Vec::new()),
                Completion::ToolCalls { text, calls } => (text, calls),
            };

            if calls.is_empty() {
                self.conversation.push_assistant(text.clone());
                return Ok(RunReport {
                    answer: text,
                    round_trips,
                    stop: StopReason::FinalAnswer,
                });
            }

            round_trips += 1;
            let results = self.execute_tools(&calls, &cancel).await?;
            self.conversation.commit_round_trip(text, calls, results);

            if round_trips >= self.max_round_trips {
                warn!(
                    max_round_trips = self.max_round_trips,
                    "Round-trip limit reached without a final answer"
                );
                return Ok(RunReport {
                    answer: format!(
                        "Stopped after {} tool round trips without a final answer.",
                        round_trips
                    ),
                    round_trips,
                    stop: StopReason::RoundTripLimit,
                });
            }
        }
    }

    /// Answers every call, in request order. Nothing is committed here so a
    /// cancelled phase leaves the conversation untouched.
    async fn execute_tools(
        &self,
        calls: &[ToolCall],
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolCallResult>, AgentError> {
        if self.parallel_tool_calls {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            debug!(count = calls.len(), "Executing tool calls concurrently");
            let results = join_all(calls.iter().map(|call| self.tool_registry.execute(call))).await;
            return Ok(results);
        }

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            if cancel.is_cancelled() {
                info!(tool = %call.name, "Run cancelled before tool call");
                return Err(AgentError::Cancelled);
            }
            debug!(tool = %call.name, call_id = %call.id, "Executing tool call");
            results.push(self.tool_registry.execute(call).await);
        }
        Ok(results)
    }
}
