use crate::traits::{ChatMessage, Role, ToolCall, ToolCallResult};
use serde::{Deserialize, Serialize};

/// Ordered, append-only message history for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: Option<&str>) -> Self {
        let mut conversation = Self::new();
        if let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) {
            conversation.messages.push(ChatMessage::system(prompt));
        }
        conversation
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Appends an assistant tool-call message together with its results.
    /// `results` must answer `calls` one-to-one and in the same order.
    pub(crate) fn commit_round_trip(
        &mut self,
        text: String,
        calls: Vec<ToolCall>,
        results: Vec<ToolCallResult>,
    ) {
        debug_assert_eq!(
            calls.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            results.iter().map(|r| r.call_id.as_str()).collect::<Vec<_>>(),
        );

        self.messages
            .push(ChatMessage::assistant_with_tool_calls(text, calls));
        self.messages
            .extend(results.into_iter().map(ChatMessage::tool_result));
    }

    /// Ids of tool calls that have no matching tool message yet. A tool
    /// message only answers calls of the assistant message it follows, so
    /// ids reused across turns are tracked per round trip.
    pub fn unanswered_calls(&self) -> Vec<&str> {
        let mut unanswered: Vec<&str> = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for message in &self.messages {
            match message.role {
                Role::Assistant => {
                    unanswered.append(&mut pending);
                    if let Some(calls) = &message.tool_calls {
                        pending.extend(calls.iter().map(|c| c.id.as_str()));
                    }
                }
                Role::Tool => {
                    if let Some(id) = message.tool_call_id.as_deref()
                        && let Some(pos) = pending.iter().position(|p| *p == id)
                    {
                        pending.remove(pos);
                    }
                }
                _ => {}
            }
        }

        unanswered.append(&mut pending);
        unanswered
    }

    /// Drops everything except a leading system message.
    pub fn reset(&mut self) {
        let keep = usize::from(self.messages.first().is_some_and(|m| m.role == Role::System));
        self.messages.truncate(keep);
    }
}
