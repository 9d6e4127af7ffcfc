use crate::error::CompletionError;
use crate::traits::{ChatMessage, ChatRequest, Completion, Provider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What the provider was asked on one turn.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<String>,
}

/// Replays a fixed sequence of completions and records every request.
/// Once the script runs out it repeats the fallback completion if one was
/// set, otherwise it fails with [`CompletionError::Empty`].
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion, CompletionError>>>,
    fallback: Option<Completion>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedProvider {
    pub fn new(completions: impl IntoIterator<Item = Completion>) -> Self {
        Self {
            script: Mutex::new(completions.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Answers every call with the same completion.
    pub fn repeating(completion: Completion) -> Self {
        Self::default().with_fallback(completion)
    }

    pub fn with_fallback(mut self, completion: Completion) -> Self {
        self.fallback = Some(completion);
        self
    }

    pub fn then_fail(self, error: CompletionError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<Completion, CompletionError> {
        lock(&self.requests).push(RecordedRequest {
            messages: request.messages.to_vec(),
            tools: request
                .tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        });

        match lock(&self.script).pop_front() {
            Some(step) => step,
            None => self.fallback.clone().ok_or(CompletionError::Empty),
        }
    }
}
