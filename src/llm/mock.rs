//! Deterministic provider for tests and offline runs

use super::{Completion, LlmError, LlmProvider, LlmResult, ResponseSchema};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One canned answer
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Text(String),
    Structured(serde_json::Value),
    Error(String),
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        MockResponse::Text(content.into())
    }

    pub fn structured(data: serde_json::Value) -> Self {
        MockResponse::Structured(data)
    }

    pub fn error(message: impl Into<String>) -> Self {
        MockResponse::Error(message.into())
    }
}

/// A recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub method: &'static str,
    pub prompt: String,
    pub system: Option<String>,
    pub schema: Option<String>,
}

/// Provider that replays queued responses in order
///
/// When the queue is empty, text completions return the default response and
/// structured completions return the schema's minimal instance.
pub struct MockProvider {
    default_response: String,
    queue: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<MockCall>>,
}

pub const MOCK_MODEL: &str = "mock-model";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_default_response("Mock response")
    }

    pub fn with_default_response(default_response: impl Into<String>) -> Self {
        Self {
            default_response: default_response.into(),
            queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let provider = Self::new();
        lock(&provider.queue).extend(responses);
        provider
    }

    /// Queue a response for the next call
    pub fn push(&self, response: MockResponse) {
        lock(&self.queue).push_back(response);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<MockCall> {
        lock(&self.calls).last().cloned()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Clear both the call log and the response queue
    pub fn reset(&self) {
        lock(&self.calls).clear();
        lock(&self.queue).clear();
    }

    fn record(&self, method: &'static str, prompt: &str, system: Option<&str>, schema: Option<&str>) {
        lock(&self.calls).push(MockCall {
            method,
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
            schema: schema.map(str::to_string),
        });
    }

    fn next_response(&self) -> Option<MockResponse> {
        lock(&self.queue).pop_front()
    }

    fn completion(&self, prompt: &str, content: String) -> Completion {
        let mut usage = HashMap::new();
        usage.insert(
            "input_tokens".to_string(),
            prompt.split_whitespace().count() as u64,
        );
        usage.insert("output_tokens".to_string(), 10);
        Completion {
            content,
            model: MOCK_MODEL.to_string(),
            usage,
        }
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<Completion> {
        self.record("complete", prompt, system, None);
        let content = match self.next_response() {
            Some(MockResponse::Text(text)) => text,
            Some(MockResponse::Structured(data)) => data.to_string(),
            Some(MockResponse::Error(message)) => return Err(LlmError::Mock(message)),
            None => self.default_response.clone(),
        };
        Ok(self.completion(prompt, content))
    }

    fn complete_json(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
        system: Option<&str>,
    ) -> LlmResult<serde_json::Value> {
        self.record("complete_structured", prompt, system, Some(&schema.name));
        match self.next_response() {
            Some(MockResponse::Structured(data)) => Ok(data),
            Some(MockResponse::Text(text)) => super::parse_json_content(&text),
            Some(MockResponse::Error(message)) => Err(LlmError::Mock(message)),
            None => Ok(schema.minimal_instance()),
        }
    }
}
