//! Test-only mock provider.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::provider::{ChatOptions, LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    /// Vector returned for any text without an entry in `embeddings`.
    pub embedding: Vec<f32>,
    pub embeddings: HashMap<String, Vec<f32>>,
    pub fail_chat: bool,
    pub fail_embed: bool,
    chat_calls: Arc<Mutex<Vec<(Vec<Message>, ChatOptions)>>>,
    embed_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding: vec![1.0, 0.0, 0.0],
            embeddings: HashMap::new(),
            fail_chat: false,
            fail_embed: false,
            chat_calls: Arc::new(Mutex::new(Vec::new())),
            embed_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_chat() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_embed() -> Self {
        Self {
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.embeddings.insert(text.into(), vector);
        self
    }

    /// Every chat request received so far, in call order.
    #[must_use]
    pub fn chat_calls(&self) -> Vec<(Vec<Message>, ChatOptions)> {
        self.chat_calls.lock().unwrap().clone()
    }

    /// Every embedding batch received so far, in call order.
    #[must_use]
    pub fn embed_calls(&self) -> Vec<Vec<String>> {
        self.embed_calls.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    async fn chat(
        &self,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<String, crate::LlmError> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options));
        if self.fail_chat {
            return Err(crate::LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, crate::LlmError> {
        self.embed_calls.lock().unwrap().push(texts.to_vec());
        if self.fail_embed {
            return Err(crate::LlmError::RateLimited);
        }
        Ok(texts
            .iter()
            .map(|t| {
                self.embeddings
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| self.embedding.clone())
            })
            .collect())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
