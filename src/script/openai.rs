//! OpenAI-backed narration script generation.

use super::ScriptGenerator;
use crate::error::{FortellError, Result};
use crate::retry::{self, RetryPolicy};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Default timeout for generation requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Script generator backed by OpenAI chat completions.
pub struct OpenAiScriptGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAiScriptGenerator {
    /// Create a generator for the given model. The API key comes from the
    /// process environment (`OPENAI_API_KEY`).
    pub fn new(model: &str, temperature: f32, retry: RetryPolicy) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client: Client::with_config(OpenAIConfig::default()).with_http_client(http_client),
            model: model.to_string(),
            temperature,
            retry,
        }
    }
}

#[async_trait]
impl ScriptGenerator for OpenAiScriptGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Submitting narration prompt ({} characters)", prompt.len());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| FortellError::Script(e.to_string()))?
                .into()])
            .build()
            .map_err(|e| FortellError::Script(e.to_string()))?;

        let response = retry::with_backoff(&self.retry, "script generation", || async {
            self.client.chat().create(request.clone()).await
        })
        .await
        .map_err(|e| FortellError::OpenAI(format!("Failed to generate script: {}", e)))?;

        let script = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| FortellError::Script("Empty response from LLM".to_string()))?
            .clone();

        Ok(script)
    }
}
