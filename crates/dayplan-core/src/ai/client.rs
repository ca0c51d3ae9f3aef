use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompt::{optimize_prompt, parse_suggestion, suggest_prompt};
use super::{AiError, Assistant, TaskSuggestion};

/// Generation can be slow; allow more time than data requests.
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Sends prompt templates to a hosted text-generation endpoint.
///
/// The endpoint accepts `{"model", "prompt"}` and replies with `{"text"}`.
#[derive(Clone)]
pub struct HostedModelClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HostedModelClient {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let mut request = self.client.post(&self.endpoint).json(&GenerateRequest {
            model: &self.model,
            prompt,
        });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(AiError::RequestFailed(format!("Status {}: {}", status, preview)));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidReply(e.to_string()))?;
        debug!(model = %self.model, chars = reply.text.len(), "Assistant reply received");
        Ok(reply.text)
    }
}

#[async_trait]
impl Assistant for HostedModelClient {
    async fn suggest(&self, task_description: &str, schedule: &str) -> Result<TaskSuggestion, AiError> {
        let reply = self.generate(&suggest_prompt(task_description, schedule)).await?;
        parse_suggestion(&reply)
    }

    async fn optimize(&self, tasks: &str, timetable: &str) -> Result<String, AiError> {
        let reply = self.generate(&optimize_prompt(tasks, timetable)).await?;
        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(AiError::InvalidReply("empty timetable".to_string()));
        }
        Ok(trimmed.to_string())
    }
}
