//! Local Ollama backend over the non-streaming `/api/chat` endpoint.

use serde::{Deserialize, Serialize};

use super::model::{map_send_error, non_empty_reply, wire_messages, ChatModel, WireMessage};
use super::ModelError;
use crate::models::ChatTurn;

pub const OLLAMA_TEMPERATURE: f32 = 0.8;

pub struct OllamaChatClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaChatClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, ModelError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaReply,
}

#[derive(Deserialize)]
struct OllamaReply {
    content: String,
}

impl ChatModel for OllamaChatClient {
    fn complete(&self, instruction: &str, history: &[ChatTurn]) -> Result<String, ModelError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model: &self.model,
            messages: wire_messages(instruction, history),
            stream: false,
            options: OllamaOptions {
                temperature: OLLAMA_TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = %self.model, "Ollama chat failed");
            return Err(ModelError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaChatResponse = response
            .json()
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        non_empty_reply(parsed.message.content)
    }
}
