use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::gateway::Generator;
use crate::engine::prompt_builder::PromptBuilder;
use crate::model::ending::Ending;
use crate::model::reply::{decode_ending, decode_reply, decode_scenario, GeneratorReply};
use crate::model::scenario::Scenario;
use crate::model::session::Session;

/// Connection settings for an OpenAI-compatible chat-completions
/// endpoint (LM Studio, llama.cpp server, and the like).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            model: "local-model".to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Gateway implementation talking to a local chat-completions server.
pub struct LmStudioClient {
    client: Client,
    config: GeneratorConfig,
}

impl LmStudioClient {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let req = ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
        };

        let url = endpoint(&self.config.base_url, "chat/completions");
        debug!(%url, "requesting completion");

        let resp = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .context("generator request failed")?
            .error_for_status()
            .context("generator returned an error status")?
            .json::<ChatCompletionResponse>()
            .context("generator response was not a chat completion")?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("generator returned no completion"))?;
        Ok(choice.message.content)
    }
}

impl Generator for LmStudioClient {
    fn initial_scenario(&self) -> Result<Scenario> {
        let content = self.complete(&PromptBuilder::initial_scenario())?;
        Ok(decode_scenario(&content)?)
    }

    fn next_turn(&self, session: &Session, choice_text: &str) -> Result<GeneratorReply> {
        let content = self.complete(&PromptBuilder::next_turn(session, choice_text))?;
        Ok(decode_reply(&content)?)
    }

    fn ending(&self, session: &Session) -> Result<Ending> {
        let content = self.complete(&PromptBuilder::ending(session))?;
        Ok(decode_ending(&content)?)
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Probe the endpoint's model list; backs the settings panel.
pub fn test_connection(config: &GeneratorConfig) -> Result<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let resp: serde_json::Value = client
        .get(endpoint(&config.base_url, "models"))
        .send()?
        .json()?;

    Ok(format!(
        "Connected ({} models available)",
        resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
    ))
}
