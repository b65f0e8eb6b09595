//! Text translation through a chat-completion API
//!
//! The model is asked to detect the source language and translate into the
//! target language only when they differ.

use crate::config::{TlsConfig, TranslationConfig};
use crate::errors::{AppError, Result};
use crate::{http, metrics};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

const SERVICE: &str = "translation";

const SYSTEM_PROMPT: &str = "Your task is to identify the language of a given text and translate it \
into another given language if it's not already in the given language. Include the original \
language in the translation prefix.";

const UNEXPECTED_RESPONSE: &str = "Unexpected API response structure.";

/// Translation outcome: `{"response": "..."}` or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Translation {
    Translated { response: String },
    Failed { error: String },
}

/// Anything that can translate text
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Translation;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Chat-completion translator
pub struct Translator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl Translator {
    /// Create a translator; the API key and an existing CA bundle are required
    pub fn new(config: &TranslationConfig, tls: &TlsConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "OPENAI_API_KEY is not set".to_string(),
            })?;

        let ca_path = tls
            .ca_bundle_path
            .as_deref()
            .ok_or_else(|| AppError::Configuration {
                message: "CACERT_PATH is not set".to_string(),
            })?;

        if !Path::new(ca_path).is_file() {
            return Err(AppError::Configuration {
                message: format!("CA bundle not found at {}", ca_path),
            });
        }

        let client = http::build_client(
            Duration::from_secs(config.timeout_secs),
            Some(Path::new(ca_path)),
        )?;

        Ok(Self::with_http_client(client, config, api_key))
    }

    /// Create a translator around an existing reqwest client
    pub fn with_http_client(
        client: reqwest::Client,
        config: &TranslationConfig,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
        }
    }

    fn user_prompt(text: &str, target_language: &str) -> String {
        format!(
            "Translate the following text into {lang} if it is not already in that language. \
             If the text is already in {lang}, leave it as is. Do not include in your response \
             any additional commentary or explanation.\n\nText to translate: \"{text}\"",
            lang = target_language,
            text = text
        )
    }

    async fn complete(&self, text: &str, target_language: &str) -> Result<Option<String>> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(text, target_language),
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let chat: ChatResponse = response.json().await?;

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty()))
    }
}

#[async_trait]
impl Translate for Translator {
    async fn translate(&self, text: &str, target_language: &str) -> Translation {
        let start = Instant::now();
        let result = self.complete(text, target_language).await;
        metrics::record_upstream_call(SERVICE, result.is_ok(), start.elapsed().as_secs_f64());

        match result {
            Ok(Some(response)) => Translation::Translated { response },
            Ok(None) => {
                tracing::warn!(model = %self.model, "Translation response had no content");
                Translation::Failed {
                    error: UNEXPECTED_RESPONSE.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(model = %self.model, error = %e, "Translation request failed");
                Translation::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
