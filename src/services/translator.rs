//! Translation service: turns extracted text into the target language.

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::services::chat::{ChatClient, ServiceError};
use crate::services::prompt::PromptBuilder;

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// Async, stateless text translation.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks as
/// `Arc<dyn Translator>`. The result is a pure function of `text`.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, ServiceError>;
}

// ---------------------------------------------------------------------------
// ApiTranslator
// ---------------------------------------------------------------------------

/// Translates through a chat-completions endpoint.
pub struct ApiTranslator {
    chat: ChatClient,
    prompts: PromptBuilder,
}

impl ApiTranslator {
    pub fn new(chat: ChatClient, prompts: PromptBuilder) -> Self {
        Self { chat, prompts }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            ChatClient::from_config(config),
            PromptBuilder::new(&config.source_languages, &config.target_language),
        )
    }
}

#[async_trait]
impl Translator for ApiTranslator {
    /// Blank input short-circuits to an empty translation without a request.
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let (system_msg, user_msg) = self.prompts.translation(text);
        let messages = serde_json::json!([
            { "role": "system", "content": system_msg },
            { "role": "user",   "content": user_msg   }
        ]);

        let translated = self.chat.complete(messages).await?;
        if translated.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(translated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
