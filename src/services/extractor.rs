//! Extraction service: recognises text in a scanned image or PDF and returns
//! it together with a first translation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::services::chat::{ChatClient, ServiceError};
use crate::services::payload::EncodedFile;
use crate::services::prompt::PromptBuilder;
use crate::services::translator::{ApiTranslator, Translator};

/// Text recognised in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub extracted_text: String,
    pub translated_text: String,
}

// ---------------------------------------------------------------------------
// TextExtractor trait
// ---------------------------------------------------------------------------

/// Async text recognition for image and PDF payloads.
///
/// Implementors must be `Send + Sync` (held as `Arc<dyn TextExtractor>`).
/// Line breaks of the source are preserved in `extracted_text`.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, payload: &EncodedFile) -> Result<Extraction, ServiceError>;
}

// ---------------------------------------------------------------------------
// ApiExtractor
// ---------------------------------------------------------------------------

/// Vision-model extraction through a chat-completions endpoint, followed by a
/// translation of the recognised text.
pub struct ApiExtractor {
    chat: ChatClient,
    prompts: PromptBuilder,
    translator: Arc<dyn Translator>,
    translation_timeout: Duration,
}

impl ApiExtractor {
    pub fn new(chat: ChatClient, prompts: PromptBuilder, translator: Arc<dyn Translator>) -> Self {
        Self {
            chat,
            prompts,
            translator,
            translation_timeout: ServiceConfig::default().timeout(),
        }
    }

    /// Bound on the follow-up translation. Past it the extraction still
    /// succeeds, with an empty translation.
    pub fn with_translation_timeout(mut self, timeout: Duration) -> Self {
        self.translation_timeout = timeout;
        self
    }

    /// Build an extractor whose follow-up translation uses the same endpoint.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            ChatClient::from_config(config),
            PromptBuilder::new(&config.source_languages, &config.target_language),
            Arc::new(ApiTranslator::from_config(config)),
        )
        .with_translation_timeout(config.timeout())
    }
}

#[async_trait]
impl TextExtractor for ApiExtractor {
    async fn extract(&self, payload: &EncodedFile) -> Result<Extraction, ServiceError> {
        let messages = serde_json::json!([{
            "role": "user",
            "content": [
                { "type": "text", "text": self.prompts.extraction() },
                { "type": "image_url", "image_url": { "url": payload.data_url() } }
            ]
        }]);

        let extracted_text = self.chat.complete(messages).await?;
        log::debug!(
            "services: extracted {} chars from {}",
            extracted_text.chars().count(),
            payload.file_name
        );

        Ok(with_translation(extracted_text, self.translator.as_ref(), self.translation_timeout).await)
    }
}

/// Pair `extracted_text` with its translation.
///
/// A failed or timed-out translation does not fail the extraction; the
/// translation is left empty and can be refreshed by editing the text.
pub(crate) async fn with_translation(
    extracted_text: String,
    translator: &dyn Translator,
    timeout: Duration,
) -> Extraction {
    let translation = tokio::time::timeout(timeout, translator.translate(&extracted_text))
        .await
        .unwrap_or(Err(ServiceError::Timeout));
    let translated_text = match translation {
        Ok(text) => text,
        Err(e) => {
            log::warn!("services: translation after extraction failed: {e}");
            String::new()
        }
    };

    Extraction {
        extracted_text,
        translated_text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
