//! Remote collaborators of the pipeline.
//!
//! This module provides:
//! * [`TextExtractor`]: async trait for text recognition in images/PDFs.
//! * [`Translator`]: async trait for text translation.
//! * [`ApiExtractor`] / [`ApiTranslator`]: implementations over an
//!   OpenAI-compatible chat-completions endpoint ([`ChatClient`]).
//! * [`PromptBuilder`]: extraction and translation prompts.
//! * [`EncodedFile`]: base64 `data:` URL payload for uploads.
//! * [`ServiceError`]: error variants for remote calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use doc_translate::config::AppConfig;
//! use doc_translate::services::{ApiTranslator, Translator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let translator = ApiTranslator::from_config(&config.service);
//!
//!     let english = translator.translate("नमस्ते").await.unwrap();
//!     println!("{english}");
//! }
//! ```

pub mod chat;
pub mod extractor;
pub mod payload;
pub mod prompt;
pub mod translator;

#[cfg(test)]
pub(crate) mod mock;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use chat::{ChatClient, ServiceError};
pub use extractor::{ApiExtractor, Extraction, TextExtractor};
pub use payload::EncodedFile;
pub use prompt::PromptBuilder;
pub use translator::{ApiTranslator, Translator};
