//! Scriptable service doubles for unit tests.
//!
//! Both doubles record every call and can add artificial latency, which
//! lets the pipeline tests control interleavings under paused tokio time.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::services::chat::ServiceError;
use crate::services::extractor::{Extraction, TextExtractor};
use crate::services::payload::EncodedFile;
use crate::services::translator::Translator;

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

enum Scripted {
    Ok(Extraction),
    Fail(String),
}

/// Extraction double keyed by file name. Unscripted files fail with a 500.
#[derive(Default)]
pub struct MockExtractor {
    script: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, file_name: &str, extracted: &str, translated: &str) -> Self {
        self.script.insert(
            file_name.into(),
            Scripted::Ok(Extraction {
                extracted_text: extracted.into(),
                translated_text: translated.into(),
            }),
        );
        self
    }

    pub fn fail(mut self, file_name: &str, message: &str) -> Self {
        self.script
            .insert(file_name.into(), Scripted::Fail(message.into()));
        self
    }

    pub fn delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.into(), delay);
        self
    }

    /// File names seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for MockExtractor {
    async fn extract(&self, payload: &EncodedFile) -> Result<Extraction, ServiceError> {
        self.calls.lock().unwrap().push(payload.file_name.clone());

        if let Some(delay) = self.delays.get(&payload.file_name) {
            tokio::time::sleep(*delay).await;
        }

        match self.script.get(&payload.file_name) {
            Some(Scripted::Ok(extraction)) => Ok(extraction.clone()),
            Some(Scripted::Fail(message)) => Err(ServiceError::Request(message.clone())),
            None => Err(ServiceError::Status {
                status: 500,
                body: format!("no scripted response for {}", payload.file_name),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MockTranslator
// ---------------------------------------------------------------------------

/// One recorded translation request.
#[derive(Debug, Clone)]
pub struct TranslateCall {
    pub text: String,
    pub at: Instant,
}

/// Translation double. Unscripted texts translate to `EN[<text>]`.
#[derive(Default)]
pub struct MockTranslator {
    responses: HashMap<String, String>,
    failing: HashSet<String>,
    fail_all: bool,
    latency: Duration,
    calls: Mutex<Vec<TranslateCall>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, text: &str, translated: &str) -> Self {
        self.responses.insert(text.into(), translated.into());
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing.insert(text.into());
        self
    }

    pub fn fail_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<TranslateCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(TranslateCall {
            text: text.to_string(),
            at: Instant::now(),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.fail_all || self.failing.contains(text) {
            return Err(ServiceError::Timeout);
        }

        Ok(self
            .responses
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("EN[{text}]")))
    }
}
