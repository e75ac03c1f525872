//! Orchestrator: drives documents through extraction and keeps their
//! translations in step with user edits.
//!
//! # Pipeline flow
//!
//! ```text
//! ingest(file)
//!   ├─ validate (size, type)            reject → ValidationError, nothing stored
//!   ├─ store.add_document               [Pending]
//!   ├─ store.update_document            [Processing]
//!   └─ spawn: encode → extractor.extract
//!         ├─ Ok  → extracted + translated          [Completed]
//!         └─ Err → message                         [Error]
//!
//! on_text_edited(id, text)
//!   ├─ store.edit_extracted_text        (immediate)
//!   └─ debouncer.schedule(id)           (1000 ms after the last edit)
//!         ├─ blank text → translated = ""           (no request)
//!         └─ translator.translate(text)
//!               ├─ Ok  → translated (if text unchanged meanwhile)
//!               └─ Err → warn, keep previous translation
//! ```
//!
//! Every document runs in its own tokio task and only ever writes its own
//! id, so a failure in one never reaches another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};

use crate::config::AppConfig;
use crate::services::{EncodedFile, ServiceError, TextExtractor, Translator};
use crate::store::{DocumentId, DocumentStatus, DocumentUpdate, SharedStore, StoreError};

use super::debounce::Debouncer;
use super::upload::{IncomingFile, IngestPolicy, ValidationError};

// ---------------------------------------------------------------------------
// EditError
// ---------------------------------------------------------------------------

/// Why an edit was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// OrchestratorSettings
// ---------------------------------------------------------------------------

/// Tunables taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub policy: IngestPolicy,
    /// Idle time after the last edit before re-translating.
    pub debounce: Duration,
    /// Upper bound on any single extraction or translation call.
    pub request_timeout: Duration,
    /// Drop translations whose source text has been edited since.
    pub discard_stale_translations: bool,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            policy: IngestPolicy::from_config(&config.ingest),
            debounce: config.edit.debounce(),
            request_timeout: config.service.timeout(),
            discard_stale_translations: config.edit.discard_stale_translations,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// A registered upload whose extraction is running in the background.
#[derive(Debug)]
pub struct Ingestion {
    pub id: DocumentId,
    task: JoinHandle<()>,
}

impl Ingestion {
    /// Wait until the extraction task has written its result (or was
    /// aborted by a removal).
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                log::error!("pipeline: extraction task for {} panicked: {e}", self.id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives documents through their lifecycle.
///
/// Cheap to clone; all clones share the same store, services and timers.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use doc_translate::config::AppConfig;
/// use doc_translate::pipeline::{IncomingFile, Orchestrator, OrchestratorSettings};
/// use doc_translate::services::{ApiExtractor, ApiTranslator};
/// use doc_translate::store::new_shared_store;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let orchestrator = Orchestrator::new(
///     new_shared_store(),
///     Arc::new(ApiExtractor::from_config(&config.service)),
///     Arc::new(ApiTranslator::from_config(&config.service)),
///     OrchestratorSettings::from_config(&config),
/// );
///
/// let file = IncomingFile::from_bytes("receipt.jpg", None, std::fs::read("receipt.jpg").unwrap());
/// let ingestion = orchestrator.ingest(file).unwrap();
/// let id = ingestion.id;
/// ingestion.finished().await;
///
/// orchestrator.on_text_edited(id, "नमस्ते संसार").unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    store: SharedStore,
    extractor: Arc<dyn TextExtractor>,
    translator: Arc<dyn Translator>,
    settings: OrchestratorSettings,
    debouncer: Debouncer,
    extractions: Mutex<HashMap<DocumentId, AbortHandle>>,
}

/// Remote calls behind one `extract`: recognition, then the follow-up
/// translation. Each gets its own `request_timeout`.
const CALLS_PER_EXTRACTION: u32 = 2;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Orchestrator {
    /// Create a new orchestrator.
    ///
    /// * `store`: shared document store (also read by the caller).
    /// * `extractor`: extraction service (e.g. `ApiExtractor`).
    /// * `translator`: translation service used on edits (e.g. `ApiTranslator`).
    pub fn new(
        store: SharedStore,
        extractor: Arc<dyn TextExtractor>,
        translator: Arc<dyn Translator>,
        settings: OrchestratorSettings,
    ) -> Self {
        let debouncer = Debouncer::new(settings.debounce);
        Self {
            inner: Arc::new(Inner {
                store,
                extractor,
                translator,
                settings,
                debouncer,
                extractions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Validate and register `file`, then extract it in the background.
    ///
    /// On return the document exists and is `Processing`. A rejected file is
    /// never registered. Must be called within a tokio runtime.
    pub fn ingest(&self, file: IncomingFile) -> Result<Ingestion, ValidationError> {
        if let Err(e) = self.inner.settings.policy.validate(&file) {
            log::warn!("pipeline: rejected upload: {e}");
            return Err(e);
        }

        let store = &self.inner.store;
        let id = store.add_document(&file.meta(), file.file_url.clone());
        log::info!("pipeline: registered {} as {id}", file.name);

        if let Err(e) = store.update_document(id, DocumentUpdate::status(DocumentStatus::Processing)) {
            log::error!("pipeline: could not start extraction for {id}: {e}");
        }

        let inner = Arc::clone(&self.inner);
        let mut extractions = lock(&self.inner.extractions);
        let task = tokio::spawn(async move {
            inner.run_extraction(id, file).await;
            lock(&inner.extractions).remove(&id);
        });
        extractions.insert(id, task.abort_handle());

        Ok(Ingestion { id, task })
    }

    /// Ingest several files at once. Each runs independently; a rejection or
    /// failure of one never affects the others.
    pub fn ingest_batch(
        &self,
        files: impl IntoIterator<Item = IncomingFile>,
    ) -> Vec<Result<Ingestion, ValidationError>> {
        files.into_iter().map(|file| self.ingest(file)).collect()
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Apply a user edit to the extracted text of `id` immediately and
    /// schedule a debounced translation refresh.
    ///
    /// The refresh targets `id` regardless of which document is active.
    pub fn on_text_edited(&self, id: DocumentId, text: impl Into<String>) -> Result<(), EditError> {
        self.inner.store.edit_extracted_text(id, text)?;

        let inner = Arc::clone(&self.inner);
        self.inner
            .debouncer
            .schedule(id, async move { inner.refresh_translation(id).await });
        Ok(())
    }

    /// `true` while a refresh for `id` is waiting for its debounce window.
    pub fn refresh_pending(&self, id: DocumentId) -> bool {
        self.inner.debouncer.is_pending(id)
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Remove `id`, cancelling its pending refresh and in-flight extraction.
    ///
    /// Results of calls that still complete are dropped because the id is
    /// gone and never reused.
    pub fn remove_document(&self, id: DocumentId) -> bool {
        if self.inner.debouncer.cancel(id) {
            log::debug!("pipeline: cancelled pending refresh for {id}");
        }
        if let Some(task) = lock(&self.inner.extractions).remove(&id) {
            task.abort();
            log::debug!("pipeline: aborted extraction for {id}");
        }
        self.inner.store.remove_document(id)
    }
}

impl Inner {
    async fn run_extraction(&self, id: DocumentId, file: IncomingFile) {
        let payload = EncodedFile::encode(&file.name, &file.mime_type, &file.bytes);
        drop(file);

        log::debug!("pipeline: extracting {id} ({})", payload.file_name);

        let deadline = self.settings.request_timeout * CALLS_PER_EXTRACTION;
        let extraction = tokio::time::timeout(deadline, self.extractor.extract(&payload))
            .await
            .unwrap_or(Err(ServiceError::Timeout));

        let update = match extraction {
            Ok(extraction) => {
                log::info!("pipeline: extraction completed for {id}");
                DocumentUpdate::completed(extraction.extracted_text, extraction.translated_text)
            }
            Err(e) => {
                log::error!("pipeline: extraction failed for {id}: {e}");
                DocumentUpdate::failed(e.to_string())
            }
        };

        if let Err(e) = self.store.update_document(id, update) {
            log::debug!("pipeline: dropped extraction result for {id}: {e}");
        }
    }

    async fn refresh_translation(&self, id: DocumentId) {
        let Some(doc) = self.store.document(id) else {
            log::debug!("pipeline: {id} is gone, skipping refresh");
            return;
        };
        let source = doc.extracted_text;

        if source.trim().is_empty() {
            if let Err(e) = self
                .store
                .update_document(id, DocumentUpdate::translated_text(""))
            {
                log::debug!("pipeline: could not clear translation for {id}: {e}");
            }
            return;
        }

        let translated = match self.call(self.translator.translate(&source)).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("pipeline: translation refresh failed for {id}: {e}");
                return;
            }
        };

        let discard_stale = self.settings.discard_stale_translations;
        let result = self.store.update_document_if(
            id,
            |doc| !discard_stale || doc.extracted_text == source,
            DocumentUpdate::translated_text(translated),
        );

        match result {
            Ok(true) => log::debug!("pipeline: translation refreshed for {id}"),
            Ok(false) => log::debug!("pipeline: discarded stale translation for {id}"),
            Err(e) => log::debug!("pipeline: dropped translation for {id}: {e}"),
        }
    }

    /// Bound a single remote call by the configured timeout.
    async fn call<T>(
        &self,
        request: impl std::future::Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        tokio::time::timeout(self.settings.request_timeout, request)
            .await
            .unwrap_or(Err(ServiceError::Timeout))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
