//! The document store: single owner of every document and of the active
//! selection.
//!
//! State is kept as an immutable [`StoreSnapshot`] behind a
//! `tokio::sync::watch` channel. Every mutation derives a new snapshot from
//! the previous one and swaps it in while holding the channel's lock, so each
//! call is atomic for readers and observers only ever see whole states.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use super::document::{Document, DocumentId, DocumentUpdate, FileMeta};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors reported by [`DocumentStore`] mutations.
///
/// A failed mutation leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No document with this id is in the collection.
    #[error("document {0} not found")]
    NotFound(DocumentId),

    /// The update asked for a status change the lifecycle does not allow.
    #[error("document {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: DocumentId,
        from: &'static str,
        to: &'static str,
    },

    /// User edits are only accepted once extraction has completed.
    #[error("document {id} is {status}; only completed documents can be edited")]
    NotEditable { id: DocumentId, status: &'static str },
}

// ---------------------------------------------------------------------------
// StoreSnapshot
// ---------------------------------------------------------------------------

/// Immutable view of the collection and the active selection.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    documents: Vec<Document>,
    active: Option<DocumentId>,
}

impl StoreSnapshot {
    /// Documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active.and_then(|id| self.document(id))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// `true` while any document is still pending or being extracted.
    pub fn is_processing(&self) -> bool {
        self.documents.iter().any(|doc| doc.status.is_transient())
    }

    fn position(&self, id: DocumentId) -> Option<usize> {
        self.documents.iter().position(|doc| doc.id == id)
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Single-writer container for all documents.
///
/// Shared as [`SharedStore`]; never hand out references into it, callers get
/// clones or snapshots.
#[derive(Debug)]
pub struct DocumentStore {
    state: watch::Sender<Arc<StoreSnapshot>>,
}

/// Thread-safe handle to the [`DocumentStore`]. Cheap to clone.
pub type SharedStore = Arc<DocumentStore>;

/// Construct a new, empty [`SharedStore`].
pub fn new_shared_store() -> SharedStore {
    Arc::new(DocumentStore::new())
}

impl DocumentStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(StoreSnapshot::default()));
        Self { state }
    }

    /// Current state. The returned snapshot never changes; call again to see
    /// later updates.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.state.borrow())
    }

    /// Receive a notification with every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.state.subscribe()
    }

    /// Register a new `Pending` document, append it and make it active.
    pub fn add_document(&self, meta: &FileMeta, file_url: impl Into<String>) -> DocumentId {
        let doc = Document::new(meta, file_url.into());
        let id = doc.id;

        self.state.send_modify(|state| {
            let mut documents = state.documents.clone();
            documents.push(doc);
            *state = Arc::new(StoreSnapshot {
                documents,
                active: Some(id),
            });
        });

        log::debug!("store: added {id} ({})", meta.name);
        id
    }

    /// Merge `update` into the document `id`.
    pub fn update_document(&self, id: DocumentId, update: DocumentUpdate) -> Result<(), StoreError> {
        self.update_document_if(id, |_| true, update).map(|_| ())
    }

    /// Merge `update` into `id` only if `guard` accepts the current document.
    ///
    /// Returns `Ok(false)` when the guard refused; the check and the write
    /// happen under the same lock.
    pub fn update_document_if<G>(
        &self,
        id: DocumentId,
        guard: G,
        update: DocumentUpdate,
    ) -> Result<bool, StoreError>
    where
        G: FnOnce(&Document) -> bool,
    {
        let mut outcome = Err(StoreError::NotFound(id));

        self.state.send_if_modified(|state| {
            let Some(index) = state.position(id) else {
                return false;
            };
            if !guard(&state.documents[index]) {
                outcome = Ok(false);
                return false;
            }
            match state.documents[index].merged(update) {
                Ok(doc) => {
                    let mut documents = state.documents.clone();
                    documents[index] = doc;
                    *state = Arc::new(StoreSnapshot {
                        documents,
                        active: state.active,
                    });
                    outcome = Ok(true);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        outcome
    }

    /// Replace the extracted text of a completed document (the user-edit
    /// transition `completed → completed`).
    pub fn edit_extracted_text(&self, id: DocumentId, text: impl Into<String>) -> Result<(), StoreError> {
        let mut status = None;
        let applied = self.update_document_if(
            id,
            |doc| {
                status = Some(doc.status.label());
                doc.status == super::DocumentStatus::Completed
            },
            DocumentUpdate::extracted_text(text),
        )?;

        if applied {
            Ok(())
        } else {
            Err(StoreError::NotEditable {
                id,
                status: status.unwrap_or("unknown"),
            })
        }
    }

    /// Select `id` as the active document. Unknown ids are rejected and the
    /// selection stays as it was.
    pub fn set_active_document(&self, id: DocumentId) -> Result<(), StoreError> {
        let mut outcome = Err(StoreError::NotFound(id));

        self.state.send_if_modified(|state| {
            if state.position(id).is_none() {
                return false;
            }
            outcome = Ok(());
            if state.active == Some(id) {
                return false;
            }
            *state = Arc::new(StoreSnapshot {
                documents: state.documents.clone(),
                active: Some(id),
            });
            true
        });

        outcome
    }

    /// The active document, if any.
    pub fn active_document(&self) -> Option<Document> {
        self.state.borrow().active_document().cloned()
    }

    pub fn document(&self, id: DocumentId) -> Option<Document> {
        self.state.borrow().document(id).cloned()
    }

    /// All documents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.state.borrow().documents.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.state.borrow().is_processing()
    }

    /// Remove `id`. Clears the selection if it was active. Returns `false`
    /// when there was nothing to remove.
    pub fn remove_document(&self, id: DocumentId) -> bool {
        let removed = self.state.send_if_modified(|state| {
            if state.position(id).is_none() {
                return false;
            }
            let documents = state
                .documents
                .iter()
                .filter(|doc| doc.id != id)
                .cloned()
                .collect();
            let active = state.active.filter(|active| *active != id);
            *state = Arc::new(StoreSnapshot { documents, active });
            true
        });

        if removed {
            log::debug!("store: removed {id}");
        }
        removed
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
