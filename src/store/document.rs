//! Document model and its status state machine.
//!
//! [`DocumentStatus`] drives each document's lifecycle:
//!
//! ```text
//! Pending ──extraction started──▶ Processing
//!                                 ──extraction ok────▶ Completed
//!                                 ──extraction failed─▶ Error(message)
//! Completed ──text edited──▶ Completed   (translation refreshed)
//! Error: terminal
//! ```
//!
//! A [`DocumentUpdate`] is merged into a [`Document`] by
//! [`Document::merged`], which rejects illegal transitions and keeps the
//! translation from outliving its source text.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::StoreError;

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// Opaque, never-reused document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0.simple())
    }
}

// ---------------------------------------------------------------------------
// DocumentStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a document.
///
/// The failure message lives inside [`DocumentStatus::Error`], so a document
/// carries an error message exactly when it is in the error state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Registered, extraction not started yet.
    Pending,
    /// Extraction request in flight.
    Processing,
    /// Extraction succeeded; text may be edited and re-translated.
    Completed,
    /// Extraction failed. Terminal.
    Error(String),
}

impl DocumentStatus {
    /// Whether `self → next` is an edge of the lifecycle graph.
    ///
    /// `Completed → Completed` is allowed so translation refreshes may
    /// restate the status.
    ///
    /// ```
    /// use doc_translate::store::DocumentStatus;
    ///
    /// assert!(DocumentStatus::Pending.can_become(&DocumentStatus::Processing));
    /// assert!(!DocumentStatus::Completed.can_become(&DocumentStatus::Processing));
    /// ```
    pub fn can_become(&self, next: &DocumentStatus) -> bool {
        matches!(
            (self, next),
            (DocumentStatus::Pending, DocumentStatus::Processing)
                | (DocumentStatus::Processing, DocumentStatus::Completed)
                | (DocumentStatus::Processing, DocumentStatus::Error(_))
                | (DocumentStatus::Completed, DocumentStatus::Completed)
        )
    }

    /// `true` while extraction has not finished yet.
    pub fn is_transient(&self) -> bool {
        matches!(self, DocumentStatus::Pending | DocumentStatus::Processing)
    }

    /// Short label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Error(_) => "error",
        }
    }

    /// The failure message when `self` is [`DocumentStatus::Error`].
    pub fn error(&self) -> Option<&str> {
        match self {
            DocumentStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// FileMeta
// ---------------------------------------------------------------------------

/// Display metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One uploaded file and the text derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub file_name: String,
    /// Reference to the original bytes; not owned by the store.
    pub file_url: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub extracted_text: String,
    pub translated_text: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
    /// Creation time, for ordering and display only.
    pub timestamp: DateTime<Utc>,
}

impl Document {
    pub(crate) fn new(meta: &FileMeta, file_url: String) -> Self {
        Self {
            id: DocumentId::new(),
            file_name: meta.name.clone(),
            file_url,
            mime_type: meta.mime_type.clone(),
            size_bytes: meta.size_bytes,
            extracted_text: String::new(),
            translated_text: String::new(),
            status: DocumentStatus::Pending,
            timestamp: Utc::now(),
        }
    }

    /// The failure message, present only in the error state.
    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    /// Build the document that results from applying `update`.
    ///
    /// Fails with [`StoreError::InvalidTransition`] when the update names a
    /// status the current one cannot move to. A blank `extracted_text`
    /// always clears `translated_text`.
    pub(crate) fn merged(&self, update: DocumentUpdate) -> Result<Document, StoreError> {
        let mut next = self.clone();

        if let Some(status) = update.status {
            if !self.status.can_become(&status) {
                return Err(StoreError::InvalidTransition {
                    id: self.id,
                    from: self.status.label(),
                    to: status.label(),
                });
            }
            next.status = status;
        }
        if let Some(text) = update.extracted_text {
            next.extracted_text = text;
        }
        if let Some(text) = update.translated_text {
            next.translated_text = text;
        }
        if next.extracted_text.trim().is_empty() {
            next.translated_text.clear();
        }

        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// DocumentUpdate
// ---------------------------------------------------------------------------

/// Partial set of fields to merge into a document. `None` leaves a field as
/// it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentUpdate {
    pub extracted_text: Option<String>,
    pub translated_text: Option<String>,
    pub status: Option<DocumentStatus>,
}

impl DocumentUpdate {
    pub fn status(status: DocumentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Successful extraction result.
    pub fn completed(extracted_text: impl Into<String>, translated_text: impl Into<String>) -> Self {
        Self {
            extracted_text: Some(extracted_text.into()),
            translated_text: Some(translated_text.into()),
            status: Some(DocumentStatus::Completed),
        }
    }

    /// Failed extraction.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::status(DocumentStatus::Error(message.into()))
    }

    pub fn extracted_text(text: impl Into<String>) -> Self {
        Self {
            extracted_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn translated_text(text: impl Into<String>) -> Self {
        Self {
            translated_text: Some(text.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> FileMeta {
        FileMeta {
            name: "receipt.jpg".into(),
            mime_type: "image/jpeg".into(),
            size_bytes: 3 * 1024 * 1024,
        }
    }

    fn completed_doc(extracted: &str, translated: &str) -> Document {
        let doc = Document::new(&meta(), "memory://receipt.jpg".into());
        doc.merged(DocumentUpdate::status(DocumentStatus::Processing))
            .and_then(|d| d.merged(DocumentUpdate::completed(extracted, translated)))
            .unwrap()
    }

    #[test]
    fn new_document_is_pending_and_empty() {
        let doc = Document::new(&meta(), "memory://receipt.jpg".into());
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert!(doc.extracted_text.is_empty());
        assert!(doc.translated_text.is_empty());
        assert!(doc.error().is_none());
        assert_eq!(doc.file_name, "receipt.jpg");
    }

    #[test]
    fn ids_are_distinct_and_prefixed() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("doc-"));
    }

    #[test]
    fn lifecycle_edges() {
        use DocumentStatus::*;

        assert!(Pending.can_become(&Processing));
        assert!(Processing.can_become(&Completed));
        assert!(Processing.can_become(&Error("x".into())));
        assert!(Completed.can_become(&Completed));

        assert!(!Pending.can_become(&Completed));
        assert!(!Completed.can_become(&Pending));
        assert!(!Completed.can_become(&Processing));
        assert!(!Error("x".into()).can_become(&Processing));
        assert!(!Error("x".into()).can_become(&Completed));
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let doc = Document::new(&meta(), "memory://receipt.jpg".into());
        let err = doc.merged(DocumentUpdate::completed("a", "b")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition { from: "pending", to: "completed", .. }
        ));
    }

    #[test]
    fn failure_carries_message() {
        let doc = Document::new(&meta(), "memory://receipt.jpg".into())
            .merged(DocumentUpdate::status(DocumentStatus::Processing))
            .and_then(|d| d.merged(DocumentUpdate::failed("OCR extraction failed")))
            .unwrap();
        assert_eq!(doc.status.label(), "error");
        assert_eq!(doc.error(), Some("OCR extraction failed"));
    }

    #[test]
    fn blank_extracted_text_clears_translation() {
        let doc = completed_doc("नमस्ते", "Hello");
        let edited = doc.merged(DocumentUpdate::extracted_text("   ")).unwrap();
        assert_eq!(edited.extracted_text, "   ");
        assert!(edited.translated_text.is_empty());
    }

    #[test]
    fn translation_of_blank_text_is_not_kept() {
        let doc = completed_doc("", "");
        let updated = doc.merged(DocumentUpdate::translated_text("orphan")).unwrap();
        assert!(updated.translated_text.is_empty());
    }

    #[test]
    fn serializes_status_and_error_side_by_side() {
        let doc = Document::new(&meta(), "memory://receipt.jpg".into())
            .merged(DocumentUpdate::status(DocumentStatus::Processing))
            .and_then(|d| d.merged(DocumentUpdate::failed("boom")))
            .unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["fileName"], "receipt.jpg");

        let ok = completed_doc("a", "b");
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "completed");
        assert!(json.get("error").is_none());
    }
}
