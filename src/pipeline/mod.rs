//! Ingestion and translation pipeline.
//!
//! This module turns uploads into documents and keeps translations in step
//! with edits. All state lives in the [`DocumentStore`](crate::store::DocumentStore);
//! the pipeline only schedules work and writes results back.
//!
//! # Architecture
//!
//! ```text
//! IncomingFile
//!        │
//!        ▼
//! Orchestrator::ingest()
//!        ├─ IngestPolicy::validate        → ValidationError (nothing stored)
//!        ├─ store.add_document            → Pending
//!        ├─ store.update_document         → Processing
//!        └─ tokio::spawn(extract)         → Completed | Error
//!
//! Orchestrator::on_text_edited()
//!        ├─ store.edit_extracted_text     (immediate)
//!        └─ Debouncer::schedule           → Translator::translate after 1 s idle
//!
//! SharedStore (watch snapshot) ←─── read by the CLI / any subscriber
//! ```

pub mod debounce;
pub mod orchestrator;
pub mod upload;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use debounce::Debouncer;
pub use orchestrator::{EditError, Ingestion, Orchestrator, OrchestratorSettings};
pub use upload::{IncomingFile, IngestPolicy, LoadError, ValidationError};
