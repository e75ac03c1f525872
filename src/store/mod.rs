//! Document store: the single source of truth for documents and the active
//! selection.
//!
//! * [`Document`] / [`DocumentStatus`]: one unit of work and its lifecycle.
//! * [`DocumentUpdate`]: partial update merged by the store.
//! * [`DocumentStore`] / [`SharedStore`]: owns the collection; every
//!   mutation goes through it.
//! * [`StoreSnapshot`]: immutable view handed to readers and subscribers.
//!
//! # Quick start
//!
//! ```rust
//! use doc_translate::store::{new_shared_store, DocumentStatus, DocumentUpdate, FileMeta};
//!
//! let store = new_shared_store();
//! let meta = FileMeta {
//!     name: "receipt.jpg".into(),
//!     mime_type: "image/jpeg".into(),
//!     size_bytes: 3 * 1024 * 1024,
//! };
//! let id = store.add_document(&meta, "memory://receipt.jpg");
//! store
//!     .update_document(id, DocumentUpdate::status(DocumentStatus::Processing))
//!     .unwrap();
//! assert_eq!(store.active_document().unwrap().status, DocumentStatus::Processing);
//! ```

pub mod collection;
pub mod document;

pub use collection::{new_shared_store, DocumentStore, SharedStore, StoreError, StoreSnapshot};
pub use document::{Document, DocumentId, DocumentStatus, DocumentUpdate, FileMeta};
