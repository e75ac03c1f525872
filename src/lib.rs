//! OCR and translation pipeline for scanned Nepali / Sinhalese documents.
//!
//! * [`store`]: documents, their lifecycle and the active selection.
//! * [`pipeline`]: upload validation, extraction and debounced re-translation.
//! * [`services`]: extraction / translation services over a chat endpoint.
//! * [`export`]: writes translations to disk.
//! * [`config`]: TOML settings and platform paths.

pub mod config;
pub mod export;
pub mod pipeline;
pub mod services;
pub mod store;
