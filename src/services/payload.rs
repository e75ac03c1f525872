//! Transport encoding for uploaded files.
//!
//! Files travel to the extraction service as a base64 `data:` URL, which
//! chat-completion vision endpoints accept in an `image_url` part.

use base64::Engine;

/// An uploaded file encoded for the extraction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    /// Original file name, for logging and test doubles.
    pub file_name: String,
    pub mime_type: String,
    data_url: String,
}

impl EncodedFile {
    /// Encode `bytes` as `data:<mime>;base64,<payload>`.
    pub fn encode(file_name: &str, mime_type: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            data_url: format!("data:{mime_type};base64,{payload}"),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}
