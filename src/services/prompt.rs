//! Prompt builder for the extraction and translation calls.
//!
//! [`PromptBuilder`] produces two kinds of prompt:
//! * **Extraction** (`extraction`): instruction sent alongside the scanned
//!   image or PDF.
//! * **Translation** (`translation`): `(system_msg, user_msg)` pair wrapping
//!   the text to translate.
//!
//! The source and target language names are chosen at construction time and
//! spliced into the instructions verbatim.

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds extraction and translation prompts.
///
/// # Example
/// ```rust
/// use doc_translate::services::PromptBuilder;
///
/// let builder = PromptBuilder::new("Nepali or Sinhalese", "English");
/// let (system, user) = builder.translation("नमस्ते");
/// assert!(system.contains("English"));
/// assert!(user.ends_with("नमस्ते"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    source_languages: String,
    target_language: String,
}

impl PromptBuilder {
    pub fn new(source_languages: &str, target_language: &str) -> Self {
        Self {
            source_languages: source_languages.to_string(),
            target_language: target_language.to_string(),
        }
    }

    /// Instruction accompanying the image payload.
    pub fn extraction(&self) -> String {
        format!(
            "Extract all text from this image. The text may be in {}. \
             Return the extracted text as-is, preserving line breaks and formatting. \
             Do not add any explanations or commentary.",
            self.source_languages
        )
    }

    /// Build a **(system_msg, user_msg)** pair asking for a translation of
    /// `text`.
    pub fn translation(&self, text: &str) -> (String, String) {
        let system_msg = format!(
            "You are a translator. Reply with ONLY the {} translation, \
             keeping the line structure of the input. No explanations.",
            self.target_language
        );
        let user_msg = format!(
            "Translate the following text (which may be in {}) to {}:\n\n{}",
            self.source_languages, self.target_language, text
        );
        (system_msg, user_msg)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
