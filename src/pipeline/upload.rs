//! Incoming files and the upload acceptance policy.
//!
//! [`IncomingFile`] is what the upload side hands to the orchestrator: raw
//! bytes plus name, MIME type and a reference URL. It enforces nothing;
//! [`IngestPolicy::validate`] decides whether a file may become a document.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::IngestConfig;
use crate::store::FileMeta;

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Why a file was refused before registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{name} is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("{name} has unsupported type {mime_type}")]
    UnsupportedType { name: String, mime_type: String },
}

/// Why a file on disk could not become an [`IncomingFile`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// IncomingFile
// ---------------------------------------------------------------------------

/// A raw upload.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    /// Declared MIME type. Guessed from `name` when the uploader gave none.
    pub mime_type: String,
    /// Reference to the original bytes (`file://…` or `memory://…`).
    pub file_url: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    /// Wrap in-memory bytes. `mime_type = None` guesses from the file name.
    pub fn from_bytes(name: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime(&name));
        let file_url = format!("memory://{name}");

        Self {
            name,
            mime_type,
            file_url,
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = file_name_of(path);
        let absolute = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());

        Ok(Self {
            mime_type: guess_mime(&name),
            file_url: format!("file://{}", absolute.display()),
            name,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn meta(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size(),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

// ---------------------------------------------------------------------------
// IngestPolicy
// ---------------------------------------------------------------------------

/// Size ceiling and accepted types for uploads.
#[derive(Debug, Clone)]
pub struct IngestPolicy {
    max_file_bytes: u64,
    accepted_types: Vec<String>,
}

impl IngestPolicy {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            accepted_types: config
                .accepted_types
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Accept or refuse `file`. Size is checked first.
    pub fn validate(&self, file: &IncomingFile) -> Result<(), ValidationError> {
        if file.size() > self.max_file_bytes {
            return Err(ValidationError::TooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: self.max_file_bytes,
            });
        }

        // Parameters such as `; charset=…` do not matter for acceptance.
        let essence = file
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if !self.accepted_types.iter().any(|t| *t == essence) {
            return Err(ValidationError::UnsupportedType {
                name: file.name.clone(),
                mime_type: file.mime_type.clone(),
            });
        }

        Ok(())
    }

    /// Read `path` and validate it. The size comes from file metadata, so an
    /// oversized file is refused without being read.
    pub async fn load(&self, path: &Path) -> Result<IncomingFile, LoadError> {
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let size = tokio::fs::metadata(path).await.map_err(io_error)?.len();
        if size > self.max_file_bytes {
            return Err(ValidationError::TooLarge {
                name: file_name_of(path),
                size,
                limit: self.max_file_bytes,
            }
            .into());
        }

        let file = IncomingFile::from_path(path).await.map_err(io_error)?;
        self.validate(&file)?;
        Ok(file)
    }
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    #[test]
    fn guesses_type_from_name() {
        assert_eq!(IncomingFile::from_bytes("a.JPG", None, vec![]).mime_type, "image/jpeg");
        assert_eq!(IncomingFile::from_bytes("a.png", None, vec![]).mime_type, "image/png");
        assert_eq!(
            IncomingFile::from_bytes("scan.pdf", None, vec![]).mime_type,
            "application/pdf"
        );
        assert_eq!(
            IncomingFile::from_bytes("noext", None, vec![]).mime_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn declared_type_wins_over_name() {
        let file = IncomingFile::from_bytes("blob", Some("image/png"), vec![1, 2, 3]);
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.file_url, "memory://blob");
        assert_eq!(file.meta().size_bytes, 3);
    }

    #[test]
    fn accepts_images_and_pdf_within_limit() {
        let policy = IngestPolicy::default();
        for name in ["receipt.jpg", "page.png", "scan.pdf"] {
            let file = IncomingFile::from_bytes(name, None, vec![0; 3 * MB]);
            assert_eq!(policy.validate(&file), Ok(()), "{name}");
        }
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        let policy = IngestPolicy::default();
        let file = IncomingFile::from_bytes("big.png", None, vec![0; 10 * MB]);
        assert!(policy.validate(&file).is_ok());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let policy = IngestPolicy::default();
        let file = IncomingFile::from_bytes("huge.jpg", None, vec![0; 11 * MB]);
        assert_eq!(
            policy.validate(&file),
            Err(ValidationError::TooLarge {
                name: "huge.jpg".into(),
                size: (11 * MB) as u64,
                limit: (10 * MB) as u64,
            })
        );
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let policy = IngestPolicy::default();
        let file = IncomingFile::from_bytes("notes.txt", None, b"hello".to_vec());
        assert!(matches!(
            policy.validate(&file),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn type_parameters_and_case_are_ignored() {
        let policy = IngestPolicy::default();
        let file = IncomingFile::from_bytes("x", Some("Application/PDF; name=x"), vec![]);
        assert!(policy.validate(&file).is_ok());
    }

    fn small_policy() -> IngestPolicy {
        IngestPolicy::from_config(&IngestConfig {
            max_file_bytes: 16,
            ..IngestConfig::default()
        })
    }

    #[tokio::test]
    async fn load_refuses_oversized_file_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.jpg");
        // Sparse: large on paper, nothing written.
        std::fs::File::create(&path)
            .unwrap()
            .set_len(4 * 1024 * 1024 * 1024)
            .unwrap();

        let err = small_policy().load(&path).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Rejected(ValidationError::TooLarge { ref name, size, limit: 16 })
                if name == "huge.jpg" && size == 4 * 1024 * 1024 * 1024
        ));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jpg");

        let err = small_policy().load(&path).await.unwrap_err();
        assert!(matches!(&err, LoadError::Io { path: p, .. } if *p == path));
        assert!(err.to_string().contains("missing.jpg"));
    }

    #[tokio::test]
    async fn load_accepts_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("page.png");
        let text = dir.path().join("notes.txt");
        std::fs::write(&ok, b"png").unwrap();
        std::fs::write(&text, b"txt").unwrap();

        let file = small_policy().load(&ok).await.unwrap();
        assert_eq!(file.mime_type, "image/png");
        assert!(matches!(
            small_policy().load(&text).await,
            Err(LoadError::Rejected(ValidationError::UnsupportedType { .. }))
        ));
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let file = IncomingFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "receipt.jpg");
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.bytes, b"jpeg bytes");
        assert!(file.file_url.starts_with("file://"));
        assert!(file.file_url.ends_with("receipt.jpg"));
    }
}
