//! File Encoder: turns an uploaded résumé into the base64 payload sent inline to the model.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// A file selected by the user, held in memory until it is encoded.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub filename: String,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    /// Reads a file from disk, inferring its media type from the extension.
    pub async fn read(path: &Path) -> Result<Self, EncodingError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| EncodingError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cv.pdf".to_string());

        Ok(Self::new(bytes, media_type_for(path), filename))
    }

    pub fn encode(&self) -> EncodedPayload {
        EncodedPayload::new(STANDARD.encode(&self.bytes), self.media_type.clone())
            .with_file_name(self.filename.clone())
    }
}

/// Base64 text plus its media type. Never carries a data-URL prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    data: String,
    media_type: String,
    file_name: Option<String>,
}

impl EncodedPayload {
    pub fn new(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        let data: String = data.into();
        let data = if data.starts_with("data:") {
            strip_data_url_prefix(&data).to_string()
        } else {
            data
        };
        Self {
            data,
            media_type: media_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Name of the file the payload was encoded from, when known.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Length of the encoded text, in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    pub fn decode(&self) -> Result<Vec<u8>, EncodingError> {
        Ok(STANDARD.decode(self.data.as_bytes())?)
    }
}

/// Strips a `data:<media type>;base64,` prefix as produced by browser file readers.
pub fn strip_data_url_prefix(data: &str) -> &str {
    if !data.starts_with("data:") {
        return data;
    }
    match data.find(";base64,") {
        Some(idx) => &data[idx + ";base64,".len()..],
        None => data,
    }
}

/// Whether a path would be read as a PDF.
pub fn is_pdf_path(path: &Path) -> bool {
    media_type_for(path) == PDF_MEDIA_TYPE
}

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("txt") => "text/plain",
        // Same fallback as the browser client when the type is unknown.
        _ => PDF_MEDIA_TYPE,
    }
}
