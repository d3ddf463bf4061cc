use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Images larger than this are not previewed.
pub const MAX_PREVIEW_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("image too large for preview ({actual} bytes, max {max_bytes})")]
    TooLarge { max_bytes: u64, actual: u64 },
}

/// MIME type guessed from the file extension.
pub fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Read an image and return it as a data URL.
pub async fn decode_preview(path: &Path, mime: &str) -> Result<String, PreviewError> {
    let read_error = |err: std::io::Error| PreviewError::Read {
        path: path.display().to_string(),
        message: err.to_string(),
    };
    let len = tokio::fs::metadata(path).await.map_err(read_error)?.len();
    if len > MAX_PREVIEW_BYTES {
        return Err(PreviewError::TooLarge {
            max_bytes: MAX_PREVIEW_BYTES,
            actual: len,
        });
    }
    let bytes = tokio::fs::read(path).await.map_err(read_error)?;
    Ok(encode_data_url(mime, &bytes))
}
