//! Binary-to-text encoding for user-supplied assets.
//!
//! The remote service takes images as base64 text plus a separate media type.
//! Nothing here enforces a size limit; the service's own request limits are
//! the effective bound.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Media type used when a file's type cannot be determined.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A binary asset encoded for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Base64 payload, without any `data:` prefix.
    pub data: String,
    /// The asset's declared media type (e.g. `image/jpeg`).
    pub mime_type: String,
}

impl EncodedImage {
    /// Render as a `data:` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.data)
    }
}

/// Read a file and encode its full contents.
///
/// The media type is the one declared by the file's extension.
///
/// # Errors
///
/// Returns [`Error::Read`] if the file is missing, unreadable, a directory, or empty.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::read(path, e.to_string()))?;
    if bytes.is_empty() {
        return Err(Error::read(path, "file is empty"));
    }

    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME_TYPE);
    debug!(path = %path.display(), mime_type, size = bytes.len(), "encoded file");

    Ok(encode_bytes(&bytes, mime_type))
}

/// Encode raw bytes with the given media type.
#[must_use]
pub fn encode_bytes(bytes: &[u8], mime_type: &str) -> EncodedImage {
    EncodedImage {
        data: STANDARD.encode(bytes),
        mime_type: mime_type.to_string(),
    }
}

/// Split a possibly prefixed payload into `(payload, declared media type)`.
///
/// Text without a `data:<mime>;base64,` prefix is returned unchanged with no
/// media type.
#[must_use]
pub fn strip_data_url(text: &str) -> (&str, Option<&str>) {
    let Some(rest) = text.strip_prefix("data:") else {
        return (text, None);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return (text, None);
    };
    let mime = header
        .split(';')
        .next()
        .filter(|m| !m.is_empty() && *m != "base64");
    (payload, mime)
}

/// Build a `data:` URL from a media type and base64 payload.
#[must_use]
pub fn to_data_url(mime_type: &str, payload: &str) -> String {
    format!("data:{mime_type};base64,{payload}")
}

/// Decode a base64 `data:` URL into `(media type, bytes)`.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if the text is not a base64 data URL.
pub fn decode_data_url(text: &str) -> Result<(String, Vec<u8>)> {
    let is_base64 = text
        .split_once(',')
        .is_some_and(|(header, _)| header.ends_with(";base64"));
    if !is_base64 {
        return Err(Error::malformed("not a base64 data URL"));
    }

    let (payload, mime) = strip_data_url(text);
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::malformed(format!("invalid base64 payload: {e}")))?;
    Ok((mime.unwrap_or(FALLBACK_MIME_TYPE).to_string(), bytes))
}
