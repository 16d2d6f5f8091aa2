//! Image file validation and object-key generation for uploads.
//!
//! Validation is pure and synchronous: a rejected file never reaches the
//! remote storage layer. Object keys are randomized so uploads for identically
//! named files cannot clash; the retry key mixes in a timestamp to stay
//! distinguishable from the first attempt.

use crate::{ALLOWED_IMAGE_EXTENSIONS, MAX_IMAGE_BYTES};
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Image validation errors.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("file size {size} exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("unsupported content type: {0} (only image uploads are accepted)")]
    UnsupportedContentType(String),

    #[error("filename has no extension: {0}")]
    MissingExtension(String),

    #[error("unsupported file extension: {0} (allowed: jpg, jpeg, png, gif, webp)")]
    UnsupportedExtension(String),
}

/// An image file selected for upload, as received from the caller.
#[derive(Clone, Debug)]
pub struct ImageFile {
    /// Original filename, used only to derive the extension.
    pub name: String,
    /// Declared MIME content type.
    pub content_type: String,
    /// File payload.
    pub bytes: Bytes,
}

impl ImageFile {
    /// Create an image file from its parts.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Validate size, content type, and extension.
    ///
    /// Returns the lowercased extension on success. Checks run in a fixed
    /// order: size first, then content type, then extension.
    pub fn validate(&self) -> Result<String, ImageError> {
        if self.size() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge {
                size: self.size(),
                max: MAX_IMAGE_BYTES,
            });
        }

        if !self.content_type.starts_with("image/") {
            return Err(ImageError::UnsupportedContentType(self.content_type.clone()));
        }

        let ext = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| ImageError::MissingExtension(self.name.clone()))?;

        if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImageError::UnsupportedExtension(ext));
        }

        Ok(ext)
    }
}

/// Build the first-attempt object key: `<prefix>/<uuid>.<ext>`.
pub fn object_key(prefix: &str, ext: &str) -> String {
    format!("{}/{}.{}", prefix, Uuid::new_v4(), ext)
}

/// Build the retry object key after a name collision:
/// `<prefix>/<uuid>_<unix-millis>.<ext>`.
///
/// A fresh 128-bit identifier already makes a second collision negligible;
/// the timestamp keeps the retry name distinguishable from the first attempt
/// in bucket listings and logs.
pub fn retry_object_key(prefix: &str, ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{}/{}_{}.{}", prefix, Uuid::new_v4(), millis, ext)
}
