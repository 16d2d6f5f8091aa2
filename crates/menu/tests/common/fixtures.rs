//! Test fixtures for image payloads.

use bytes::Bytes;
use crema_core::ImageFile;

/// Build an image file with a zero-filled payload of the given size.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn image_file(name: &str, content_type: &str, len: usize) -> ImageFile {
    ImageFile::new(name, content_type, Bytes::from(vec![0u8; len]))
}

/// A small valid PNG upload.
#[allow(dead_code)]
pub fn small_png(name: &str) -> ImageFile {
    image_file(name, "image/png", 16 * 1024)
}
