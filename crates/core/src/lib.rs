//! Core domain types and shared logic for the Crema menu administration system.
//!
//! This crate defines the canonical types used across all other crates:
//! - Image file validation and object-key generation for uploads
//! - Configuration for the hosted remote data service

pub mod config;
pub mod image;

pub use config::{AppConfig, RemoteConfig};
pub use image::{ImageError, ImageFile};

/// Maximum accepted image upload size: 2 MiB.
pub const MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

/// Filename extensions accepted for image uploads (lowercase).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
