//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};

/// Connection settings for the hosted remote data service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Project base URL (e.g., "https://example.supabase.co").
    pub url: String,
    /// Project API key sent with every request.
    /// WARNING: Use the anonymous (publishable) key here; row-level security
    /// on the remote tables is what gates writes, not this key.
    pub api_key: String,
    /// Object-storage bucket holding menu images.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Key prefix inside the bucket for menu item images.
    #[serde(default = "default_image_prefix")]
    pub image_prefix: String,
}

fn default_bucket() -> String {
    "menu-images".to_string()
}

fn default_image_prefix() -> String {
    "menu-items".to_string()
}

impl RemoteConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("remote.url must not be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(format!("remote.url must be an http(s) URL: {}", self.url));
        }
        if self.api_key.trim().is_empty() {
            return Err("remote.api_key must not be empty".to_string());
        }
        if self.bucket.trim().is_empty() {
            return Err("remote.bucket must not be empty".to_string());
        }
        if self.image_prefix.contains('/') {
            return Err(format!(
                "remote.image_prefix must be a single path segment: {}",
                self.image_prefix
            ));
        }
        Ok(())
    }

    /// Create a test configuration pointing at a placeholder project.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: "test-anon-key".to_string(),
            bucket: default_bucket(),
            image_prefix: default_image_prefix(),
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote data service settings.
    pub remote: RemoteConfig,
}

impl AppConfig {
    /// Create a test configuration.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            remote: RemoteConfig::for_testing(),
        }
    }
}
