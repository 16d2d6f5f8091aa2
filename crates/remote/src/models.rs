//! Wire models mapping to the remote schema.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Table rows
// =============================================================================

/// Row from the `categories` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub name: String,
    pub description: String,
}

/// Row from the `menu_items` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItemRow {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub name: String,
    pub description: String,
    /// Display-formatted price string, not a numeric amount.
    pub price: String,
    /// Public image URL, empty when the item has no image.
    pub image: String,
    pub category_id: Uuid,
}

// =============================================================================
// Insert payloads (server assigns id and created_at)
// =============================================================================

/// Insert payload for `categories`.
#[derive(Clone, Debug, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

/// Insert payload for `menu_items`. The owning category is passed separately
/// so the foreign key is always set explicitly at the call site.
#[derive(Clone, Debug, Serialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
}

// =============================================================================
// Partial updates
// =============================================================================

/// Partial update for a category. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    /// Merge this patch into a row in place.
    pub fn apply_to(&self, row: &mut CategoryRow) {
        if let Some(name) = &self.name {
            row.name = name.clone();
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
    }
}

/// Partial update for a menu item. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MenuItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MenuItemPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image.is_none()
    }

    /// Merge this patch into a row in place.
    pub fn apply_to(&self, row: &mut MenuItemRow) {
        if let Some(name) = &self.name {
            row.name = name.clone();
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
        if let Some(price) = &self.price {
            row.price = price.clone();
        }
        if let Some(image) = &self.image {
            row.image = image.clone();
        }
    }
}

// =============================================================================
// Auth session
// =============================================================================

/// An authenticated session issued by the remote auth service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token attached to privileged requests.
    pub access_token: String,
    /// Token used to obtain a fresh session once this one expires.
    pub refresh_token: Option<String>,
    /// Expiry instant of the access token.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Email of the signed-in account, when the service reports it.
    pub user_email: Option<String>,
}

impl Session {
    /// Whether the access token has expired.
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }
}
