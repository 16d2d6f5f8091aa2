//! Client trait definitions for the remote data service.
//!
//! The rest of the workspace consumes the service exclusively through these
//! traits, so tests substitute an in-memory fake for the HTTP client.

use crate::error::RemoteResult;
use crate::models::{
    CategoryPatch, CategoryRow, MenuItemPatch, MenuItemRow, NewCategory, NewMenuItem, Session,
};
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

/// Session-based authentication.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session>;

    /// Return the current session, or `None` when there is no session or the
    /// existing one has expired.
    async fn get_session(&self) -> RemoteResult<Option<Session>>;

    /// Invalidate the current session.
    async fn sign_out(&self) -> RemoteResult<()>;
}

/// Operations on the `categories` table.
#[async_trait]
pub trait CategoriesApi: Send + Sync {
    /// List all categories, ordered by creation time ascending.
    async fn list_categories(&self) -> RemoteResult<Vec<CategoryRow>>;

    /// Insert a category and return the server-assigned row.
    async fn insert_category(&self, category: &NewCategory) -> RemoteResult<CategoryRow>;

    /// Apply a partial update and return the updated row.
    /// Zero rows matched is `RemoteError::NotFound`, not success.
    async fn update_category(&self, id: Uuid, patch: &CategoryPatch) -> RemoteResult<CategoryRow>;

    /// Delete a row and return it. Zero rows matched is `RemoteError::NotFound`.
    async fn delete_category(&self, id: Uuid) -> RemoteResult<CategoryRow>;
}

/// Operations on the `menu_items` table.
#[async_trait]
pub trait MenuItemsApi: Send + Sync {
    /// List all menu items, ordered by creation time ascending.
    async fn list_menu_items(&self) -> RemoteResult<Vec<MenuItemRow>>;

    /// Insert an item with its foreign key set to `category_id` and return
    /// the server-assigned row. A missing category fails the FK constraint
    /// remotely and surfaces as an error.
    async fn insert_menu_item(
        &self,
        category_id: Uuid,
        item: &NewMenuItem,
    ) -> RemoteResult<MenuItemRow>;

    /// Apply a partial update by item id and return the updated row.
    /// Zero rows matched is `RemoteError::NotFound`, not success.
    async fn update_menu_item(
        &self,
        id: Uuid,
        patch: &MenuItemPatch,
    ) -> RemoteResult<MenuItemRow>;

    /// Delete a row by item id and return it. Zero rows matched is
    /// `RemoteError::NotFound`.
    async fn delete_menu_item(&self, id: Uuid) -> RemoteResult<MenuItemRow>;
}

/// Operations on the image bucket.
#[async_trait]
pub trait BucketApi: Send + Sync {
    /// Upload an object. Never overwrites: an existing key yields
    /// `RemoteError::AlreadyExists`.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> RemoteResult<()>;

    /// Resolve the public URL for an object key.
    fn public_url(&self, key: &str) -> RemoteResult<String>;

    /// Remove objects by key. Unknown keys are not an error.
    async fn remove(&self, keys: &[String]) -> RemoteResult<()>;
}

/// Combined remote data service.
pub trait RemoteService: AuthApi + CategoriesApi + MenuItemsApi + BucketApi {}

impl<T: AuthApi + CategoriesApi + MenuItemsApi + BucketApi + ?Sized> RemoteService for T {}
