//! Menu repository: an in-memory projection of the remote menu, plus the
//! commands that mutate it.
//!
//! The projection is a strict cache of server-confirmed state. Mutations call
//! the remote first and patch the projection from the returned row; a failed
//! remote call leaves the projection untouched. `fetch_all` rebuilds the
//! whole projection from two ordered queries.

use crate::error::{MenuError, MenuResult};
use bytes::Bytes;
use crema_core::image::{self, ImageFile};
use crema_remote::{
    AuthApi, BucketApi, CategoriesApi, CategoryPatch, CategoryRow, MenuItemPatch, MenuItemRow,
    MenuItemsApi, NewCategory, NewMenuItem, RemoteService,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A category with its items, as projected from the remote store.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuCategory {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub name: String,
    pub description: String,
    /// Items ordered by creation time. Empty when the category has none,
    /// never absent.
    pub items: Vec<MenuItemRow>,
}

impl MenuCategory {
    fn from_row(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            name: row.name,
            description: row.description,
            items: Vec::new(),
        }
    }
}

/// Repository over the remote menu tables and image bucket.
///
/// Overlapping calls are not serialized: two concurrent updates for the same
/// row race, and the last response to resolve wins in the projection. The
/// projection lock is never held across a remote call.
pub struct MenuRepository {
    remote: Arc<dyn RemoteService>,
    image_prefix: String,
    categories: RwLock<Vec<MenuCategory>>,
}

impl MenuRepository {
    /// Create a repository over the given remote service. `image_prefix` is
    /// the bucket key prefix for uploaded menu images (e.g. "menu-items").
    pub fn new(remote: Arc<dyn RemoteService>, image_prefix: impl Into<String>) -> Self {
        Self {
            remote,
            image_prefix: image_prefix.into(),
            categories: RwLock::new(Vec::new()),
        }
    }

    /// Cloned snapshot of the projection for rendering.
    pub async fn categories(&self) -> Vec<MenuCategory> {
        self.categories.read().await.clone()
    }

    /// Gate for mutating operations: a fresh session check on every call
    /// rather than trust in cached state. An errored check is treated as
    /// unauthorized (and logged), not surfaced as a remote fault.
    async fn require_session(&self) -> MenuResult<()> {
        match self.remote.get_session().await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(MenuError::Unauthorized),
            Err(err) => {
                tracing::warn!(error = %err, "session check failed, refusing operation");
                Err(MenuError::Unauthorized)
            }
        }
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Rebuild the projection from the remote store. Requires no session:
    /// the public site reads the menu through this same path.
    ///
    /// Both queries must succeed; any failure leaves the projection as it
    /// was.
    pub async fn fetch_all(&self) -> MenuResult<()> {
        let categories = self.remote.list_categories().await?;
        let items = self.remote.list_menu_items().await?;

        let joined = join_menu(categories, items);
        *self.categories.write().await = joined;
        Ok(())
    }

    // =========================================================================
    // Category commands
    // =========================================================================

    /// Insert a category and append it to the projection.
    pub async fn add_category(&self, category: NewCategory) -> MenuResult<MenuCategory> {
        self.require_session().await?;

        let row = self.remote.insert_category(&category).await?;
        tracing::info!(category_id = %row.id, name = %row.name, "category added");

        let entry = MenuCategory::from_row(row);
        self.categories.write().await.push(entry.clone());
        Ok(entry)
    }

    /// Partially update a category. The projection entry is patched from the
    /// server-returned row; its items are untouched.
    pub async fn update_category(&self, id: Uuid, patch: &CategoryPatch) -> MenuResult<()> {
        self.require_session().await?;

        let row = self.remote.update_category(id, patch).await?;
        tracing::info!(category_id = %id, "category updated");

        let mut categories = self.categories.write().await;
        if let Some(category) = categories.iter_mut().find(|c| c.id == id) {
            category.name = row.name;
            category.description = row.description;
        }
        Ok(())
    }

    /// Delete a category. The projection entry and its nested items go with
    /// it; remote cascade behavior is the store's responsibility.
    pub async fn delete_category(&self, id: Uuid) -> MenuResult<()> {
        self.require_session().await?;

        self.remote.delete_category(id).await?;
        tracing::info!(category_id = %id, "category deleted");

        self.categories.write().await.retain(|c| c.id != id);
        Ok(())
    }

    // =========================================================================
    // Item commands
    // =========================================================================

    /// Insert an item under a category and append the returned row to that
    /// category's items. A category unknown to the remote store fails its
    /// foreign-key constraint and nothing changes locally.
    pub async fn add_menu_item(
        &self,
        category_id: Uuid,
        item: NewMenuItem,
    ) -> MenuResult<MenuItemRow> {
        self.require_session().await?;

        let row = self.remote.insert_menu_item(category_id, &item).await?;
        tracing::info!(item_id = %row.id, category_id = %category_id, "menu item added");

        let mut categories = self.categories.write().await;
        if let Some(category) = categories.iter_mut().find(|c| c.id == category_id) {
            category.items.push(row.clone());
        } else {
            // Remote accepted the insert but the projection has no such
            // category; the next fetch_all reconciles.
            tracing::warn!(category_id = %category_id, "inserted item under a category missing from the projection");
        }
        Ok(row)
    }

    /// Partially update an item. The remote update filters by item id alone;
    /// `category_id` only locates the local list to patch.
    pub async fn update_menu_item(
        &self,
        category_id: Uuid,
        item_id: Uuid,
        patch: &MenuItemPatch,
    ) -> MenuResult<()> {
        self.require_session().await?;

        let row = self.remote.update_menu_item(item_id, patch).await?;
        tracing::info!(item_id = %item_id, "menu item updated");

        let mut categories = self.categories.write().await;
        if let Some(item) = categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .and_then(|c| c.items.iter_mut().find(|i| i.id == item_id))
        {
            *item = row;
        }
        Ok(())
    }

    /// Delete an item and drop it from its category's items. Siblings are
    /// untouched.
    pub async fn delete_menu_item(&self, category_id: Uuid, item_id: Uuid) -> MenuResult<()> {
        self.require_session().await?;

        self.remote.delete_menu_item(item_id).await?;
        tracing::info!(item_id = %item_id, "menu item deleted");

        let mut categories = self.categories.write().await;
        if let Some(category) = categories.iter_mut().find(|c| c.id == category_id) {
            category.items.retain(|i| i.id != item_id);
        }
        Ok(())
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Validate and upload an image, returning its public URL.
    ///
    /// The object key is randomized; on a reported name collision the upload
    /// is retried exactly once under a timestamp-disambiguated key. The
    /// projection is not touched: the caller attaches the URL to an item
    /// via `add_menu_item`/`update_menu_item`.
    pub async fn upload_image(&self, file: &ImageFile) -> MenuResult<String> {
        self.require_session().await?;

        let ext = file.validate()?;
        let key = image::object_key(&self.image_prefix, &ext);

        match self.upload_object(&key, file).await {
            Ok(()) => self.resolve_public_url(&key),
            Err(MenuError::Remote(err)) if err.is_collision() => {
                let retry_key = image::retry_object_key(&self.image_prefix, &ext);
                tracing::warn!(key = %key, retry_key = %retry_key, "object key collision, retrying once");
                self.upload_object(&retry_key, file).await?;
                self.resolve_public_url(&retry_key)
            }
            Err(err) => Err(err),
        }
    }

    async fn upload_object(&self, key: &str, file: &ImageFile) -> MenuResult<()> {
        self.remote
            .upload(key, Bytes::clone(&file.bytes), &file.content_type)
            .await
            .map_err(MenuError::from)
    }

    fn resolve_public_url(&self, key: &str) -> MenuResult<String> {
        match self.remote.public_url(key) {
            Ok(url) if !url.is_empty() => Ok(url),
            Ok(_) => Err(MenuError::UrlResolution(key.to_string())),
            Err(err) => {
                tracing::error!(key = %key, error = %err, "uploaded object has no public URL");
                Err(MenuError::UrlResolution(key.to_string()))
            }
        }
    }

    /// Remove an uploaded image. Accepts the stored public URL (or any
    /// `/`-separated path) and derives the object key from its trailing
    /// segment. An empty `path` is a silent no-op.
    pub async fn delete_image(&self, path: &str) -> MenuResult<()> {
        self.require_session().await?;

        if path.is_empty() {
            return Ok(());
        }

        let key = path.rsplit('/').next().unwrap_or_default();
        if key.is_empty() {
            return Err(MenuError::UrlResolution(path.to_string()));
        }

        self.remote
            .remove(&[format!("{}/{}", self.image_prefix, key)])
            .await?;
        tracing::info!(key = %key, "image removed");
        Ok(())
    }
}

/// Join items under their categories by `category_id`, preserving the
/// creation-time order of both inputs. Items referencing an unknown category
/// are dropped from the projection (and logged); they reappear once their
/// category does.
fn join_menu(categories: Vec<CategoryRow>, items: Vec<MenuItemRow>) -> Vec<MenuCategory> {
    let mut joined: Vec<MenuCategory> = categories.into_iter().map(MenuCategory::from_row).collect();

    for item in items {
        match joined.iter_mut().find(|c| c.id == item.category_id) {
            Some(category) => category.items.push(item),
            None => {
                tracing::warn!(
                    item_id = %item.id,
                    category_id = %item.category_id,
                    "menu item references an unknown category, dropped from projection"
                );
            }
        }
    }
    joined
}
