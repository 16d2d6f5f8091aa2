//! In-memory stand-in for the hosted data service, with failure injection
//! and call counters.

use async_trait::async_trait;
use bytes::Bytes;
use crema_remote::error::{RemoteError, RemoteResult};
use crema_remote::models::{
    CategoryPatch, CategoryRow, MenuItemPatch, MenuItemRow, NewCategory, NewMenuItem, Session,
};
use crema_remote::traits::{AuthApi, BucketApi, CategoriesApi, MenuItemsApi};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Fake remote backend. Tables and the bucket live in memory; the session is
/// a flag the tests flip. `data_calls` counts table and storage requests,
/// the things that would cross the network for data. Session reads are not
/// counted, matching the real client where the session is process state.
pub struct FakeRemote {
    categories: Mutex<Vec<CategoryRow>>,
    items: Mutex<Vec<MenuItemRow>>,
    objects: Mutex<HashMap<String, usize>>,
    session: Mutex<Option<Session>>,
    clock: AtomicU64,

    // Failure injection.
    pub fail_sign_in: AtomicBool,
    pub fail_sign_out: AtomicBool,
    pub fail_get_session: AtomicBool,
    pub fail_list_categories: AtomicBool,
    pub fail_list_items: AtomicBool,
    pub fail_upload: AtomicBool,
    pub fail_public_url: AtomicBool,
    /// Number of upcoming upload attempts to reject as key collisions.
    pub collide_uploads: AtomicUsize,

    // Observability.
    pub data_calls: AtomicUsize,
    pub upload_attempts: Mutex<Vec<String>>,
}

#[allow(dead_code)] // each test file compiles common/ separately
impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            categories: Mutex::new(Vec::new()),
            items: Mutex::new(Vec::new()),
            objects: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            clock: AtomicU64::new(1),
            fail_sign_in: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            fail_get_session: AtomicBool::new(false),
            fail_list_categories: AtomicBool::new(false),
            fail_list_items: AtomicBool::new(false),
            fail_upload: AtomicBool::new(false),
            fail_public_url: AtomicBool::new(false),
            collide_uploads: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            upload_attempts: Mutex::new(Vec::new()),
        })
    }

    /// A fake with an already-active session, for tests exercising
    /// privileged operations.
    pub fn with_session() -> Arc<Self> {
        let remote = Self::new();
        remote.set_session();
        remote
    }

    pub fn set_session(&self) {
        *self.session.lock().unwrap() = Some(Session {
            access_token: "fake-access-token".to_string(),
            refresh_token: None,
            expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
            user_email: Some("admin@example.com".to_string()),
        });
    }

    pub fn clear_session(&self) {
        *self.session.lock().unwrap() = None;
    }

    /// Monotonic creation timestamps so list ordering is deterministic.
    fn next_created_at(&self) -> OffsetDateTime {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(tick as i64)
    }

    /// Seed a category directly, as if another client had written it.
    pub fn seed_category(&self, name: &str, description: &str) -> CategoryRow {
        let row = CategoryRow {
            id: Uuid::new_v4(),
            created_at: self.next_created_at(),
            name: name.to_string(),
            description: description.to_string(),
        };
        self.categories.lock().unwrap().push(row.clone());
        row
    }

    /// Seed a menu item directly, as if another client had written it.
    pub fn seed_item(&self, category_id: Uuid, name: &str, price: &str) -> MenuItemRow {
        let row = MenuItemRow {
            id: Uuid::new_v4(),
            created_at: self.next_created_at(),
            name: name.to_string(),
            description: String::new(),
            price: price.to_string(),
            image: String::new(),
            category_id,
        };
        self.items.lock().unwrap().push(row.clone());
        row
    }

    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn category_row(&self, id: Uuid) -> Option<CategoryRow> {
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    fn injected(&self, what: &str) -> RemoteError {
        RemoteError::Api {
            status: 500,
            message: format!("injected failure: {what}"),
        }
    }
}

#[async_trait]
impl AuthApi for FakeRemote {
    async fn sign_in_with_password(&self, email: &str, _password: &str) -> RemoteResult<Session> {
        if self.fail_sign_in.load(Ordering::Relaxed) {
            return Err(RemoteError::from_status(
                400,
                "invalid login credentials".to_string(),
            ));
        }
        let session = Session {
            access_token: "fake-access-token".to_string(),
            refresh_token: None,
            expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
            user_email: Some(email.to_string()),
        };
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn get_session(&self) -> RemoteResult<Option<Session>> {
        if self.fail_get_session.load(Ordering::Relaxed) {
            return Err(self.injected("get_session"));
        }
        let session = self.session.lock().unwrap().clone();
        Ok(session.filter(|s| !s.is_expired()))
    }

    async fn sign_out(&self) -> RemoteResult<()> {
        self.session.lock().unwrap().take();
        if self.fail_sign_out.load(Ordering::Relaxed) {
            return Err(self.injected("sign_out"));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoriesApi for FakeRemote {
    async fn list_categories(&self) -> RemoteResult<Vec<CategoryRow>> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_list_categories.load(Ordering::Relaxed) {
            return Err(self.injected("list_categories"));
        }
        let mut rows = self.categories.lock().unwrap().clone();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn insert_category(&self, category: &NewCategory) -> RemoteResult<CategoryRow> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        let row = CategoryRow {
            id: Uuid::new_v4(),
            created_at: self.next_created_at(),
            name: category.name.clone(),
            description: category.description.clone(),
        };
        self.categories.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_category(&self, id: Uuid, patch: &CategoryPatch) -> RemoteResult<CategoryRow> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        let mut rows = self.categories.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                patch.apply_to(row);
                Ok(row.clone())
            }
            None => Err(RemoteError::NotFound(format!("category {id}"))),
        }
    }

    async fn delete_category(&self, id: Uuid) -> RemoteResult<CategoryRow> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        let mut rows = self.categories.lock().unwrap();
        let Some(position) = rows.iter().position(|r| r.id == id) else {
            return Err(RemoteError::NotFound(format!("category {id}")));
        };
        let removed = rows.remove(position);
        // The remote store cascades item deletion over the foreign key.
        self.items.lock().unwrap().retain(|i| i.category_id != id);
        Ok(removed)
    }
}

#[async_trait]
impl MenuItemsApi for FakeRemote {
    async fn list_menu_items(&self) -> RemoteResult<Vec<MenuItemRow>> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_list_items.load(Ordering::Relaxed) {
            return Err(self.injected("list_menu_items"));
        }
        let mut rows = self.items.lock().unwrap().clone();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn insert_menu_item(
        &self,
        category_id: Uuid,
        item: &NewMenuItem,
    ) -> RemoteResult<MenuItemRow> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        let category_exists = self
            .categories
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.id == category_id);
        if !category_exists {
            return Err(RemoteError::Api {
                status: 409,
                message: "insert or update on table \"menu_items\" violates foreign key constraint"
                    .to_string(),
            });
        }

        let row = MenuItemRow {
            id: Uuid::new_v4(),
            created_at: self.next_created_at(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.clone(),
            image: item.image.clone(),
            category_id,
        };
        self.items.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_menu_item(
        &self,
        id: Uuid,
        patch: &MenuItemPatch,
    ) -> RemoteResult<MenuItemRow> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        let mut rows = self.items.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                patch.apply_to(row);
                Ok(row.clone())
            }
            None => Err(RemoteError::NotFound(format!("menu item {id}"))),
        }
    }

    async fn delete_menu_item(&self, id: Uuid) -> RemoteResult<MenuItemRow> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        let mut rows = self.items.lock().unwrap();
        let Some(position) = rows.iter().position(|r| r.id == id) else {
            return Err(RemoteError::NotFound(format!("menu item {id}")));
        };
        Ok(rows.remove(position))
    }
}

#[async_trait]
impl BucketApi for FakeRemote {
    async fn upload(&self, key: &str, data: Bytes, _content_type: &str) -> RemoteResult<()> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        self.upload_attempts.lock().unwrap().push(key.to_string());

        if self.fail_upload.load(Ordering::Relaxed) {
            return Err(self.injected("upload"));
        }
        if self.collide_uploads.load(Ordering::Relaxed) > 0 {
            self.collide_uploads.fetch_sub(1, Ordering::Relaxed);
            return Err(RemoteError::AlreadyExists(key.to_string()));
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) {
            return Err(RemoteError::AlreadyExists(key.to_string()));
        }
        objects.insert(key.to_string(), data.len());
        Ok(())
    }

    fn public_url(&self, key: &str) -> RemoteResult<String> {
        if self.fail_public_url.load(Ordering::Relaxed) {
            return Err(RemoteError::Url("public URLs disabled".to_string()));
        }
        Ok(format!("https://cdn.fake.test/{key}"))
    }

    async fn remove(&self, keys: &[String]) -> RemoteResult<()> {
        self.data_calls.fetch_add(1, Ordering::Relaxed);
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}
