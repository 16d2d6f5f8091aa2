//! Remote data service client for Crema.
//!
//! This crate provides:
//! - Client traits for the hosted backend: auth sessions, the `categories`
//!   and `menu_items` tables, and the image bucket
//! - Wire models shared with the repository layer
//! - An HTTP implementation over reqwest

pub mod error;
pub mod http;
pub mod models;
pub mod traits;

pub use error::{RemoteError, RemoteResult};
pub use http::HttpRemote;
pub use models::{
    CategoryPatch, CategoryRow, MenuItemPatch, MenuItemRow, NewCategory, NewMenuItem, Session,
};
pub use traits::{AuthApi, BucketApi, CategoriesApi, MenuItemsApi, RemoteService};

use crema_core::RemoteConfig;
use std::sync::Arc;

/// Create a remote service client from configuration.
pub fn from_config(config: &RemoteConfig) -> RemoteResult<Arc<dyn RemoteService>> {
    Ok(Arc::new(HttpRemote::new(config)?))
}
