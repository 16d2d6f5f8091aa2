//! Session manager and menu repository for the Crema admin surface.
//!
//! This crate is the core of the system: it tracks authentication state,
//! holds the in-memory projection of the remote menu, and exposes the
//! commands the presentation layer issues. The remote data service is
//! injected as a trait object, so tests run against an in-memory fake.

pub mod error;
pub mod repository;
pub mod session;

pub use error::{MenuError, MenuResult};
pub use repository::{MenuCategory, MenuRepository};
pub use session::{SessionError, SessionManager, SessionState};
