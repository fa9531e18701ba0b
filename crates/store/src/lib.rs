//! # Catalogue Store
//!
//! Record models for the bookstore back office and the storage collaborator
//! consumed by the lookup engine.
//!
//! ## Core Types
//!
//! - [`Book`], [`Customer`], [`CustomerOrder`]: snapshots of persisted records.
//! - [`BookField`], [`CustomerField`]: the searchable string fields.
//! - [`CatalogStore`]: coarse candidate fetching per field, plus the exact
//!   lookups used by the order-to-customer join.
//! - [`InMemoryStore`]: `RwLock`-guarded implementation, seeded from JSON via
//!   [`CatalogSeed`].
//! - [`PrefilterMode`]: how candidates are narrowed before scoring.
//!
//! ## Example Usage
//!
//! ```
//! use store::{Book, BookField, CatalogStore, InMemoryStore};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let store = InMemoryStore::new();
//! store.insert_book(Book {
//!     book_no: "B001".into(),
//!     title: "Go Programming".into(),
//!     ..Default::default()
//! }).unwrap();
//!
//! let candidates = store.fetch_books(BookField::Title, "Programming").await.unwrap();
//! assert_eq!(candidates.len(), 1);
//! # });
//! ```

mod backend;
mod model;
mod prefilter;
mod seed;

pub use backend::{CatalogStore, InMemoryStore, StoreConfig};
pub use model::{Book, BookField, Customer, CustomerField, CustomerOrder};
pub use prefilter::PrefilterMode;
pub use seed::CatalogSeed;

use thiserror::Error;

/// Errors raised by a [`CatalogStore`] or while seeding one.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("failed to read seed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
