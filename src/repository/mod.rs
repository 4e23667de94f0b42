//! Repository layer: row-store clients for the `books` collection

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Book, NewBook};

pub use memory::MemoryBookStore;
pub use rest::RestBookStore;

/// Failures reported by a row-store client
#[derive(Error, Debug)]
pub enum StoreError {
    /// The client could not be constructed (missing or malformed credentials)
    #[error("{0}")]
    Config(String),

    #[error("Data API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Data API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The store rejected a write because the ISBN is already taken
    #[error("Duplicate ISBN {0}")]
    UniqueViolation(String),

    /// A write or delete came back without the affected row
    #[error("{0}")]
    NoRowsAffected(String),
}

/// CRUD access to the hosted `books` table.
///
/// Writes return the affected row, or `None` when the store reports that
/// nothing was written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Select every row. No ordering is guaranteed.
    async fn list_books(&self) -> Result<Vec<Book>, StoreError>;

    async fn get_book(&self, id: i64) -> Result<Option<Book>, StoreError>;

    /// Rows whose `isbn` equals `isbn`, skipping `exclude_id` when given
    async fn find_by_isbn(&self, isbn: &str, exclude_id: Option<i64>) -> Result<Vec<Book>, StoreError>;

    async fn insert_book(&self, book: &NewBook) -> Result<Option<Book>, StoreError>;

    /// Full replacement of the row's editable columns
    async fn update_book(&self, id: i64, book: &NewBook) -> Result<Option<Book>, StoreError>;

    async fn delete_book(&self, id: i64) -> Result<Option<Book>, StoreError>;
}
