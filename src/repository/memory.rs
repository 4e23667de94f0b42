//! In-process book store

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookStore, StoreError};
use crate::models::{Book, NewBook};

#[derive(Default)]
struct Rows {
    last_id: i64,
    books: Vec<Book>,
}

/// Keeps rows in memory and enforces ISBN uniqueness the way the hosted
/// table's unique constraint does.
#[derive(Default)]
pub struct MemoryBookStore {
    rows: RwLock<Rows>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.rows.read().await.books.clone())
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.books.iter().find(|b| b.id == id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str, exclude_id: Option<i64>) -> Result<Vec<Book>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .books
            .iter()
            .filter(|b| b.isbn == isbn && Some(b.id) != exclude_id)
            .cloned()
            .collect())
    }

    async fn insert_book(&self, book: &NewBook) -> Result<Option<Book>, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.books.iter().any(|b| b.isbn == book.isbn) {
            return Err(StoreError::UniqueViolation(book.isbn.clone()));
        }

        rows.last_id += 1;
        let created = Book {
            id: rows.last_id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            is_available: book.is_available,
        };
        rows.books.push(created.clone());
        Ok(Some(created))
    }

    async fn update_book(&self, id: i64, book: &NewBook) -> Result<Option<Book>, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.books.iter().any(|b| b.isbn == book.isbn && b.id != id) {
            return Err(StoreError::UniqueViolation(book.isbn.clone()));
        }

        Ok(rows.books.iter_mut().find(|b| b.id == id).map(|row| {
            row.title = book.title.clone();
            row.author = book.author.clone();
            row.isbn = book.isbn.clone();
            row.is_available = book.is_available;
            row.clone()
        }))
    }

    async fn delete_book(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let mut rows = self.rows.write().await;
        let position = rows.books.iter().position(|b| b.id == id);
        Ok(position.map(|idx| rows.books.remove(idx)))
    }
}
