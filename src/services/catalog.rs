//! Catalog management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{validate_book, Book, BookForm, NewBook},
    repository::{BookStore, StoreError},
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn BookStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// All books, in whatever order the store returns them
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.store.list_books().await?)
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.store
            .get_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ID {} not found", id)))
    }

    /// Create a new book. The ISBN must not be in use by any other book.
    pub async fn create_book(&self, form: &BookForm) -> AppResult<Book> {
        validate_book(form)?;

        let conflict = || AppError::Conflict(format!("Book with ISBN {} already exists", form.isbn));

        if !self.store.find_by_isbn(&form.isbn, None).await?.is_empty() {
            return Err(conflict());
        }

        let created = self
            .store
            .insert_book(&NewBook::for_create(form))
            .await
            .map_err(|e| unique_as_conflict(e, conflict))?
            .ok_or_else(|| StoreError::NoRowsAffected("Failed to add book to database".to_string()))?;

        tracing::info!(book_id = created.id, isbn = %created.isbn, "Catalog: book created");
        Ok(created)
    }

    /// Replace title, author, ISBN and availability of book `id`.
    /// Keeping the book's own ISBN is not a conflict.
    pub async fn update_book(&self, id: i64, form: &BookForm) -> AppResult<Book> {
        validate_book(form)?;

        let conflict = || AppError::Conflict(format!("Another book with ISBN {} already exists", form.isbn));

        if !self.store.find_by_isbn(&form.isbn, Some(id)).await?.is_empty() {
            return Err(conflict());
        }

        let updated = self
            .store
            .update_book(id, &NewBook::for_update(form))
            .await
            .map_err(|e| unique_as_conflict(e, conflict))?
            .ok_or_else(|| StoreError::NoRowsAffected("Failed to update book in database".to_string()))?;

        tracing::info!(book_id = id, isbn = %updated.isbn, "Catalog: book updated");
        Ok(updated)
    }

    /// Delete book `id`, returning the removed row
    pub async fn delete_book(&self, id: i64) -> AppResult<Book> {
        let existing = self.get_book(id).await?;

        let deleted = self
            .store
            .delete_book(id)
            .await?
            .ok_or_else(|| StoreError::NoRowsAffected("Failed to delete book from database".to_string()))?;

        tracing::info!(book_id = id, "Catalog: book deleted");
        Ok(Book {
            title: existing.title,
            ..deleted
        })
    }
}

/// The store's unique constraint catches what the pre-write check races past
fn unique_as_conflict(err: StoreError, conflict: impl FnOnce() -> AppError) -> AppError {
    match err {
        StoreError::UniqueViolation(_) => conflict(),
        other => other.into(),
    }
}
