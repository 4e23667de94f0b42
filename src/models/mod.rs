//! Data models for the book catalog

pub mod book;

// Re-export commonly used types
pub use book::{validate_book, violations, Book, BookForm, NewBook};
