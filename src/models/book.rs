//! Book model, form payload and the shared presence validation

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book row as stored in the `books` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// Column values written on insert and on full-replace update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub is_available: bool,
}

impl NewBook {
    /// Payload for a freshly created book; new books are always available
    pub fn for_create(form: &BookForm) -> Self {
        Self {
            title: form.title.clone(),
            author: form.author.clone(),
            isbn: form.isbn.clone(),
            is_available: true,
        }
    }

    /// Payload for an update; availability follows the checkbox
    pub fn for_update(form: &BookForm) -> Self {
        Self {
            title: form.title.clone(),
            author: form.author.clone(),
            isbn: form.isbn.clone(),
            is_available: form.is_available(),
        }
    }
}

/// Submitted create/edit form. Absent text fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BookForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    /// Checkbox value; browsers send `on` when checked and omit it otherwise
    #[serde(default)]
    pub is_available: Option<String>,
}

impl BookForm {
    /// Validated fields, in the order their messages are reported
    const FIELDS: [&'static str; 3] = ["title", "author", "isbn"];

    pub fn is_available(&self) -> bool {
        self.is_available.as_deref() == Some("on")
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            is_available: book.is_available.then(|| "on".to_string()),
        }
    }
}

/// Every violated constraint of `form`, in field order.
pub fn violations(form: &BookForm) -> Vec<String> {
    let errors = match form.validate() {
        Ok(()) => return Vec::new(),
        Err(errors) => errors,
    };
    let fields = errors.field_errors();

    BookForm::FIELDS
        .iter()
        .filter_map(|name| {
            fields.iter().find(|(field, _)| {
                let field: &str = field;
                field == *name
            })
        })
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect()
}

/// Reject `form` with a single message naming every missing field
pub fn validate_book(form: &BookForm) -> AppResult<()> {
    let problems = violations(form);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join(", ")))
    }
}
