//! Book catalog pages: list, create, update and delete.
//!
//! Operation failures never escape these handlers. They become an error
//! status message plus a fallback page (empty list, redisplayed form, or a
//! redirect to the list).

use axum::{
    extract::{rejection::PathRejection, Path},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;

use super::{
    flash::{self, FlashMessage},
    Catalog,
};
use crate::{
    error::{AppError, AppResult},
    models::BookForm,
    views,
};

/// Ids that are not non-negative integers do not match any route
fn book_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    match path {
        Ok(Path(id)) if id >= 0 => Ok(id),
        _ => Err(AppError::PageNotFound),
    }
}

/// User-facing text for a failed operation. Expected outcomes carry their
/// own message; store faults are prefixed with what was being attempted.
fn failure_message(action: &str, err: &AppError) -> String {
    match err {
        AppError::Validation(msg) | AppError::Conflict(msg) | AppError::NotFound(msg) => msg.clone(),
        other => format!("{}: {}", action, other),
    }
}

fn redirect_to_list(jar: SignedCookieJar, message: FlashMessage) -> Response {
    (flash::push(jar, message), Redirect::to("/")).into_response()
}

/// Render a page with pending messages plus `extra`
fn render(
    jar: SignedCookieJar,
    extra: Option<FlashMessage>,
    page: impl FnOnce(&[FlashMessage]) -> String,
) -> Response {
    let (jar, mut messages) = flash::take(jar);
    messages.extend(extra);
    (jar, Html(page(&messages))).into_response()
}

/// GET / - list all books
pub async fn index(Catalog(catalog): Catalog, jar: SignedCookieJar) -> Response {
    let (books, problem) = match catalog.list_books().await {
        Ok(books) => (books, None),
        Err(e) => {
            tracing::warn!("Listing books failed: {}", e);
            (Vec::new(), Some(FlashMessage::error(format!("Error fetching books: {}", e))))
        }
    };

    render(jar, problem, |messages| views::index(&books, messages))
}

/// GET /book/new - empty create form
pub async fn new_book_form(_catalog: Catalog, jar: SignedCookieJar) -> Response {
    render(jar, None, |messages| views::create_form(&BookForm::default(), messages))
}

/// POST /book/new - create a book
pub async fn create_book(
    Catalog(catalog): Catalog,
    jar: SignedCookieJar,
    Form(form): Form<BookForm>,
) -> Response {
    match catalog.create_book(&form).await {
        Ok(book) => redirect_to_list(
            jar,
            FlashMessage::success(format!("Successfully added \"{}\" to the library!", book.title)),
        ),
        Err(e) => {
            tracing::warn!(isbn = %form.isbn, "Creating book failed: {}", e);
            let problem = FlashMessage::error(failure_message("Error adding book", &e));
            render(jar, Some(problem), |messages| views::create_form(&form, messages))
        }
    }
}

/// GET /book/{id}/update - edit form with the stored values
pub async fn edit_book_form(
    Catalog(catalog): Catalog,
    path: Result<Path<i64>, PathRejection>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let id = book_id(path)?;

    match catalog.get_book(id).await {
        Ok(book) => {
            let form = BookForm::from(&book);
            Ok(render(jar, None, |messages| views::edit_form(book.id, &form, messages)))
        }
        Err(e) => {
            tracing::warn!(book_id = id, "Loading book failed: {}", e);
            Ok(redirect_to_list(
                jar,
                FlashMessage::error(failure_message("Error accessing book", &e)),
            ))
        }
    }
}

/// POST /book/{id}/update - apply an update
pub async fn update_book(
    Catalog(catalog): Catalog,
    path: Result<Path<i64>, PathRejection>,
    jar: SignedCookieJar,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    let id = book_id(path)?;

    let existing = match catalog.get_book(id).await {
        Ok(book) => book,
        Err(e) => {
            tracing::warn!(book_id = id, "Loading book failed: {}", e);
            return Ok(redirect_to_list(
                jar,
                FlashMessage::error(failure_message("Error accessing book", &e)),
            ));
        }
    };

    match catalog.update_book(existing.id, &form).await {
        Ok(book) => Ok(redirect_to_list(
            jar,
            FlashMessage::success(format!("Successfully updated \"{}\"!", book.title)),
        )),
        Err(e) => {
            tracing::warn!(book_id = id, isbn = %form.isbn, "Updating book failed: {}", e);
            let problem = FlashMessage::error(failure_message("Error updating book", &e));
            Ok(render(jar, Some(problem), |messages| {
                views::edit_form(existing.id, &form, messages)
            }))
        }
    }
}

/// POST /book/{id}/delete - delete a book
pub async fn delete_book(
    Catalog(catalog): Catalog,
    path: Result<Path<i64>, PathRejection>,
    jar: SignedCookieJar,
) -> AppResult<Response> {
    let id = book_id(path)?;

    let message = match catalog.delete_book(id).await {
        Ok(book) => FlashMessage::success(format!(
            "Successfully deleted \"{}\" from the library.",
            book.title
        )),
        Err(e) => {
            tracing::warn!(book_id = id, "Deleting book failed: {}", e);
            FlashMessage::error(failure_message("Error deleting book", &e))
        }
    };

    Ok(redirect_to_list(jar, message))
}
