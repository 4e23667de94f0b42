//! HTTP handlers and router for the book catalog

pub mod books;
pub mod flash;
pub mod health;

use std::any::Any;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, Response},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};

use crate::{error::AppError, services::catalog::CatalogService, AppState};

/// Extractor for the catalog service. Fails closed with a 500 when no
/// store client could be constructed at startup.
pub struct Catalog(pub CatalogService);

#[async_trait]
impl FromRequestParts<AppState> for Catalog {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .services
            .as_ref()
            .map(|services| Catalog(services.catalog.clone()))
            .ok_or(AppError::StoreUnavailable)
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/", get(books::index))
        .route("/book/new", get(books::new_book_form).post(books::create_book))
        .route("/book/:id/update", get(books::edit_book_form).post(books::update_book))
        .route("/book/:id/delete", post(books::delete_book))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_store))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(CompressionLayer::new()),
        )
}

/// Health endpoints answer even without a store client
const STORE_EXEMPT_PATHS: [&str; 2] = ["/health", "/ready"];

/// Every other request, matched or not, fails with a 500 until a restart
/// brings up a store client.
async fn require_store(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let path = request.uri().path();
    if state.services.is_none() && !STORE_EXEMPT_PATHS.iter().any(|exempt| *exempt == path) {
        return Err(AppError::StoreUnavailable);
    }
    Ok(next.run(request).await)
}

async fn not_found() -> AppError {
    AppError::PageNotFound
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
