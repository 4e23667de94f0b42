//! Book Catalog
//!
//! A small library catalog web application: list, create, update and delete
//! book records kept in a hosted `books` table behind an HTTP data API.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repository::BookStore;
use services::Services;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when the store client could not be constructed at startup
    pub services: Option<Arc<Services>>,
    /// Signs the flash cookie
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, store: Option<Arc<dyn BookStore>>) -> Self {
        let cookie_key = Key::from(&Sha512::digest(config.session.secret.as_bytes()));

        Self {
            config: Arc::new(config),
            services: store.map(|store| Arc::new(Services::new(store))),
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
