//! Book store backed by a hosted PostgREST-style data API.
//!
//! Rows live in `{url}/rest/v1/{table}`. Filters are sent as query
//! parameters (`isbn=eq.123`, `id=neq.4`) and writes ask for the affected
//! rows back with `Prefer: return=representation`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, Response, StatusCode, Url,
};
use serde::Deserialize;

use super::{BookStore, StoreError};
use crate::{
    config::StoreConfig,
    models::{Book, NewBook},
};

/// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct RestBookStore {
    client: Client,
    endpoint: Url,
}

/// Error body returned by the data API
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl RestBookStore {
    /// Build the client from configuration. Fails when the URL or key is
    /// missing or unusable; no request is made.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| StoreError::Config("Store credentials are missing".to_string()))?;
        let key = config
            .key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| StoreError::Config("Store credentials are missing".to_string()))?;

        let endpoint = Url::parse(&format!(
            "{}/rest/v1/{}",
            url.trim_end_matches('/'),
            config.table
        ))
        .map_err(|e| StoreError::Config(format!("Invalid store URL: {}", e)))?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(key)
            .map_err(|e| StoreError::Config(format!("Invalid store key: {}", e)))?;
        api_key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|e| StoreError::Config(format!("Invalid store key: {}", e)))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Decode the rows of a response, turning error statuses into `StoreError`
    async fn rows(response: Response) -> Result<Vec<Book>, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Vec<Book>>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }

    async fn first_row(response: Response) -> Result<Option<Book>, StoreError> {
        Ok(Self::rows(response).await?.into_iter().next())
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Map an unsuccessful data API response to a store error
fn classify_failure(status: StatusCode, body: &str) -> StoreError {
    let detail: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();

    let unique = match detail.code.as_deref() {
        Some(code) => code == UNIQUE_VIOLATION,
        None => status == StatusCode::CONFLICT,
    };
    if unique {
        return StoreError::UniqueViolation(detail.details.or(detail.message).unwrap_or_default());
    }

    let message = detail
        .message
        .unwrap_or_else(|| body.trim().to_string());
    StoreError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl BookStore for RestBookStore {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("select", "*")])
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("select", "*".to_string()), ("id", eq(id))])
            .send()
            .await?;
        Self::first_row(response).await
    }

    async fn find_by_isbn(&self, isbn: &str, exclude_id: Option<i64>) -> Result<Vec<Book>, StoreError> {
        let mut query = vec![("select", "*".to_string()), ("isbn", eq(isbn))];
        if let Some(id) = exclude_id {
            query.push(("id", format!("neq.{}", id)));
        }

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn insert_book(&self, book: &NewBook) -> Result<Option<Book>, StoreError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Prefer", "return=representation")
            .json(&[book])
            .send()
            .await?;
        Self::first_row(response).await
    }

    async fn update_book(&self, id: i64, book: &NewBook) -> Result<Option<Book>, StoreError> {
        let response = self
            .client
            .patch(self.endpoint.clone())
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(book)
            .send()
            .await?;
        Self::first_row(response).await
    }

    async fn delete_book(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let response = self
            .client
            .delete(self.endpoint.clone())
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        Self::first_row(response).await
    }
}
