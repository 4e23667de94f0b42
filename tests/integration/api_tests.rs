//! API integration tests
//!
//! Drive the full router in process over an in-memory book store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use book_catalog::{
    api,
    config::StoreBackend,
    models::{Book, NewBook},
    repository::{BookStore, MemoryBookStore, StoreError},
    AppConfig, AppState,
};

/// Minimal browser: remembers the flash cookie between requests
struct TestClient {
    router: Router,
    cookie: Option<String>,
}

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

impl TestClient {
    fn with_store(store: Option<Arc<dyn BookStore>>) -> Self {
        Self {
            router: api::router(AppState::new(AppConfig::default(), store)),
            cookie: None,
        }
    }

    /// Client over a fresh in-memory store, returned alongside for inspection
    fn memory() -> (Self, Arc<MemoryBookStore>) {
        let store = Arc::new(MemoryBookStore::new());
        let shared: Arc<dyn BookStore> = store.clone();
        (Self::with_store(Some(shared)), store)
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<&[(&str, &str)]>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie.clone());
        }

        let body = match form {
            Some(fields) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                let encoded: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                Body::from(encoded.join("&"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().trim();
            if pair.ends_with('=') {
                self.cookie = None;
            } else {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send(Method::POST, uri, Some(form)).await
    }
}

async fn seed(store: &MemoryBookStore, title: &str, isbn: &str) -> i64 {
    store
        .insert_book(&NewBook {
            title: title.to_string(),
            author: "Someone".to_string(),
            isbn: isbn.to_string(),
            is_available: true,
        })
        .await
        .unwrap()
        .unwrap()
        .id
}

/// Store whose data API is down: every call fails except the row lookup,
/// so handlers reach the write they are attempting
struct FailingStore {
    panic_on_list: bool,
}

impl FailingStore {
    fn outage() -> StoreError {
        StoreError::Api {
            status: 503,
            message: "down".to_string(),
        }
    }
}

#[async_trait]
impl BookStore for FailingStore {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        if self.panic_on_list {
            panic!("row decoding blew up");
        }
        Err(Self::outage())
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(Some(Book {
            id,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            isbn: "123".to_string(),
            is_available: true,
        }))
    }

    async fn find_by_isbn(&self, _isbn: &str, _exclude_id: Option<i64>) -> Result<Vec<Book>, StoreError> {
        Err(Self::outage())
    }

    async fn insert_book(&self, _book: &NewBook) -> Result<Option<Book>, StoreError> {
        Err(Self::outage())
    }

    async fn update_book(&self, _id: i64, _book: &NewBook) -> Result<Option<Book>, StoreError> {
        Err(Self::outage())
    }

    async fn delete_book(&self, _id: i64) -> Result<Option<Book>, StoreError> {
        Err(Self::outage())
    }
}

fn failing_client(panic_on_list: bool) -> TestClient {
    TestClient::with_store(Some(Arc::new(FailingStore { panic_on_list })))
}

fn assert_redirects_to_list(response: &TestResponse) {
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_create_book_then_list_it() {
    let (mut client, store) = TestClient::memory();

    let response = client
        .post("/book/new", &[("title", "Dune"), ("author", "Herbert"), ("isbn", "123")])
        .await;
    assert_redirects_to_list(&response);

    let rows = store.list_books().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Dune");
    assert_eq!(rows[0].author, "Herbert");
    assert_eq!(rows[0].isbn, "123");
    assert!(rows[0].is_available);

    let page = client.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("<td>Dune</td>"));
    assert!(page.body.contains("Successfully added &quot;Dune&quot; to the library!"));

    // The status message is shown once
    let page = client.get("/").await;
    assert!(!page.body.contains("Successfully added"));
}

#[tokio::test]
async fn test_create_duplicate_isbn_is_rejected() {
    let (mut client, store) = TestClient::memory();
    client
        .post("/book/new", &[("title", "Dune"), ("author", "Herbert"), ("isbn", "123")])
        .await;

    let response = client
        .post("/book/new", &[("title", "Messiah"), ("author", "Herbert"), ("isbn", "123")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Book with ISBN 123 already exists"));
    // Submitted values are shown again
    assert!(response.body.contains(r#"value="Messiah""#));

    assert_eq!(store.list_books().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_with_missing_fields_names_each_one() {
    let (mut client, store) = TestClient::memory();

    let response = client.post("/book/new", &[("title", "Dune"), ("author", "")]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Author is required, ISBN is required"));
    assert!(response.body.contains(r#"value="Dune""#));

    let response = client.post("/book/new", &[]).await;
    assert!(response
        .body
        .contains("Title is required, Author is required, ISBN is required"));

    assert!(store.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_form_shows_stored_values() {
    let (mut client, store) = TestClient::memory();
    let id = seed(&store, "Dune", "123").await;

    let response = client.get(&format!("/book/{}/update", id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"value="Dune""#));
    assert!(response.body.contains(r#"name="is_available" checked"#));
}

#[tokio::test]
async fn test_update_to_another_books_isbn_is_rejected() {
    let (mut client, store) = TestClient::memory();
    let x = seed(&store, "Dune", "111").await;
    seed(&store, "Emma", "222").await;

    let response = client
        .post(
            &format!("/book/{}/update", x),
            &[("title", "Dune"), ("author", "Herbert"), ("isbn", "222"), ("is_available", "on")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Another book with ISBN 222 already exists"));
    assert!(response.body.contains(r#"value="222""#));

    let stored = store.get_book(x).await.unwrap().unwrap();
    assert_eq!(stored.isbn, "111");
}

#[tokio::test]
async fn test_update_keeping_own_isbn_succeeds() {
    let (mut client, store) = TestClient::memory();
    let x = seed(&store, "Dune", "111").await;

    // Checkbox omitted: the book becomes unavailable
    let response = client
        .post(
            &format!("/book/{}/update", x),
            &[("title", "Dune+Messiah"), ("author", "Herbert"), ("isbn", "111")],
        )
        .await;
    assert_redirects_to_list(&response);

    let stored = store.get_book(x).await.unwrap().unwrap();
    assert_eq!(stored.title, "Dune Messiah");
    assert!(!stored.is_available);

    let page = client.get("/").await;
    assert!(page.body.contains("Successfully updated &quot;Dune Messiah&quot;!"));
    assert!(page.body.contains("Checked out"));
}

#[tokio::test]
async fn test_update_missing_book_redirects_without_mutation() {
    let (mut client, store) = TestClient::memory();
    seed(&store, "Dune", "111").await;

    let response = client.get("/book/99/update").await;
    assert_redirects_to_list(&response);

    let response = client
        .post("/book/99/update", &[("title", "X"), ("author", "Y"), ("isbn", "999")])
        .await;
    assert_redirects_to_list(&response);

    let page = client.get("/").await;
    assert!(page.body.contains("Book with ID 99 not found"));

    let rows = store.list_books().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].isbn, "111");
}

#[tokio::test]
async fn test_delete_book() {
    let (mut client, store) = TestClient::memory();
    let id = seed(&store, "Dune", "123").await;
    let keep = seed(&store, "Emma", "456").await;

    let response = client.post(&format!("/book/{}/delete", id), &[]).await;
    assert_redirects_to_list(&response);

    let page = client.get("/").await;
    assert!(page.body.contains("Successfully deleted &quot;Dune&quot; from the library."));
    assert!(!page.body.contains(&format!(r#"id="book-{}""#, id)));
    assert!(page.body.contains(&format!(r#"id="book-{}""#, keep)));
}

#[tokio::test]
async fn test_delete_missing_book() {
    let (mut client, store) = TestClient::memory();
    seed(&store, "Dune", "123").await;

    let response = client.post("/book/42/delete", &[]).await;
    assert_redirects_to_list(&response);

    let page = client.get("/").await;
    assert!(page.body.contains("Book with ID 42 not found"));
    assert_eq!(store.list_books().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_routes_are_not_found() {
    let (mut client, store) = TestClient::memory();
    seed(&store, "Dune", "123").await;

    let response = client.get("/nowhere").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Page not found"));

    let response = client.get("/book/abc/update").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // Negative ids are not ids
    let response = client.get("/book/-1/update").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let response = client.post("/book/-1/delete", &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(store.list_books().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_failure_shows_empty_list_with_message() {
    let mut client = failing_client(false);

    let page = client.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Error fetching books: Data API returned 503: down"));
    assert!(!page.body.contains(r#"id="book-"#));
}

#[tokio::test]
async fn test_create_failure_redisplays_form() {
    let mut client = failing_client(false);

    let response = client
        .post("/book/new", &[("title", "Dune"), ("author", "Herbert"), ("isbn", "123")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Error adding book: Data API returned 503: down"));
    assert!(response.body.contains(r#"value="Dune""#));
}

#[tokio::test]
async fn test_update_failure_redisplays_form() {
    let mut client = failing_client(false);

    let response = client
        .post(
            "/book/7/update",
            &[("title", "Dune+Messiah"), ("author", "Herbert"), ("isbn", "456")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Error updating book: Data API returned 503: down"));
    assert!(response.body.contains(r#"value="Dune Messiah""#));
    assert!(response.body.contains(r#"action="/book/7/update""#));
}

#[tokio::test]
async fn test_delete_failure_redirects_with_message() {
    let mut client = failing_client(false);

    let response = client.post("/book/7/delete", &[]).await;
    assert_redirects_to_list(&response);

    let page = client.get("/").await;
    assert!(page.body.contains("Error deleting book: Data API returned 503: down"));
}

#[tokio::test]
async fn test_handler_panic_is_a_generic_server_error() {
    let mut client = failing_client(true);

    let response = client.get("/").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.contains("Internal server error"));
    assert!(!response.body.contains("row decoding blew up"));
}

#[tokio::test]
async fn test_missing_store_fails_closed() {
    let router = api::router(AppState::new(AppConfig::default(), None));

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Database connection failed"));

    // Unmatched routes fail closed too, before routing
    for uri in ["/nowhere", "/book/abc/update", "/book/new"] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
    }

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains(r#""store":"rest""#));
}

#[tokio::test]
async fn test_ready_reports_store_backend() {
    let mut config = AppConfig::default();
    config.store.backend = StoreBackend::Memory;
    let store: Arc<dyn BookStore> = Arc::new(MemoryBookStore::new());
    let router = api::router(AppState::new(config, Some(store)));

    let response = router
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains(r#""status":"ready""#));
    assert!(body.contains(r#""store":"memory""#));
}
