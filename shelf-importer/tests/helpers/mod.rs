//! Shared fixtures for shelf-importer integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use shelf_common::config::DuplicateCodeGuard;
use shelf_common::events::EventBus;
use shelf_importer::db::{books, images};
use shelf_importer::providers::ProviderRegistry;
use shelf_importer::services::{CoverDownloader, ImportService};
use shelf_importer::types::{
    BookProvider, BookQuery, ExternalBookResult, ExternalContributor, ImporterSource,
    ProviderDescriptor, ProviderError,
};
use shelf_importer::AppState;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const OWNER: &str = "user-owner";
pub const FRIEND: &str = "user-friend";
pub const STRANGER: &str = "user-stranger";
pub const ADMIN: &str = "user-admin";

pub const LIBRARY: &str = "lib-home";
pub const COLLECTION: &str = "col-novels";
pub const OTHER_COLLECTION: &str = "col-stranger";

pub const DUNE_ISBN: &str = "9780441013593";

// ============================================================================
// Providers
// ============================================================================

pub struct TestProvider {
    descriptor: ProviderDescriptor,
    results: Vec<ExternalBookResult>,
    fail: bool,
    pub isbn_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
}

impl TestProvider {
    pub fn new(key: ImporterSource, name: &str, supports_query_search: bool) -> Self {
        Self {
            descriptor: ProviderDescriptor {
                key,
                name: name.to_string(),
                url: format!("https://{}.example", key.as_str().to_lowercase()),
                description: BTreeMap::from([("en-US".to_string(), format!("{name} test source"))]),
                language: "all".to_string(),
                supports_query_search,
            },
            results: Vec::new(),
            fail: false,
            isbn_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(mut self, results: Vec<ExternalBookResult>) -> Self {
        self.results = results;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn isbn_calls(&self) -> usize {
        self.isbn_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> Result<Vec<ExternalBookResult>, ProviderError> {
        if self.fail {
            Err(ProviderError::Network("connection reset".to_string()))
        } else {
            Ok(self.results.clone())
        }
    }
}

#[async_trait]
impl BookProvider for TestProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search_by_isbn(&self, _isbn: &str) -> Result<Vec<ExternalBookResult>, ProviderError> {
        self.isbn_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }

    async fn search_by_query(&self, _query: &BookQuery) -> Result<Vec<ExternalBookResult>, ProviderError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.respond()
    }
}

/// Dune as an Open Library hit
pub fn dune(provider: ImporterSource) -> ExternalBookResult {
    let mut result = ExternalBookResult::new("OL24374150M", provider, DUNE_ISBN, "Dune");
    result.publisher = "Ace Books".to_string();
    result.contributors = vec![
        ExternalContributor::new("Frank Herbert", "Author"),
        ExternalContributor::new("John Schoenherr", "Illustrator"),
    ];
    result.page_count = 896;
    result
}

// ============================================================================
// Covers
// ============================================================================

/// Attaches a placeholder image row instead of downloading
pub struct StubCovers {
    pool: SqlitePool,
    pub requested: Mutex<Vec<String>>,
}

#[async_trait]
impl CoverDownloader for StubCovers {
    async fn download_cover(&self, book_id: &str, url: &str) -> Option<String> {
        self.requested.lock().unwrap().push(url.to_string());

        let image = images::ImageRecord {
            id: format!("img-{book_id}"),
            file_name: format!("books/img-{book_id}.jpg"),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 0,
        };
        let mut conn = self.pool.acquire().await.ok()?;
        images::insert(&mut conn, &image).await.ok()?;
        books::set_cover(&mut conn, book_id, &image.id).await.ok()?;
        Some(image.id)
    }
}

// ============================================================================
// App
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub covers: Arc<StubCovers>,
    pub events: EventBus,
}

impl TestApp {
    pub async fn new(providers: Vec<Arc<TestProvider>>) -> Self {
        Self::with_guard(providers, DuplicateCodeGuard::Constraint).await
    }

    pub async fn with_guard(providers: Vec<Arc<TestProvider>>, guard: DuplicateCodeGuard) -> Self {
        let pool = shelf_common::db::init_memory_database()
            .await
            .expect("Failed to create in-memory database");
        seed(&pool).await;

        let registry = Arc::new(ProviderRegistry::new(
            providers
                .into_iter()
                .map(|p| p as Arc<dyn BookProvider>)
                .collect(),
        ));
        let events = EventBus::new(100);
        let covers = Arc::new(StubCovers {
            pool: pool.clone(),
            requested: Mutex::new(Vec::new()),
        });
        let importer = Arc::new(ImportService::new(
            pool.clone(),
            events.clone(),
            covers.clone(),
            guard,
        ));

        let state = AppState::new(pool.clone(), registry, importer);

        Self {
            router: shelf_importer::build_router(state),
            pool,
            covers,
            events,
        }
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-user-id", user)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

async fn seed(pool: &SqlitePool) {
    for (id, is_admin) in [(OWNER, false), (FRIEND, false), (STRANGER, false), (ADMIN, true)] {
        sqlx::query("INSERT INTO users (id, username, is_admin) VALUES (?, ?, ?)")
            .bind(id)
            .bind(id)
            .bind(is_admin)
            .execute(pool)
            .await
            .unwrap();
    }

    for (library, owner, collection) in [(LIBRARY, OWNER, COLLECTION), ("lib-stranger", STRANGER, OTHER_COLLECTION)] {
        sqlx::query("INSERT INTO libraries (id, name, owner_id) VALUES (?, ?, ?)")
            .bind(library)
            .bind(library)
            .bind(owner)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO collections (id, name, library_id) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(collection)
            .bind(library)
            .execute(pool)
            .await
            .unwrap();
    }

    sqlx::query("INSERT INTO library_shares (library_id, user_id) VALUES (?, ?)")
        .bind(LIBRARY)
        .bind(FRIEND)
        .execute(pool)
        .await
        .unwrap();
}
