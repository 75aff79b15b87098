//! Import transaction coordinator
//!
//! Turns one chosen [`ExternalBookResult`] into a stored book:
//!
//! 1. Preconditions (no mutation): the collection exists and the code is not
//!    yet used in its library.
//! 2. One transaction: resolve publisher, people and roles, create the book,
//!    then re-read it and stamp the source provider and external id.
//! 3. After commit: emit buffered events, download the cover (best-effort),
//!    re-read the book for the caller.

use shelf_common::config::DuplicateCodeGuard;
use shelf_common::events::{DomainEvent, EventBus};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{self, books, collections};
use crate::error::ImportError;
use crate::isbn;
use crate::models::{BookDetail, MonetaryAmount, NewBook, User};
use crate::services::book_lifecycle;
use crate::services::covers::CoverDownloader;
use crate::services::resolver;
use crate::types::ExternalBookResult;

pub struct ImportService {
    pool: SqlitePool,
    events: EventBus,
    covers: Arc<dyn CoverDownloader>,
    duplicate_guard: DuplicateCodeGuard,
}

impl ImportService {
    pub fn new(
        pool: SqlitePool,
        events: EventBus,
        covers: Arc<dyn CoverDownloader>,
        duplicate_guard: DuplicateCodeGuard,
    ) -> Self {
        Self {
            pool,
            events,
            covers,
            duplicate_guard,
        }
    }

    /// Import `result` into the collection
    ///
    /// Library access must already have been checked for `user`.
    pub async fn import_to_collection(
        &self,
        collection_id: &str,
        result: &ExternalBookResult,
        user: &User,
    ) -> Result<BookDetail, ImportError> {
        let code = isbn::normalize(&result.isbn);

        let library_id = {
            let mut conn = self.pool.acquire().await?;

            let collection = collections::find_by_id(&mut conn, collection_id)
                .await?
                .ok_or_else(|| ImportError::IdDoesNotExist("Collection not found".to_string()))?;

            if books::exists_by_code_in_library(&mut conn, &code, &collection.library_id).await? {
                return Err(duplicate_code(&code));
            }

            collection.library_id
        };

        info!(
            user_id = %user.id,
            collection_id,
            provider = %result.provider,
            source_book_id = %result.id,
            "Importing book"
        );

        let mut events: Vec<DomainEvent> = Vec::new();
        let mut tx = self.pool.begin().await?;

        let publisher =
            resolver::resolve_publisher(&mut *tx, &result.publisher, &library_id, &mut events).await?;
        let contributors =
            resolver::resolve_contributors(&mut *tx, &result.contributors, &library_id, &mut events)
                .await?;

        let price = result.label_price.clone().unwrap_or_else(MonetaryAmount::zero);
        let new_book = NewBook {
            collection_id: collection_id.to_string(),
            contributors,
            publishers: publisher.map(|p| vec![p.id]).unwrap_or_default(),
            code: code.clone(),
            barcode: Some(code.clone()),
            title: result.title.clone(),
            subtitle: result.subtitle.clone(),
            number: result.number.clone(),
            synopsis: result.synopsis.clone(),
            dimensions: result.dimensions.unwrap_or_default(),
            label_price: price.clone(),
            paid_price: price,
            weight: result.weight.unwrap_or_default(),
            page_count: result.page_count,
            is_in_library: true,
            notes: String::new(),
            links: result.links.clone(),
        };

        // Dropping `tx` on any early return rolls everything back
        let created = book_lifecycle::add_book(&mut *tx, new_book, &mut events)
            .await
            .map_err(|e| translate_creation_error(self.duplicate_guard, e, &code))?;

        let mut book = books::find_by_id(&mut *tx, &created.id)
            .await?
            .ok_or_else(|| ImportError::IdDoesNotExist("Book not found".to_string()))?;
        book.source = Some(result.provider);
        book.source_book_id = Some(result.id.clone());
        book_lifecycle::update_book(&mut *tx, &mut book, &mut events).await?;

        tx.commit().await?;
        debug!(book_id = %book.id, events = events.len(), "Import transaction committed");
        self.events.emit_all(events);

        if let Some(url) = result.cover_url() {
            self.covers.download_cover(&book.id, url).await;
        }

        let mut conn = self.pool.acquire().await?;
        let detail = books::find_detail(&mut conn, &book.id)
            .await?
            .ok_or_else(|| ImportError::IdDoesNotExist("Book not found".to_string()))?;

        info!(book_id = %detail.book.id, code = %detail.book.code, "Book imported");

        Ok(detail)
    }
}

fn duplicate_code(code: &str) -> ImportError {
    ImportError::DuplicateCode(format!("A book with the code {code} already exists"))
}

/// Report a lost race on the `(library_id, code)` index per the configured guard
fn translate_creation_error(guard: DuplicateCodeGuard, err: ImportError, code: &str) -> ImportError {
    match err {
        ImportError::Database(ref db_err)
            if guard == DuplicateCodeGuard::Constraint && db::is_unique_violation(db_err) =>
        {
            duplicate_code(code)
        }
        other => other,
    }
}
