//! Importer API handlers
//!
//! GET /importer/sources, GET /importer/sources/:id, GET /importer/search/:isbn,
//! GET /importer/search, POST /importer/import

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::db::{collections, libraries};
use crate::error::{ApiError, ApiResult, ImportError};
use crate::isbn;
use crate::models::{Dimensions, User};
use crate::projection::{
    self, book_entity, collection, entity, external_book_entities, source_entity, BookAttributes,
    CollectionResponse, Entity, EntityResponse, ExternalBookAttributes, ImporterSourceAttributes,
    ReferenceExpansion,
};
use crate::types::{BookQuery, ExternalBookResult, ExternalContributor, ImporterSource};
use crate::AppState;

type SourceList = Json<CollectionResponse<Entity<ImporterSourceAttributes>>>;
type ExternalBookList = Json<CollectionResponse<Entity<ExternalBookAttributes>>>;

#[derive(Debug, Default, Deserialize)]
pub struct IsbnSearchParams {
    pub sources: Option<String>,
    pub includes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuerySearchParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub sources: Option<String>,
    pub includes: Option<String>,
}

/// POST /importer/import body
///
/// When `title`, `contributors` and `publisher` are all present the book is
/// imported from the body as-is; otherwise it is fetched again from `source`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub id: String,
    pub isbn: String,
    pub collection: String,
    pub source: ImporterSource,
    pub title: Option<String>,
    pub contributors: Option<Vec<ExternalContributor>>,
    pub publisher: Option<String>,
    pub synopsis: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
    pub url: Option<String>,
}

impl ImportRequest {
    /// External result carried by the body, if complete enough to import
    fn inline_result(&self) -> Option<ExternalBookResult> {
        let (Some(title), Some(contributors), Some(publisher)) =
            (&self.title, &self.contributors, &self.publisher)
        else {
            return None;
        };

        let mut result = ExternalBookResult::new(self.id.clone(), self.source, isbn::normalize(&self.isbn), title.clone());
        result.contributors = contributors.clone();
        result.publisher = publisher.clone();
        result.synopsis = self.synopsis.clone().unwrap_or_default();
        result.dimensions = self.dimensions;
        result.cover_url = self.cover_url.clone();
        result.page_count = self.page_count.unwrap_or(0);
        result.url = self.url.clone();

        Some(result)
    }
}

fn parse_sources(raw: Option<&str>) -> ApiResult<HashSet<ImporterSource>> {
    projection::parse_list(raw).map_err(ApiError::BadRequest)
}

fn parse_includes(raw: Option<&str>) -> ApiResult<HashSet<ReferenceExpansion>> {
    projection::parse_list(raw).map_err(ApiError::BadRequest)
}

fn project(
    state: &AppState,
    results: &[ExternalBookResult],
    includes: &HashSet<ReferenceExpansion>,
) -> ApiResult<ExternalBookList> {
    let entities = external_book_entities(results, includes, &state.registry)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(collection(entities)))
}

/// GET /importer/sources
pub async fn list_sources(State(state): State<AppState>) -> SourceList {
    let sources = state.registry.descriptors().into_iter().map(source_entity).collect();
    Json(collection(sources))
}

/// GET /importer/sources/:id
pub async fn get_source(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> ApiResult<Json<EntityResponse<Entity<ImporterSourceAttributes>>>> {
    let descriptor = source_id
        .parse::<ImporterSource>()
        .ok()
        .and_then(|key| state.registry.descriptor(key))
        .ok_or_else(|| ImportError::IdDoesNotExist("Source not found".to_string()))?;

    Ok(Json(entity(source_entity(descriptor))))
}

/// GET /importer/search/:isbn
pub async fn search_by_isbn(
    State(state): State<AppState>,
    Path(raw_isbn): Path<String>,
    Query(params): Query<IsbnSearchParams>,
) -> ApiResult<ExternalBookList> {
    if !isbn::is_valid_isbn(&raw_isbn) {
        return Err(ApiError::BadRequest(format!("Invalid ISBN: {raw_isbn}")));
    }
    let sources = parse_sources(params.sources.as_deref())?;
    let includes = parse_includes(params.includes.as_deref())?;

    let results = state
        .registry
        .search_by_isbn(&isbn::normalize(&raw_isbn), &sources)
        .await;

    project(&state, &results, &includes)
}

/// GET /importer/search?title=&author=&language=
pub async fn search_by_query(
    State(state): State<AppState>,
    Query(params): Query<QuerySearchParams>,
) -> ApiResult<ExternalBookList> {
    let sources = parse_sources(params.sources.as_deref())?;
    let includes = parse_includes(params.includes.as_deref())?;

    let query = BookQuery {
        title: params.title,
        author: params.author,
        language: params.language,
    };
    if query.is_blank() {
        return Ok(Json(collection(Vec::new())));
    }

    let results = state.registry.search_by_query(&query, &sources).await;

    project(&state, &results, &includes)
}

/// POST /importer/import
pub async fn import_book(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<EntityResponse<Entity<BookAttributes>>>> {
    {
        let mut conn = state.db.acquire().await?;

        let collection = collections::find_by_id(&mut conn, &request.collection)
            .await?
            .ok_or_else(|| ImportError::RelationIdDoesNotExist("Collection not found".to_string()))?;
        let library = libraries::find_by_id(&mut conn, &collection.library_id)
            .await?
            .ok_or_else(|| ImportError::RelationIdDoesNotExist("Library not found".to_string()))?;

        if !user.can_access_library(&library) {
            warn!(user_id = %user.id, library_id = %library.id, "Import denied");
            return Err(ImportError::UserDoesNotHaveAccess.into());
        }
    }

    let provider = state
        .registry
        .find(request.source)
        .ok_or_else(|| ImportError::IdDoesNotExist("Source not found".to_string()))?;

    let result = match request.inline_result() {
        Some(result) => result,
        None => {
            info!(source = %request.source, isbn = %request.isbn, "Fetching book from source for import");
            let mut results = provider
                .search_by_isbn(&isbn::normalize(&request.isbn))
                .await
                .map_err(ImportError::from)?;

            match results.iter().position(|r| r.id == request.id) {
                Some(index) => results.swap_remove(index),
                None if !results.is_empty() => results.swap_remove(0),
                None => {
                    return Err(ImportError::IdDoesNotExist("Book not found in the source".to_string()).into())
                }
            }
        }
    };

    let detail = state
        .importer
        .import_to_collection(&request.collection, &result, &user)
        .await?;

    Ok(Json(entity(book_entity(&detail))))
}

pub fn importer_routes() -> Router<AppState> {
    Router::new()
        .route("/importer/sources", get(list_sources))
        .route("/importer/sources/:id", get(get_source))
        .route("/importer/search", get(search_by_query))
        .route("/importer/search/:isbn", get(search_by_isbn))
        .route("/importer/import", post(import_book))
}
