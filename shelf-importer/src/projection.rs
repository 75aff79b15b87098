//! Response projection
//!
//! Pure mapping from domain values to the JSON envelope the boundary returns.
//! No I/O: provider expansion reads descriptors from the in-memory registry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{BookDetail, BookLinks, Dimensions, MonetaryAmount, Weight};
use crate::providers::ProviderRegistry;
use crate::types::{ExternalBookResult, ExternalContributor, ImporterSource, ProviderDescriptor};

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EntityResponse<T> {
    pub result: &'static str,
    pub response: &'static str,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse<T> {
    pub result: &'static str,
    pub response: &'static str,
    pub data: Vec<T>,
}

pub fn entity<T>(data: T) -> EntityResponse<T> {
    EntityResponse {
        result: "OK",
        response: "ENTITY",
        data,
    }
}

pub fn collection<T>(data: Vec<T>) -> CollectionResponse<T> {
    CollectionResponse {
        result: "OK",
        response: "COLLECTION",
        data,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    ImporterSource,
    ExternalBook,
    Book,
    Library,
    Collection,
    Publisher,
    Contributor,
    Cover,
}

#[derive(Debug, Serialize)]
pub struct Entity<A> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub attributes: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<Relationship>>,
}

#[derive(Debug, Serialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

impl Relationship {
    fn new(id: impl Into<String>, kind: EntityType) -> Self {
        Self {
            id: id.into(),
            kind,
            attributes: None,
        }
    }
}

// ============================================================================
// Query parameters
// ============================================================================

/// Related data a caller can ask to be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceExpansion {
    ImporterSource,
}

impl FromStr for ReferenceExpansion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "importer_source" => Ok(ReferenceExpansion::ImporterSource),
            other => Err(format!("Unknown expansion: {other}")),
        }
    }
}

/// Parse a comma-separated query parameter; absent or empty means an empty set
pub fn parse_list<T>(raw: Option<&str>) -> Result<HashSet<T>, String>
where
    T: FromStr<Err = String> + Eq + Hash,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::parse)
        .collect()
}

// ============================================================================
// Importer sources and external books
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImporterSourceAttributes {
    pub name: String,
    pub description: BTreeMap<String, String>,
    pub language: String,
    pub url: String,
    pub supports_query_search: bool,
}

impl From<&ProviderDescriptor> for ImporterSourceAttributes {
    fn from(descriptor: &ProviderDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            language: descriptor.language.clone(),
            url: descriptor.url.clone(),
            supports_query_search: descriptor.supports_query_search,
        }
    }
}

pub fn source_entity(descriptor: &ProviderDescriptor) -> Entity<ImporterSourceAttributes> {
    Entity {
        id: descriptor.key.to_string(),
        kind: EntityType::ImporterSource,
        attributes: descriptor.into(),
        relationships: None,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalBookAttributes {
    pub isbn: String,
    pub title: String,
    pub subtitle: String,
    pub number: String,
    pub contributors: Vec<ExternalContributor>,
    pub publisher: String,
    pub synopsis: String,
    pub dimensions: Option<Dimensions>,
    pub label_price: Option<MonetaryAmount>,
    pub weight: Option<Weight>,
    pub page_count: i32,
    pub url: Option<String>,
    pub cover_url: Option<String>,
    pub links: BookLinks,
}

/// Expanded provider missing from the registry
#[derive(Debug, Error)]
#[error("Importer source {0} is not registered")]
pub struct UnknownSource(pub ImporterSource);

/// External book entity; `descriptor` embeds the provider's attributes
pub fn external_book_entity(
    result: &ExternalBookResult,
    descriptor: Option<&ProviderDescriptor>,
) -> Entity<ExternalBookAttributes> {
    let mut source = Relationship::new(result.provider.to_string(), EntityType::ImporterSource);
    source.attributes = descriptor.and_then(|d| {
        serde_json::to_value(ImporterSourceAttributes::from(d)).ok()
    });

    Entity {
        id: result.id.clone(),
        kind: EntityType::ExternalBook,
        attributes: ExternalBookAttributes {
            isbn: result.isbn.clone(),
            title: result.title.clone(),
            subtitle: result.subtitle.clone(),
            number: result.number.clone(),
            contributors: result.contributors.clone(),
            publisher: result.publisher.clone(),
            synopsis: result.synopsis.clone(),
            dimensions: result.dimensions,
            label_price: result.label_price.clone(),
            weight: result.weight,
            page_count: result.page_count,
            url: result.url.clone(),
            cover_url: result.cover_url().map(str::to_string),
            links: result.links.clone(),
        },
        relationships: Some(vec![source]),
    }
}

/// Project aggregated search results, expanding providers when requested
///
/// Fails if an expanded result names a provider the registry does not hold.
pub fn external_book_entities(
    results: &[ExternalBookResult],
    includes: &HashSet<ReferenceExpansion>,
    registry: &ProviderRegistry,
) -> Result<Vec<Entity<ExternalBookAttributes>>, UnknownSource> {
    let expand = includes.contains(&ReferenceExpansion::ImporterSource);

    results
        .iter()
        .map(|result| {
            let descriptor = if expand {
                Some(
                    registry
                        .descriptor(result.provider)
                        .ok_or(UnknownSource(result.provider))?,
                )
            } else {
                None
            };
            Ok(external_book_entity(result, descriptor))
        })
        .collect()
}

// ============================================================================
// Books
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAttributes {
    pub code: String,
    pub barcode: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub number: String,
    pub synopsis: String,
    pub dimensions: Dimensions,
    pub label_price: MonetaryAmount,
    pub paid_price: MonetaryAmount,
    pub weight: Weight,
    pub page_count: i32,
    pub is_in_library: bool,
    pub notes: String,
    pub links: BookLinks,
    pub source: Option<ImporterSource>,
    pub source_book_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn book_entity(detail: &BookDetail) -> Entity<BookAttributes> {
    let book = &detail.book;

    let mut relationships = vec![
        Relationship::new(book.library_id.clone(), EntityType::Library),
        Relationship::new(book.collection_id.clone(), EntityType::Collection),
    ];
    relationships.extend(
        detail
            .publisher_ids
            .iter()
            .map(|id| Relationship::new(id.clone(), EntityType::Publisher)),
    );
    relationships.extend(detail.contributors.iter().map(|c| Relationship {
        id: c.id.clone(),
        kind: EntityType::Contributor,
        attributes: Some(serde_json::json!({"person": c.person_id, "role": c.role_id})),
    }));
    if let Some(image_id) = &book.cover_image_id {
        relationships.push(Relationship::new(image_id.clone(), EntityType::Cover));
    }

    Entity {
        id: book.id.clone(),
        kind: EntityType::Book,
        attributes: BookAttributes {
            code: book.code.clone(),
            barcode: book.barcode.clone(),
            title: book.title.clone(),
            subtitle: book.subtitle.clone(),
            number: book.number.clone(),
            synopsis: book.synopsis.clone(),
            dimensions: book.dimensions,
            label_price: book.label_price.clone(),
            paid_price: book.paid_price.clone(),
            weight: book.weight,
            page_count: book.page_count,
            is_in_library: book.is_in_library,
            notes: book.notes.clone(),
            links: book.links.clone(),
            source: book.source,
            source_book_id: book.source_book_id.clone(),
            created_at: book.created_at,
            updated_at: book.updated_at,
        },
        relationships: Some(relationships),
    }
}
