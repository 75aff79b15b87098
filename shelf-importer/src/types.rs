//! Core Types and Trait Definitions for external book sources
//!
//! Every external source implements [`BookProvider`] and normalizes its API
//! into [`ExternalBookResult`]. The registry fans calls out over the trait only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{BookLinks, Dimensions, MonetaryAmount, Weight};

// ============================================================================
// Provider identity
// ============================================================================

/// Key of an external source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImporterSource {
    Cbl,
    OpenLibrary,
    Skoob,
}

impl ImporterSource {
    pub const ALL: [ImporterSource; 3] = [
        ImporterSource::Cbl,
        ImporterSource::OpenLibrary,
        ImporterSource::Skoob,
    ];

    /// Canonical key name (`OPEN_LIBRARY`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ImporterSource::Cbl => "CBL",
            ImporterSource::OpenLibrary => "OPEN_LIBRARY",
            ImporterSource::Skoob => "SKOOB",
        }
    }
}

impl fmt::Display for ImporterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the key in any case (`open_library`, `OPEN_LIBRARY`)
impl FromStr for ImporterSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ImporterSource::ALL
            .into_iter()
            .find(|source| source.as_str() == upper)
            .ok_or_else(|| format!("Unknown importer source: {s}"))
    }
}

/// Static description of an external source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub key: ImporterSource,
    pub name: String,
    pub url: String,
    /// Locale tag → description text
    pub description: BTreeMap<String, String>,
    pub language: String,
    pub supports_query_search: bool,
}

// ============================================================================
// Normalized results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalContributor {
    pub name: String,
    pub role: String,
}

impl ExternalContributor {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// One source's answer to a lookup, not yet reconciled with the library
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalBookResult {
    /// Provider-scoped id
    pub id: String,
    pub provider: ImporterSource,
    /// May be empty for query-search hits
    pub isbn: String,
    pub title: String,
    /// Ordered as the source lists them
    pub contributors: Vec<ExternalContributor>,
    /// Free text, resolved to a publisher entity on import
    pub publisher: String,
    pub number: String,
    pub subtitle: String,
    pub synopsis: String,
    pub dimensions: Option<Dimensions>,
    pub label_price: Option<MonetaryAmount>,
    pub cover_url: Option<String>,
    pub page_count: i32,
    pub url: Option<String>,
    pub weight: Option<Weight>,
    pub links: BookLinks,
}

impl ExternalBookResult {
    /// Result with the required fields set and everything else empty
    pub fn new(
        id: impl Into<String>,
        provider: ImporterSource,
        isbn: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            isbn: isbn.into(),
            title: title.into(),
            contributors: Vec::new(),
            publisher: String::new(),
            number: String::new(),
            subtitle: String::new(),
            synopsis: String::new(),
            dimensions: None,
            label_price: None,
            cover_url: None,
            page_count: 0,
            url: None,
            weight: None,
            links: BookLinks::default(),
        }
    }

    /// Cover URL when present and non-empty
    pub fn cover_url(&self) -> Option<&str> {
        self.cover_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Title/author search parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    /// BCP-47 tag (e.g. `pt-BR`)
    pub language: Option<String>,
}

impl BookQuery {
    /// True when neither title nor author carries text
    pub fn is_blank(&self) -> bool {
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        blank(&self.title) && blank(&self.author)
    }

    /// Title with surrounding whitespace removed, if any text
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Author with surrounding whitespace removed, if any text
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }
}

// ============================================================================
// Provider trait
// ============================================================================

/// External bibliographic source
///
/// Implementations must be safe to call concurrently: the registry issues one
/// call per provider at the same time.
#[async_trait]
pub trait BookProvider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    fn key(&self) -> ImporterSource {
        self.descriptor().key
    }

    /// Look up a book by ISBN; an unknown ISBN yields an empty list, not an error
    async fn search_by_isbn(&self, isbn: &str) -> Result<Vec<ExternalBookResult>, ProviderError>;

    /// Look up books by title/author
    ///
    /// Only called when `descriptor().supports_query_search` is true.
    async fn search_by_query(
        &self,
        _query: &BookQuery,
    ) -> Result<Vec<ExternalBookResult>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Provider call failure
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Source answered with an error status
    #[error("API error: {0}")]
    Api(String),

    /// Source answered with a payload we could not read
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source has no data for the request
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// Request could not be built from the input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Api(format!("status {status}: {err}"))
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parses_any_case() {
        assert_eq!("open_library".parse::<ImporterSource>().unwrap(), ImporterSource::OpenLibrary);
        assert_eq!("OPEN_LIBRARY".parse::<ImporterSource>().unwrap(), ImporterSource::OpenLibrary);
        assert_eq!(" skoob ".parse::<ImporterSource>().unwrap(), ImporterSource::Skoob);
        assert!("GOODREADS".parse::<ImporterSource>().is_err());
    }

    #[test]
    fn test_source_serializes_as_key_name() {
        let json = serde_json::to_string(&ImporterSource::OpenLibrary).unwrap();
        assert_eq!(json, "\"OPEN_LIBRARY\"");
    }

    #[test]
    fn test_query_blankness() {
        assert!(BookQuery::default().is_blank());
        assert!(BookQuery {
            title: Some("   ".to_string()),
            author: Some(String::new()),
            language: Some("en".to_string()),
        }
        .is_blank());

        let query = BookQuery {
            title: Some("  Dune ".to_string()),
            ..Default::default()
        };
        assert!(!query.is_blank());
        assert_eq!(query.title(), Some("Dune"));
        assert_eq!(query.author(), None);
    }

    #[test]
    fn test_empty_cover_url_is_treated_as_absent() {
        let mut result = ExternalBookResult::new("1", ImporterSource::OpenLibrary, "9780441013593", "Dune");
        assert_eq!(result.cover_url(), None);

        result.cover_url = Some(String::new());
        assert_eq!(result.cover_url(), None);

        result.cover_url = Some("https://covers.example/1.jpg".to_string());
        assert_eq!(result.cover_url(), Some("https://covers.example/1.jpg"));
    }
}
