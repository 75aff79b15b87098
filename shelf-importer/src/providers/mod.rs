//! External book sources
//!
//! The registry is an immutable list of providers built once at startup.
//! Searches fan out to every eligible provider concurrently; a failing
//! provider contributes nothing and never fails the search.

pub mod open_library;

use crate::types::{BookProvider, BookQuery, ExternalBookResult, ImporterSource, ProviderDescriptor};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub use open_library::OpenLibraryProvider;

/// Which provider method a fan-out calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchKind {
    Isbn,
    Query,
}

impl SearchKind {
    fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Isbn => "isbn",
            SearchKind::Query => "query",
        }
    }
}

/// Registered providers, in registration order
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn BookProvider>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn BookProvider>>) -> Self {
        Self { providers }
    }

    /// Descriptors sorted by display name
    pub fn descriptors(&self) -> Vec<&ProviderDescriptor> {
        let mut descriptors: Vec<_> = self.providers.iter().map(|p| p.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn find(&self, key: ImporterSource) -> Option<Arc<dyn BookProvider>> {
        self.providers.iter().find(|p| p.key() == key).cloned()
    }

    pub fn descriptor(&self, key: ImporterSource) -> Option<&ProviderDescriptor> {
        self.providers
            .iter()
            .map(|p| p.descriptor())
            .find(|d| d.key == key)
    }

    pub fn count(&self) -> usize {
        self.providers.len()
    }

    /// Providers eligible for a search
    ///
    /// Query search requires `supports_query_search`, even for explicitly
    /// requested sources. An empty `sources` set, or one naming none of the
    /// eligible providers, selects every eligible provider.
    fn select(&self, sources: &HashSet<ImporterSource>, kind: SearchKind) -> Vec<Arc<dyn BookProvider>> {
        let eligible: Vec<Arc<dyn BookProvider>> = self
            .providers
            .iter()
            .filter(|p| kind == SearchKind::Isbn || p.descriptor().supports_query_search)
            .cloned()
            .collect();

        let requested: Vec<Arc<dyn BookProvider>> = eligible
            .iter()
            .filter(|p| sources.contains(&p.key()))
            .cloned()
            .collect();

        if requested.is_empty() {
            eligible
        } else {
            requested
        }
    }

    /// ISBN lookup across the selected providers
    pub async fn search_by_isbn(
        &self,
        isbn: &str,
        sources: &HashSet<ImporterSource>,
    ) -> Vec<ExternalBookResult> {
        let providers = self.select(sources, SearchKind::Isbn);

        let futures = providers.into_iter().map(|provider| {
            let isbn = isbn.to_string();
            async move {
                let outcome = provider.search_by_isbn(&isbn).await;
                isolate(provider.key(), SearchKind::Isbn, outcome)
            }
        });

        join_all(futures).await.into_iter().flatten().collect()
    }

    /// Title/author lookup across the selected query-capable providers
    ///
    /// A blank query returns immediately without calling any provider.
    pub async fn search_by_query(
        &self,
        query: &BookQuery,
        sources: &HashSet<ImporterSource>,
    ) -> Vec<ExternalBookResult> {
        if query.is_blank() {
            debug!("Blank query, skipping provider fan-out");
            return Vec::new();
        }

        let providers = self.select(sources, SearchKind::Query);

        let futures = providers.into_iter().map(|provider| {
            let query = query.clone();
            async move {
                let outcome = provider.search_by_query(&query).await;
                isolate(provider.key(), SearchKind::Query, outcome)
            }
        });

        join_all(futures).await.into_iter().flatten().collect()
    }
}

/// Turn one provider's outcome into its contribution to the aggregate
fn isolate(
    key: ImporterSource,
    kind: SearchKind,
    outcome: Result<Vec<ExternalBookResult>, crate::types::ProviderError>,
) -> Vec<ExternalBookResult> {
    match outcome {
        Ok(results) => {
            debug!(provider = %key, search = kind.as_str(), count = results.len(), "Provider search complete");
            results
        }
        Err(e) => {
            warn!(provider = %key, search = kind.as_str(), error = %e, "Provider search failed, contributing no results");
            Vec::new()
        }
    }
}

/// Shared HTTP client for provider and cover requests
pub fn build_http_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout)
        .build()
}

// ============================================================================
// Mock Provider for Testing
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::types::ProviderError;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub struct MockProvider {
        pub descriptor: ProviderDescriptor,
        pub results: Vec<ExternalBookResult>,
        pub should_fail: bool,
        pub delay: Option<Duration>,
        pub isbn_calls: AtomicUsize,
        pub query_calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(key: ImporterSource, name: &str, supports_query_search: bool) -> Self {
            Self {
                descriptor: ProviderDescriptor {
                    key,
                    name: name.to_string(),
                    url: format!("https://{}.example", key.as_str().to_lowercase()),
                    description: BTreeMap::new(),
                    language: "all".to_string(),
                    supports_query_search,
                },
                results: Vec::new(),
                should_fail: false,
                delay: None,
                isbn_calls: AtomicUsize::new(0),
                query_calls: AtomicUsize::new(0),
            }
        }

        pub fn with_titles(mut self, titles: &[&str]) -> Self {
            let key = self.descriptor.key;
            self.results = titles
                .iter()
                .enumerate()
                .map(|(i, title)| {
                    ExternalBookResult::new(format!("{key}-{i}"), key, "9780441013593", *title)
                })
                .collect();
            self
        }

        pub fn failing(mut self) -> Self {
            self.should_fail = true;
            self
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        async fn respond(&self) -> Result<Vec<ExternalBookResult>, ProviderError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.should_fail {
                Err(ProviderError::Network("Mock failure".to_string()))
            } else {
                Ok(self.results.clone())
            }
        }
    }

    #[async_trait]
    impl BookProvider for MockProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn search_by_isbn(&self, _isbn: &str) -> Result<Vec<ExternalBookResult>, ProviderError> {
            self.isbn_calls.fetch_add(1, Ordering::SeqCst);
            self.respond().await
        }

        async fn search_by_query(&self, _query: &BookQuery) -> Result<Vec<ExternalBookResult>, ProviderError> {
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            self.respond().await
        }
    }
}
