//! Open Library provider
//!
//! ISBN search uses the `/api/books` data endpoint, enriched best-effort with
//! the edition record from `/isbn/{isbn}.json`. Query search uses `/search.json`.

mod dto;

use async_trait::async_trait;
use reqwest::{header, Client};
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{BookLinks, Dimensions, LengthUnit};
use crate::types::{
    BookProvider, BookQuery, ExternalBookResult, ExternalContributor, ImporterSource,
    ProviderDescriptor, ProviderError,
};
use dto::{BookData, BookDetails, BooksResponse, SearchDoc, SearchResponse};

/// Public site, also the default API base
pub const OPEN_LIBRARY_URL: &str = "https://openlibrary.org";

const COVERS_URL: &str = "https://covers.openlibrary.org/b/id";

const SEARCH_FIELDS: &str =
    "key,title,author_name,isbn,publisher,number_of_pages_median,cover_i,first_publish_year";

const SEARCH_LIMIT: &str = "12";

const DEFAULT_ROLE: &str = "Author";

/// Language used when the query carries none or an unmapped one
const DEFAULT_LANGUAGE: &str = "eng";

/// ISO 639-1 to the ISO 639-2/B codes Open Library indexes by
const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("ar", "ara"),
    ("bg", "bul"),
    ("ca", "cat"),
    ("cs", "cze"),
    ("da", "dan"),
    ("de", "ger"),
    ("el", "gre"),
    ("en", "eng"),
    ("es", "spa"),
    ("fi", "fin"),
    ("fr", "fre"),
    ("he", "heb"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("id", "ind"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("ko", "kor"),
    ("nl", "dut"),
    ("no", "nor"),
    ("pl", "pol"),
    ("pt", "por"),
    ("ro", "rum"),
    ("ru", "rus"),
    ("sk", "slo"),
    ("sv", "swe"),
    ("th", "tha"),
    ("tr", "tur"),
    ("uk", "ukr"),
    ("vi", "vie"),
    ("zh", "chi"),
];

pub struct OpenLibraryProvider {
    client: Client,
    base_url: String,
    descriptor: ProviderDescriptor,
}

impl OpenLibraryProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, OPEN_LIBRARY_URL)
    }

    /// Provider talking to a different API host; links still point at the public site
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let description = BTreeMap::from([
            (
                "en-US".to_string(),
                "Open Library is an online project intended to create \"one web page for every \
                 book ever published\". It's a project of the Internet Archive, a non-profit \
                 organization."
                    .to_string(),
            ),
            (
                "pt-BR".to_string(),
                "O Open Library é um projeto online com o objetivo de criar \"uma página na \
                 internet para cada livro já publicado\". É um projeto do Internet Archive, uma \
                 organização sem fins lucrativos."
                    .to_string(),
            ),
        ]);

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            descriptor: ProviderDescriptor {
                key: ImporterSource::OpenLibrary,
                name: "Open Library".to_string(),
                url: OPEN_LIBRARY_URL.to_string(),
                description,
                language: "all".to_string(),
                supports_query_search: true,
            },
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    async fn fetch_details(&self, isbn: &str) -> Option<BookDetails> {
        let url = format!("{}/isbn/{}.json", self.base_url, isbn);
        match self.get_json::<BookDetails>(&url, &[]).await {
            Ok(details) => Some(details),
            Err(e) => {
                debug!(isbn, error = %e, "Open Library edition details unavailable");
                None
            }
        }
    }

    fn site_link(&self, key: &str) -> String {
        format!("{}{}", self.descriptor.url, key)
    }

    fn map_book(&self, requested_isbn: &str, data: BookData, details: Option<BookDetails>) -> ExternalBookResult {
        let isbn = first_identifier(&data, "isbn_13")
            .or_else(|| first_identifier(&data, "isbn_10"))
            .unwrap_or(requested_isbn)
            .to_string();

        let id = data.key.trim_start_matches("/books/").to_string();
        let link = self.site_link(&data.key);

        let mut result = ExternalBookResult::new(id, ImporterSource::OpenLibrary, isbn, data.title.trim());

        result.contributors = data
            .authors
            .iter()
            .map(|author| ExternalContributor::new(author.name.clone(), DEFAULT_ROLE))
            .collect();
        result.publisher = data
            .publishers
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        result.page_count = data.page_count.unwrap_or(0);
        result.cover_url = data.cover.and_then(|c| c.large).filter(|url| !url.is_empty());

        if let Some(details) = details {
            result.contributors.extend(details.contributors.into_iter().map(|c| {
                let role = c
                    .role
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ROLE.to_string());
                ExternalContributor::new(c.name, role)
            }));
            result.dimensions = details.physical_dimensions.as_deref().and_then(parse_dimensions);
            result.synopsis = details.description.map(|d| d.into_string()).unwrap_or_default();
        }

        result.url = Some(link.clone());
        result.links = BookLinks {
            open_library: Some(link),
            ..Default::default()
        };

        result
    }

    fn map_search_doc(&self, doc: SearchDoc) -> ExternalBookResult {
        let isbn = preferred_isbn(&doc.isbn).to_string();
        let id = doc.key.trim_start_matches("/works/").to_string();
        let link = self.site_link(&doc.key);

        let mut result = ExternalBookResult::new(id, ImporterSource::OpenLibrary, isbn, doc.title.trim());
        result.contributors = doc
            .author_name
            .into_iter()
            .map(|name| ExternalContributor::new(name, DEFAULT_ROLE))
            .collect();
        result.publisher = doc.publisher.into_iter().next().unwrap_or_default();
        result.page_count = doc.page_count.unwrap_or(0);
        result.cover_url = doc.cover_id.map(|id| format!("{COVERS_URL}/{id}-L.jpg"));
        result.url = Some(link.clone());
        result.links = BookLinks {
            open_library: Some(link),
            ..Default::default()
        };

        result
    }
}

#[async_trait]
impl BookProvider for OpenLibraryProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search_by_isbn(&self, isbn: &str) -> Result<Vec<ExternalBookResult>, ProviderError> {
        let bib_key = format!("ISBN:{isbn}");
        let url = format!("{}/api/books", self.base_url);

        let mut books: BooksResponse = self
            .get_json(
                &url,
                &[
                    ("bibkeys", bib_key.clone()),
                    ("jscmd", "data".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        let Some(data) = books.remove(&bib_key) else {
            debug!(isbn, "ISBN not found in Open Library");
            return Ok(Vec::new());
        };

        let details = self.fetch_details(isbn).await;

        Ok(vec![self.map_book(isbn, data, details)])
    }

    async fn search_by_query(&self, query: &BookQuery) -> Result<Vec<ExternalBookResult>, ProviderError> {
        if query.is_blank() {
            return Ok(Vec::new());
        }

        let mut params = vec![
            ("limit", SEARCH_LIMIT.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
            ("language", language_code(query.language.as_deref()).to_string()),
        ];
        if let Some(title) = query.title() {
            params.push(("title", title.to_string()));
        }
        if let Some(author) = query.author() {
            params.push(("author", author.to_string()));
        }

        let url = format!("{}/search.json", self.base_url);
        let response: SearchResponse = self.get_json(&url, &params).await?;

        Ok(response
            .docs
            .into_iter()
            .filter(|doc| !doc.isbn.is_empty())
            .map(|doc| self.map_search_doc(doc))
            .collect())
    }
}

fn first_identifier<'a>(data: &'a BookData, kind: &str) -> Option<&'a str> {
    data.identifiers
        .get(kind)
        .and_then(|values| values.first())
        .map(String::as_str)
}

/// 13-digit ISBN first, then 10-digit, then whatever comes first
fn preferred_isbn(isbns: &[String]) -> &str {
    isbns
        .iter()
        .find(|isbn| isbn.len() == 13)
        .or_else(|| isbns.iter().find(|isbn| isbn.len() == 10))
        .or_else(|| isbns.first())
        .map(String::as_str)
        .unwrap_or_default()
}

/// Map a BCP-47 tag (`pt-BR`, `en`) to Open Library's language vocabulary
fn language_code(tag: Option<&str>) -> &'static str {
    let Some(primary) = tag
        .and_then(|t| t.split(['-', '_']).next())
        .map(|p| p.trim().to_ascii_lowercase())
    else {
        return DEFAULT_LANGUAGE;
    };

    LANGUAGE_CODES
        .iter()
        .find(|(iso1, _)| *iso1 == primary)
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Parse `"24 x 16 x 3 centimeters"` as height x width x depth
fn parse_dimensions(raw: &str) -> Option<Dimensions> {
    let raw = raw.trim();
    let (numbers, unit) = if let Some(rest) = raw.strip_suffix("centimeters") {
        (rest, LengthUnit::Centimeter)
    } else if let Some(rest) = raw.strip_suffix("inches") {
        (rest, LengthUnit::Inch)
    } else {
        (raw, LengthUnit::Inch)
    };

    let values: Vec<f32> = numbers
        .split(" x ")
        .filter_map(|part| part.trim().parse::<f32>().ok())
        .collect();

    match values.as_slice() {
        [height, width, depth] => Some(Dimensions {
            width: *width,
            height: *height,
            depth: *depth,
            unit,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const DUNE_BOOKS: &str = r#"{
        "ISBN:9780441013593": {
            "key": "/books/OL24374150M",
            "title": " Dune ",
            "url": "https://openlibrary.org/books/OL24374150M/Dune",
            "authors": [{"url": "https://openlibrary.org/authors/OL79034A", "name": "Frank Herbert"}],
            "identifiers": {"isbn_10": ["0441013597"], "isbn_13": ["9780441013593"]},
            "number_of_pages": 896,
            "publishers": [{"name": "Ace Books"}, {"name": "Penguin"}],
            "cover": {"small": "s.jpg", "medium": "m.jpg", "large": "https://covers.openlibrary.org/b/id/1-L.jpg"}
        }
    }"#;

    fn provider(base_url: &str) -> OpenLibraryProvider {
        OpenLibraryProvider::with_base_url(Client::new(), base_url)
    }

    #[test]
    fn test_parse_dimensions() {
        let d = parse_dimensions("24 x 16.5 x 3 centimeters").unwrap();
        assert_eq!((d.height, d.width, d.depth), (24.0, 16.5, 3.0));
        assert_eq!(d.unit, LengthUnit::Centimeter);

        let d = parse_dimensions("9.2 x 6.1 x 1.4 inches").unwrap();
        assert_eq!(d.unit, LengthUnit::Inch);
        assert_eq!(d.width, 6.1);

        assert!(parse_dimensions("24 x 16 centimeters").is_none());
        assert!(parse_dimensions("").is_none());
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(language_code(Some("pt-BR")), "por");
        assert_eq!(language_code(Some("FR")), "fre");
        assert_eq!(language_code(Some("tlh")), "eng");
        assert_eq!(language_code(None), "eng");
    }

    #[test]
    fn test_isbn_preference() {
        let isbns = vec!["123".to_string(), "0441013597".to_string(), "9780441013593".to_string()];
        assert_eq!(preferred_isbn(&isbns), "9780441013593");
        assert_eq!(preferred_isbn(&isbns[..2]), "0441013597");
        assert_eq!(preferred_isbn(&isbns[..1]), "123");
        assert_eq!(preferred_isbn(&[]), "");
    }

    #[test]
    fn test_map_book_with_details() {
        let mut books: BooksResponse = serde_json::from_str(DUNE_BOOKS).unwrap();
        let data = books.remove("ISBN:9780441013593").unwrap();
        let details: BookDetails = serde_json::from_value(json!({
            "physical_dimensions": "17.5 x 10.6 x 3.8 centimeters",
            "contributors": [
                {"name": "John Schoenherr", "role": "Illustrator"},
                {"name": "Jane Doe", "role": ""}
            ],
            "description": {"type": "/type/text", "value": "Desert planet."}
        }))
        .unwrap();

        let result = provider(OPEN_LIBRARY_URL).map_book("9780441013593", data, Some(details));

        assert_eq!(result.id, "OL24374150M");
        assert_eq!(result.isbn, "9780441013593");
        assert_eq!(result.title, "Dune");
        assert_eq!(result.publisher, "Ace Books");
        assert_eq!(result.page_count, 896);
        assert_eq!(
            result.contributors,
            vec![
                ExternalContributor::new("Frank Herbert", "Author"),
                ExternalContributor::new("John Schoenherr", "Illustrator"),
                ExternalContributor::new("Jane Doe", "Author"),
            ]
        );
        assert_eq!(result.synopsis, "Desert planet.");
        assert_eq!(result.dimensions.unwrap().height, 17.5);
        assert_eq!(result.cover_url(), Some("https://covers.openlibrary.org/b/id/1-L.jpg"));
        assert_eq!(
            result.links.open_library.as_deref(),
            Some("https://openlibrary.org/books/OL24374150M")
        );
    }

    #[test]
    fn test_plain_string_description() {
        let details: BookDetails = serde_json::from_value(json!({"description": "Plain."})).unwrap();
        assert_eq!(details.description.unwrap().into_string(), "Plain.");
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_isbn_search_against_http_server() {
        let router = Router::new()
            .route(
                "/api/books",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(params.get("jscmd").map(String::as_str), Some("data"));
                    if params.get("bibkeys").map(String::as_str) == Some("ISBN:9780441013593") {
                        Json(serde_json::from_str::<Value>(DUNE_BOOKS).unwrap())
                    } else {
                        Json(json!({}))
                    }
                }),
            )
            // Edition record missing: details are best-effort
            .route(
                "/isbn/:file",
                get(|Path(_file): Path<String>| async { axum::http::StatusCode::NOT_FOUND }),
            );
        let provider = provider(&serve(router).await);

        let results = provider.search_by_isbn("9780441013593").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dune");
        assert!(results[0].dimensions.is_none());

        assert!(provider.search_by_isbn("9780000000002").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_search_sends_mapped_language_and_drops_docs_without_isbn() {
        let seen = Arc::new(Mutex::new(HashMap::new()));
        let captured = Arc::clone(&seen);
        let router = Router::new().route(
            "/search.json",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let captured = Arc::clone(&captured);
                async move {
                    *captured.lock().unwrap() = params;
                    Json(json!({
                        "numFound": 2,
                        "docs": [
                            {"key": "/works/OL1W", "title": "Duna", "author_name": ["Frank Herbert"],
                             "isbn": ["8576570491", "9788576570493"], "cover_i": 42},
                            {"key": "/works/OL2W", "title": "No ISBN"}
                        ]
                    }))
                }
            }),
        );
        let provider = provider(&serve(router).await);

        let query = BookQuery {
            title: Some("Duna".to_string()),
            author: None,
            language: Some("pt-BR".to_string()),
        };
        let results = provider.search_by_query(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "OL1W");
        assert_eq!(results[0].isbn, "9788576570493");
        assert_eq!(results[0].cover_url(), Some("https://covers.openlibrary.org/b/id/42-L.jpg"));

        let params = seen.lock().unwrap().clone();
        assert_eq!(params.get("language").map(String::as_str), Some("por"));
        assert_eq!(params.get("title").map(String::as_str), Some("Duna"));
        assert!(!params.contains_key("author"));
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let router = Router::new().route(
            "/api/books",
            get(|| async { axum::http::StatusCode::SERVICE_UNAVAILABLE }),
        );
        let provider = provider(&serve(router).await);

        let err = provider.search_by_isbn("9780441013593").await.unwrap_err();
        assert!(matches!(err, ProviderError::Api(_)));
    }
}
