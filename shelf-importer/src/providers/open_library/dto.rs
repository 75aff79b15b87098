//! Open Library wire formats

use serde::Deserialize;
use std::collections::HashMap;

/// `/api/books` answer, keyed by bibkey (`ISBN:978...`)
pub type BooksResponse = HashMap<String, BookData>;

#[derive(Debug, Clone, Deserialize)]
pub struct BookData {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Contributor>,
    #[serde(default)]
    pub cover: Option<Cover>,
    #[serde(default)]
    pub identifiers: HashMap<String, Vec<String>>,
    #[serde(default, rename = "number_of_pages")]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub publishers: Vec<Publisher>,
}

/// `/isbn/{isbn}.json` answer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookDetails {
    #[serde(default)]
    pub physical_dimensions: Option<String>,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    #[serde(default)]
    pub description: Option<Text>,
}

/// Text fields come either as a bare string or as `{"type": ..., "value": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    Typed { value: String },
}

impl Text {
    pub fn into_string(self) -> String {
        match self {
            Text::Plain(value) | Text::Typed { value } => value,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Publisher {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cover {
    #[serde(default)]
    pub large: Option<String>,
}

/// `/search.json` answer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub isbn: Vec<String>,
    #[serde(default)]
    pub publisher: Vec<String>,
    #[serde(default, rename = "number_of_pages_median")]
    pub page_count: Option<i32>,
    #[serde(default, rename = "cover_i")]
    pub cover_id: Option<i64>,
}
