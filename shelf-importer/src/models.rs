//! Library domain models
//!
//! Users, libraries, collections and the library-scoped entities an import
//! resolves or creates (publishers, people, contributor roles, books).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::types::ImporterSource;

/// Generate a new entity id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Access control
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

impl User {
    /// Admins see every library; other users see the ones they own or that are shared with them
    pub fn can_access_library(&self, library: &Library) -> bool {
        self.is_admin
            || library.owner_id == self.id
            || library.shared_with.iter().any(|id| id == &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub shared_with: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub library_id: String,
}

// ============================================================================
// Library-scoped named entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Publisher {
    pub id: String,
    pub name: String,
    pub library_id: String,
}

impl Publisher {
    pub fn new(name: impl Into<String>, library_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            library_id: library_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub library_id: String,
}

impl Person {
    pub fn new(name: impl Into<String>, library_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            library_id: library_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ContributorRole {
    pub id: String,
    pub name: String,
    pub library_id: String,
}

impl ContributorRole {
    pub fn new(name: impl Into<String>, library_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            library_id: library_id.into(),
        }
    }
}

// ============================================================================
// Value types
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LengthUnit {
    #[default]
    Centimeter,
    Millimeter,
    Inch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MassUnit {
    #[default]
    Kilogram,
    Gram,
    Ounce,
    Pound,
}

impl LengthUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::Centimeter => "CENTIMETER",
            LengthUnit::Millimeter => "MILLIMETER",
            LengthUnit::Inch => "INCH",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CENTIMETER" => Ok(LengthUnit::Centimeter),
            "MILLIMETER" => Ok(LengthUnit::Millimeter),
            "INCH" => Ok(LengthUnit::Inch),
            other => Err(format!("Unknown length unit: {other}")),
        }
    }
}

impl MassUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MassUnit::Kilogram => "KILOGRAM",
            MassUnit::Gram => "GRAM",
            MassUnit::Ounce => "OUNCE",
            MassUnit::Pound => "POUND",
        }
    }
}

impl FromStr for MassUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KILOGRAM" => Ok(MassUnit::Kilogram),
            "GRAM" => Ok(MassUnit::Gram),
            "OUNCE" => Ok(MassUnit::Ounce),
            "POUND" => Ok(MassUnit::Pound),
            other => Err(format!("Unknown mass unit: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    #[serde(default)]
    pub unit: LengthUnit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: f32,
    #[serde(default)]
    pub unit: MassUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryAmount {
    pub amount: f64,
    pub currency: String,
}

impl MonetaryAmount {
    /// Placeholder used when a source has no price
    pub fn zero() -> Self {
        Self {
            amount: 0.0,
            currency: "USD".to_string(),
        }
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}

/// Cross-references to the book on external sites
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amazon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goodreads: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_library: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skoob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

// ============================================================================
// Books
// ============================================================================

/// Stored book
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: String,
    pub library_id: String,
    pub collection_id: String,
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
    pub cover_image_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Person + role pair to attach to a new book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookContributor {
    pub person_id: String,
    pub role_id: String,
}

/// Book creation request
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub collection_id: String,
    pub contributors: Vec<NewBookContributor>,
    pub publishers: Vec<String>,
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
}

/// Stored contributor link of a book
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BookContributor {
    pub id: String,
    pub book_id: String,
    pub person_id: String,
    pub role_id: String,
}

/// Book with its relations, as returned to callers
#[derive(Debug, Clone, PartialEq)]
pub struct BookDetail {
    pub book: Book,
    pub publisher_ids: Vec<String>,
    pub contributors: Vec<BookContributor>,
}
