//! Book persistence
//!
//! A book row carries its dimensions, prices and weight as flat columns and
//! its links as a JSON document. Publishers and contributors live in ordered
//! link tables.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqliteConnection;
use tracing::warn;

use crate::models::{
    Book, BookContributor, BookDetail, BookLinks, Dimensions, MonetaryAmount, NewBookContributor,
    Weight,
};
use crate::types::ImporterSource;

const BOOK_COLUMNS: &str = "id, library_id, collection_id, code, barcode, title, subtitle, number, \
     synopsis, width, height, depth, length_unit, label_price_amount, label_price_currency, \
     paid_price_amount, paid_price_currency, weight_value, mass_unit, page_count, is_in_library, \
     notes, links, source, source_book_id, cover_image_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: String,
    library_id: String,
    collection_id: String,
    code: String,
    barcode: Option<String>,
    title: String,
    subtitle: String,
    number: String,
    synopsis: String,
    width: f32,
    height: f32,
    depth: f32,
    length_unit: String,
    label_price_amount: f64,
    label_price_currency: String,
    paid_price_amount: f64,
    paid_price_currency: String,
    weight_value: f32,
    mass_unit: String,
    page_count: i32,
    is_in_library: bool,
    notes: String,
    links: Json<BookLinks>,
    source: Option<String>,
    source_book_id: Option<String>,
    cover_image_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        let unit = row.length_unit.parse().unwrap_or_else(|e| {
            warn!(book_id = %row.id, "{e}; using default");
            Default::default()
        });
        let mass_unit = row.mass_unit.parse().unwrap_or_else(|e| {
            warn!(book_id = %row.id, "{e}; using default");
            Default::default()
        });
        let source = row.source.as_deref().and_then(|s| s.parse::<ImporterSource>().ok());

        Book {
            id: row.id,
            library_id: row.library_id,
            collection_id: row.collection_id,
            code: row.code,
            barcode: row.barcode,
            title: row.title,
            subtitle: row.subtitle,
            number: row.number,
            synopsis: row.synopsis,
            dimensions: Dimensions {
                width: row.width,
                height: row.height,
                depth: row.depth,
                unit,
            },
            label_price: MonetaryAmount {
                amount: row.label_price_amount,
                currency: row.label_price_currency,
            },
            paid_price: MonetaryAmount {
                amount: row.paid_price_amount,
                currency: row.paid_price_currency,
            },
            weight: Weight {
                value: row.weight_value,
                unit: mass_unit,
            },
            page_count: row.page_count,
            is_in_library: row.is_in_library,
            notes: row.notes,
            links: row.links.0,
            source,
            source_book_id: row.source_book_id,
            cover_image_id: row.cover_image_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn exists_by_code_in_library(
    conn: &mut SqliteConnection,
    code: &str,
    library_id: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE library_id = ? AND code = ?")
            .bind(library_id)
            .bind(code)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count > 0)
}

/// Insert the book row and its publisher/contributor links, preserving order
pub async fn insert(
    conn: &mut SqliteConnection,
    book: &Book,
    publisher_ids: &[String],
    contributors: &[NewBookContributor],
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO books ({BOOK_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&book.id)
    .bind(&book.library_id)
    .bind(&book.collection_id)
    .bind(&book.code)
    .bind(&book.barcode)
    .bind(&book.title)
    .bind(&book.subtitle)
    .bind(&book.number)
    .bind(&book.synopsis)
    .bind(book.dimensions.width)
    .bind(book.dimensions.height)
    .bind(book.dimensions.depth)
    .bind(book.dimensions.unit.as_str())
    .bind(book.label_price.amount)
    .bind(&book.label_price.currency)
    .bind(book.paid_price.amount)
    .bind(&book.paid_price.currency)
    .bind(book.weight.value)
    .bind(book.weight.unit.as_str())
    .bind(book.page_count)
    .bind(book.is_in_library)
    .bind(&book.notes)
    .bind(Json(&book.links))
    .bind(book.source.map(|s| s.as_str()))
    .bind(&book.source_book_id)
    .bind(&book.cover_image_id)
    .bind(book.created_at)
    .bind(book.updated_at)
    .execute(&mut *conn)
    .await?;

    for (position, publisher_id) in publisher_ids.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO book_publishers (book_id, publisher_id, position) VALUES (?, ?, ?)",
        )
        .bind(&book.id)
        .bind(publisher_id)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    for (position, contributor) in contributors.iter().enumerate() {
        sqlx::query(
            "INSERT INTO book_contributors (id, book_id, person_id, role_id, position) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(crate::models::new_id())
        .bind(&book.id)
        .bind(&contributor.person_id)
        .bind(&contributor.role_id)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Book>, sqlx::Error> {
    let row = sqlx::query_as::<_, BookRow>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Book::from))
}

/// Persist every mutable field of `book`; returns false if the row is gone
pub async fn update(conn: &mut SqliteConnection, book: &Book) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE books SET
            collection_id = ?, code = ?, barcode = ?, title = ?, subtitle = ?, number = ?,
            synopsis = ?, width = ?, height = ?, depth = ?, length_unit = ?,
            label_price_amount = ?, label_price_currency = ?,
            paid_price_amount = ?, paid_price_currency = ?,
            weight_value = ?, mass_unit = ?, page_count = ?, is_in_library = ?, notes = ?,
            links = ?, source = ?, source_book_id = ?, cover_image_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&book.collection_id)
    .bind(&book.code)
    .bind(&book.barcode)
    .bind(&book.title)
    .bind(&book.subtitle)
    .bind(&book.number)
    .bind(&book.synopsis)
    .bind(book.dimensions.width)
    .bind(book.dimensions.height)
    .bind(book.dimensions.depth)
    .bind(book.dimensions.unit.as_str())
    .bind(book.label_price.amount)
    .bind(&book.label_price.currency)
    .bind(book.paid_price.amount)
    .bind(&book.paid_price.currency)
    .bind(book.weight.value)
    .bind(book.weight.unit.as_str())
    .bind(book.page_count)
    .bind(book.is_in_library)
    .bind(&book.notes)
    .bind(Json(&book.links))
    .bind(book.source.map(|s| s.as_str()))
    .bind(&book.source_book_id)
    .bind(&book.cover_image_id)
    .bind(book.updated_at)
    .bind(&book.id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_cover(
    conn: &mut SqliteConnection,
    book_id: &str,
    image_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE books SET cover_image_id = ?, updated_at = ? WHERE id = ?")
        .bind(image_id)
        .bind(Utc::now())
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Book plus ordered publisher ids and contributors
pub async fn find_detail(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<BookDetail>, sqlx::Error> {
    let Some(book) = find_by_id(conn, id).await? else {
        return Ok(None);
    };

    let publisher_ids: Vec<String> = sqlx::query_scalar(
        "SELECT publisher_id FROM book_publishers WHERE book_id = ? ORDER BY position",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let contributors = sqlx::query_as::<_, BookContributor>(
        "SELECT id, book_id, person_id, role_id FROM book_contributors \
         WHERE book_id = ? ORDER BY position",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(BookDetail {
        book,
        publisher_ids,
        contributors,
    }))
}
