//! Database initialization
//!
//! Creates the SQLite database on first run and applies the schema
//! idempotently on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL allows concurrent readers with one writer
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// The pool is pinned to a single connection that never expires, since every
/// in-memory connection is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_libraries_tables(pool).await?;
    create_collections_table(pool).await?;

    // Library-scoped entities resolved by name
    create_named_entity_table(pool, "publishers").await?;
    create_named_entity_table(pool, "people").await?;
    create_named_entity_table(pool, "contributor_roles").await?;

    create_images_table(pool).await?;
    create_books_table(pool).await?;

    // Linking tables
    create_book_publishers_table(pool).await?;
    create_book_contributors_table(pool).await?;

    info!("Database schema initialized");

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_libraries_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS libraries (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS library_shares (
            library_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            PRIMARY KEY (library_id, user_id),
            FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE CASCADE,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_collections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            library_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Publishers, people and contributor roles share one shape: a name unique
/// case-insensitively within a library.
///
/// `name_key` holds the Unicode lower-cased name.
async fn create_named_entity_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            library_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE CASCADE
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_library_name \
         ON {table}(library_id, name_key)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_images_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS images (
            id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_books_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            library_id TEXT NOT NULL,
            collection_id TEXT NOT NULL,
            code TEXT NOT NULL,
            barcode TEXT,
            title TEXT NOT NULL,
            subtitle TEXT NOT NULL DEFAULT '',
            number TEXT NOT NULL DEFAULT '',
            synopsis TEXT NOT NULL DEFAULT '',
            width REAL NOT NULL DEFAULT 0,
            height REAL NOT NULL DEFAULT 0,
            depth REAL NOT NULL DEFAULT 0,
            length_unit TEXT NOT NULL DEFAULT 'CENTIMETER',
            label_price_amount REAL NOT NULL DEFAULT 0,
            label_price_currency TEXT NOT NULL DEFAULT 'USD',
            paid_price_amount REAL NOT NULL DEFAULT 0,
            paid_price_currency TEXT NOT NULL DEFAULT 'USD',
            weight_value REAL NOT NULL DEFAULT 0,
            mass_unit TEXT NOT NULL DEFAULT 'KILOGRAM',
            page_count INTEGER NOT NULL DEFAULT 0,
            is_in_library INTEGER NOT NULL DEFAULT 1,
            notes TEXT NOT NULL DEFAULT '',
            links TEXT NOT NULL DEFAULT '{}',
            source TEXT,
            source_book_id TEXT,
            cover_image_id TEXT,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            FOREIGN KEY (library_id) REFERENCES libraries(id) ON DELETE CASCADE,
            FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE,
            FOREIGN KEY (cover_image_id) REFERENCES images(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Final arbiter for concurrent imports of the same code
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_books_library_code ON books(library_id, code)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_book_publishers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_publishers (
            book_id TEXT NOT NULL,
            publisher_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (book_id, publisher_id),
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY (publisher_id) REFERENCES publishers(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_book_contributors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_contributors (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            person_id TEXT NOT NULL,
            role_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY (person_id) REFERENCES people(id) ON DELETE CASCADE,
            FOREIGN KEY (role_id) REFERENCES contributor_roles(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
