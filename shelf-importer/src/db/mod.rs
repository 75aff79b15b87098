//! Database access for shelf-importer
//!
//! Repository functions take a `&mut SqliteConnection` so the same code runs
//! on a pooled connection or inside the import transaction.

pub mod books;
pub mod collections;
pub mod contributor_roles;
pub mod images;
pub mod libraries;
mod named;
pub mod people;
pub mod publishers;
pub mod users;

/// True if the error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Seed helpers shared by repository and service tests

    use sqlx::SqlitePool;

    /// Fresh schema with one user owning library `lib-1` holding collection `col-1`
    pub async fn seeded_pool() -> SqlitePool {
        let pool = shelf_common::db::init_memory_database()
            .await
            .expect("Failed to create in-memory database");

        seed_library(&pool, "user-1", "lib-1", "col-1").await;
        pool
    }

    pub async fn seed_library(pool: &SqlitePool, user_id: &str, library_id: &str, collection_id: &str) {
        sqlx::query("INSERT OR IGNORE INTO users (id, username, is_admin) VALUES (?, ?, 0)")
            .bind(user_id)
            .bind(user_id)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO libraries (id, name, owner_id) VALUES (?, ?, ?)")
            .bind(library_id)
            .bind(format!("Library {library_id}"))
            .bind(user_id)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO collections (id, name, library_id) VALUES (?, ?, ?)")
            .bind(collection_id)
            .bind(format!("Collection {collection_id}"))
            .bind(library_id)
            .execute(pool)
            .await
            .unwrap();
    }
}
