use sqlx::SqliteConnection;

use super::named;
use crate::models::Publisher;

const TABLE: &str = "publishers";

/// Case-insensitive exact-name match within the library
pub async fn find_by_name_in_library(
    conn: &mut SqliteConnection,
    name: &str,
    library_id: &str,
) -> Result<Option<Publisher>, sqlx::Error> {
    named::find_by_name_in_library(conn, TABLE, name, library_id).await
}

pub async fn insert(conn: &mut SqliteConnection, publisher: &Publisher) -> Result<(), sqlx::Error> {
    named::insert(conn, TABLE, &publisher.id, &publisher.name, &publisher.library_id).await
}

pub async fn owners_of(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<Vec<(String, String)>, sqlx::Error> {
    named::owners_of(conn, TABLE, ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_library, seeded_pool};

    #[tokio::test]
    async fn test_name_match_ignores_case_and_library() {
        let pool = seeded_pool().await;
        seed_library(&pool, "user-1", "lib-2", "col-2").await;
        let mut conn = pool.acquire().await.unwrap();

        let ace = Publisher::new("Ace Books", "lib-1");
        insert(&mut conn, &ace).await.unwrap();

        let found = find_by_name_in_library(&mut conn, "ACE BOOKS", "lib-1")
            .await
            .unwrap()
            .expect("publisher should match ignoring case");
        assert_eq!(found.id, ace.id);
        assert_eq!(found.name, "Ace Books");

        assert!(find_by_name_in_library(&mut conn, "Ace Books", "lib-2")
            .await
            .unwrap()
            .is_none());
    }
}
