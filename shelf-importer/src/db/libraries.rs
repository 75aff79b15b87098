use sqlx::SqliteConnection;

use crate::models::Library;

/// Load a library together with the ids of the users it is shared with
pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Library>, sqlx::Error> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT id, name, owner_id FROM libraries WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some((id, name, owner_id)) = row else {
        return Ok(None);
    };

    let shared_with: Vec<String> =
        sqlx::query_scalar("SELECT user_id FROM library_shares WHERE library_id = ? ORDER BY user_id")
            .bind(&id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(Some(Library {
        id,
        name,
        owner_id,
        shared_with,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seeded_pool;

    #[tokio::test]
    async fn test_find_library_with_shares() {
        let pool = seeded_pool().await;
        sqlx::query("INSERT INTO users (id, username, is_admin) VALUES ('user-2', 'friend', 0)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO library_shares (library_id, user_id) VALUES ('lib-1', 'user-2')")
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let library = find_by_id(&mut conn, "lib-1").await.unwrap().unwrap();

        assert_eq!(library.owner_id, "user-1");
        assert_eq!(library.shared_with, vec!["user-2".to_string()]);
        assert!(find_by_id(&mut conn, "missing").await.unwrap().is_none());
    }
}
