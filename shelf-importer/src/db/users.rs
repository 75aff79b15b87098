use sqlx::SqliteConnection;

use crate::models::User;

pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, is_admin FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}
