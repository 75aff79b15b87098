use sqlx::SqliteConnection;

use crate::models::Collection;

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Collection>, sqlx::Error> {
    sqlx::query_as::<_, Collection>("SELECT id, name, library_id FROM collections WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}
