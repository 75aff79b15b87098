use sqlx::SqliteConnection;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ImageRecord {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

pub async fn insert(conn: &mut SqliteConnection, image: &ImageRecord) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO images (id, file_name, mime_type, size_bytes) VALUES (?, ?, ?, ?)")
        .bind(&image.id)
        .bind(&image.file_name)
        .bind(&image.mime_type)
        .bind(image.size_bytes)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<ImageRecord>, sqlx::Error> {
    sqlx::query_as::<_, ImageRecord>(
        "SELECT id, file_name, mime_type, size_bytes FROM images WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}
