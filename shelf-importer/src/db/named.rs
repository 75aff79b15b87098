//! Shared queries for library-scoped entities identified by name
//!
//! Publishers, people and contributor roles live in tables with the same
//! `(id, name, library_id)` shape and a case-insensitive unique name per library.
//! Lookups go through `name_key`, the lower-cased name.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

/// Case-folded form stored in `name_key`
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

pub(super) async fn find_by_name_in_library<T>(
    conn: &mut SqliteConnection,
    table: &str,
    name: &str,
    library_id: &str,
) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(&format!(
        "SELECT id, name, library_id FROM {table} \
         WHERE library_id = ? AND name_key = ?"
    ))
    .bind(library_id)
    .bind(name_key(name))
    .fetch_optional(&mut *conn)
    .await
}

/// Batch lookup; one query regardless of how many names are given
pub(super) async fn find_by_names_in_library<T>(
    conn: &mut SqliteConnection,
    table: &str,
    names: &[String],
    library_id: &str,
) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT id, name, library_id FROM {table} WHERE library_id = "));
    builder.push_bind(library_id);
    builder.push(" AND name_key IN (");
    let mut separated = builder.separated(", ");
    for name in names {
        separated.push_bind(name_key(name));
    }
    separated.push_unseparated(")");

    builder.build_query_as::<T>().fetch_all(&mut *conn).await
}

pub(super) async fn insert(
    conn: &mut SqliteConnection,
    table: &str,
    id: &str,
    name: &str,
    library_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO {table} (id, name, name_key, library_id) VALUES (?, ?, ?, ?)"
    ))
    .bind(id)
    .bind(name)
    .bind(name_key(name))
    .bind(library_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `(id, library_id)` of each row in `table` whose id is in `ids`
pub(super) async fn owners_of(
    conn: &mut SqliteConnection,
    table: &str,
    ids: &[String],
) -> Result<Vec<(String, String)>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT id, library_id FROM {table} WHERE id IN ("));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    builder.build_query_as().fetch_all(&mut *conn).await
}
