use sqlx::SqliteConnection;

use super::named;
use crate::models::Person;

const TABLE: &str = "people";

/// All people in the library whose name matches one of `names`, ignoring case
pub async fn find_by_names_in_library(
    conn: &mut SqliteConnection,
    names: &[String],
    library_id: &str,
) -> Result<Vec<Person>, sqlx::Error> {
    named::find_by_names_in_library(conn, TABLE, names, library_id).await
}

pub async fn insert(conn: &mut SqliteConnection, person: &Person) -> Result<(), sqlx::Error> {
    named::insert(conn, TABLE, &person.id, &person.name, &person.library_id).await
}

pub async fn owners_of(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<Vec<(String, String)>, sqlx::Error> {
    named::owners_of(conn, TABLE, ids).await
}
