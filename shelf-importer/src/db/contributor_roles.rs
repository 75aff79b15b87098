use sqlx::SqliteConnection;

use super::named;
use crate::models::ContributorRole;

const TABLE: &str = "contributor_roles";

pub async fn find_by_names_in_library(
    conn: &mut SqliteConnection,
    names: &[String],
    library_id: &str,
) -> Result<Vec<ContributorRole>, sqlx::Error> {
    named::find_by_names_in_library(conn, TABLE, names, library_id).await
}

pub async fn insert(conn: &mut SqliteConnection, role: &ContributorRole) -> Result<(), sqlx::Error> {
    named::insert(conn, TABLE, &role.id, &role.name, &role.library_id).await
}

pub async fn owners_of(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<Vec<(String, String)>, sqlx::Error> {
    named::owners_of(conn, TABLE, ids).await
}
