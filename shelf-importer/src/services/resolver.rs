//! Entity resolution
//!
//! Maps the free-text names of an external result onto library-scoped
//! entities, reusing existing ones (matched ignoring case) and creating the
//! rest. Each category costs one lookup query however many contributors the
//! result lists; names repeated within the result resolve to the same entity.
//!
//! Creation events are appended to a caller-owned buffer; the caller emits
//! them once the enclosing transaction has committed.

use async_trait::async_trait;
use chrono::Utc;
use shelf_common::events::DomainEvent;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use tracing::debug;

use crate::db::{contributor_roles, people, publishers};
use crate::models::{ContributorRole, NewBookContributor, Person, Publisher};
use crate::types::ExternalContributor;

const DEFAULT_ROLE: &str = "Author";

/// Library-scoped entity identified by a case-insensitively unique name
#[async_trait]
trait NamedEntity: Sized + Send + Sync {
    fn create(name: &str, library_id: &str) -> Self;

    fn name(&self) -> &str;

    fn added_event(&self) -> DomainEvent;

    async fn find_many(
        conn: &mut SqliteConnection,
        names: &[String],
        library_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error>;

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl NamedEntity for Person {
    fn create(name: &str, library_id: &str) -> Self {
        Person::new(name, library_id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn added_event(&self) -> DomainEvent {
        DomainEvent::PersonAdded {
            person_id: self.id.clone(),
            library_id: self.library_id.clone(),
            name: self.name.clone(),
            timestamp: Utc::now(),
        }
    }

    async fn find_many(
        conn: &mut SqliteConnection,
        names: &[String],
        library_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        people::find_by_names_in_library(conn, names, library_id).await
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        people::insert(conn, self).await
    }
}

#[async_trait]
impl NamedEntity for ContributorRole {
    fn create(name: &str, library_id: &str) -> Self {
        ContributorRole::new(name, library_id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn added_event(&self) -> DomainEvent {
        DomainEvent::ContributorRoleAdded {
            role_id: self.id.clone(),
            library_id: self.library_id.clone(),
            name: self.name.clone(),
            timestamp: Utc::now(),
        }
    }

    async fn find_many(
        conn: &mut SqliteConnection,
        names: &[String],
        library_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        contributor_roles::find_by_names_in_library(conn, names, library_id).await
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        contributor_roles::insert(conn, self).await
    }
}

/// Find or create the publisher named `name`
///
/// A blank name resolves to no publisher.
pub async fn resolve_publisher(
    conn: &mut SqliteConnection,
    name: &str,
    library_id: &str,
    events: &mut Vec<DomainEvent>,
) -> Result<Option<Publisher>, sqlx::Error> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    if let Some(existing) = publishers::find_by_name_in_library(conn, name, library_id).await? {
        return Ok(Some(existing));
    }

    let publisher = Publisher::new(name, library_id);
    publishers::insert(conn, &publisher).await?;
    debug!(publisher_id = %publisher.id, name, "Created publisher");

    events.push(DomainEvent::PublisherAdded {
        publisher_id: publisher.id.clone(),
        library_id: publisher.library_id.clone(),
        name: publisher.name.clone(),
        timestamp: Utc::now(),
    });

    Ok(Some(publisher))
}

/// Find or create a person and a role for every contributor, preserving order
///
/// Contributors with a blank name are skipped; a blank role means author.
pub async fn resolve_contributors(
    conn: &mut SqliteConnection,
    contributors: &[ExternalContributor],
    library_id: &str,
    events: &mut Vec<DomainEvent>,
) -> Result<Vec<NewBookContributor>, sqlx::Error> {
    let contributors: Vec<(&str, &str)> = contributors
        .iter()
        .map(|c| {
            let role = c.role.trim();
            (c.name.trim(), if role.is_empty() { DEFAULT_ROLE } else { role })
        })
        .filter(|(name, _)| !name.is_empty())
        .collect();

    let people: HashMap<String, Person> = resolve_names(
        conn,
        contributors.iter().map(|(name, _)| *name),
        library_id,
        events,
    )
    .await?;

    let roles: HashMap<String, ContributorRole> = resolve_names(
        conn,
        contributors.iter().map(|(_, role)| *role),
        library_id,
        events,
    )
    .await?;

    let mut resolved = Vec::with_capacity(contributors.len());
    for (name, role) in contributors {
        // Both maps hold every name they were given
        if let (Some(person), Some(role)) = (people.get(&name.to_lowercase()), roles.get(&role.to_lowercase())) {
            resolved.push(NewBookContributor {
                person_id: person.id.clone(),
                role_id: role.id.clone(),
            });
        }
    }

    Ok(resolved)
}

/// Resolve every name to an entity, keyed by lower-cased name
async fn resolve_names<'a, T: NamedEntity>(
    conn: &mut SqliteConnection,
    raw_names: impl Iterator<Item = &'a str>,
    library_id: &str,
    events: &mut Vec<DomainEvent>,
) -> Result<HashMap<String, T>, sqlx::Error> {
    let mut distinct: Vec<String> = Vec::new();
    for name in raw_names {
        if !distinct.iter().any(|n| n == name) {
            distinct.push(name.to_string());
        }
    }

    let mut by_name: HashMap<String, T> = T::find_many(conn, &distinct, library_id)
        .await?
        .into_iter()
        .map(|entity| (entity.name().to_lowercase(), entity))
        .collect();

    for name in &distinct {
        let key = name.to_lowercase();
        if by_name.contains_key(&key) {
            continue;
        }

        let entity = T::create(name, library_id);
        entity.insert(conn).await?;
        events.push(entity.added_event());
        by_name.insert(key, entity);
    }

    Ok(by_name)
}
