//! Book creation and update
//!
//! Every relation of a new book (collection, publishers, people, roles) must
//! exist and belong to the collection's library.

use chrono::Utc;
use shelf_common::events::DomainEvent;
use sqlx::SqliteConnection;
use std::collections::HashMap;

use crate::db::{books, collections, contributor_roles, people, publishers};
use crate::error::ImportError;
use crate::models::{new_id, Book, NewBook};

/// Create a book in the library of `new_book.collection_id`
pub async fn add_book(
    conn: &mut SqliteConnection,
    new_book: NewBook,
    events: &mut Vec<DomainEvent>,
) -> Result<Book, ImportError> {
    let collection = collections::find_by_id(conn, &new_book.collection_id)
        .await?
        .ok_or_else(|| ImportError::RelationIdDoesNotExist("Collection not found".to_string()))?;
    let library_id = collection.library_id;

    let publisher_owners = publishers::owners_of(conn, &new_book.publishers).await?;
    check_relations(&new_book.publishers, publisher_owners, &library_id, "Publisher")?;

    let person_ids: Vec<String> = new_book.contributors.iter().map(|c| c.person_id.clone()).collect();
    let person_owners = people::owners_of(conn, &person_ids).await?;
    check_relations(&person_ids, person_owners, &library_id, "Person")?;

    let role_ids: Vec<String> = new_book.contributors.iter().map(|c| c.role_id.clone()).collect();
    let role_owners = contributor_roles::owners_of(conn, &role_ids).await?;
    check_relations(&role_ids, role_owners, &library_id, "Contributor role")?;

    let now = Utc::now();
    let book = Book {
        id: new_id(),
        library_id,
        collection_id: new_book.collection_id,
        code: new_book.code,
        barcode: new_book.barcode,
        title: new_book.title,
        subtitle: new_book.subtitle,
        number: new_book.number,
        synopsis: new_book.synopsis,
        dimensions: new_book.dimensions,
        label_price: new_book.label_price,
        paid_price: new_book.paid_price,
        weight: new_book.weight,
        page_count: new_book.page_count,
        is_in_library: new_book.is_in_library,
        notes: new_book.notes,
        links: new_book.links,
        source: None,
        source_book_id: None,
        cover_image_id: None,
        created_at: now,
        updated_at: now,
    };

    books::insert(conn, &book, &new_book.publishers, &new_book.contributors).await?;

    events.push(DomainEvent::BookAdded {
        book_id: book.id.clone(),
        library_id: book.library_id.clone(),
        timestamp: now,
    });

    Ok(book)
}

/// Persist changes to an existing book
pub async fn update_book(
    conn: &mut SqliteConnection,
    book: &mut Book,
    events: &mut Vec<DomainEvent>,
) -> Result<(), ImportError> {
    book.updated_at = Utc::now();

    if !books::update(conn, book).await? {
        return Err(ImportError::IdDoesNotExist("Book not found".to_string()));
    }

    events.push(DomainEvent::BookUpdated {
        book_id: book.id.clone(),
        library_id: book.library_id.clone(),
        timestamp: book.updated_at,
    });

    Ok(())
}

fn check_relations(
    requested: &[String],
    found: Vec<(String, String)>,
    library_id: &str,
    label: &str,
) -> Result<(), ImportError> {
    let owners: HashMap<String, String> = found.into_iter().collect();

    for id in requested {
        match owners.get(id) {
            None => {
                return Err(ImportError::RelationIdDoesNotExist(format!("{label} not found")));
            }
            Some(owner) if owner != library_id => {
                return Err(ImportError::RelationIsNotFromSameLibrary(format!(
                    "{label} is not from the same library"
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_library, seeded_pool};
    use crate::models::{Dimensions, MonetaryAmount, NewBookContributor, Person, Publisher, Weight};
    use crate::models::{BookLinks, ContributorRole};

    fn new_book(collection_id: &str) -> NewBook {
        NewBook {
            collection_id: collection_id.to_string(),
            contributors: Vec::new(),
            publishers: Vec::new(),
            code: "9780441013593".to_string(),
            barcode: Some("9780441013593".to_string()),
            title: "Dune".to_string(),
            subtitle: String::new(),
            number: String::new(),
            synopsis: String::new(),
            dimensions: Dimensions::default(),
            label_price: MonetaryAmount::zero(),
            paid_price: MonetaryAmount::zero(),
            weight: Weight::default(),
            page_count: 0,
            is_in_library: true,
            notes: String::new(),
            links: BookLinks::default(),
        }
    }

    #[tokio::test]
    async fn test_add_book_derives_library_and_emits_event() {
        let pool = seeded_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut events = Vec::new();

        let book = add_book(&mut conn, new_book("col-1"), &mut events).await.unwrap();

        assert_eq!(book.library_id, "lib-1");
        assert!(matches!(&events[..], [DomainEvent::BookAdded { .. }]));
    }

    #[tokio::test]
    async fn test_unknown_collection_is_relation_error() {
        let pool = seeded_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let err = add_book(&mut conn, new_book("nope"), &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, ImportError::RelationIdDoesNotExist(_)));
    }

    #[tokio::test]
    async fn test_relations_from_other_library_are_rejected() {
        let pool = seeded_pool().await;
        seed_library(&pool, "user-1", "lib-2", "col-2").await;
        let mut conn = pool.acquire().await.unwrap();

        let foreign = Publisher::new("Ace", "lib-2");
        publishers::insert(&mut conn, &foreign).await.unwrap();

        let mut request = new_book("col-1");
        request.publishers = vec![foreign.id];
        let err = add_book(&mut conn, request, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, ImportError::RelationIsNotFromSameLibrary(_)));

        let person = Person::new("Frank Herbert", "lib-1");
        people::insert(&mut conn, &person).await.unwrap();
        let mut request = new_book("col-1");
        request.contributors = vec![NewBookContributor {
            person_id: person.id,
            role_id: ContributorRole::new("Author", "lib-1").id,
        }];
        let err = add_book(&mut conn, request, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, ImportError::RelationIdDoesNotExist(_)));
    }

    #[tokio::test]
    async fn test_update_missing_book_is_id_error() {
        let pool = seeded_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut events = Vec::new();

        let mut book = add_book(&mut conn, new_book("col-1"), &mut events).await.unwrap();
        update_book(&mut conn, &mut book, &mut events).await.unwrap();
        assert_eq!(events.len(), 2);

        book.id = "missing".to_string();
        let err = update_book(&mut conn, &mut book, &mut events).await.unwrap_err();
        assert!(matches!(err, ImportError::IdDoesNotExist(_)));
    }
}
