//! Cover download
//!
//! Runs after the import transaction has committed. Every failure is logged
//! and absorbed: the book stays imported, just without a cover.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client};
use shelf_common::events::{DomainEvent, EventBus};
use sqlx::SqlitePool;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{books, images};
use crate::models::new_id;

/// Largest cover accepted by default (10 MiB)
pub const DEFAULT_MAX_COVER_BYTES: usize = 10 * 1024 * 1024;

/// Attaches a cover image to a stored book
#[async_trait]
pub trait CoverDownloader: Send + Sync {
    /// Download `url` and attach it to `book_id`; returns the new image id
    async fn download_cover(&self, book_id: &str, url: &str) -> Option<String>;
}

#[derive(Debug, Error)]
enum CoverError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected content type: {0}")]
    NotAnImage(String),

    #[error("cover larger than {0} bytes")]
    TooLarge(usize),

    #[error("file write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Stores covers under `<images_dir>/books/`
pub struct HttpCoverDownloader {
    client: Client,
    pool: SqlitePool,
    images_dir: PathBuf,
    events: EventBus,
    max_bytes: usize,
}

impl HttpCoverDownloader {
    pub fn new(client: Client, pool: SqlitePool, images_dir: PathBuf, events: EventBus) -> Self {
        Self {
            client,
            pool,
            images_dir,
            events,
            max_bytes: DEFAULT_MAX_COVER_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn try_download(&self, book_id: &str, url: &str) -> Result<String, CoverError> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let mime_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .unwrap_or_default();
        let extension = image_extension(&mime_type).ok_or_else(|| CoverError::NotAnImage(mime_type.clone()))?;

        if response.content_length().is_some_and(|len| len > self.max_bytes as u64) {
            return Err(CoverError::TooLarge(self.max_bytes));
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(CoverError::TooLarge(self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        let image_id = new_id();
        let file_name = format!("books/{image_id}.{extension}");
        let path = self.images_dir.join(&file_name);
        tokio::fs::create_dir_all(self.images_dir.join("books")).await?;
        tokio::fs::write(&path, &bytes).await?;

        let image = images::ImageRecord {
            id: image_id.clone(),
            file_name,
            mime_type,
            size_bytes: bytes.len() as i64,
        };

        if let Err(e) = self.attach(book_id, &image).await {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %remove_err, "Failed to remove unattached cover file");
            }
            return Err(e.into());
        }

        Ok(image_id)
    }

    async fn attach(&self, book_id: &str, image: &images::ImageRecord) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        images::insert(&mut *tx, image).await?;
        books::set_cover(&mut *tx, book_id, &image.id).await?;
        tx.commit().await
    }
}

#[async_trait]
impl CoverDownloader for HttpCoverDownloader {
    async fn download_cover(&self, book_id: &str, url: &str) -> Option<String> {
        match self.try_download(book_id, url).await {
            Ok(image_id) => {
                info!(book_id, image_id = %image_id, "Attached cover");
                self.events.emit_lossy(DomainEvent::BookCoverAdded {
                    book_id: book_id.to_string(),
                    image_id: image_id.clone(),
                    timestamp: Utc::now(),
                });
                Some(image_id)
            }
            Err(e) => {
                warn!(book_id, url, error = %e, "Cover download failed, book kept without cover");
                None
            }
        }
    }
}

fn image_extension(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}
