//! Errors raised while bootstrapping a Shelf service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Opening the database or applying the schema failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the database directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}
