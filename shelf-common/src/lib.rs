//! # Shelf Common Library
//!
//! Shared code for the Shelf services including:
//! - Error types
//! - Bootstrap configuration loading
//! - SQLite database initialization and schema
//! - Domain event bus

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
