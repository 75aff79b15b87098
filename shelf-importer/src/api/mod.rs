//! HTTP API handlers for shelf-importer

pub mod auth;
pub mod health;
pub mod importer;

pub use health::health_routes;
pub use importer::importer_routes;
