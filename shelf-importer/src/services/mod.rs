//! Import services
//!
//! - [`resolver`]: find-or-create of publishers, people and contributor roles
//! - [`book_lifecycle`]: book creation/update with relation checks
//! - [`importer`]: the import transaction coordinator
//! - [`covers`]: post-commit cover download

pub mod book_lifecycle;
pub mod covers;
pub mod importer;
pub mod resolver;

pub use covers::{CoverDownloader, HttpCoverDownloader};
pub use importer::ImportService;
