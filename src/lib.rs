// Revolution Archive - Core Library
// Exposes the record store, auth gate, and content API for the server
// binary and the integration tests

pub mod api;
pub mod auth;
pub mod config;
pub mod db;

// Re-export commonly used types
pub use api::{router, ApiError, AppState};
pub use auth::{AdminSecret, AuthError, RequireAdmin};
pub use config::Config;
pub use db::{
    setup_database, ArchiveFields, ArchiveItem, News, NewsFields, Person, PersonFields, SiteInfo,
    SiteInfoFields, SITE_INFO_ID,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
