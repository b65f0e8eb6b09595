//! RoastingReels Common Library
//!
//! Shared code for the RoastingReels gateway and the populate command:
//! - Database models, the `Store` trait and its implementations
//! - Movie metadata client and service
//! - Translation client
//! - Popular-movie import
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod http;
pub mod metadata;
pub mod metrics;
pub mod sync;
pub mod translation;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{Repository, Store};
pub use errors::{AppError, Result};
pub use metadata::{MetadataProvider, MetadataService};
pub use translation::{Translate, Translator};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
