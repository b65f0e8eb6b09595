//! Configuration management for RoastingReels services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - The legacy variable names used by existing deployments
//!   (DATABASE_URL, TMDB_API_BEARER_TOKEN, OPENAI_API_KEY, CACERT_PATH, JWT_SECRET)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Movie metadata provider (TMDB)
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Chat-completion translation API
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Trust store for outbound HTTPS
    #[serde(default)]
    pub tls: TlsConfig,

    /// Poster uploads
    #[serde(default)]
    pub uploads: UploadConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply pending migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token signing
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,

    /// Registrations with this email suffix receive the editor role
    #[serde(default = "default_editor_email_suffix")]
    pub editor_email_suffix: String,

    /// Cookie carrying the JWT for page flows
    #[serde(default = "default_auth_cookie")]
    pub cookie_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// API base URL
    #[serde(default = "default_metadata_base_url")]
    pub base_url: String,

    /// Prefix applied to poster paths
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Bearer token for the provider
    pub bearer_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u64,

    /// Response language
    #[serde(default = "default_metadata_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslationConfig {
    /// Chat-completion endpoint
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,

    /// API key
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_translation_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TlsConfig {
    /// PEM bundle of trusted CA certificates
    pub ca_bundle_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Directory uploaded posters are written to
    #[serde(default = "default_posters_dir")]
    pub posters_dir: String,

    /// Maximum poster size in bytes
    #[serde(default = "default_max_poster_bytes")]
    pub max_poster_bytes: usize,

    /// Poster stored when neither a file nor a URL is given
    #[serde(default = "default_poster")]
    pub default_poster: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_run_migrations() -> bool { true }
fn default_jwt_expiration() -> u64 { 3600 }
fn default_editor_email_suffix() -> String { "@roastingreels.editor.com".to_string() }
fn default_auth_cookie() -> String { "auth_token".to_string() }
fn default_metadata_base_url() -> String { "https://api.themoviedb.org".to_string() }
fn default_image_base_url() -> String { "https://image.tmdb.org/t/p/w500".to_string() }
fn default_metadata_timeout() -> u64 { 5 }
fn default_metadata_language() -> String { "en-US".to_string() }
fn default_translation_endpoint() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_translation_model() -> String { "gpt-4".to_string() }
fn default_translation_timeout() -> u64 { 30 }
fn default_posters_dir() -> String { "public/uploads/posters".to_string() }
fn default_max_poster_bytes() -> usize { 1024 * 1024 }
fn default_poster() -> String { "noImage.jpg".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "roastingreels".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            // Legacy variable names win over everything else
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("metadata.bearer_token", std::env::var("TMDB_API_BEARER_TOKEN").ok())?
            .set_override_option("translation.api_key", std::env::var("OPENAI_API_KEY").ok())?
            .set_override_option("tls.ca_bundle_path", std::env::var("CACERT_PATH").ok())?
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?

            .build()?;

        config.try_deserialize()
    }

    /// Startup checks for settings every deployment needs
    pub fn validate(&self) -> Result<()> {
        let ca_path = self.tls.ca_bundle_path.as_deref().ok_or_else(|| AppError::Configuration {
            message: "CACERT_PATH is not set".to_string(),
        })?;

        if !Path::new(ca_path).is_file() {
            return Err(AppError::Configuration {
                message: format!("CA bundle not found at {}", ca_path),
            });
        }

        if self.auth.jwt_secret.as_deref().map_or(true, str::is_empty) {
            return Err(AppError::Configuration {
                message: "JWT secret is not set".to_string(),
            });
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration(),
            editor_email_suffix: default_editor_email_suffix(),
            cookie_name: default_auth_cookie(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: default_metadata_base_url(),
            image_base_url: default_image_base_url(),
            bearer_token: None,
            timeout_secs: default_metadata_timeout(),
            language: default_metadata_language(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translation_endpoint(),
            api_key: None,
            model: default_translation_model(),
            timeout_secs: default_translation_timeout(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            posters_dir: default_posters_dir(),
            max_poster_bytes: default_max_poster_bytes(),
            default_poster: default_poster(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/roastingreels".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
                run_migrations: default_run_migrations(),
            },
            auth: AuthConfig::default(),
            metadata: MetadataConfig::default(),
            translation: TranslationConfig::default(),
            tls: TlsConfig::default(),
            uploads: UploadConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use std::io::Write;

    fn configured(ca_path: Option<String>) -> AppConfig {
        let mut config = AppConfig::default();
        config.tls.ca_bundle_path = ca_path;
        config.auth.jwt_secret = Some("secret".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.metadata.timeout_secs, 5);
        assert_eq!(config.translation.model, "gpt-4");
        assert_eq!(config.uploads.max_poster_bytes, 1_048_576);
        assert_eq!(config.uploads.default_poster, "noImage.jpg");
    }

    #[test]
    fn test_validate_requires_ca_bundle() {
        let err = configured(None).validate().unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_validate_rejects_missing_ca_file() {
        let err = configured(Some("/nonexistent/cacert.pem".to_string()))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("CA bundle not found"));
    }

    #[test]
    fn test_validate_accepts_existing_bundle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "-----BEGIN CERTIFICATE-----").unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert_ok!(configured(Some(path.clone())).validate());

        let mut no_secret = configured(Some(path));
        no_secret.auth.jwt_secret = None;
        assert_err!(no_secret.validate());
    }
}
