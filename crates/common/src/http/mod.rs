//! Outbound HTTP client construction
//!
//! Both third-party clients trust the CA bundle named by the TLS config
//! in addition to the built-in roots.

use crate::errors::{AppError, Result};
use std::path::Path;
use std::time::Duration;

/// Build a reqwest client with a timeout and an optional extra CA bundle
pub fn build_client(timeout: Duration, ca_bundle: Option<&Path>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(path) = ca_bundle {
        let pem = std::fs::read(path).map_err(|e| AppError::Configuration {
            message: format!("Failed to read CA bundle {}: {}", path.display(), e),
        })?;

        let certificates = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
            AppError::Configuration {
                message: format!("Invalid CA bundle {}: {}", path.display(), e),
            }
        })?;

        tracing::debug!(
            path = %path.display(),
            count = certificates.len(),
            "Loaded CA certificates"
        );

        for certificate in certificates {
            builder = builder.add_root_certificate(certificate);
        }
    }

    builder.build().map_err(|e| AppError::Internal {
        message: format!("Failed to create HTTP client: {}", e),
    })
}
