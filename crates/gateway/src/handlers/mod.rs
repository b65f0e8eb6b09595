//! API handlers module

pub mod auth;
pub mod health;
pub mod movies;
pub mod reviews;
pub mod suggestions;
pub mod translate;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use roastingreels_common::errors::{AppError, Result};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Cache policy for read endpoints
pub const CACHEABLE: &str = "public, max-age=3600";

/// Cache policy for writes
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// Decode a JSON request body
///
/// Syntax errors and a literal `null` are `Invalid JSON`; a document of the
/// wrong shape is reported as a field violation on `body`. Handlers call
/// this after their permission and existence checks so those win.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let value: Value = serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)?;
    if value.is_null() {
        return Err(AppError::InvalidJson);
    }

    serde_json::from_value(value).map_err(|e| AppError::field("body", e.to_string()))
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
pub fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 200 with the read cache policy
pub fn cacheable<T: Serialize>(body: T) -> Response {
    ([(header::CACHE_CONTROL, CACHEABLE)], Json(body)).into_response()
}

/// Write response pointing at the stored resource
pub fn stored<T: Serialize>(status: StatusCode, location: String, body: T) -> Response {
    (
        status,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, NO_STORE.to_string()),
        ],
        Json(body),
    )
        .into_response()
}

/// 204 after a delete
pub fn deleted() -> Response {
    (StatusCode::NO_CONTENT, [(header::CACHE_CONTROL, NO_STORE)]).into_response()
}
