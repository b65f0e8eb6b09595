//! Review translation

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::parse_json;
use crate::AppState;
use roastingreels_common::{
    errors::{ErrorResponse, Result},
    translation::Translation,
};

#[derive(Debug, Deserialize, Validate)]
pub struct TranslateRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "The text to translate must not be blank."))]
    pub text: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "The target language must not be blank."))]
    pub language: String,
}

/// Translate `text` into `language`
pub async fn translate(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: TranslateRequest = parse_json(&body)?;
    request.validate()?;

    match state.translator.translate(&request.text, &request.language).await {
        Translation::Translated { response } => {
            Ok(Json(Translation::Translated { response }).into_response())
        }
        Translation::Failed { error } => {
            tracing::warn!(language = %request.language, error = %error, "Translation failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to translate text".to_string(),
                }),
            )
                .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_json, TestApp};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_translate() {
        let app = TestApp::new().await;

        let response = app
            .json(
                Method::POST,
                "/translate",
                None,
                json!({"text": "Bonjour", "language": "English"}),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"response": "(English) Bonjour"})
        );
    }

    #[tokio::test]
    async fn test_translation_failure() {
        let app = TestApp::new().await;

        let response = app
            .json(
                Method::POST,
                "/translate",
                None,
                json!({"text": "Bonjour", "language": "Klingon"}),
            )
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Failed to translate text"})
        );
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let app = TestApp::new().await;

        let response = app
            .json(Method::POST, "/translate", None, json!({"language": "English"}))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
