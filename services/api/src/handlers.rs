//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests to the teaching
//! assistant. It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;
use tutor_core::{
    lesson::StructuredResponse,
    tutor::{ChatError, DEFAULT_SESSION},
};

use crate::{
    models::{ChatRequest, ErrorResponse, WelcomeResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    BadUpstreamFormat(String),
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::BadUpstreamFormat(detail) => (StatusCode::BAD_GATEWAY, detail),
            ApiError::InternalServerError(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => ApiError::BadRequest("The message must not be empty.".to_string()),
            // Both are already logged where they are detected, in `handle_chat`.
            ChatError::BadUpstreamFormat { .. } => {
                ApiError::BadUpstreamFormat("The model's reply was not valid JSON.".to_string())
            }
            ChatError::InvalidShape(_) => ApiError::InternalServerError(
                "An error occurred while processing the request.".to_string(),
            ),
            ChatError::Upstream(e) => {
                error!("Internal Server Error: {:?}", e);
                ApiError::InternalServerError(format!(
                    "An error occurred while processing the request: {:#}",
                    e
                ))
            }
        }
    }
}

/// Welcome message for liveness checks and documentation discovery.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome message", body = WelcomeResponse)
    )
)]
pub async fn root(State(state): State<Arc<AppState>>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!(
            "Welcome to the {} teaching assistant API. See /swagger-ui for the documentation.",
            state.config.subject
        ),
    })
}

/// Ask a question and receive a structured explanation with follow-up questions.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Structured explanation", body = StructuredResponse),
        (status = 400, description = "Empty message", body = ErrorResponse),
        (status = 502, description = "The model's reply was not valid JSON", body = ErrorResponse),
        (status = 500, description = "Model call or validation failure", body = ErrorResponse)
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<StructuredResponse>, ApiError> {
    let session = payload
        .session_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SESSION);

    let response = state.tutor.handle_chat(session, &payload.message).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn status_of(err: ChatError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_chat_errors_map_to_status_classes() {
        assert_eq!(status_of(ChatError::EmptyMessage), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ChatError::BadUpstreamFormat {
                raw: "nope".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ChatError::Upstream(anyhow!("timeout"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let shape_err = serde_json::from_str::<StructuredResponse>("{}").unwrap_err();
        assert_eq!(
            status_of(ChatError::InvalidShape(shape_err)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_reply_details_are_fixed_messages() {
        match ApiError::from(ChatError::BadUpstreamFormat {
            raw: "secret model text".to_string(),
        }) {
            ApiError::BadUpstreamFormat(detail) => {
                assert!(detail.contains("not valid JSON"));
                assert!(!detail.contains("secret model text"));
            }
            _ => panic!("Expected BadUpstreamFormat"),
        }

        let shape_err = serde_json::from_str::<StructuredResponse>("{}").unwrap_err();
        match ApiError::from(ChatError::InvalidShape(shape_err)) {
            ApiError::InternalServerError(detail) => assert!(!detail.contains("missing field")),
            _ => panic!("Expected InternalServerError"),
        }
    }

    #[test]
    fn test_upstream_detail_includes_cause() {
        match ApiError::from(ChatError::Upstream(anyhow!("connection reset"))) {
            ApiError::InternalServerError(detail) => assert!(detail.contains("connection reset")),
            _ => panic!("Expected InternalServerError"),
        }
    }
}
