//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{ChatRequest, ErrorResponse, WelcomeResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tutor_core::lesson::{ExplanationSection, StructuredResponse, Verification};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::root, handlers::chat),
    components(
        schemas(
            ChatRequest,
            ErrorResponse,
            WelcomeResponse,
            StructuredResponse,
            ExplanationSection,
            Verification
        )
    ),
    tags(
        (name = "Tutor API", description = "Structured explanations and follow-up questions from a teaching assistant")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::root))
        .route("/chat", post(handlers::chat))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
