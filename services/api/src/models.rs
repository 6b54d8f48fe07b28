//! API Models
//!
//! Request and response bodies of the HTTP API that are not part of the
//! shared lesson types, annotated for OpenAPI generation with `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone)]
pub struct ChatRequest {
    #[schema(example = "What is a class?")]
    pub message: String,
    /// Scopes the conversation history. Requests without one share the
    /// default conversation.
    #[serde(default)]
    #[schema(example = "5f0c2d9e-6a51-4c1b-9a7e-1f3f4b8d2c10")]
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct WelcomeResponse {
    pub message: String,
}
