//! Structured Lesson Types
//!
//! The fixed shape every answer is reshaped into before it reaches a learner:
//! an ordered list of explanation sections followed by a short comprehension
//! check. These types are shared by the HTTP service and the terminal client.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One titled block of the explanation. Display order is list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExplanationSection {
    #[schema(example = "Overview")]
    pub title: String,
    pub content: String,
}

/// The comprehension check that closes every answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// A short prompt asking the learner to summarize what they understood.
    pub summary_prompt: String,
    /// Suggested next questions. The system prompt asks for three but the
    /// model is free to return any number.
    pub follow_up_questions: Vec<String>,
}

/// The complete structured answer returned by `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StructuredResponse {
    pub explanation: Vec<ExplanationSection>,
    pub verification: Verification,
}

impl StructuredResponse {
    /// Checks a parsed JSON document against the required shape.
    ///
    /// Both top-level fields and both verification subfields must be present
    /// with the right types. Unknown extra fields are ignored.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
