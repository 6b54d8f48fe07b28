//! Model Reply Parsing
//!
//! Models asked for raw JSON still wrap it in markdown fences now and then.
//! This module strips that wrapping and classifies the remainder as either a
//! JSON document or malformed text, leaving shape validation to the caller.

/// Outcome of parsing a cleaned model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    /// The reply is a JSON document. Its shape has not been checked yet.
    Json(serde_json::Value),
    /// The reply could not be parsed as JSON.
    Malformed { raw: String },
}

/// Trims the reply and removes every markdown code-fence marker.
pub fn clean_reply(raw: &str) -> String {
    raw.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parses an already cleaned reply.
pub fn parse_reply(cleaned: &str) -> ParsedReply {
    match serde_json::from_str::<serde_json::Value>(cleaned) {
        Ok(value) => ParsedReply::Json(value),
        Err(_) => ParsedReply::Malformed {
            raw: cleaned.to_string(),
        },
    }
}
