use serde::{Deserialize, Serialize};

/// Path of the validation endpoint.
pub const VALIDATE_PATH: &str = "/api/validate-idea";

/// Body of every non-200 answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    /// Diagnostic text, only filled in development mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
