//! vk.com API envelope types
//!
//! Every method answers with either `{"response": ...}` or
//! `{"error": {"error_code": N, "error_msg": "..."}}`.

use serde::Deserialize;
use serde_json::Value;

/// Top-level API response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub response: Option<Value>,

    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// Body of an `error` envelope.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error_code: i64,

    #[serde(default)]
    pub error_msg: String,
}
