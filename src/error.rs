use thiserror::Error;

use crate::llm::LlmError;
use crate::parser::ParseError;

/// Top-level error taxonomy for the daemon.
///
/// Validation rejections, parse failures and resolution gaps never appear
/// here; the engine resolves those into structured fallback responses.
/// What remains is genuinely unrecoverable within a request: transport
/// failures, malformed regeneration output, and the no-fallback-staff
/// configuration state.
#[derive(Debug, Error)]
pub enum TriagedError {
    #[error("Config error: {0}")]
    Config(String),

    /// The LLM call itself failed. Distinct from malformed output after a
    /// successful call; surfaced to the caller as a server error.
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    /// Regeneration completions must carry `summary` and `email`.
    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),

    /// Fallback staff resolution came up empty in a case with no safe
    /// default response. Requires operator attention, not retries.
    #[error("No available staff in fallback department {department}")]
    NoFallbackStaff { department: String },

    #[error("Staff refresh failed: {0}")]
    StaffRefresh(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
