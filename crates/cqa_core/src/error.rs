use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape used by every layer and embedded in routed responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(codes::CONFIG_INVALID, message)
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(d) = self.details.as_deref() {
            write!(f, " ({d})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// Error codes shared across crates.
pub mod codes {
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const CONFIG_READ_FAILED: &str = "CONFIG_READ_FAILED";
    pub const CORPUS_MISSING: &str = "CORPUS_MISSING";
    pub const CORPUS_READ_FAILED: &str = "CORPUS_READ_FAILED";
    pub const SEMANTIC_UNAVAILABLE: &str = "SEMANTIC_UNAVAILABLE";
    pub const SEMANTIC_SCHEMA_MISMATCH: &str = "SEMANTIC_SCHEMA_MISMATCH";
    pub const EMPTY_QUERY: &str = "EMPTY_QUERY";
    pub const SALARY_SEARCH_FAILED: &str = "SALARY_SEARCH_FAILED";
    pub const SALARY_TOOL_FAILED: &str = "SALARY_TOOL_FAILED";
    pub const EVAL_INPUT_INVALID: &str = "EVAL_INPUT_INVALID";
    pub const REFERENCES_MALFORMED: &str = "REFERENCES_MALFORMED";
}
