//! Unified Error Type System
//!
//! Single application error enum for the whole pipeline, with the
//! request-level taxonomy baked into the HTTP mapping:
//!
//! - validation errors (`InvalidUrl`) → 400, rejected before any
//!   external call
//! - upstream/internal errors → 500, request aborts with no partial
//!   report
//! - degradable errors (per-file parse failures, classification
//!   failures) never surface here at all; they are swallowed at the
//!   call site and replaced with neutral defaults

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersonaError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    /// Non-success response from GitHub or another upstream service.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Parse error in {path}: {message}")]
    Parse { message: String, path: String },

    #[error("Model error: {0}")]
    Llm(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl PersonaError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            path: path.into(),
        }
    }

    /// HTTP status this error maps to at the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PersonaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PersonaError>;
