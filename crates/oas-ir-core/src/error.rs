//! Error types for catalog builds.
//!
//! Schema compilation itself never fails — malformed input degrades to
//! `unknown`/`any` nodes. Errors exist only at the edges: parsing documents,
//! extracting catalogs, and emitter hooks run by the build orchestrator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("emitter error for {name}: {message}")]
    Emitter { name: String, message: String },
}

impl BuildError {
    /// Wrap an emitter failure for a named catalog entry.
    pub fn emitter(name: impl Into<String>, message: impl Into<String>) -> Self {
        BuildError::Emitter {
            name: name.into(),
            message: message.into(),
        }
    }
}
