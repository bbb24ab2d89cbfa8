//! Unified Error Model
//!
//! The normalization and metrics functions never fail; these errors only
//! surface at the outer boundaries (text parsing, configuration, snapshot
//! persistence).
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinewatchError {
    #[error("PARSE/{0}")]
    ParseError(String),

    #[error("SERIALIZE/{0}")]
    SerializeError(String),

    #[error("SCHEMA/{0}")]
    SchemaError(String),

    #[error("CONFIG/{0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for MinewatchError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            Self::SchemaError(err.to_string())
        } else {
            Self::SerializeError(err.to_string())
        }
    }
}
