use thiserror::Error;

/// Status polling errors
#[derive(Debug, Error)]
pub enum PollError {
    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Status endpoint answered with a non-success code
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body was not a status object
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for PollError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
