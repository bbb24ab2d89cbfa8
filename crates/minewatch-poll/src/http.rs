//! Status source backed by the analysis backend's REST API

use serde_json::Value;
use std::time::Duration;

use crate::error::PollError;
use crate::source::StatusSource;

const USER_AGENT: &str = concat!("minewatch/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// GETs `<base_url>/python/analysis/<id>`
pub struct HttpStatusSource {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpStatusSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PollError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PollError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn status_url(&self, analysis_id: &str) -> String {
        format!("{}/python/analysis/{}", self.base_url, analysis_id)
    }
}

/// The backend's `message` field when the error body is JSON, else the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

impl StatusSource for HttpStatusSource {
    async fn fetch(&self, analysis_id: &str) -> Result<Value, PollError> {
        let url = self.status_url(analysis_id);
        tracing::debug!(analysis_id = %analysis_id, url = %url, "Fetching analysis status");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| PollError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PollError::Api(status.as_u16(), error_message(&body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PollError::Parse(e.to_string()))
    }
}
