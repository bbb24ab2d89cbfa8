use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::error::PollError;

/// Something that can report the current status of an analysis job
pub trait StatusSource: Send + Sync {
    fn fetch(&self, analysis_id: &str) -> impl Future<Output = Result<Value, PollError>> + Send;
}

impl<S: StatusSource> StatusSource for Arc<S> {
    async fn fetch(&self, analysis_id: &str) -> Result<Value, PollError> {
        self.as_ref().fetch(analysis_id).await
    }
}
