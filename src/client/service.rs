use crate::types::{AnalysisRequest, AnalysisResult, SummaryResult};
use crate::Result;
use async_trait::async_trait;

/// Remote computation the analyzer delegates to.
///
/// Each call is one request-response exchange: implementations must not retry.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Token/word/character statistics for `request.text` under `request.model_id`.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult>;

    /// Summarize `request.text` with `request.model_id`.
    async fn summarize(&self, request: &AnalysisRequest) -> Result<SummaryResult>;
}
