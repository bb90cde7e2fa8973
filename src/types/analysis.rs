//! Analysis request/response types.

use serde::{Deserialize, Serialize};

/// A `(model id, text)` pair. Equality is exact: no trimming or case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisRequest {
    pub model_id: String,
    pub text: String,
}

impl AnalysisRequest {
    pub fn new(model_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            text: text.into(),
        }
    }

    pub fn cache_key(&self) -> crate::cache::CacheKey {
        crate::cache::CacheKey::for_request(&self.model_id, &self.text)
    }
}

/// Statistics for one analyzed text, exactly as returned by `/tokenize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub input_tokens: u64,
    pub word_count: u64,
    pub character_count: u64,
    /// Tokens in left-to-right order of occurrence; repeats are kept.
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Output of the summarization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub original_token_count: u64,
    pub summary_token_count: u64,
    pub summary: String,
}

impl SummaryResult {
    /// Percentage of tokens saved by the summary; 0 when the original was empty.
    pub fn savings_percent(&self) -> f64 {
        if self.original_token_count == 0 {
            return 0.0;
        }
        let saved = self.original_token_count as f64 - self.summary_token_count as f64;
        saved / self.original_token_count as f64 * 100.0
    }
}
