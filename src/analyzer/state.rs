//! Observable analyzer state.

use crate::models::ModelDescriptor;
use crate::tokens::{self, CostEstimate};
use crate::types::{AnalysisRequest, AnalysisResult, Notification};
use serde::Serialize;

/// Where the analyzer is in its evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No text or no model selected.
    Idle,
    /// Input present, waiting for it to settle.
    Pending,
    /// Settled input missed the cache; the service is working on it.
    Loading,
    /// A result for the current input is available.
    Ready,
    /// The last attempt failed; any earlier result is kept.
    Failed,
}

/// Snapshot of one analyzer, published after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerViewState {
    pub phase: Phase,
    /// Text as typed.
    pub text: String,
    /// Last text that survived the debounce.
    pub debounced_text: String,
    pub model: Option<ModelDescriptor>,
    /// Expected completion length used for the output cost.
    pub output_tokens: u64,
    /// Latest good result, possibly for an earlier input (see `result_request`).
    pub result: Option<AnalysisResult>,
    /// The `(model, text)` pair `result` was computed for.
    pub result_request: Option<AnalysisRequest>,
    pub in_flight: bool,
    pub last_error: Option<Notification>,
    pub exchange_rate: f64,
    /// Number of input changes applied so far.
    pub revision: u64,
}

impl AnalyzerViewState {
    pub(crate) fn new(output_tokens: u64, exchange_rate: f64) -> Self {
        Self {
            phase: Phase::Idle,
            text: String::new(),
            debounced_text: String::new(),
            model: None,
            output_tokens,
            result: None,
            result_request: None,
            in_flight: false,
            last_error: None,
            exchange_rate,
            revision: 0,
        }
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.id.as_str())
    }

    /// The pair the analyzer is working towards: selected model and typed
    /// text, both non-empty.
    pub fn current_request(&self) -> Option<AnalysisRequest> {
        let model = self.model_id()?;
        if self.text.is_empty() {
            return None;
        }
        Some(AnalysisRequest::new(model, self.text.clone()))
    }

    /// `result`, but only when it belongs to the current input.
    pub fn current_result(&self) -> Option<&AnalysisResult> {
        let current = self.current_request()?;
        match (&self.result, &self.result_request) {
            (Some(result), Some(req)) if *req == current => Some(result),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Cost of the current result with the selected model's pricing.
    /// Recomputed on every call.
    pub fn cost(&self) -> Option<CostEstimate> {
        let model = self.model.as_ref()?;
        let result = self.current_result()?;
        Some(tokens::estimate(
            &model.pricing,
            result.input_tokens,
            self.output_tokens,
            self.exchange_rate,
        ))
    }

    /// Share of the selected model's context window used by the current text.
    pub fn context_usage_percent(&self) -> Option<f64> {
        let model = self.model.as_ref()?;
        let result = self.current_result()?;
        Some(tokens::context_usage_percent(
            result.input_tokens,
            model.context_window,
        ))
    }
}
