//! Model pricing and cost estimation.

use serde::{Deserialize, Serialize};

/// Fixed USD to INR conversion used for the secondary currency.
pub const USD_TO_INR_RATE: f64 = 88.21;

/// Price schedule of one model: `input` / `output` USD per `per_tokens` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
    pub per_tokens: u64,
}

impl ModelPricing {
    pub fn new(input: f64, output: f64, per_tokens: u64) -> Self {
        Self {
            input,
            output,
            per_tokens,
        }
    }

    pub fn per_million(input: f64, output: f64) -> Self {
        Self::new(input, output, 1_000_000)
    }

    pub fn estimate(&self, input_tokens: u64, output_tokens: u64, rate: f64) -> CostEstimate {
        estimate(self, input_tokens, output_tokens, rate)
    }
}

/// Cost breakdown for one analysis. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostEstimate {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    /// `total_cost` converted with the fixed exchange rate.
    pub total_cost_converted: f64,
}

/// Cost of `input_tokens` prompt tokens plus `output_tokens` expected
/// completion tokens. No rounding is applied.
pub fn estimate(
    pricing: &ModelPricing,
    input_tokens: u64,
    output_tokens: u64,
    rate: f64,
) -> CostEstimate {
    let per = pricing.per_tokens as f64;
    let input_cost = input_tokens as f64 / per * pricing.input;
    let output_cost = output_tokens as f64 / per * pricing.output;
    let total_cost = input_cost + output_cost;
    CostEstimate {
        input_cost,
        output_cost,
        total_cost,
        total_cost_converted: total_cost * rate,
    }
}

impl CostEstimate {
    pub fn format_input(&self) -> String {
        format!("${:.6}", self.input_cost)
    }
    pub fn format_output(&self) -> String {
        format!("${:.6}", self.output_cost)
    }
    pub fn format_total(&self) -> String {
        format!("${:.4}", self.total_cost)
    }
    pub fn format_converted(&self) -> String {
        format!("₹{:.2}", self.total_cost_converted)
    }
}
