//! # Cost Estimation Module
//!
//! Pure pricing arithmetic for analyzed text: what the counted input tokens and
//! an expected number of output tokens cost under a model's pricing schedule,
//! in the pricing currency (USD) and converted with a fixed exchange rate.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ModelPricing`] | Input/output price per `per_tokens` tokens |
//! | [`CostEstimate`] | Derived cost breakdown, never cached |
//! | [`estimate`] | The cost function itself |
//! | [`context_usage_percent`] | Share of a context window taken by a prompt |
//!
//! ## Example
//!
//! ```rust
//! use context_optimizer::tokens::{estimate, ModelPricing, USD_TO_INR_RATE};
//!
//! let pricing = ModelPricing::per_million(0.3, 2.5);
//! let cost = estimate(&pricing, 2, 500, USD_TO_INR_RATE);
//! assert!(cost.total_cost > 0.0);
//! println!("{} ({})", cost.format_total(), cost.format_converted());
//! ```
//!
//! Rounding only happens in the `format_*` helpers; the numbers themselves are
//! left untouched.

mod pricing;
mod usage;

pub use pricing::{estimate, CostEstimate, ModelPricing, USD_TO_INR_RATE};
pub use usage::{context_usage_fraction, context_usage_percent, format_count, format_usage};
