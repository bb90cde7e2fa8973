//! # context-optimizer
//!
//! 面向提示词的 Token 与成本分析流水线：防抖、会话缓存、远程分析与成本推导。
//!
//! Token and cost analysis pipeline for prompts. Text typed by a user is
//! debounced, looked up in a session cache, analyzed by a remote tokenizer
//! service on a miss, and turned into a cost estimate under the selected
//! model's pricing.
//!
//! ## Overview
//!
//! The pipeline is driven by an [`analyzer::Analyzer`]: a single task that owns
//! the view state, reacts to input changes, and publishes every transition on a
//! `watch` channel. Responses that arrive after the input moved on are dropped,
//! so the displayed result always belongs to the current `(model, text)` pair.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use context_optimizer::{Analyzer, OptimizerClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> context_optimizer::Result<()> {
//!     let client = OptimizerClient::builder()
//!         .base_url("http://127.0.0.1:8000")
//!         .build()?;
//!     let analyzer = Analyzer::builder(Arc::new(client)).spawn();
//!
//!     analyzer.select_model("gemini-2.5-flash")?;
//!     analyzer.set_text("Summarize the following report.")?;
//!
//!     let state = analyzer.settled().await?;
//!     if let Some(cost) = state.cost() {
//!         println!("{} ({})", cost.format_total(), cost.format_converted());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`analyzer`] | Orchestrating state machine and its handle |
//! | [`debounce`] | Timer-restarting debounce primitive |
//! | [`cache`] | Session cache keyed by model and text |
//! | [`client`] | HTTP client for the tokenize/summarize/generate service |
//! | [`tokens`] | Cost model and context usage helpers |
//! | [`models`] | Model catalog with pricing |
//! | [`url_state`] | Shareable URL encoding of model and text |
//! | [`config`] | Environment-driven configuration |
//! | [`types`] | Requests, results, chat messages, notifications |

pub mod analyzer;
pub mod cache;
pub mod client;
pub mod config;
pub mod debounce;
pub mod models;
pub mod tokens;
pub mod transport;
pub mod types;
pub mod url_state;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerHandle, AnalyzerViewState, Phase};
pub use cache::{AnalysisCache, CacheKey};
pub use client::{AnalysisService, OptimizerClient, OptimizerClientBuilder};
pub use config::AnalyzerConfig;
pub use models::{ModelCatalog, ModelDescriptor};
pub use tokens::{CostEstimate, ModelPricing};
pub use types::{
    AnalysisRequest, AnalysisResult, ChatMessage, ChatRole, Conversation, Notification,
    NotificationLevel, SummaryResult,
};

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

// Re-export error types
pub mod error;
pub use error::{Error, ErrorContext};
