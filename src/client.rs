//! Client for the optimizer service.
//!
//! [`OptimizerClient`] talks HTTP; the analyzer only depends on the
//! [`AnalysisService`] trait so it can run against in-memory stand-ins.

pub mod builder;
pub mod optimizer;
pub mod service;

pub use builder::OptimizerClientBuilder;
pub use optimizer::{
    OptimizerClient, ANALYZE_FALLBACK_MESSAGE, CHAT_CONNECTION_MESSAGE, CHAT_FALLBACK_MESSAGE,
    SUMMARIZE_FALLBACK_MESSAGE,
};
pub use service::AnalysisService;
