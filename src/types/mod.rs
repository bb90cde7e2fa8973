//! # Types Module
//!
//! Wire and domain types shared by the client, the cache and the analyzer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AnalysisRequest`] | `(model id, text)` pair to analyze |
//! | [`AnalysisResult`] | Token/word/character statistics returned by `/tokenize` |
//! | [`SummaryResult`] | Output of `/optimizer/summarize` |
//! | [`ChatMessage`] | One turn of a `/generate` conversation |
//! | [`Conversation`] | Chat history with the context toggle |
//! | [`Notification`] | User-facing toast payload |

pub mod analysis;
pub mod message;
pub mod notification;

pub use analysis::{AnalysisRequest, AnalysisResult, SummaryResult};
pub use message::{ChatMessage, ChatRole, Conversation};
pub use notification::{Notification, NotificationLevel};
