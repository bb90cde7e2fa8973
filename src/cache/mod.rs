//! # Analysis Cache Module
//!
//! Session-scoped cache of [`AnalysisResult`](crate::types::AnalysisResult)s,
//! keyed by `"{model_id}:{text}"`, so that re-typing an already analyzed text
//! never hits the service twice.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`AnalysisCache`] | Typed get/put with hit/miss statistics |
//! | [`SessionStore`] | Key-value port (get/put/clear) for any backend |
//! | [`MemoryStore`] | In-memory store, shareable across analyzers |
//! | [`NullStore`] | No-op store for disabling caching |
//! | [`CacheKey`] | Key derivation from `(model id, text)` |
//!
//! ## Example
//!
//! ```rust
//! use context_optimizer::cache::{AnalysisCache, CacheKey};
//! use context_optimizer::types::AnalysisResult;
//!
//! let cache = AnalysisCache::in_memory();
//! let key = CacheKey::for_request("gemini-2.5-flash", "hello world");
//! let result = AnalysisResult {
//!     input_tokens: 2,
//!     word_count: 2,
//!     character_count: 11,
//!     tokens: vec!["hello".into(), " world".into()],
//! };
//! cache.put(&key, &result).unwrap();
//! assert_eq!(cache.get(&key), Some(result));
//! ```
//!
//! Entries are never evicted; they go away when the store is dropped at the
//! end of the session.

mod backend;
mod key;
mod manager;

pub use backend::{MemoryStore, NullStore, SessionStore};
pub use key::{CacheKey, KEY_SEPARATOR};
pub use manager::{AnalysisCache, CacheStats};
