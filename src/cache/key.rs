//! Cache key generation.

use std::fmt;

/// Separator between model id and text. Model ids never contain it (the
/// catalog rejects such ids), so the first occurrence always splits the key.
pub const KEY_SEPARATOR: char = ':';

/// `"{model_id}:{text}"`, the session-store key for one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(model_id: &str, text: &str) -> Self {
        let mut key = String::with_capacity(model_id.len() + 1 + text.len());
        key.push_str(model_id);
        key.push(KEY_SEPARATOR);
        key.push_str(text);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Model id and text this key was built from.
    pub fn parts(&self) -> (&str, &str) {
        self.0
            .split_once(KEY_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
