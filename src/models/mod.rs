//! Model catalog: the static set of selectable pricing/capability profiles.
//!
//! The catalog is configuration, not runtime state. It is validated once when
//! built (ids usable as cache key prefixes, positive context windows and
//! pricing units) and never mutated afterwards.

use crate::cache::KEY_SEPARATOR;
use crate::tokens::ModelPricing;
use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One selectable model profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    /// Display name, e.g. "Google - Gemini 2.5 Flash".
    pub name: String,
    /// Maximum tokens the model accepts.
    pub context_window: u64,
    pub pricing: ModelPricing,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        context_window: u64,
        pricing: ModelPricing,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context_window,
            pricing,
        }
    }

    /// `"Context: 1,000,000 tokens | Pricing (per 1M): $0.30 input, $2.50 output"`
    pub fn summary_line(&self) -> String {
        format!(
            "Context: {} tokens | Pricing (per {}): ${:.2} input, ${:.2} output",
            crate::tokens::format_count(self.context_window),
            per_label(self.pricing.per_tokens),
            self.pricing.input,
            self.pricing.output
        )
    }
}

fn per_label(per_tokens: u64) -> String {
    match per_tokens {
        1_000_000 => "1M".to_string(),
        1_000 => "1K".to_string(),
        n => crate::tokens::format_count(n),
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    models: Vec<ModelDescriptor>,
}

static BUILTIN: Lazy<Vec<ModelDescriptor>> = Lazy::new(|| {
    vec![
        ModelDescriptor::new(
            "gemini-2.5-flash",
            "Google - Gemini 2.5 Flash",
            1_000_000,
            ModelPricing::per_million(0.3, 2.5),
        ),
        ModelDescriptor::new(
            "gemini-2.5-flash-lite",
            "Google - Gemini 2.5 Flash-Lite",
            1_000_000,
            ModelPricing::per_million(0.1, 0.4),
        ),
        ModelDescriptor::new(
            "gemini-1.5-flash",
            "Google - Gemini 1.5 Flash (Legacy)",
            1_000_000,
            ModelPricing::per_million(0.35, 1.05),
        ),
    ]
});

/// Ordered, validated set of [`ModelDescriptor`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self> {
        validate(&models)?;
        Ok(Self { models })
    }

    /// The three Gemini profiles offered by the analyzer.
    pub fn builtin() -> Self {
        Self {
            models: BUILTIN.clone(),
        }
    }

    /// Parse a YAML catalog of the form `models: [{id, name, context_window, pricing}]`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.models)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate(models: &[ModelDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, m) in models.iter().enumerate() {
        let invalid = |msg: String| {
            Error::validation_with_context(
                msg,
                ErrorContext::new()
                    .with_field_path(format!("models[{}]", i))
                    .with_source("catalog"),
            )
        };
        if m.id.trim().is_empty() {
            return Err(invalid("model id must not be empty".into()));
        }
        if m.id.contains(KEY_SEPARATOR) {
            return Err(invalid(format!(
                "model id '{}' must not contain '{}'",
                m.id, KEY_SEPARATOR
            )));
        }
        if !seen.insert(m.id.as_str()) {
            return Err(invalid(format!("duplicate model id '{}'", m.id)));
        }
        if m.context_window == 0 {
            return Err(invalid(format!("model '{}' has a zero context window", m.id)));
        }
        if m.pricing.per_tokens == 0 {
            return Err(invalid(format!("model '{}' has a zero pricing unit", m.id)));
        }
        let price_ok = |p: f64| p.is_finite() && p >= 0.0;
        if !price_ok(m.pricing.input) || !price_ok(m.pricing.output) {
            return Err(invalid(format!("model '{}' has an invalid price", m.id)));
        }
    }
    Ok(())
}
