//! Shareable links: `(model, text)` carried in the page's query string.
//!
//! The current address is reached through a [`LocationProvider`] instead of a
//! global, so a CLI argument works as well as a real page.

use crate::models::ModelCatalog;
use crate::{Error, ErrorContext, Result};
use std::sync::RwLock;
use url::Url;

pub const MODEL_PARAM: &str = "model";
pub const TEXT_PARAM: &str = "text";
pub const RESULTS_PATH: &str = "/results";

/// Read/write access to the current page address.
pub trait LocationProvider: Send + Sync {
    /// Full current address, including the query string.
    fn href(&self) -> String;

    /// Replace the current address without navigating.
    fn replace_href(&self, href: &str);
}

/// Address held in memory.
#[derive(Debug)]
pub struct StaticLocation {
    href: RwLock<String>,
}

impl StaticLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: RwLock::new(href.into()),
        }
    }
}

impl LocationProvider for StaticLocation {
    fn href(&self) -> String {
        self.href.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace_href(&self, href: &str) {
        *self.href.write().unwrap_or_else(|e| e.into_inner()) = href.to_string();
    }
}

/// State recovered from an address. Defaults to no model and empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedState {
    pub model_id: Option<String>,
    pub text: String,
}

/// Parse `model` and `text` from `href`.
///
/// Unknown model ids are dropped; missing parameters and unparsable addresses
/// yield the defaults. The first occurrence of a repeated parameter wins.
pub fn import_href(href: &str, catalog: &ModelCatalog) -> SharedState {
    let Ok(url) = Url::parse(href) else {
        return SharedState::default();
    };
    let mut model = None;
    let mut text = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            MODEL_PARAM if model.is_none() => model = Some(value.into_owned()),
            TEXT_PARAM if text.is_none() => text = Some(value.into_owned()),
            _ => {}
        }
    }
    SharedState {
        model_id: model.filter(|m| catalog.contains(m)),
        text: text.unwrap_or_default(),
    }
}

/// [`import_href`] on the provider's current address.
pub fn import(location: &dyn LocationProvider, catalog: &ModelCatalog) -> SharedState {
    import_href(&location.href(), catalog)
}

/// Absolute link to the current page carrying `model_id` and `text`.
pub fn export(location: &dyn LocationProvider, model_id: &str, text: &str) -> Result<String> {
    let base = page_url(&location.href())?;
    Ok(with_state(base, model_id, text))
}

/// Link to the summarization results page for `(model_id, text)`.
pub fn results_url(location: &dyn LocationProvider, model_id: &str, text: &str) -> Result<String> {
    let mut base = page_url(&location.href())?;
    base.set_path(RESULTS_PATH);
    Ok(with_state(base, model_id, text))
}

/// Rewrite the provider's address so it reflects `(model_id, text)`.
pub fn sync_to_location(location: &dyn LocationProvider, model_id: &str, text: &str) -> Result<()> {
    let href = export(location, model_id, text)?;
    location.replace_href(&href);
    Ok(())
}

fn page_url(href: &str) -> Result<Url> {
    let mut url = Url::parse(href).map_err(|e| {
        Error::validation_with_context(
            format!("current location is not an absolute URL: {}", e),
            ErrorContext::new()
                .with_details(href.to_string())
                .with_source("url_state"),
        )
    })?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn with_state(mut url: Url, model_id: &str, text: &str) -> String {
    url.query_pairs_mut()
        .append_pair(MODEL_PARAM, model_id)
        .append_pair(TEXT_PARAM, text);
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://optimizer.example/tokens";

    #[test]
    fn missing_parameters_give_defaults() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(import_href(PAGE, &catalog), SharedState::default());
        assert_eq!(import_href("not a url", &catalog), SharedState::default());
    }

    #[test]
    fn unknown_models_are_ignored_but_text_is_kept() {
        let catalog = ModelCatalog::builtin();
        let state = import_href(&format!("{PAGE}?model=gpt-4o&text=hi%20there"), &catalog);
        assert_eq!(state.model_id, None);
        assert_eq!(state.text, "hi there");
    }

    #[test]
    fn export_replaces_existing_query_and_fragment() {
        let loc = StaticLocation::new(format!("{PAGE}?model=old&text=old#frag"));
        let link = export(&loc, "gemini-2.5-flash", "a b&c").unwrap();
        assert_eq!(
            link,
            "https://optimizer.example/tokens?model=gemini-2.5-flash&text=a+b%26c"
        );
    }

    #[test]
    fn results_link_points_at_results_page() {
        let loc = StaticLocation::new(PAGE);
        let link = results_url(&loc, "gemini-1.5-flash", "x").unwrap();
        assert_eq!(
            link,
            "https://optimizer.example/results?model=gemini-1.5-flash&text=x"
        );
    }

    #[test]
    fn sync_writes_through_the_provider() {
        let catalog = ModelCatalog::builtin();
        let loc = StaticLocation::new(PAGE);
        sync_to_location(&loc, "gemini-2.5-flash-lite", "hello?").unwrap();
        let state = import(&loc, &catalog);
        assert_eq!(state.model_id.as_deref(), Some("gemini-2.5-flash-lite"));
        assert_eq!(state.text, "hello?");
    }

    #[test]
    fn relative_locations_cannot_be_exported() {
        let loc = StaticLocation::new("/tokens");
        assert!(matches!(
            export(&loc, "gemini-2.5-flash", "x"),
            Err(Error::Validation { .. })
        ));
    }
}
