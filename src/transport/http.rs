use super::TransportError;
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Single-shot JSON-over-HTTP transport.
///
/// No retries: every call issues exactly one request and maps the outcome
/// onto [`Error::Remote`] (non-2xx) or [`Error::Network`] (no usable response).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport for `base_url`.
    ///
    /// `timeout` of `None` keeps reqwest's default (no overall timeout).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// POST `body` as JSON to `path` and decode the JSON answer.
    ///
    /// On a non-success status the `detail` field of the error body becomes the
    /// error message; `fallback_message` is used when it is absent.
    pub async fn post_json<B, R>(&self, path: &str, body: &B, fallback_message: &str) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = response.status();
        let text = response.text().await.map_err(TransportError::Http)?;

        if !status.is_success() {
            let message = error_detail(&text).unwrap_or_else(|| fallback_message.to_string());
            debug!(status = status.as_u16(), %message, "service returned an error");
            return Err(Error::remote(status.as_u16(), message));
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::Network(TransportError::Decode(format!("{} ({})", e, url))))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::configuration_with_context(
            "analysis endpoint address is not set",
            ErrorContext::new().with_source("transport"),
        ));
    }
    let url = Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid analysis endpoint address: {}", e),
            ErrorContext::new()
                .with_details(raw.to_string())
                .with_source("transport"),
        )
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::configuration_with_context(
            format!("unsupported endpoint scheme '{}'", other),
            ErrorContext::new()
                .with_details(raw.to_string())
                .with_source("transport"),
        )),
    }
}

/// `detail` string of a FastAPI-style error body, if present and non-empty.
fn error_detail(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("detail")
        .and_then(|d| d.as_str())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
}
