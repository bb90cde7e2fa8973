use crate::client::optimizer::OptimizerClient;
use crate::config::ENV_API_URL;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::time::Duration;

/// Builder for [`OptimizerClient`].
///
/// Takes an address and an optional timeout. The address falls back to
/// `OPTIMIZER_API_URL`.
pub struct OptimizerClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl OptimizerClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: None,
        }
    }

    /// Service address, e.g. `http://127.0.0.1:8000`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Overall request timeout. Without it the platform default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OptimizerClient> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var(ENV_API_URL).ok())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "analysis endpoint address is not configured",
                    ErrorContext::new()
                        .with_field_path(ENV_API_URL)
                        .with_source("client_builder"),
                )
            })?;
        let transport = HttpTransport::new(&base_url, self.timeout)?;
        Ok(OptimizerClient { transport })
    }
}

impl Default for OptimizerClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
