use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "OPTIMIZER_API_URL", "models[0].id")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config", "catalog", "analysis_client")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic text shown to the user when the service could not be reached.
pub const NETWORK_ERROR_MESSAGE: &str = "Could not reach the analysis service.";

/// Unified error type for the analysis pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid endpoint address and similar startup problems.
    /// Fatal: never retried.
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// The service answered with a non-success status.
    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// No usable response: connection failure, timeout or undecodable body.
    #[error("Network transport error: {0}")]
    Network(#[from] crate::transport::TransportError),

    /// A response arrived for a (model, text) pair that is no longer current.
    /// Internal signal only.
    #[error("Stale result for {key}")]
    StaleResult { key: String },

    /// The analyzer task has stopped and no longer accepts input.
    #[error("Analyzer is no longer running")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog format error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Error::Remote {
            status,
            message: message.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Whether this error must be dropped instead of shown to the user.
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleResult { .. })
    }

    /// Text for the user-facing notification.
    ///
    /// Remote messages are passed through verbatim; transport failures get a
    /// generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            Error::Remote { message, .. } => message.clone(),
            Error::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Error::Configuration { message, .. } | Error::Validation { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
