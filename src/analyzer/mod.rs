//! # Analyzer Module
//!
//! The token/cost analyzer: reacts to text and model changes, debounces them,
//! consults the session cache, calls the service on a miss and derives costs
//! from the latest result.
//!
//! ## State machine
//!
//! | From | Event | To |
//! |------|-------|----|
//! | any | text/model changed, both present | `Pending` |
//! | any | text or model cleared | `Idle` |
//! | `Pending` | quiet period over, cache hit | `Ready` |
//! | `Pending` | quiet period over, cache miss | `Loading` |
//! | `Loading` | service answered | `Ready` |
//! | `Loading` | service failed | `Failed` (previous result kept) |
//!
//! A response for input that is no longer current is dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use context_optimizer::analyzer::Analyzer;
//! use context_optimizer::client::OptimizerClient;
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
//!     analyzer.set_text("hello world")?;
//!     let state = analyzer.settled().await?;
//!     if let Some(cost) = state.cost() {
//!         println!("total {}", cost.format_total());
//!     }
//!     Ok(())
//! }
//! ```

mod driver;
mod state;

pub use state::{AnalyzerViewState, Phase};

use crate::cache::AnalysisCache;
use crate::client::AnalysisService;
use crate::config::{AnalyzerConfig, DEFAULT_DEBOUNCE, DEFAULT_OUTPUT_TOKENS};
use crate::debounce::Debouncer;
use crate::models::ModelCatalog;
use crate::tokens::{CostEstimate, USD_TO_INR_RATE};
use crate::types::{AnalysisRequest, Notification, SummaryResult};
use crate::url_state::{self, LocationProvider, StaticLocation};
use crate::{Error, ErrorContext, Result};
use driver::{Command, Driver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

/// Page address used when no location provider is given.
pub const DEFAULT_PAGE_URL: &str = "http://localhost:3000/tokens";

/// Confirmation shown once a share link has been handed to the user.
pub fn link_copied() -> Notification {
    Notification::success("Link Copied!", "The shareable link is now in your clipboard.")
}

/// Entry point for creating analyzers.
pub struct Analyzer;

impl Analyzer {
    pub fn builder(service: Arc<dyn AnalysisService>) -> AnalyzerBuilder {
        AnalyzerBuilder::new(service)
    }
}

/// Builder for a running analyzer.
pub struct AnalyzerBuilder {
    service: Arc<dyn AnalysisService>,
    cache: Option<AnalysisCache>,
    catalog: Option<Arc<ModelCatalog>>,
    location: Option<Arc<dyn LocationProvider>>,
    import_location: bool,
    sync_location: bool,
    debounce: Duration,
    output_tokens: u64,
    exchange_rate: f64,
}

impl AnalyzerBuilder {
    fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            service,
            cache: None,
            catalog: None,
            location: None,
            import_location: false,
            sync_location: false,
            debounce: DEFAULT_DEBOUNCE,
            output_tokens: DEFAULT_OUTPUT_TOKENS,
            exchange_rate: USD_TO_INR_RATE,
        }
    }

    /// Take debounce, output tokens and exchange rate from `config`.
    pub fn config(mut self, config: &AnalyzerConfig) -> Self {
        self.debounce = config.debounce;
        self.output_tokens = config.output_tokens;
        self.exchange_rate = config.exchange_rate;
        self
    }

    /// Session cache; pass a clone to share it between analyzers.
    pub fn cache(mut self, cache: AnalysisCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn catalog(mut self, catalog: Arc<ModelCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn location(mut self, location: Arc<dyn LocationProvider>) -> Self {
        self.location = Some(location);
        self
    }

    /// Seed model and text from the location's query string on start.
    pub fn import_location(mut self, enable: bool) -> Self {
        self.import_location = enable;
        self
    }

    /// Rewrite the location whenever input settles.
    pub fn sync_location(mut self, enable: bool) -> Self {
        self.sync_location = enable;
        self
    }

    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    pub fn output_tokens(mut self, n: u64) -> Self {
        self.output_tokens = n;
        self
    }

    pub fn exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = rate;
        self
    }

    /// Start the analyzer task. Must be called inside a tokio runtime.
    pub fn spawn(self) -> AnalyzerHandle {
        let id = Uuid::new_v4();
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(ModelCatalog::builtin()));
        let location = self
            .location
            .unwrap_or_else(|| Arc::new(StaticLocation::new(DEFAULT_PAGE_URL)));
        let cache = self.cache.unwrap_or_default();

        let state = AnalyzerViewState::new(self.output_tokens, self.exchange_rate);
        let (publisher, receiver) = watch::channel(state.clone());
        let (commands, inbox) = mpsc::unbounded_channel();

        let mut driver = Driver::new(
            Arc::clone(&self.service),
            cache.clone(),
            Arc::clone(&catalog),
            Arc::clone(&location),
            self.sync_location,
            Debouncer::new(self.debounce),
            state,
            publisher,
        );

        if self.import_location {
            let shared = url_state::import(location.as_ref(), &catalog);
            tracing::debug!(
                analyzer = %id,
                model = ?shared.model_id,
                "imported state from location"
            );
            driver.state.model = shared.model_id.and_then(|m| catalog.get(&m).cloned());
            driver.state.text = shared.text;
            driver.reschedule();
        }

        let span = tracing::info_span!("analyzer", id = %id);
        let task = tokio::spawn(driver.run(inbox).instrument(span));

        AnalyzerHandle {
            id,
            commands,
            sent: AtomicU64::new(0),
            state: receiver,
            service: self.service,
            cache,
            catalog,
            location,
            task,
        }
    }
}

/// Handle to one running analyzer. Dropping it stops the analyzer.
pub struct AnalyzerHandle {
    id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    sent: AtomicU64,
    state: watch::Receiver<AnalyzerViewState>,
    service: Arc<dyn AnalysisService>,
    cache: AnalysisCache,
    catalog: Arc<ModelCatalog>,
    location: Arc<dyn LocationProvider>,
    task: JoinHandle<()>,
}

impl AnalyzerHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Closed)?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn set_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SetText(text.into()))
    }

    /// Select a catalog model. Unknown ids are rejected and leave the
    /// selection unchanged.
    pub fn select_model(&self, model_id: &str) -> Result<()> {
        if !self.catalog.contains(model_id) {
            return Err(Error::validation_with_context(
                format!("unknown model '{}'", model_id),
                ErrorContext::new()
                    .with_field_path("model")
                    .with_source("analyzer"),
            ));
        }
        self.send(Command::SelectModel(Some(model_id.to_string())))
    }

    pub fn clear_model(&self) -> Result<()> {
        self.send(Command::SelectModel(None))
    }

    /// Expected completion length for the output cost.
    pub fn set_output_tokens(&self, n: u64) -> Result<()> {
        self.send(Command::SetOutputTokens(n))
    }

    /// Latest published state.
    pub fn state(&self) -> AnalyzerViewState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<AnalyzerViewState> {
        self.state.clone()
    }

    pub fn cost(&self) -> Option<CostEstimate> {
        self.state.borrow().cost()
    }

    /// Wait for the first state satisfying `predicate` (checked against the
    /// current state first).
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<AnalyzerViewState>
    where
        F: FnMut(&AnalyzerViewState) -> bool,
    {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| Error::Closed)?;
        Ok(state.clone())
    }

    /// Wait until every change sent through this handle has been applied and
    /// the analyzer is neither debouncing nor loading.
    pub async fn settled(&self) -> Result<AnalyzerViewState> {
        let sent = self.sent.load(Ordering::SeqCst);
        self.wait_for(|s| {
            s.revision >= sent && !matches!(s.phase, Phase::Pending | Phase::Loading)
        })
        .await
    }

    /// Link reproducing the current model and text.
    ///
    /// Without a selected model the user gets a warning instead.
    pub fn share_url(&self) -> std::result::Result<String, Notification> {
        let state = self.state();
        let Some(model_id) = state.model_id() else {
            return Err(Notification::warning(
                "Select a model first",
                "You need to select a model before sharing.",
            ));
        };
        url_state::export(self.location.as_ref(), model_id, &state.text)
            .map_err(|e| Notification::error("Share Error", e.user_message()))
    }

    /// Link to the summarization results page for the current input.
    pub fn results_link(&self) -> Result<String> {
        let request = self.ready_request()?;
        url_state::results_url(self.location.as_ref(), &request.model_id, &request.text)
    }

    /// Summarize the current input. Only available once its analysis is ready.
    pub async fn optimize(&self) -> Result<SummaryResult> {
        let request = self.ready_request()?;
        tracing::info!(analyzer = %self.id, model = %request.model_id, "requesting summary");
        self.service.summarize(&request).await
    }

    fn ready_request(&self) -> Result<AnalysisRequest> {
        let state = self.state.borrow();
        match (state.phase, state.current_request()) {
            (Phase::Ready, Some(request)) if state.current_result().is_some() => Ok(request),
            _ => Err(Error::validation_with_context(
                "nothing analyzed yet",
                ErrorContext::new().with_source("analyzer"),
            )),
        }
    }

    /// Stop the analyzer and wait for its task to finish. Pending timers and
    /// requests are abandoned.
    pub async fn shutdown(self) {
        let AnalyzerHandle { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "analyzer task ended abnormally");
        }
    }
}
