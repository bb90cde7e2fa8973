//! The analyzer's event loop.
//!
//! One task owns the state and handles one event at a time: user commands,
//! the debounce deadline and service responses. Responses are futures polled
//! by the same task, so no transition ever interleaves with another.

use super::state::{AnalyzerViewState, Phase};
use crate::cache::{AnalysisCache, CacheKey};
use crate::client::AnalysisService;
use crate::debounce::Debouncer;
use crate::models::ModelCatalog;
use crate::types::{AnalysisRequest, AnalysisResult, Notification};
use crate::url_state::{self, LocationProvider};
use crate::{Error, Result};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub(crate) const CALCULATION_ERROR_TITLE: &str = "Calculation Error";

#[derive(Debug)]
pub(crate) enum Command {
    SetText(String),
    SelectModel(Option<String>),
    SetOutputTokens(u64),
}

type Completion = (AnalysisRequest, Result<AnalysisResult>);

pub(crate) struct Driver {
    pub(crate) service: Arc<dyn AnalysisService>,
    pub(crate) cache: AnalysisCache,
    pub(crate) catalog: Arc<ModelCatalog>,
    pub(crate) location: Arc<dyn LocationProvider>,
    pub(crate) sync_location: bool,
    pub(crate) debouncer: Debouncer<AnalysisRequest>,
    pub(crate) state: AnalyzerViewState,
    pub(crate) publisher: watch::Sender<AnalyzerViewState>,
    in_flight: HashSet<CacheKey>,
    requests: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl Driver {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        service: Arc<dyn AnalysisService>,
        cache: AnalysisCache,
        catalog: Arc<ModelCatalog>,
        location: Arc<dyn LocationProvider>,
        sync_location: bool,
        debouncer: Debouncer<AnalysisRequest>,
        state: AnalyzerViewState,
        publisher: watch::Sender<AnalyzerViewState>,
    ) -> Self {
        Self {
            service,
            cache,
            catalog,
            location,
            sync_location,
            debouncer,
            state,
            publisher,
            in_flight: HashSet::new(),
            requests: FuturesUnordered::new(),
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    self.on_settled();
                }
                Some((request, outcome)) = self.requests.next(), if !self.requests.is_empty() => {
                    self.on_response(request, outcome);
                }
            }
        }
        debug!(abandoned = self.requests.len(), "analyzer stopped");
    }

    fn on_command(&mut self, command: Command) {
        self.state.revision += 1;
        match command {
            Command::SetText(text) => {
                self.state.text = text;
                self.reschedule();
            }
            Command::SelectModel(id) => {
                self.state.model = id.and_then(|id| self.catalog.get(&id).cloned());
                self.reschedule();
            }
            Command::SetOutputTokens(n) => {
                self.state.output_tokens = n;
                self.publish();
            }
        }
    }

    /// Input changed: restart the quiet period, or go idle when incomplete.
    pub(crate) fn reschedule(&mut self) {
        match self.state.current_request() {
            Some(request) => {
                self.debouncer.push(request);
                self.state.phase = Phase::Pending;
            }
            None => {
                self.debouncer.cancel();
                self.state.phase = Phase::Idle;
                self.state.debounced_text.clear();
                self.state.result = None;
                self.state.result_request = None;
                self.state.last_error = None;
            }
        }
        self.publish();
    }

    fn on_settled(&mut self) {
        let Some(request) = self.debouncer.take_due(Instant::now()) else {
            return;
        };
        self.state.debounced_text = request.text.clone();
        if self.sync_location {
            if let Err(e) = url_state::sync_to_location(
                self.location.as_ref(),
                &request.model_id,
                &request.text,
            ) {
                warn!(error = %e, "could not update location");
            }
        }

        let key = request.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            info!(model = %request.model_id, tokens = hit.input_tokens, "served from cache");
            self.accept(request, hit);
        } else if self.in_flight.contains(&key) {
            debug!(model = %request.model_id, "request already in flight, waiting for it");
            self.state.phase = Phase::Loading;
        } else {
            info!(model = %request.model_id, "analyzing");
            self.in_flight.insert(key);
            let service = Arc::clone(&self.service);
            let pending = request.clone();
            self.requests.push(
                async move {
                    let outcome = service.analyze(&pending).await;
                    (pending, outcome)
                }
                .boxed(),
            );
            self.state.phase = Phase::Loading;
        }
        self.publish();
    }

    fn on_response(&mut self, request: AnalysisRequest, outcome: Result<AnalysisResult>) {
        let key = request.cache_key();
        self.in_flight.remove(&key);

        if let Ok(result) = &outcome {
            if let Err(e) = self.cache.put(&key, result) {
                warn!(%key, error = %e, "could not cache analysis");
            }
        }

        if !self.is_awaited(&request) {
            let stale = Error::StaleResult {
                key: key.to_string(),
            };
            debug!(error = %stale, ok = outcome.is_ok(), "dropping response");
            return;
        }

        match outcome {
            Ok(result) => {
                info!(model = %request.model_id, tokens = result.input_tokens, "analysis ready");
                self.accept(request, result);
            }
            Err(e) => {
                warn!(model = %request.model_id, error = %e, "analysis failed");
                self.state.phase = Phase::Failed;
                self.state.last_error =
                    Some(Notification::error(CALCULATION_ERROR_TITLE, e.user_message()));
            }
        }
        self.publish();
    }

    /// A response is still wanted if it is for the current input and the
    /// analyzer is waiting on the service (not re-debouncing newer typing).
    fn is_awaited(&self, request: &AnalysisRequest) -> bool {
        self.state.phase == Phase::Loading
            && self.state.current_request().as_ref() == Some(request)
    }

    fn accept(&mut self, request: AnalysisRequest, result: AnalysisResult) {
        self.state.result = Some(result);
        self.state.result_request = Some(request);
        self.state.last_error = None;
        self.state.phase = Phase::Ready;
    }

    pub(crate) fn publish(&mut self) {
        self.state.in_flight = self.state.phase == Phase::Loading;
        self.publisher.send_replace(self.state.clone());
    }
}
