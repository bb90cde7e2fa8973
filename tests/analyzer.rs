//! Orchestrator behaviour on a paused clock with a scripted service.

use async_trait::async_trait;
use context_optimizer::analyzer::{link_copied, Analyzer, AnalyzerHandle, Phase};
use context_optimizer::cache::{AnalysisCache, CacheKey};
use context_optimizer::client::AnalysisService;
use context_optimizer::url_state::{LocationProvider, StaticLocation};
use context_optimizer::{AnalysisRequest, AnalysisResult, Error, NotificationLevel, SummaryResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

const FLASH: &str = "gemini-2.5-flash";
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Counts words as tokens; per-text latency and failures are configurable.
#[derive(Default)]
struct ScriptedService {
    calls: Mutex<Vec<AnalysisRequest>>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, String>,
}

impl ScriptedService {
    fn new() -> Self {
        Self::default()
    }

    fn delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    fn fail(mut self, text: &str, detail: &str) -> Self {
        self.failures.insert(text.to_string(), detail.to_string());
        self
    }

    fn calls(&self) -> Vec<AnalysisRequest> {
        self.calls.lock().unwrap().clone()
    }
}

fn result_for(text: &str) -> AnalysisResult {
    let words: Vec<&str> = text.split_whitespace().collect();
    AnalysisResult {
        input_tokens: words.len() as u64,
        word_count: words.len() as u64,
        character_count: text.chars().count() as u64,
        tokens: words.iter().map(|w| w.to_string()).collect(),
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> context_optimizer::Result<AnalysisResult> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delays.get(&request.text) {
            sleep(*delay).await;
        }
        if let Some(detail) = self.failures.get(&request.text) {
            return Err(Error::remote(500, detail.clone()));
        }
        Ok(result_for(&request.text))
    }

    async fn summarize(
        &self,
        request: &AnalysisRequest,
    ) -> context_optimizer::Result<SummaryResult> {
        Ok(SummaryResult {
            original_token_count: result_for(&request.text).input_tokens,
            summary_token_count: 1,
            summary: "short".to_string(),
        })
    }
}

fn spawn(service: &Arc<ScriptedService>) -> AnalyzerHandle {
    Analyzer::builder(service.clone()).debounce(DEBOUNCE).spawn()
}

#[tokio::test(start_paused = true)]
async fn test_hello_world_end_to_end() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);

    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("hello world").unwrap();
    let state = analyzer.settled().await.unwrap();

    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.debounced_text, "hello world");
    assert_eq!(state.current_result().unwrap().input_tokens, 2);
    assert_eq!(service.calls(), vec![AnalysisRequest::new(FLASH, "hello world")]);

    let cost = state.cost().unwrap();
    assert!((cost.input_cost - 2.0 * 0.3 / 1_000_000.0).abs() < 1e-18);
    assert!((cost.output_cost - 500.0 * 2.5 / 1_000_000.0).abs() < 1e-15);
    assert!((cost.total_cost_converted - cost.total_cost * 88.21).abs() < 1e-12);
    assert_eq!(analyzer.cost(), Some(cost));
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_keystrokes_issues_one_request() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();

    let start = Instant::now();
    for text in ["h", "he", "hel", "hell", "hello"] {
        analyzer.set_text(text).unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(analyzer.state().phase, Phase::Pending);
    }
    let state = analyzer.settled().await.unwrap();

    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(service.calls(), vec![AnalysisRequest::new(FLASH, "hello")]);
    // last keystroke at 400ms, so nothing before 900ms
    assert!(start.elapsed() >= Duration::from_millis(900));
}

#[tokio::test(start_paused = true)]
async fn test_model_change_is_debounced_too() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    analyzer.set_text("hello").unwrap();
    analyzer.select_model(FLASH).unwrap();
    analyzer.select_model("gemini-1.5-flash").unwrap();
    analyzer.settled().await.unwrap();

    assert_eq!(
        service.calls(),
        vec![AnalysisRequest::new("gemini-1.5-flash", "hello")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_previous_result() {
    let service = Arc::new(ScriptedService::new().fail("boom", "overloaded"));
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("fine text").unwrap();
    analyzer.settled().await.unwrap();

    analyzer.set_text("boom").unwrap();
    let state = analyzer.settled().await.unwrap();

    assert_eq!(state.phase, Phase::Failed);
    let error = state.last_error.clone().unwrap();
    assert_eq!(error.level, NotificationLevel::Error);
    assert_eq!(error.title, "Calculation Error");
    assert_eq!(error.description, "overloaded");
    assert_eq!(state.result, Some(result_for("fine text")));
    assert!(state.current_result().is_none());
    assert!(state.cost().is_none());
    assert!(analyzer
        .cache()
        .get(&CacheKey::for_request(FLASH, "boom"))
        .is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_dropped_but_cached() {
    let service = Arc::new(ScriptedService::new().delay("slow", Duration::from_secs(2)));
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();

    analyzer.set_text("slow").unwrap();
    analyzer.wait_for(|s| s.is_loading()).await.unwrap();
    analyzer.set_text("fast").unwrap();
    let state = analyzer.settled().await.unwrap();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.current_result(), Some(&result_for("fast")));

    // let the slow response land
    sleep(Duration::from_secs(3)).await;
    let state = analyzer.state();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.text, "fast");
    assert_eq!(state.result, Some(result_for("fast")));
    assert_eq!(
        analyzer.cache().get(&CacheKey::for_request(FLASH, "slow")),
        Some(result_for("slow"))
    );
    assert_eq!(service.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_old_response_ignored_while_new_pair_loads() {
    let service = Arc::new(
        ScriptedService::new()
            .delay("t1", Duration::from_secs(1))
            .delay("text2", Duration::from_secs(2)),
    );
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("t1").unwrap();
    analyzer.wait_for(|s| s.is_loading()).await.unwrap();

    // t1 is due at 1.5s, text2 starts loading at 1.0s
    analyzer.select_model("gemini-1.5-flash").unwrap();
    analyzer.set_text("text2").unwrap();
    sleep(Duration::from_millis(1100)).await;

    let state = analyzer.state();
    assert_eq!(state.phase, Phase::Loading);
    assert!(state.result.is_none());
    assert!(state.current_result().is_none());
    assert_eq!(
        analyzer.cache().get(&CacheKey::for_request(FLASH, "t1")),
        Some(result_for("t1"))
    );

    let state = analyzer.settled().await.unwrap();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.model_id(), Some("gemini-1.5-flash"));
    assert_eq!(state.current_result(), Some(&result_for("text2")));
    assert_eq!(
        service.calls(),
        vec![
            AnalysisRequest::new(FLASH, "t1"),
            AnalysisRequest::new("gemini-1.5-flash", "text2"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cache_hit_skips_loading() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("first").unwrap();
    analyzer.settled().await.unwrap();
    analyzer.set_text("second").unwrap();
    analyzer.settled().await.unwrap();

    let mut rx = analyzer.subscribe();
    rx.borrow_and_update();
    analyzer.set_text("first").unwrap();
    let mut phases = Vec::new();
    loop {
        rx.changed().await.unwrap();
        let phase = rx.borrow_and_update().phase;
        phases.push(phase);
        if phase == Phase::Ready {
            break;
        }
    }

    assert_eq!(phases, vec![Phase::Pending, Phase::Ready]);
    assert_eq!(service.calls().len(), 2);
    assert!(analyzer.cache().stats().hits >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_shared_cache_serves_second_analyzer() {
    let service = Arc::new(ScriptedService::new());
    let cache = AnalysisCache::in_memory();
    let first = Analyzer::builder(service.clone())
        .debounce(DEBOUNCE)
        .cache(cache.clone())
        .spawn();
    first.select_model(FLASH).unwrap();
    first.set_text("shared").unwrap();
    first.settled().await.unwrap();

    let second = Analyzer::builder(service.clone())
        .debounce(DEBOUNCE)
        .cache(cache)
        .spawn();
    second.select_model(FLASH).unwrap();
    second.set_text("shared").unwrap();
    let state = second.settled().await.unwrap();

    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_input_goes_idle() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("something").unwrap();
    analyzer.settled().await.unwrap();

    analyzer.set_text("").unwrap();
    let state = analyzer.settled().await.unwrap();
    assert_eq!(state.phase, Phase::Idle);
    assert!(state.debounced_text.is_empty());
    assert!(state.result.is_none());
    assert!(state.cost().is_none());

    // clearing before the quiet period ends cancels the request
    analyzer.set_text("never sent").unwrap();
    sleep(Duration::from_millis(200)).await;
    analyzer.clear_model().unwrap();
    analyzer.settled().await.unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(analyzer.state().phase, Phase::Idle);
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_duplicate_request_while_in_flight() {
    let service = Arc::new(ScriptedService::new().delay("dup", Duration::from_secs(2)));
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();

    analyzer.set_text("dup").unwrap();
    analyzer.wait_for(|s| s.is_loading()).await.unwrap();
    analyzer.set_text("dup ").unwrap();
    sleep(Duration::from_millis(100)).await;
    analyzer.set_text("dup").unwrap();
    let state = analyzer.settled().await.unwrap();

    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.current_result(), Some(&result_for("dup")));
    assert_eq!(service.calls(), vec![AnalysisRequest::new(FLASH, "dup")]);
}

#[tokio::test(start_paused = true)]
async fn test_output_tokens_only_change_cost() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("hello world").unwrap();
    let before = analyzer.settled().await.unwrap().cost().unwrap();

    analyzer.set_output_tokens(1000).unwrap();
    let state = analyzer.settled().await.unwrap();
    let after = state.cost().unwrap();

    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(after.input_cost, before.input_cost);
    assert!((after.output_cost - 2.0 * before.output_cost).abs() < 1e-15);
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_model_is_rejected() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    let err = analyzer.select_model("gpt-4").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(analyzer.state().model.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_share_url_requires_model() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    analyzer.set_text("hello world").unwrap();
    analyzer.settled().await.unwrap();

    let warning = analyzer.share_url().unwrap_err();
    assert_eq!(warning.level, NotificationLevel::Warning);
    assert_eq!(warning.title, "Select a model first");

    analyzer.select_model(FLASH).unwrap();
    analyzer.settled().await.unwrap();
    assert_eq!(
        analyzer.share_url().unwrap(),
        "http://localhost:3000/tokens?model=gemini-2.5-flash&text=hello+world"
    );
    let copied = link_copied();
    assert_eq!(copied.level, NotificationLevel::Success);
    assert_eq!(copied.title, "Link Copied!");
}

#[tokio::test(start_paused = true)]
async fn test_state_imported_from_location() {
    let service = Arc::new(ScriptedService::new());
    let location = Arc::new(StaticLocation::new(
        "http://localhost:3000/tokens?model=gemini-2.5-flash-lite&text=hi%20there",
    ));
    let analyzer = Analyzer::builder(service.clone())
        .debounce(DEBOUNCE)
        .location(location)
        .import_location(true)
        .spawn();

    let state = analyzer.settled().await.unwrap();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.model_id(), Some("gemini-2.5-flash-lite"));
    assert_eq!(state.text, "hi there");
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settled_input_is_written_to_location() {
    let service = Arc::new(ScriptedService::new());
    let location = Arc::new(StaticLocation::new("https://app.example/tokens#top"));
    let analyzer = Analyzer::builder(service.clone())
        .debounce(DEBOUNCE)
        .location(location.clone())
        .sync_location(true)
        .spawn();
    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("a&b").unwrap();
    analyzer.settled().await.unwrap();

    assert_eq!(
        location.href(),
        "https://app.example/tokens?model=gemini-2.5-flash&text=a%26b"
    );
}

#[tokio::test(start_paused = true)]
async fn test_optimize_needs_ready_result() {
    let service = Arc::new(ScriptedService::new());
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();
    assert!(analyzer.optimize().await.is_err());

    analyzer.set_text("one two three four").unwrap();
    analyzer.settled().await.unwrap();
    let summary = analyzer.optimize().await.unwrap();
    assert_eq!(summary.original_token_count, 4);
    assert!((summary.savings_percent() - 75.0).abs() < 1e-9);
    assert_eq!(
        analyzer.results_link().unwrap(),
        "http://localhost:3000/results?model=gemini-2.5-flash&text=one+two+three+four"
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_in_flight_request() {
    let service = Arc::new(ScriptedService::new().delay("forever", Duration::from_secs(3600)));
    let analyzer = spawn(&service);
    analyzer.select_model(FLASH).unwrap();
    analyzer.set_text("forever").unwrap();
    analyzer.wait_for(|s| s.in_flight).await.unwrap();

    let cache = analyzer.cache().clone();
    analyzer.shutdown().await;
    assert!(cache.is_empty());
}
