//! End-to-end scenarios through the session boundary with fake engines and
//! capabilities.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;

use privy::application::default_rules;
use privy::{
    BridgeContext, CacheKey, CacheStore, Capability, CapabilityDescriptor, CapabilityError,
    CapabilityRegistry, DenyAll, Effect, EngineError, EngineRequest, FastRouter, InputShape, OutputEvent,
    ReasoningEngine, SessionBoundary, ToolInvoker, TraceRecord, TraceStream,
};

struct FakeTool {
    descriptor: CapabilityDescriptor,
    calls: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl FakeTool {
    fn new(name: &str, cacheable: bool) -> Arc<Self> {
        Self::with(name, cacheable, Duration::ZERO, false)
    }

    fn with(name: &str, cacheable: bool, delay: Duration, fail: bool) -> Arc<Self> {
        let mut descriptor =
            CapabilityDescriptor::new(name, "fake", InputShape::required("query", "input"));
        if cacheable {
            descriptor = descriptor.cacheable();
        }
        Arc::new(Self {
            descriptor,
            calls: AtomicUsize::new(0),
            delay,
            fail,
        })
    }

    fn side_effect(name: &str) -> Arc<Self> {
        Arc::new(Self {
            descriptor: CapabilityDescriptor::new(name, "fake", InputShape::required("command", "input"))
                .with_effect(Effect::SideEffect),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail: false,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Capability for FakeTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &str) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(CapabilityError::failed(&self.descriptor.name, "upstream exploded"));
        }
        Ok(match self.descriptor.name.as_str() {
            "weather_tool" => "London: ☀️ +18°C ↗11km/h 60%".to_string(),
            "search_tool" => format!("--- SEARCH RESULTS ---\n1. {}\n--- END ---", input),
            other => format!("{} ran {}", other, input),
        })
    }
}

/// Calls `tool` once with the query, then answers with `answer`
struct ToolUsingEngine {
    tool: String,
    answer: Vec<&'static str>,
    stream_tokens: bool,
    runs: AtomicUsize,
}

impl ToolUsingEngine {
    fn new(tool: &str, answer: Vec<&'static str>, stream_tokens: bool) -> Arc<Self> {
        Arc::new(Self {
            tool: tool.to_string(),
            answer,
            stream_tokens,
            runs: AtomicUsize::new(0),
        })
    }
}

impl ReasoningEngine for ToolUsingEngine {
    fn run(&self, request: EngineRequest, tools: Arc<dyn ToolInvoker>) -> TraceStream {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let tool = self.tool.clone();
        let answer = self.answer.clone();
        let stream_tokens = self.stream_tokens;

        stream! {
            yield Ok(TraceRecord::run_start());
            yield Ok(TraceRecord::capability_start(&tool, request.input.as_str()));
            match tools.invoke(&tool, &request.input).await {
                Ok(output) => yield Ok(TraceRecord::capability_end(&tool, output)),
                Err(e) => {
                    yield Err(EngineError::from(e));
                    return;
                }
            }
            if stream_tokens {
                for piece in &answer {
                    yield Ok(TraceRecord::token(*piece));
                }
            }
            yield Ok(TraceRecord::run_end(answer.concat()));
        }
        .boxed()
    }

    fn model_id(&self) -> &str {
        "tool-using-fake"
    }
}

struct Harness {
    session: SessionBoundary,
    cache: Arc<CacheStore>,
    weather: Arc<FakeTool>,
    search: Arc<FakeTool>,
}

fn harness(engine: Arc<dyn ReasoningEngine>, search: Arc<FakeTool>) -> Harness {
    let weather = FakeTool::new("weather_tool", true);
    let registry = Arc::new(
        CapabilityRegistry::builder()
            .register(search.clone())
            .unwrap()
            .register(weather.clone())
            .unwrap()
            .register(FakeTool::new("dad_joke_tool", false))
            .unwrap()
            .register(FakeTool::side_effect("terminal_tool"))
            .unwrap()
            .register(FakeTool::side_effect("youtube_tool"))
            .unwrap()
            .build(),
    );
    let router = FastRouter::new(default_rules(), &registry).unwrap();
    let cache = Arc::new(CacheStore::in_memory());
    let context = BridgeContext::new(engine, registry, router, cache.clone(), Arc::new(DenyAll));
    Harness {
        session: SessionBoundary::new(Arc::new(context)),
        cache,
        weather,
        search,
    }
}

async fn ask(session: &SessionBoundary, query: &str) -> Vec<OutputEvent> {
    session.submit(query, Vec::new()).collect().await
}

#[tokio::test]
async fn test_weather_query_short_circuits() {
    let engine = ToolUsingEngine::new("search_tool", vec!["unused"], true);
    let h = harness(engine.clone(), FakeTool::new("search_tool", true));

    let events = ask(&h.session, "weather london").await;

    assert_eq!(events, vec![OutputEvent::token("London: ☀️ +18°C ↗11km/h 60%")]);
    assert_eq!(h.weather.calls(), 1);
    assert_eq!(engine.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_factual_question_goes_through_engine_with_search() {
    let engine = ToolUsingEngine::new("search_tool", vec!["The PM is ", "Mark Carney."], true);
    let h = harness(engine.clone(), FakeTool::new("search_tool", true));

    let query = "who is the prime minister of Canada";
    let events = ask(&h.session, query).await;

    assert_eq!(events.len(), 4);
    assert_eq!(
        events[0],
        OutputEvent::ToolStart {
            name: "search_tool".into(),
            input: query.into()
        }
    );
    assert!(matches!(&events[1], OutputEvent::ToolEnd { name, output }
        if name == "search_tool" && output.contains("SEARCH RESULTS")));
    assert_eq!(events[2], OutputEvent::token("The PM is "));
    assert_eq!(events[3], OutputEvent::token("Mark Carney."));
    assert_eq!(engine.runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_repeated_search_is_served_from_cache() {
    let engine = ToolUsingEngine::new("search_tool", vec!["answer"], true);
    let h = harness(engine, FakeTool::new("search_tool", true));

    let first = ask(&h.session, "latest rust release").await;
    let second = ask(&h.session, "  Latest   Rust release ").await;

    assert!(first.iter().all(|e| !e.is_error()));
    assert!(second.iter().all(|e| !e.is_error()));
    assert_eq!(h.search.calls(), 1);
}

#[tokio::test]
async fn test_capability_timeout_yields_one_error() {
    let engine = ToolUsingEngine::new("search_tool", vec!["never"], true);
    let slow = Arc::new(FakeTool {
        descriptor: CapabilityDescriptor::new(
            "search_tool",
            "slow",
            InputShape::required("query", "input"),
        )
        .with_timeout(Duration::from_millis(50)),
        calls: AtomicUsize::new(0),
        delay: Duration::from_secs(10),
        fail: false,
    });
    let h = harness(engine, slow);

    let events = ask(&h.session, "what happened today").await;

    let errors: Vec<_> = events.iter().filter(|e| e.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(events.last().unwrap().is_error());
    match errors[0] {
        OutputEvent::Error { message } => assert!(message.contains("timed out")),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_tokenless_run_gets_one_synthetic_token() {
    let engine = ToolUsingEngine::new("search_tool", vec!["Ottawa"], false);
    let h = harness(engine, FakeTool::new("search_tool", true));

    let events = ask(&h.session, "capital of canada").await;
    let tokens: Vec<_> = events.iter().filter(|e| e.is_token()).collect();

    assert_eq!(tokens, vec![&OutputEvent::token("Ottawa")]);
}

#[tokio::test]
async fn test_capability_failure_ends_with_exactly_one_error() {
    let engine = ToolUsingEngine::new("search_tool", vec!["never"], true);
    let h = harness(
        engine,
        FakeTool::with("search_tool", true, Duration::ZERO, true),
    );

    let events = ask(&h.session, "who won the match").await;

    assert_eq!(events.iter().filter(|e| e.is_error()).count(), 1);
    assert!(events.last().unwrap().is_error());
    assert!(!events.iter().any(|e| e.is_token()));
}

#[tokio::test]
async fn test_side_effect_routes_never_short_circuit() {
    let engine = ToolUsingEngine::new("terminal_tool", vec!["done"], true);
    let h = harness(engine.clone(), FakeTool::new("search_tool", true));

    let events = ask(&h.session, "run ls -la").await;

    assert_eq!(engine.runs.load(Ordering::SeqCst), 1);
    assert!(matches!(&events[1], OutputEvent::ToolEnd { output, .. }
        if output.starts_with("Cancelled by caller")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_share_cache() {
    const SAME_KEY: usize = 8;
    const DISTINCT: usize = 4;

    let engine = ToolUsingEngine::new("search_tool", vec!["answer"], true);
    let h = harness(
        engine.clone(),
        FakeTool::with("search_tool", true, Duration::from_millis(20), false),
    );

    let mut queries = vec!["latest rust release".to_string(); SAME_KEY];
    queries.extend((0..DISTINCT).map(|i| format!("rust release number {}", i)));

    let runs = queries.iter().cloned().map(|query| {
        let session = h.session.clone();
        tokio::spawn(async move { ask(&session, &query).await })
    });
    for events in futures::future::join_all(runs).await {
        let events = events.unwrap();
        assert!(events.iter().all(|e| !e.is_error()));
        assert_eq!(events.last(), Some(&OutputEvent::token("answer")));
    }

    assert_eq!(engine.runs.load(Ordering::SeqCst), SAME_KEY + DISTINCT);
    let calls = h.search.calls();
    assert!(calls >= 1 + DISTINCT, "{} calls", calls);
    assert!(calls <= SAME_KEY + DISTINCT, "{} calls", calls);

    for query in queries {
        let record = h
            .cache
            .get(&CacheKey::new("search_tool", &query))
            .await
            .unwrap();
        assert_eq!(record.query, query);
        assert_eq!(
            record.result,
            format!("--- SEARCH RESULTS ---\n1. {}\n--- END ---", query)
        );
        assert!(!record.failed);
    }
}
