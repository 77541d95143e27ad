//! Integration tests for RouteSelector
//!
//! Covers classification decisions, caching, reload and configuration
//! fallback through the public API.

use intent_router::config::{ConfigSource, FileConfigSource, RouteSpec, StaticConfigSource};
use intent_router::router::match_confidence;
use intent_router::{
    ClassifyOptions, ConversationTurn, ReasonCode, RouteSelector, RouterConfig, RouterError,
    SelectorState,
};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WORK_CHAT_YAML: &str = r#"
settings:
  confidence_threshold: 0.6
routes:
  work:
    keywords: ["task", "plan"]
    weight: 1.0
    priority: 1
  chat:
    keywords: ["hello"]
    weight: 0.8
    priority: 2
"#;

fn work_chat_selector() -> RouteSelector {
    let source = StaticConfigSource::from_yaml(WORK_CHAT_YAML).unwrap();
    RouteSelector::new(Arc::new(source))
}

/// Config source whose content can be swapped between reloads
struct SwitchableSource {
    config: Mutex<RouterConfig>,
}

impl SwitchableSource {
    fn new(config: RouterConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    fn set(&self, config: RouterConfig) {
        *self.config.lock().unwrap() = config;
    }
}

impl ConfigSource for SwitchableSource {
    fn load(&self) -> intent_router::Result<RouterConfig> {
        Ok(self.config.lock().unwrap().clone())
    }

    fn describe(&self) -> String {
        "switchable".to_string()
    }
}

/// Source that always fails
struct BrokenSource;

impl ConfigSource for BrokenSource {
    fn load(&self) -> intent_router::Result<RouterConfig> {
        Err(RouterError::ConfigLoad("backend unreachable".to_string()))
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

fn config_with_routes(routes: &[(&str, &[&str], f64, i32)]) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.pattern_groups.clear();
    for (name, keywords, weight, priority) in routes {
        config.routes.insert(
            name.to_string(),
            RouteSpec {
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                weight: *weight,
                priority: *priority,
                endpoint: None,
            },
        );
    }
    config
}

#[test]
fn test_end_to_end_work_route() {
    let selector = work_chat_selector();
    let result = selector.select_route("I need to plan a task", &[], &ClassifyOptions::default());

    assert_eq!(result.selected_route, "work");
    assert!(result.confidence > 0.6);
    assert_eq!(result.reason, ReasonCode::KeywordMatchSuccess);
    assert!(!result.fallback);

    let expected = 0.5 + 0.3 + 0.1 + 0.05 * (21.0 / 30.0);
    assert!((result.confidence - expected).abs() < 1e-9);
}

#[test]
fn test_identical_request_served_from_cache() {
    let selector = work_chat_selector();
    let context = vec![ConversationTurn::user("hi"), ConversationTurn::assistant("hello!")];
    let options = ClassifyOptions::default();

    let first = selector.select_route("plan my task", &context, &options);
    let second = selector.select_route("plan my task", &context, &options);

    assert_eq!(first, second);
    let stats = selector.stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.total_requests, 2);
}

#[test]
fn test_different_context_misses_cache() {
    let selector = work_chat_selector();
    let options = ClassifyOptions::default();

    selector.select_route("plan", &[ConversationTurn::user("first topic")], &options);
    selector.select_route("plan", &[ConversationTurn::user("second topic")], &options);

    let stats = selector.stats();
    assert_eq!(stats.cache_hits, 0);
    assert_eq!(stats.cache_misses, 2);
    assert_eq!(stats.cache_entries, 2);
}

#[test]
fn test_different_options_miss_cache() {
    let selector = work_chat_selector();
    selector.select_route("hello", &[], &ClassifyOptions::default());
    let lowered = selector.select_route("hello", &[], &ClassifyOptions::new().with_threshold(0.2));

    assert_eq!(lowered.selected_route, "chat");
    assert_eq!(selector.stats().cache_hits, 0);
}

#[test]
fn test_fallbacks_are_cached() {
    let selector = work_chat_selector();

    let first = selector.select_route("what is the weather", &[], &ClassifyOptions::default());
    let second = selector.select_route("what is the weather", &[], &ClassifyOptions::default());

    assert_eq!(first.selected_route, "general");
    assert_eq!(first.reason, ReasonCode::NoKeywordsMatched);
    assert_eq!(first, second);
    assert_eq!(selector.stats().cache_hits, 1);
}

#[test]
fn test_context_enhancement_lifts_confidence() {
    let selector = work_chat_selector();
    let options = ClassifyOptions::new().with_bypass_cache(true);

    let plain = selector.select_route("hello", &[], &options);
    assert_eq!(plain.reason, ReasonCode::ConfidenceBelowThreshold);

    let context = vec![
        ConversationTurn::user("hello again"),
        ConversationTurn::assistant("hello! how can I help?"),
    ];
    let enhanced = selector.select_route("hello", &context, &options);
    let best = enhanced.best_match().unwrap();
    assert!(best.context_enhanced);
    assert!((best.score - 1.1).abs() < 1e-9);

    // score term +0.075, context bonus +0.15
    let lifted = match_confidence(best, "hello");
    let base = match_confidence(plain.best_match().unwrap(), "hello");
    assert!((lifted - base - 0.225).abs() < 1e-9);
}

#[test]
fn test_reload_clears_cache_and_applies_new_routes() {
    let source = Arc::new(SwitchableSource::new(config_with_routes(&[(
        "work",
        &["plan"],
        1.0,
        1,
    )])));
    let selector = RouteSelector::new(source.clone());
    let options = ClassifyOptions::new().with_threshold(0.3);

    let before = selector.select_route("plan the launch", &[], &options);
    assert_eq!(before.selected_route, "work");
    assert_eq!(selector.stats().cache_entries, 1);

    source.set(config_with_routes(&[("planning", &["plan"], 1.0, 1)]));
    let version = selector.reload_config().unwrap();

    assert_eq!(version, 2);
    assert_eq!(selector.stats().cache_entries, 0);
    assert_eq!(selector.stats().reloads, 1);

    let after = selector.select_route("plan the launch", &[], &options);
    assert_eq!(after.selected_route, "planning");
    assert_eq!(selector.stats().cache_hits, 0);
}

#[test]
fn test_failed_reload_keeps_current_configuration() {
    let selector = RouteSelector::new(Arc::new(BrokenSource));
    selector.initialize();
    assert_eq!(selector.config_version(), 1);

    assert!(matches!(
        selector.reload_config(),
        Err(RouterError::ConfigLoad(_))
    ));
    assert_eq!(selector.config_version(), 1);
    assert_eq!(selector.stats().reloads, 0);
    assert_eq!(selector.routes().len(), 1);
}

#[test]
fn test_unreadable_config_falls_back_to_minimal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("router.yaml");
    std::fs::write(&path, "routes: [this is: not valid").unwrap();

    let selector = RouteSelector::new(Arc::new(FileConfigSource::new(&path)));
    let result = selector.select_route("plan a task", &[], &ClassifyOptions::default());

    assert_eq!(selector.state(), SelectorState::Ready);
    assert_eq!(result.selected_route, "general");
    assert_eq!(result.reason, ReasonCode::NoKeywordsMatched);
    assert!(result.fallback);

    let routes = selector.routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].name, "general");
}

#[test]
fn test_concurrent_misses_converge() {
    let selector = Arc::new(work_chat_selector());
    selector.initialize();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let selector = Arc::clone(&selector);
                scope.spawn(move || {
                    selector.select_route("plan a task", &[], &ClassifyOptions::default())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(selector.stats().cache_entries, 1);
    assert_eq!(selector.stats().total_requests, 8);
}

#[tokio::test(start_paused = true)]
async fn test_cached_decision_expires_after_ttl() {
    let mut config = config_with_routes(&[("work", &["plan"], 1.0, 1)]);
    config.settings.cache.ttl_secs = 1;
    let selector = RouteSelector::from_config(config);
    let options = ClassifyOptions::default();

    selector.select_route("plan", &[], &options);
    selector.select_route("plan", &[], &options);
    assert_eq!(selector.stats().cache_hits, 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    selector.select_route("plan", &[], &options);

    let stats = selector.stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 2);
}

#[test]
fn test_capacity_bounds_cache() {
    let mut config = config_with_routes(&[("work", &["plan"], 1.0, 1)]);
    config.settings.cache.max_entries = 3;
    let selector = RouteSelector::from_config(config);

    for i in 0..10 {
        selector.select_route(&format!("plan {}", i), &[], &ClassifyOptions::default());
    }

    assert_eq!(selector.stats().cache_entries, 3);
    assert_eq!(selector.cache_stats().evictions, 7);
}

fn keyword(route: usize, n: usize) -> String {
    format!("r{}k{}x", route, n)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_route_keywords_select_that_route(
        specs in prop::collection::vec((1usize..4, 0.5f64..2.0, 1i32..5), 1..6),
        target in 0usize..6,
    ) {
        let target = target % specs.len();
        let mut config = RouterConfig::default();
        config.pattern_groups.clear();
        for (i, (keyword_count, weight, priority)) in specs.iter().enumerate() {
            config.routes.insert(
                format!("route{}", i),
                RouteSpec {
                    keywords: (0..*keyword_count).map(|n| keyword(i, n)).collect(),
                    weight: *weight,
                    priority: *priority,
                    endpoint: None,
                },
            );
        }
        let selector = RouteSelector::from_config(config);

        let message = (0..specs[target].0)
            .map(|n| keyword(target, n))
            .collect::<Vec<_>>()
            .join(" ");
        let result = selector.select_route(&message, &[], &ClassifyOptions::default());

        prop_assert_eq!(result.matches.len(), 1);
        prop_assert_eq!(&result.matches[0].route, &format!("route{}", target));
        if result.reason == ReasonCode::KeywordMatchSuccess {
            prop_assert_eq!(result.selected_route, format!("route{}", target));
        } else {
            prop_assert_eq!(result.reason, ReasonCode::ConfidenceBelowThreshold);
        }
    }
}
