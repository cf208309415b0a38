use logwatch_rs::aggregation::{
    AggregationConfig, AggregationEngine, AlertState, AlertTransition, ROOT_SECTION,
};
use logwatch_rs::{parse_line, EventBuilder, LogEvent, Notification};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn engine(window_secs: u64, rolling_secs: u64, threshold: f64) -> AggregationEngine {
    let config = AggregationConfig::builder()
        .window(Duration::from_secs(window_secs))
        .rolling_window(Duration::from_secs(rolling_secs))
        .rate_threshold(threshold)
        .build()
        .unwrap();
    AggregationEngine::new(config).unwrap()
}

fn ingest_n(engine: &AggregationEngine, path: &str, n: usize) {
    for _ in 0..n {
        engine.ingest(&LogEvent::for_path(path));
    }
}

#[test]
fn test_alert_triggers_and_recovers_with_single_window_lookback() {
    let mut engine = engine(1, 1, 1.0);
    assert_eq!(engine.lookback(), 1);

    ingest_n(&engine, "/report", 2);
    let first = engine.flush();
    assert_eq!(first.aggregate.rolling_total, 2);
    assert_eq!(first.aggregate.rolling_average_rate, 2.0);
    assert_eq!(first.transition, Some(AlertTransition::Triggered));
    assert_eq!(engine.alert_state(), AlertState::Triggered);

    let second = engine.flush();
    assert_eq!(second.aggregate.total, 0);
    assert_eq!(second.aggregate.rolling_total, 0);
    assert_eq!(second.aggregate.rolling_average_rate, 0.0);
    assert_eq!(second.transition, Some(AlertTransition::Recovered));
    assert_eq!(engine.alert_state(), AlertState::Normal);

    let notes = second.notifications();
    assert!(matches!(notes[0], Notification::AlertRecovered(_)));
    assert!(matches!(notes[1], Notification::AggregateClosed(_)));
}

#[test]
fn test_rolling_total_sums_last_w_windows() {
    let mut engine = engine(1, 3, 1000.0);
    let counts = [4, 7, 1, 9, 2];
    let mut rolling = Vec::new();

    for count in counts {
        ingest_n(&engine, "/api/user", count);
        rolling.push(engine.flush().aggregate.rolling_total);
    }

    // Only the three most recent windows contribute
    assert_eq!(rolling, vec![4, 11, 12, 17, 12]);
}

#[test]
fn test_rolling_average_uses_whole_seconds() {
    let mut engine = engine(1, 4, 1000.0);
    ingest_n(&engine, "/", 10);
    let outcome = engine.flush();

    assert_eq!(outcome.aggregate.rolling_total, 10);
    // 10 / 4 truncates to 2
    assert_eq!(outcome.aggregate.rolling_average_rate, 2.0);
}

#[test]
fn test_empty_flush_is_idempotent() {
    let mut engine = engine(1, 2, 1.0);

    for _ in 0..3 {
        let outcome = engine.flush();
        assert_eq!(outcome.aggregate.total, 0);
        assert_eq!(outcome.aggregate.rolling_total, 0);
        assert_eq!(outcome.aggregate.count(ROOT_SECTION), 0);
        assert!(outcome.transition.is_none());
        assert_eq!(outcome.notifications().len(), 1);
    }
    assert_eq!(engine.alert_state(), AlertState::Normal);
}

#[test]
fn test_rate_equal_to_threshold_does_not_trigger() {
    let mut engine = engine(1, 1, 3.0);
    ingest_n(&engine, "/api", 3);

    let outcome = engine.flush();
    assert_eq!(outcome.aggregate.rolling_average_rate, 3.0);
    assert!(outcome.transition.is_none());
    assert_eq!(engine.alert_state(), AlertState::Normal);
}

#[test]
fn test_rate_equal_to_threshold_recovers() {
    let mut engine = engine(1, 1, 3.0);
    ingest_n(&engine, "/api", 4);
    assert_eq!(engine.flush().transition, Some(AlertTransition::Triggered));

    ingest_n(&engine, "/api", 3);
    assert_eq!(engine.flush().transition, Some(AlertTransition::Recovered));
}

#[test]
fn test_sustained_traffic_keeps_single_alert() {
    let mut engine = engine(1, 2, 1.0);
    let mut transitions = Vec::new();

    for _ in 0..5 {
        ingest_n(&engine, "/report", 10);
        transitions.push(engine.flush().transition);
    }

    assert_eq!(transitions[0], Some(AlertTransition::Triggered));
    assert!(transitions[1..].iter().all(Option::is_none));
}

#[test]
fn test_root_equals_total_for_any_paths() {
    let mut engine = engine(1, 1, 1000.0);
    let paths = ["", "   ", "/", "no-slash", "/a", "/a/b/c", "//double", "/trailing/"];
    for path in paths {
        engine.ingest(&EventBuilder::new().path(path).build());
    }

    let agg = engine.flush().aggregate;
    assert_eq!(agg.total, paths.len() as u64);
    assert_eq!(agg.count(ROOT_SECTION), agg.total);
    assert_eq!(agg.count("/a"), 2);
    assert_eq!(agg.count("/a/b"), 1);
    assert_eq!(agg.count("/a/b/c"), 1);
}

#[test]
fn test_sample_log_section_counts() {
    let mut engine = engine(1, 2, 1.0);
    let events: Vec<LogEvent> = include_str!("fixtures/sample_access.log")
        .lines()
        .map(|line| parse_line(line).unwrap())
        .collect();
    assert_eq!(events.len(), 240);

    for event in &events {
        engine.ingest(event);
    }
    let outcome = engine.flush();
    let agg = &outcome.aggregate;

    assert_eq!(agg.total, 240);
    assert_eq!(agg.rolling_total, 240);
    assert_eq!(agg.rolling_average_rate, 120.0);
    assert_eq!(outcome.transition, Some(AlertTransition::Triggered));

    assert_eq!(agg.count("/admin"), 144);
    assert_eq!(agg.count("/api"), 72);
    assert_eq!(agg.count("/report"), 24);
    assert_eq!(agg.count("/admin/moderate"), 54);
    assert_eq!(agg.count("/api/comment"), 18);

    let busiest = agg.busiest_sections();
    assert_eq!(busiest[0], ("/", 240));
    assert_eq!(busiest[1], ("/admin", 144));
    assert_eq!(busiest[2], ("/api", 72));
}

#[test]
fn test_concurrent_ingest_loses_no_events() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 5_000;

    let mut engine = engine(1, 1, 1_000_000.0);
    let ingestor = engine.ingestor();
    let mut flushed = 0u64;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let ingestor = ingestor.clone();
                scope.spawn(move || {
                    let path = format!("/worker/{}", i);
                    for _ in 0..PER_THREAD {
                        ingestor.ingest_path(&path);
                    }
                })
            })
            .collect();

        while !handles.iter().all(|h| h.is_finished()) {
            let agg = engine.flush().aggregate;
            assert_eq!(agg.count(ROOT_SECTION), agg.total);
            assert_eq!(agg.count("/worker"), agg.total);
            flushed += agg.total;
            std::thread::yield_now();
        }
    });

    flushed += engine.flush().aggregate.total;
    assert_eq!(flushed, (THREADS * PER_THREAD) as u64);
}

#[test]
fn test_invalid_configuration_rejected() {
    let config = AggregationConfig {
        window: Duration::from_secs(10),
        rolling_window: Duration::from_secs(5),
        rate_threshold: 1.0,
    };
    assert!(AggregationEngine::new(config).is_err());

    let config = AggregationConfig {
        rate_threshold: 0.0,
        ..AggregationConfig::default()
    };
    assert!(AggregationEngine::new(config).is_err());
}
