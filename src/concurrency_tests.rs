use crate::access_parser::AccessLogParser;
use crate::config::ParserOptions;
use crate::models::{EventTime, FieldValue};
use crate::parse_result::ParseOutcome;
use chrono::{Duration, TimeZone, Utc};
use crossbeam_channel::bounded;
use rayon::prelude::*;
use std::sync::Arc;
use std::thread;

fn apache_line(seconds: i64, size: usize) -> (String, EventTime) {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let time = (base + Duration::seconds(seconds)).fixed_offset();
    let line = format!(
        r#"192.0.2.1 - - [{}] "GET /item/{} HTTP/1.1" 200 {} "-" "bench" "{}" "-""#,
        time.format("%d/%b/%Y:%H:%M:%S %z"),
        size,
        size,
        size
    );
    (line, time)
}

fn envoy_line(seconds: i64, size: usize) -> (String, EventTime) {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let time = (base + Duration::seconds(seconds)).fixed_offset();
    let line = format!(
        r#"[{}] "GET /svc/{} HTTP/1.1" 200 - 0 {} 3 2 "-" "grpc" "id-{}" "svc" "10.0.0.1:80" "t{}/s{}""#,
        time.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        size,
        size,
        size,
        size,
        size
    );
    (line, time)
}

/// Many threads on one instance; every timestamp must belong to its own line
#[test]
fn test_same_instance_timestamps_match_lines_under_load() {
    let parser = Arc::new(AccessLogParser::new("apache2", ParserOptions::default()).unwrap());
    let workers = 8;
    let per_worker = 500;

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || {
                for i in 0..per_worker {
                    let n = worker * per_worker + i;
                    // Every fourth line repeats its predecessor's second to exercise the cache
                    let seconds = (n - (n % 4 == 3) as usize) as i64;
                    let (line, expected) = apache_line(seconds, n);

                    match parser.parse(&line).unwrap() {
                        ParseOutcome::Matched { time, record } => {
                            assert_eq!(time, expected, "line {}", n);
                            assert_eq!(record.get("response_size"), Some(&FieldValue::Int(n as i64)));
                        }
                        ParseOutcome::NotMatched => panic!("line {} did not match", n),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_rayon_batch_on_shared_instance() {
    let parser = AccessLogParser::new("envoy", ParserOptions::default()).unwrap();
    let inputs: Vec<(String, EventTime)> = (0..2000).map(|n| envoy_line((n % 97) as i64, n)).collect();

    inputs.par_iter().enumerate().for_each(|(n, (line, expected))| {
        let outcome = parser.parse(line).unwrap();
        assert_eq!(outcome.time(), Some(*expected), "line {}", n);
        let record = outcome.record().unwrap();
        assert_eq!(record.get("trace"), Some(&FieldValue::Str(format!("t{}", n))));
        assert_eq!(record.get("span_id"), Some(&FieldValue::Str(format!("s{}", n))));
    });
}

/// Holding one instance's time lock must not stall another instance
#[test]
fn test_instances_do_not_share_time_lock() {
    let blocked = AccessLogParser::new("apache2", ParserOptions::default()).unwrap();
    let free = Arc::new(AccessLogParser::new("apache2", ParserOptions::default()).unwrap());

    let guard = blocked.resolver().lock_state();
    assert!(blocked.resolver().is_locked());
    assert!(!free.resolver().is_locked());

    let (tx, rx) = bounded(1);
    let worker = {
        let free = Arc::clone(&free);
        thread::spawn(move || {
            let (line, expected) = apache_line(42, 7);
            let outcome = free.parse(&line).unwrap();
            tx.send(outcome.time() == Some(expected)).unwrap();
        })
    };

    let finished = rx.recv_timeout(std::time::Duration::from_secs(10));
    drop(guard);
    worker.join().unwrap();

    assert_eq!(finished, Ok(true));
}

#[test]
fn test_clones_do_not_share_time_lock() {
    let original = AccessLogParser::new("nginx", ParserOptions::default()).unwrap();
    let clone = original.clone();

    let _guard = original.resolver().lock_state();
    assert!(!clone.resolver().is_locked());

    let line = r#"10.1.2.3 - - [10/Oct/2000:13:55:36 +0000] "GET / HTTP/1.1" 200 1 "-" "-" "0.1" "-""#;
    assert!(clone.parse(line).unwrap().is_matched());
}

/// Matching and normalization stay lock-free: no-match lines never touch the resolver
#[test]
fn test_non_matching_lines_skip_time_lock() {
    let parser = AccessLogParser::new("envoy", ParserOptions::default()).unwrap();
    let _guard = parser.resolver().lock_state();

    assert_eq!(parser.parse("definitely not envoy").unwrap(), ParseOutcome::NotMatched);
}
