//! Integration tests for the result handler lifecycle and message flow.
//!
//! Tests cover:
//! - Draining queued messages before the loop stops
//! - Many producer threads feeding one consumer
//! - Forced purge on abnormal shutdown
//! - Progress status reporting for bounded and unbounded runs

mod common;

use chrono::Duration;
use common::{backtest, day, test_handler, wait_until};
use reporting::models::Message;
use reporting::policy::{RunDescriptor, RunDescriptorInput};
use reporting::queue::HandlerState;
use reporting::sink::InMemorySink;
use reporting::{HandlerError, ResultHandler};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;

#[test]
fn test_state_machine_transitions() {
    let (handler, _sink) = test_handler(RunDescriptor::Unbounded);
    assert_eq!(handler.state(), HandlerState::Created);

    handler.start().unwrap();
    assert_eq!(handler.state(), HandlerState::Running);
    assert!(handler.is_active());

    handler.exit();
    handler.exit();
    handler.join();

    assert_eq!(handler.state(), HandlerState::Stopped);
    assert!(!handler.is_active());
    assert!(matches!(handler.start(), Err(HandlerError::AlreadyStarted)));
}

#[test]
fn test_all_messages_drained_before_inactive() {
    let (handler, sink) = test_handler(RunDescriptor::Unbounded);

    for i in 0..1_000 {
        handler.log(format!("message {i}"));
    }
    handler.exit();
    handler.start().unwrap();
    handler.join();

    assert!(!handler.is_active());
    assert_eq!(sink.len(), 1_000);
    let lines = sink.lines();
    assert_eq!(lines.first().map(String::as_str), Some("message 0"));
    assert_eq!(lines.last().map(String::as_str), Some("message 999"));
}

#[test]
fn test_many_producers_one_consumer() {
    let (handler, sink) = test_handler(RunDescriptor::Unbounded);
    let handler = Arc::new(handler);
    handler.start().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                for i in 0..250 {
                    handler.debug(format!("producer {p} line {i}"));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    handler.shutdown();

    assert_eq!(sink.len(), 1_000);
    // FIFO holds per producer.
    for p in 0..4 {
        let prefix = format!("producer {p} ");
        let own: Vec<_> = sink
            .lines()
            .into_iter()
            .filter(|line| line.starts_with(&prefix))
            .collect();
        let expected: Vec<_> = (0..250).map(|i| format!("producer {p} line {i}")).collect();
        assert_eq!(own, expected);
    }
}

#[test]
fn test_purge_then_exit_processes_nothing() {
    let (handler, sink) = test_handler(RunDescriptor::Unbounded);
    for i in 0..5 {
        handler.log(format!("doomed {i}"));
    }

    assert_eq!(handler.purge_queue(), 5);
    handler.exit();
    handler.start().unwrap();
    handler.join();

    assert!(sink.is_empty());
    assert_eq!(handler.state(), HandlerState::Stopped);
}

#[test]
fn test_errors_carry_stack_trace_and_unknown_kinds_are_dropped() {
    let (handler, sink) = test_handler(RunDescriptor::Unbounded);

    handler.runtime_error("Index out of range", Some("at OnData line 12".to_string()));
    handler.error_message("Brokerage disconnected", None);
    handler.enqueue(Message::other("chart_update", "{}"));
    handler.log("after");

    handler.start().unwrap();
    handler.shutdown();

    assert_eq!(
        sink.lines(),
        vec![
            "Index out of range Stack Trace: at OnData line 12",
            "Brokerage disconnected",
            "after",
        ]
    );
}

#[test]
fn test_duplicate_debug_messages_are_not_suppressed() {
    let (handler, sink) = test_handler(RunDescriptor::Unbounded);
    for _ in 0..3 {
        handler.debug("same line");
    }
    handler.start().unwrap();
    handler.shutdown();

    assert_eq!(sink.len(), 3);
}

#[test]
fn test_bounded_run_reports_progress_from_watermark() {
    let (handler, sink) = test_handler(backtest(100));
    handler.start().unwrap();

    handler.sample_equity(day(25), Decimal::from(100_500));
    assert!(wait_until(|| sink.contains("Progress: 25.00%")));

    handler.sample_equity(day(100), Decimal::from(101_000));
    assert!(wait_until(|| sink.contains("Progress: 100.00%")));

    handler.shutdown();
    assert!(sink.contains("Processed 100 of 100 days"));
}

#[test]
fn test_unbounded_run_reports_no_progress() {
    let (handler, sink) = test_handler(RunDescriptor::Unbounded);
    handler.start().unwrap();
    handler.sample_equity(day(1), Decimal::ONE);

    thread::sleep(std::time::Duration::from_millis(60));
    handler.shutdown();

    assert!(!sink.contains("Progress"));
}

#[test]
fn test_producers_do_not_block_while_loop_is_stopped() {
    let (handler, sink) = test_handler(RunDescriptor::Unbounded);
    handler.start().unwrap();
    handler.shutdown();

    // After Stopped nothing consumes the queue, but enqueueing still returns.
    handler.log("late");
    assert_eq!(handler.pending_messages(), 1);
    assert!(sink.is_empty());
}

#[test]
fn test_construction_from_malformed_input_fails() {
    let input = RunDescriptorInput {
        start: Some(day(0)),
        end: None,
        live: false,
    };
    let result = ResultHandler::from_input(
        input,
        common::fast_config(),
        InMemorySink::new_shared(),
    );
    assert!(matches!(result, Err(HandlerError::RunDescriptor(_))));
}

#[test]
fn test_resample_period_follows_span() {
    let short = ResultHandler::new(
        backtest(1),
        common::fast_config(),
        InMemorySink::new_shared(),
    )
    .unwrap();
    assert_eq!(short.resample_period(), Duration::minutes(4));

    // 8000 * 4 minutes.
    let long_run = RunDescriptor::bounded(day(0), day(0) + Duration::minutes(32_000)).unwrap();
    let long = ResultHandler::new(long_run, common::fast_config(), InMemorySink::new_shared())
        .unwrap();
    assert_eq!(long.resample_period(), Duration::minutes(8));

    let live = ResultHandler::new(
        RunDescriptor::Unbounded,
        common::fast_config(),
        InMemorySink::new_shared(),
    )
    .unwrap();
    assert_eq!(live.resample_period(), Duration::seconds(2));
    assert_eq!(live.notification_period(), std::time::Duration::from_millis(10));
}
