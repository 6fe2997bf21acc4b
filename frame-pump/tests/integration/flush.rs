//! Flush phase: termination, idempotence and lookahead accounting.

use std::panic::{catch_unwind, AssertUnwindSafe};

use frame_pump::{CompressedUnit, DriverConfig, EncodeDriver, SessionState};

use crate::helpers::{params, pts, CountingSource, ScriptedEncoder};

#[test]
fn flush_stops_at_first_empty_drain() {
    let (encoder, log) = ScriptedEncoder::new();
    let mut driver = EncodeDriver::new(encoder.with_lag(4), &params(), DriverConfig::new(0)).unwrap();
    let mut sink: Vec<CompressedUnit> = Vec::new();

    driver
        .run_encode_loop(&mut CountingSource::new(10), &mut sink)
        .unwrap();
    assert_eq!(sink.len(), 6);

    let flushed = driver.run_flush_loop(&mut sink).unwrap();
    assert_eq!(flushed, 4);
    assert_eq!(driver.state(), SessionState::Closed);
    // Four productive calls and the empty one that ends the loop.
    assert_eq!(log.borrow().end_of_stream_submits(), 5);
    assert_eq!(pts(&sink), (0..10).collect::<Vec<_>>());
}

#[test]
fn encoder_without_lookahead_needs_one_flush_call() {
    let (encoder, log) = ScriptedEncoder::new();
    let mut driver = EncodeDriver::new(encoder, &params(), DriverConfig::new(0)).unwrap();
    let mut sink: Vec<CompressedUnit> = Vec::new();

    driver
        .run_encode_loop(&mut CountingSource::new(5), &mut sink)
        .unwrap();
    assert_eq!(driver.run_flush_loop(&mut sink).unwrap(), 0);
    assert_eq!(log.borrow().end_of_stream_submits(), 1);
}

#[test]
fn total_units_do_not_depend_on_flush_split() {
    for lag in 0..8 {
        for per_call in 1..=4 {
            let (encoder, log) = ScriptedEncoder::new();
            let encoder = encoder.with_lag(lag).with_released_per_flush(per_call);
            let driver = EncodeDriver::new(encoder, &params(), DriverConfig::new(5)).unwrap();

            let mut sink: Vec<CompressedUnit> = Vec::new();
            let summary = driver.run(&mut CountingSource::new(17), &mut sink).unwrap();

            assert_eq!(sink.len(), 17, "lag {lag}, {per_call} per call");
            assert_eq!(summary.units, 17);
            let expected_calls = (lag.min(17) + per_call - 1) / per_call + 1;
            assert_eq!(log.borrow().end_of_stream_submits(), expected_calls);
        }
    }
}

#[test]
fn second_flush_is_a_no_op() {
    let (encoder, log) = ScriptedEncoder::new();
    let mut driver = EncodeDriver::new(encoder.with_lag(2), &params(), DriverConfig::new(0)).unwrap();
    let mut sink: Vec<CompressedUnit> = Vec::new();

    driver
        .run_encode_loop(&mut CountingSource::new(4), &mut sink)
        .unwrap();
    assert_eq!(driver.run_flush_loop(&mut sink).unwrap(), 2);

    let calls_before = log.borrow().calls.len();
    assert_eq!(driver.run_flush_loop(&mut sink).unwrap(), 0);
    assert_eq!(log.borrow().calls.len(), calls_before);
    assert_eq!(sink.len(), 4);

    driver.finish().unwrap();
    assert_eq!(log.borrow().shutdowns(), 1);
}

#[test]
fn flush_without_encode_phase() {
    let (encoder, log) = ScriptedEncoder::new();
    let mut driver = EncodeDriver::new(encoder, &params(), DriverConfig::new(0)).unwrap();
    let mut sink: Vec<CompressedUnit> = Vec::new();

    assert_eq!(driver.state(), SessionState::Configured);
    assert_eq!(driver.run_flush_loop(&mut sink).unwrap(), 0);
    assert_eq!(driver.state(), SessionState::Closed);
    assert!(sink.is_empty());
    assert_eq!(log.borrow().end_of_stream_submits(), 1);
}

#[test]
fn finish_reports_totals_once() {
    let (encoder, log) = ScriptedEncoder::new();
    let encoder = encoder.with_lag(1).with_own_keyframes(&[2]);
    let mut driver = EncodeDriver::new(encoder, &params(), DriverConfig::new(3)).unwrap();
    let mut sink: Vec<CompressedUnit> = Vec::new();

    driver
        .run_encode_loop(&mut CountingSource::new(6), &mut sink)
        .unwrap();
    driver.run_flush_loop(&mut sink).unwrap();
    let summary = driver.finish().unwrap();

    assert_eq!(summary.frames_submitted, 6);
    assert_eq!(summary.units, 6);
    // Forced at 0 and 3, plus the encoder's own at 2.
    assert_eq!(summary.keyframes, 3);
    assert_eq!(
        summary.bytes,
        sink.iter().map(|u| u.data.len() as u64).sum::<u64>()
    );
    assert_eq!(log.borrow().shutdowns(), 1);
}

#[test]
fn finishing_before_flush_panics_and_releases_encoder() {
    let (encoder, log) = ScriptedEncoder::new();
    let mut driver = EncodeDriver::new(encoder.with_lag(2), &params(), DriverConfig::new(0)).unwrap();
    let mut sink: Vec<CompressedUnit> = Vec::new();

    driver
        .run_encode_loop(&mut CountingSource::new(5), &mut sink)
        .unwrap();
    assert_eq!(sink.len(), 3);

    let result = catch_unwind(AssertUnwindSafe(move || driver.finish()));
    let message = match result {
        Ok(_) => panic!("finish succeeded with two frames still held"),
        Err(payload) => payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default(),
    };
    assert!(message.contains("session must be flushed before it is finished"), "{message}");

    let log = log.borrow();
    assert_eq!(log.end_of_stream_submits(), 0);
    assert_eq!(log.shutdowns(), 1);
}

#[test]
#[should_panic(expected = "session must be flushed before it is finished")]
fn finishing_a_configured_session_panics() {
    let (encoder, _log) = ScriptedEncoder::new();
    let driver = EncodeDriver::new(encoder, &params(), DriverConfig::new(0)).unwrap();
    let _ = driver.finish();
}
