//! BDD step definitions for timed charger tests

use chrono::{TimeZone, Utc};
use cucumber::{given, then, when};

use voltcheck::config::TestConfig;
use voltcheck::sample::Sample;
use voltcheck::session::{SessionAnalyzer, TestOutcome};
use voltcheck::verdict::OverallVerdict;

use crate::world::VoltcheckWorld;

fn analyzer(world: &mut VoltcheckWorld) -> &mut SessionAnalyzer {
    world.analyzer.as_mut().expect("test not configured")
}

fn completed(world: &VoltcheckWorld) -> &voltcheck::session::SessionResult {
    match world.outcome.as_ref().expect("test has not finished") {
        TestOutcome::Completed(result) => result,
        other => panic!("expected a completed test, got {:?}", other),
    }
}

#[given(expr = "a charger test lasting {int} seconds")]
fn charger_test(world: &mut VoltcheckWorld, seconds: u64) {
    let mut analyzer = SessionAnalyzer::new(&TestConfig {
        duration_seconds: seconds,
        ..TestConfig::default()
    });
    analyzer.start();
    world.analyzer = Some(analyzer);
}

#[when(expr = "the test records {int} samples of {float} mA at {float} V")]
fn record_samples(world: &mut VoltcheckWorld, count: usize, current: f64, voltage: f64) {
    let analyzer = analyzer(world);
    for _ in 0..count {
        analyzer.record(&Sample::new(current, voltage, 30.0, 50, true));
    }
}

#[when(expr = "the test records currents {string} at {float} V")]
fn record_currents(world: &mut VoltcheckWorld, currents: String, voltage: f64) {
    let analyzer = analyzer(world);
    for value in currents.split(',') {
        let current: f64 = value.trim().parse().expect("invalid current");
        analyzer.record(&Sample::new(current, voltage, 30.0, 50, true));
    }
}

#[when(expr = "the test records voltages {string} at {float} mA")]
fn record_voltages(world: &mut VoltcheckWorld, voltages: String, current: f64) {
    let analyzer = analyzer(world);
    for value in voltages.split(',') {
        let voltage: f64 = value.trim().parse().expect("invalid voltage");
        analyzer.record(&Sample::new(current, voltage, 30.0, 50, true));
    }
}

#[when("the test runs out of time")]
fn test_completes(world: &mut VoltcheckWorld) {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let analyzer = analyzer(world);
    assert!(analyzer.is_expired(), "test still has time remaining");
    let outcome = analyzer.complete("Scenario".to_string(), created_at);
    world.outcome = Some(outcome);
}

#[when("the test is stopped manually")]
fn test_stopped(world: &mut VoltcheckWorld) {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let outcome = analyzer(world).stop("Scenario".to_string(), created_at);
    world.outcome = Some(outcome);
}

#[then(expr = "{int} seconds remain")]
fn seconds_remain(world: &mut VoltcheckWorld, seconds: u64) {
    assert_eq!(analyzer(world).remaining_seconds(), seconds);
}

#[then(expr = "the verdict is {string}")]
fn verdict_is(world: &mut VoltcheckWorld, expected: String) {
    let expected: OverallVerdict =
        serde_json::from_value(serde_json::Value::String(expected.clone()))
            .unwrap_or_else(|_| panic!("Unknown verdict: {}", expected));
    assert_eq!(completed(world).classify().overall, expected);
}

#[then(expr = "the average current is {float} mA")]
fn average_current(world: &mut VoltcheckWorld, expected: f64) {
    let actual = completed(world).avg_current_ma;
    assert!((actual - expected).abs() < 1e-6, "average was {}", actual);
}

#[then(expr = "the maximum current is {float} mA")]
fn maximum_current(world: &mut VoltcheckWorld, expected: f64) {
    let actual = completed(world).max_current_ma;
    assert!((actual - expected).abs() < 1e-6, "maximum was {}", actual);
}

#[then(expr = "the voltage drop is {float} V")]
fn voltage_drop(world: &mut VoltcheckWorld, expected: f64) {
    let actual = completed(world).voltage_drop_v;
    assert!((actual - expected).abs() < 1e-6, "drop was {}", actual);
}

#[then(expr = "the stability is {float} percent")]
fn stability(world: &mut VoltcheckWorld, expected: f64) {
    let actual = completed(world).stability_pct;
    assert!((actual - expected).abs() < 0.05, "stability was {}", actual);
}

#[then(expr = "{int} samples were recorded")]
fn samples_recorded(world: &mut VoltcheckWorld, count: usize) {
    assert_eq!(completed(world).samples.len(), count);
}

#[then(expr = "the test reports insufficient data with {int} of {int} samples")]
fn insufficient_data(world: &mut VoltcheckWorld, collected: usize, required: usize) {
    assert_eq!(
        world.outcome,
        Some(TestOutcome::InsufficientData {
            collected,
            required
        })
    );
}
