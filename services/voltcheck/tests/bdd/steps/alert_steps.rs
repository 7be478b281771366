//! BDD step definitions for threshold alerts and stability

use cucumber::{given, then, when};

use voltcheck::alert::{AlertKind, FullChargeLatch};
use voltcheck::config::ThresholdConfig;
use voltcheck::sample::Sample;

use crate::world::VoltcheckWorld;

fn parse_kind(s: &str) -> AlertKind {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .unwrap_or_else(|_| panic!("Unknown alert kind: {}", s))
}

fn feed(world: &mut VoltcheckWorld, sample: Sample, ms: u64) {
    let now = world.at(ms);
    let thresholds = world.thresholds.clone();
    let events = world.alert_engine.evaluate(&sample, &thresholds, now);
    world.all_events.extend(events.iter().cloned());
    world.last_events = events;
}

#[given("default thresholds")]
fn default_thresholds(world: &mut VoltcheckWorld) {
    world.thresholds = ThresholdConfig::default();
}

#[given(expr = "a low current threshold of {float} mA")]
fn low_current_threshold(world: &mut VoltcheckWorld, threshold: f64) {
    world.thresholds.low_current_ma = threshold;
}

#[given(expr = "the {string} alert is disabled")]
fn alert_disabled(world: &mut VoltcheckWorld, kind: String) {
    match parse_kind(&kind) {
        AlertKind::LowCurrent => world.thresholds.alerts.low_current = false,
        AlertKind::HighTemperature => world.thresholds.alerts.high_temperature = false,
        AlertKind::UnstableCharging => world.thresholds.alerts.unstable_charging = false,
        AlertKind::FullChargeAlarm => world.thresholds.alarm_enabled = false,
    }
}

#[given("the full charge alarm is enabled")]
fn full_charge_alarm_enabled(world: &mut VoltcheckWorld) {
    world.thresholds.alarm_enabled = true;
}

#[when(expr = "a charging sample of {float} mA at {float} C and level {int} arrives at {int} ms")]
fn charging_sample(world: &mut VoltcheckWorld, current: f64, temp_c: f64, level: u8, ms: u64) {
    let sample = Sample::new(current, 4.2, temp_c, level, true);
    feed(world, sample, ms);
}

#[when(expr = "a discharging sample of {float} mA arrives at {int} ms")]
fn discharging_sample(world: &mut VoltcheckWorld, current: f64, ms: u64) {
    feed(world, Sample::new(current, 3.9, 30.0, 80, false), ms);
}

#[when(expr = "charging currents {string} arrive one second apart")]
fn charging_currents(world: &mut VoltcheckWorld, currents: String) {
    let start = world
        .clock_origin
        .map(|origin| origin.elapsed().as_millis() as u64)
        .unwrap_or(0);
    for (i, value) in currents.split(',').enumerate() {
        let current: f64 = value.trim().parse().expect("invalid current");
        feed(
            world,
            Sample::new(current, 4.2, 30.0, 50, true),
            start + i as u64 * 1000,
        );
    }
}

#[then(expr = "a {string} alert is raised")]
fn alert_raised(world: &mut VoltcheckWorld, kind: String) {
    let kind = parse_kind(&kind);
    assert!(
        world.last_events.iter().any(|e| e.kind() == kind),
        "expected {:?} in {:?}",
        kind,
        world.last_events
    );
}

#[then("no alert is raised")]
fn no_alert_raised(world: &mut VoltcheckWorld) {
    assert!(
        world.last_events.is_empty(),
        "unexpected alerts: {:?}",
        world.last_events
    );
}

#[then(expr = "{int} {string} alert(s) has/have been raised in total")]
fn alerts_in_total(world: &mut VoltcheckWorld, count: usize, kind: String) {
    let kind = parse_kind(&kind);
    let raised = world.all_events.iter().filter(|e| e.kind() == kind).count();
    assert_eq!(raised, count, "events so far: {:?}", world.all_events);
}

#[then(expr = "the raised alert message contains {string}")]
fn alert_message_contains(world: &mut VoltcheckWorld, text: String) {
    let messages: Vec<String> = world.last_events.iter().map(|e| e.message()).collect();
    assert!(
        messages.iter().any(|m| m.contains(&text)),
        "{:?} does not contain '{}'",
        messages,
        text
    );
}

#[then("the stability reading is not ready")]
fn stability_not_ready(world: &mut VoltcheckWorld) {
    let reading = world.alert_engine.last_stability();
    assert!(!reading.ready);
    assert!(!reading.is_unstable);
    assert_eq!(reading.cv, 0.0);
}

#[then(expr = "the stability reading is ready with stability {float} percent")]
fn stability_ready(world: &mut VoltcheckWorld, expected: f64) {
    let reading = world.alert_engine.last_stability();
    assert!(reading.ready);
    assert!(
        (reading.stability_pct() - expected).abs() < 0.1,
        "stability was {}",
        reading.stability_pct()
    );
}

#[then(expr = "the full charge alarm is {word}")]
fn full_charge_latch(world: &mut VoltcheckWorld, state: String) {
    let expected = match state.as_str() {
        "armed" => FullChargeLatch::Armed,
        "fired" => FullChargeLatch::Fired,
        other => panic!("Unknown latch state: {}", other),
    };
    assert_eq!(world.alert_engine.latch(), expected);
}
