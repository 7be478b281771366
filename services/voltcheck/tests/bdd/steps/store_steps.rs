//! BDD step definitions for the result store and CSV export

use chrono::{TimeZone, Utc};
use cucumber::{given, then, when};

use voltcheck::export::{parse_sessions_csv, sessions_to_csv};
use voltcheck::sample::Sample;
use voltcheck::session::{SampleSeries, SessionResult};
use voltcheck::store::ResultStore;
use voltcheck::VoltcheckError;

use crate::world::VoltcheckWorld;

fn result(name: &str, hour: u32, current: f64) -> SessionResult {
    let mut samples = SampleSeries::default();
    for offset in [-20.0, 0.0, 20.0] {
        samples.push(&Sample::new(current + offset, 4.2, 30.0, 50, true));
    }
    SessionResult::from_series(
        name.to_string(),
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
        samples,
    )
}

async fn session_id(world: &mut VoltcheckWorld, name: &str) -> u64 {
    world
        .store()
        .list()
        .await
        .expect("list failed")
        .into_iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no session named {}", name))
        .id
}

#[given(expr = "a stored session {string} recorded at {int}:00 averaging {float} mA")]
async fn stored_session(world: &mut VoltcheckWorld, name: String, hour: u32, current: f64) {
    world
        .store()
        .save(result(&name, hour, current))
        .await
        .expect("save failed");
}

#[when(expr = "the session {string} is renamed to {string}")]
async fn rename_session(world: &mut VoltcheckWorld, name: String, new_name: String) {
    let id = session_id(world, &name).await;
    world
        .store()
        .rename(id, &new_name)
        .await
        .expect("rename failed");
}

#[when(expr = "the session {string} is deleted")]
async fn delete_session(world: &mut VoltcheckWorld, name: String) {
    let id = session_id(world, &name).await;
    world.store().delete(id).await.expect("delete failed");
}

#[when("all sessions are deleted")]
async fn delete_all(world: &mut VoltcheckWorld) {
    world.store().delete_all().await.expect("delete all failed");
}

#[when(expr = "session {int} is deleted")]
async fn delete_by_id(world: &mut VoltcheckWorld, id: u64) {
    world.last_error = world.store().delete(id).await.err();
}

#[when("the sessions are exported")]
async fn export_sessions(world: &mut VoltcheckWorld) {
    let sessions = world.store().list().await.expect("list failed");
    world.export_csv = Some(sessions_to_csv(&sessions).expect("export failed"));
}

#[then(expr = "the session list is {string}")]
async fn session_list(world: &mut VoltcheckWorld, expected: String) {
    let names: Vec<String> = world
        .store()
        .list()
        .await
        .expect("list failed")
        .into_iter()
        .map(|s| s.name)
        .collect();
    let expected: Vec<String> = expected
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    assert_eq!(names, expected);
}

#[then("the session was not found")]
fn session_not_found(world: &mut VoltcheckWorld) {
    assert!(
        matches!(world.last_error, Some(VoltcheckError::NotFound(_))),
        "unexpected result: {:?}",
        world.last_error
    );
}

#[then(expr = "the export header is {string}")]
fn export_header(world: &mut VoltcheckWorld, header: String) {
    let csv = world.export_csv.as_ref().expect("nothing exported");
    assert_eq!(csv.lines().next(), Some(header.as_str()));
}

#[then(expr = "the export row {int} is {string}")]
fn export_row(world: &mut VoltcheckWorld, row: usize, expected: String) {
    let csv = world.export_csv.as_ref().expect("nothing exported");
    assert_eq!(csv.lines().nth(row), Some(expected.as_str()));
}

#[then("the export parses back to the stored sessions")]
async fn export_parses_back(world: &mut VoltcheckWorld) {
    let csv = world.export_csv.clone().expect("nothing exported");
    let parsed = parse_sessions_csv(&csv).expect("parse failed");
    let stored = world.store().list().await.expect("list failed");
    assert_eq!(parsed.len(), stored.len());
    for (row, session) in parsed.iter().zip(&stored) {
        assert_eq!(row.name, session.name);
        assert_eq!(row.created_at, session.created_at);
        assert!((row.avg_current_ma - session.avg_current_ma).abs() <= 0.5);
        assert!((row.max_current_ma - session.max_current_ma).abs() <= 0.5);
        assert!((row.stability_pct - session.stability_pct).abs() <= 0.05);
        assert!((row.voltage_drop_v - session.voltage_drop_v).abs() <= 0.0005);
    }
}
