//! CSV export of stored sessions and of the raw sample log

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::session::SessionResult;
use crate::state::LoggedSample;
use crate::VoltcheckError;

pub const SESSION_HEADER: [&str; 6] = [
    "Session Name",
    "Timestamp",
    "Avg Current (mA)",
    "Max Current (mA)",
    "Stability (%)",
    "Voltage Drop (V)",
];

pub const SAMPLE_LOG_HEADER: [&str; 6] = [
    "Timestamp",
    "Current (mA)",
    "Voltage (V)",
    "Temperature (°C)",
    "Level (%)",
    "Status",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of a session export, as read back
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedSession {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub avg_current_ma: f64,
    pub max_current_ma: f64,
    pub stability_pct: f64,
    pub voltage_drop_v: f64,
}

/// Render sessions in the order given
pub fn sessions_to_csv(sessions: &[SessionResult]) -> crate::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SESSION_HEADER)?;
    for session in sessions {
        writer.write_record([
            session.name.clone(),
            session.created_at.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.0}", session.avg_current_ma),
            format!("{:.0}", session.max_current_ma),
            format!("{:.1}", session.stability_pct),
            format!("{:.3}", session.voltage_drop_v),
        ])?;
    }
    finish(writer)
}

/// Read a session export back
pub fn parse_sessions_csv(input: &str) -> crate::Result<Vec<ExportedSession>> {
    let mut reader = csv::Reader::from_reader(input.as_bytes());
    let headers = reader.headers()?;
    if headers.iter().ne(SESSION_HEADER) {
        return Err(VoltcheckError::Parse(format!(
            "Unexpected session export header: {:?}",
            headers
        )));
    }

    let mut sessions = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or_default();
        let created_at = NaiveDateTime::parse_from_str(field(1), TIMESTAMP_FORMAT)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|e| {
                let row = line + 1;
                VoltcheckError::Parse(format!("Row {row}: bad timestamp '{}': {e}", field(1)))
            })?;
        sessions.push(ExportedSession {
            name: field(0).to_string(),
            created_at,
            avg_current_ma: parse_number(field(2), line)?,
            max_current_ma: parse_number(field(3), line)?,
            stability_pct: parse_number(field(4), line)?,
            voltage_drop_v: parse_number(field(5), line)?,
        });
    }
    Ok(sessions)
}

/// Render the raw sample log, oldest first
pub fn sample_log_to_csv<'a>(
    samples: impl IntoIterator<Item = &'a LoggedSample>,
) -> crate::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SAMPLE_LOG_HEADER)?;
    for sample in samples {
        writer.write_record([
            sample.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.2}", sample.current_ma),
            format!("{:.3}", sample.voltage_v),
            format!("{:.1}", sample.temperature_c),
            sample.level.to_string(),
            sample.status.clone(),
        ])?;
    }
    finish(writer)
}

fn parse_number(value: &str, line: usize) -> crate::Result<f64> {
    value.trim().parse().map_err(|_| {
        VoltcheckError::Parse(format!("Row {}: '{}' is not a number", line + 1, value))
    })
}

fn finish(writer: csv::Writer<Vec<u8>>) -> crate::Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| VoltcheckError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| VoltcheckError::Parse(e.to_string()))
}
