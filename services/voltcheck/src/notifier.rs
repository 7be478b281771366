//! Notifier trait for delivering alerts

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alert::AlertEvent;

/// A notification to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: i8,
    pub sound: Option<String>,
}

impl Notification {
    pub fn from_alert(event: &AlertEvent) -> Self {
        let (priority, sound) = match event {
            AlertEvent::HighTemperature { .. } => (1, None),
            AlertEvent::FullChargeAlarm { .. } => (1, Some("siren".to_string())),
            AlertEvent::LowCurrent { .. } | AlertEvent::UnstableCharging { .. } => (0, None),
        };
        Self {
            title: event.title().to_string(),
            message: event.message(),
            priority,
            sound,
        }
    }

    /// Notification for the charger being plugged in or removed
    pub fn charger_changed(connected: bool) -> Self {
        let (title, message) = if connected {
            ("Charger Connected", "Charge monitoring started")
        } else {
            ("Charger Disconnected", "Charge monitoring stopped")
        };
        Self {
            title: title.to_string(),
            message: message.to_string(),
            priority: -1,
            sound: None,
        }
    }
}

/// Record of a sent notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Alert kind, or `charger` for connect/disconnect notices
    pub source: String,
    pub notifier_type: String,
    pub message: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp_epoch_ms: u64,
}

/// Trait for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "pushover")
    fn type_name(&self) -> &str;

    /// Send a notification
    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}
