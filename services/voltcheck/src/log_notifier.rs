//! Notifier that writes alerts to the service log

use async_trait::async_trait;

use crate::notifier::{Notification, Notifier};

/// Emits notifications as `warn` level log lines
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn type_name(&self) -> &str {
        "log"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        tracing::warn!("{}: {}", notification.title, notification.message);
        Ok(())
    }
}
