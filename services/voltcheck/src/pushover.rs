//! Alert delivery through the Pushover messages API

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::NotifierConfig;
use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier};
use crate::VoltcheckError;

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Pushover truncation limits, in characters
const MAX_TITLE_CHARS: usize = 250;
const MAX_MESSAGE_CHARS: usize = 1024;

/// Emergency priority (2) needs retry/expire parameters, so it is capped
const MAX_PRIORITY: i8 = 1;
const MIN_PRIORITY: i8 = -2;

#[derive(Debug, Deserialize)]
struct PushoverReply {
    status: i32,
    #[serde(default)]
    errors: Vec<String>,
}

pub struct PushoverNotifier {
    api_token: String,
    user_key: String,
    default_title: String,
    default_priority: i8,
    default_sound: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverNotifier")
            .field("default_title", &self.default_title)
            .field("default_priority", &self.default_priority)
            .finish_non_exhaustive()
    }
}

impl PushoverNotifier {
    pub fn new(config: &NotifierConfig, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let NotifierConfig::Pushover {
            api_token,
            user_key,
            default_title,
            default_priority,
            default_sound,
        } = config
        else {
            return Err(VoltcheckError::Config(format!(
                "Expected a pushover notifier config, got '{}'",
                config.type_name()
            )));
        };
        if api_token.is_empty() || user_key.is_empty() {
            return Err(VoltcheckError::Config(
                "Pushover notifier needs both api_token and user_key".to_string(),
            ));
        }

        Ok(Self {
            api_token: api_token.clone(),
            user_key: user_key.clone(),
            default_title: default_title.clone(),
            default_priority: *default_priority,
            default_sound: default_sound.clone(),
            http,
        })
    }

    /// Form fields for one message, with defaults filled in and limits applied
    fn form_fields(&self, notification: &Notification) -> Vec<(&'static str, String)> {
        let title = if notification.title.is_empty() {
            &self.default_title
        } else {
            &notification.title
        };
        // Charger notices carry -1 and should stay quiet
        let priority = match notification.priority {
            0 => self.default_priority,
            p => p,
        }
        .clamp(MIN_PRIORITY, MAX_PRIORITY);
        let sound = notification
            .sound
            .clone()
            .unwrap_or_else(|| self.default_sound.clone());

        vec![
            ("token", self.api_token.clone()),
            ("user", self.user_key.clone()),
            ("title", truncate_chars(title, MAX_TITLE_CHARS)),
            (
                "message",
                truncate_chars(&notification.message, MAX_MESSAGE_CHARS),
            ),
            ("priority", priority.to_string()),
            ("sound", sound),
        ]
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn type_name(&self) -> &str {
        "pushover"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let fields = self.form_fields(notification);
        let params: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();

        tracing::debug!("Posting '{}' to Pushover", notification.title);
        let response = self.http.post_form(PUSHOVER_API_URL, &params).await?;

        // A 200 can still carry status 0 with validation errors
        let reply: Option<PushoverReply> = serde_json::from_str(&response.body).ok();
        match reply {
            Some(reply) if response.is_success() && reply.status == 1 => Ok(()),
            Some(reply) if !reply.errors.is_empty() => Err(VoltcheckError::Notifier(format!(
                "Pushover rejected the message ({}): {}",
                response.status,
                reply.errors.join("; ")
            ))),
            _ => Err(VoltcheckError::Notifier(format!(
                "Pushover API returned status {}: {}",
                response.status, response.body
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertEvent;
    use crate::io::{HttpResponse, MockHttpClient};

    fn config() -> NotifierConfig {
        NotifierConfig::Pushover {
            api_token: "app-token".to_string(),
            user_key: "user-key".to_string(),
            default_title: "Charging Alert".to_string(),
            default_priority: 0,
            default_sound: "pushover".to_string(),
        }
    }

    fn reply(status: u16, body: &'static str) -> crate::Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    /// A client expecting one post whose form satisfies `check`
    fn client_expecting(
        check: impl Fn(&[(&str, &str)]) -> bool + Send + 'static,
    ) -> Arc<MockHttpClient> {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .withf(move |url, params| url == PUSHOVER_API_URL && check(params))
            .times(1)
            .returning(|_, _| Box::pin(async { reply(200, r#"{"status":1,"request":"abc"}"#) }));
        Arc::new(mock)
    }

    fn client_replying(status: u16, body: &'static str) -> Arc<MockHttpClient> {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .returning(move |_, _| Box::pin(async move { reply(status, body) }));
        Arc::new(mock)
    }

    #[tokio::test]
    async fn low_current_alert_is_posted() {
        let http = client_expecting(|params| {
            params.contains(&("token", "app-token"))
                && params.contains(&("user", "user-key"))
                && params.contains(&("title", "Low Charging Current"))
                && params.contains(&("priority", "0"))
                && params.contains(&("sound", "pushover"))
                && params
                    .iter()
                    .any(|(k, v)| *k == "message" && v.contains("320 mA"))
        });
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        let notification =
            Notification::from_alert(&AlertEvent::LowCurrent { current_ma: 320.0 });
        notifier.notify(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn full_charge_alarm_uses_its_sound() {
        let http = client_expecting(|params| {
            params.contains(&("title", "Battery Alarm"))
                && params.contains(&("priority", "1"))
                && params.contains(&("sound", "siren"))
        });
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        let notification = Notification::from_alert(&AlertEvent::FullChargeAlarm { level: 100 });
        notifier.notify(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn empty_title_falls_back_to_default() {
        let http = client_expecting(|params| params.contains(&("title", "Charging Alert")));
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        let notification = Notification {
            title: String::new(),
            message: "msg".to_string(),
            priority: 0,
            sound: None,
        };
        notifier.notify(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn emergency_priority_is_capped() {
        let http = client_expecting(|params| params.contains(&("priority", "1")));
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        let notification = Notification {
            title: "t".to_string(),
            message: "m".to_string(),
            priority: 2,
            sound: None,
        };
        notifier.notify(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn long_messages_are_truncated() {
        let http = client_expecting(|params| {
            params
                .iter()
                .any(|(k, v)| *k == "message" && v.chars().count() == MAX_MESSAGE_CHARS)
        });
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        let notification = Notification {
            title: "t".to_string(),
            message: "°".repeat(2000),
            priority: 0,
            sound: None,
        };
        notifier.notify(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_request_reports_api_errors() {
        let http = client_replying(
            400,
            r#"{"status":0,"errors":["user identifier is invalid"]}"#,
        );
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        let err = notifier
            .notify(&Notification::charger_changed(true))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("user identifier is invalid"));
    }

    #[tokio::test]
    async fn status_zero_with_200_is_an_error() {
        let http = client_replying(200, r#"{"status":0,"errors":["message cannot be blank"]}"#);
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        assert!(notifier
            .notify(&Notification::charger_changed(false))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn non_json_failure_reports_status() {
        let http = client_replying(502, "Bad Gateway");
        let notifier = PushoverNotifier::new(&config(), http).unwrap();
        let err = notifier
            .notify(&Notification::charger_changed(true))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn transport_failure_is_propagated() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .returning(|_, _| Box::pin(async { Err(VoltcheckError::Http("timeout".into())) }));
        let notifier = PushoverNotifier::new(&config(), Arc::new(mock)).unwrap();
        let err = notifier
            .notify(&Notification::charger_changed(true))
            .await
            .unwrap_err();
        assert!(matches!(err, VoltcheckError::Http(_)));
    }

    #[test]
    fn requires_credentials() {
        let config = NotifierConfig::Pushover {
            api_token: String::new(),
            user_key: "user-key".to_string(),
            default_title: "Charging Alert".to_string(),
            default_priority: 0,
            default_sound: "pushover".to_string(),
        };
        let http = Arc::new(MockHttpClient::new());
        assert!(PushoverNotifier::new(&config, http).is_err());
    }

    #[test]
    fn rejects_other_notifier_config() {
        let err = PushoverNotifier::new(&NotifierConfig::Log, Arc::new(MockHttpClient::new()))
            .unwrap_err();
        assert!(err.to_string().contains("pushover"));
    }
}
