//! Pushover push notifications with bounded retry.
//!
//! Delivery is at-least-once from the caller's point of view: every attempt
//! that fails (transport error or HTTP status >= 400) is logged and retried
//! after a fixed interval, up to the configured number of attempts.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use reqwest::Client;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::PushoverCredentials;

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pushover rejected the message: status code: {status}, error text: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("push notification not delivered after {attempts} attempts")]
    Delivery {
        attempts: u32,
        #[source]
        last: Box<NotifyError>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Priority {
    Silent,
    Low,
    #[default]
    Default,
    High,
    Emergency,
}

impl Priority {
    /// Pushover's numeric priority.
    pub fn as_param(self) -> &'static str {
        match self {
            Priority::Silent => "-2",
            Priority::Low => "-1",
            Priority::Default => "0",
            Priority::High => "1",
            Priority::Emergency => "2",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

/// Message sent once live trades confirm the feed is up.
pub fn startup_notification<Tz>(started_at: &DateTime<Tz>, price: &str) -> Notification
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    Notification {
        title: "Bot Started".into(),
        message: format!(
            "Start time: {}\nPrice: {}",
            started_at.format("%m/%d/%y - %I:%M %p"),
            price
        ),
        priority: Priority::Default,
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

pub struct PushoverNotifier {
    http: Client,
    url: String,
    credentials: PushoverCredentials,
    attempts: u32,
    retry_interval: Duration,
}

impl PushoverNotifier {
    pub fn new(
        credentials: PushoverCredentials,
        attempts: u32,
        retry_interval: Duration,
    ) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            http,
            url: PUSHOVER_URL.to_string(),
            credentials,
            attempts: attempts.max(1),
            retry_interval,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    async fn post(&self, n: &Notification) -> Result<(), NotifyError> {
        let form = [
            ("token", self.credentials.token.as_str()),
            ("user", self.credentials.user.as_str()),
            ("message", n.message.as_str()),
            ("title", n.title.as_str()),
            ("priority", n.priority.as_param()),
        ];

        let resp = self
            .http
            .post(&self.url)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    #[instrument(skip(self, notification), fields(title = %notification.title))]
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut attempt = 1;

        loop {
            let err = match self.post(notification).await {
                Ok(()) => {
                    info!(attempt, "push notification delivered");
                    return Ok(());
                }
                Err(e) => e,
            };

            warn!(
                attempt,
                attempts = self.attempts,
                error = %err,
                "push notification failed on try {attempt}/{}",
                self.attempts
            );

            if attempt >= self.attempts {
                return Err(NotifyError::Delivery {
                    attempts: self.attempts,
                    last: Box::new(err),
                });
            }

            attempt += 1;
            tokio::time::sleep(self.retry_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> PushoverCredentials {
        PushoverCredentials {
            token: "tok".into(),
            user: "usr".into(),
        }
    }

    fn note() -> Notification {
        Notification {
            title: "Bot Started".into(),
            message: "hello".into(),
            priority: Priority::High,
        }
    }

    async fn notifier(server: &MockServer, attempts: u32) -> PushoverNotifier {
        PushoverNotifier::new(creds(), attempts, Duration::ZERO)
            .unwrap()
            .with_url(format!("{}/1/messages.json", server.uri()))
    }

    #[test]
    fn priorities_map_to_pushover_levels() {
        assert_eq!(Priority::Silent.as_param(), "-2");
        assert_eq!(Priority::Low.as_param(), "-1");
        assert_eq!(Priority::default().as_param(), "0");
        assert_eq!(Priority::High.as_param(), "1");
        assert_eq!(Priority::Emergency.as_param(), "2");
    }

    #[test]
    fn startup_message_format() {
        let at = Utc.with_ymd_and_hms(2019, 3, 7, 15, 4, 0).unwrap();
        let n = startup_notification(&at, "0.31000");
        assert_eq!(n.title, "Bot Started");
        assert_eq!(n.message, "Start time: 03/07/19 - 03:04 PM\nPrice: 0.31000");
    }

    #[tokio::test]
    async fn delivers_form_encoded_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("token=tok"))
            .and(body_string_contains("user=usr"))
            .and(body_string_contains("title=Bot+Started"))
            .and(body_string_contains("priority=1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server, 5).await.notify(&note()).await.unwrap();
    }

    #[tokio::test]
    async fn retries_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server, 5).await.notify(&note()).await.unwrap();
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid token"))
            .expect(3)
            .mount(&server)
            .await;

        let err = notifier(&server, 3).await.notify(&note()).await.unwrap_err();
        match err {
            NotifyError::Delivery { attempts, last } => {
                assert_eq!(attempts, 3);
                match *last {
                    NotifyError::Status { status, body } => {
                        assert_eq!(status.as_u16(), 400);
                        assert_eq!(body, "invalid token");
                    }
                    other => panic!("unexpected last error: {other}"),
                }
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server, 0).await.notify(&note()).await.unwrap();
    }
}
