use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::AppConfig;

const QUEUE_CAPACITY: usize = 64;

/// LoginAttempt
///
/// One login submission, successful or not, as reported to the site owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginAttempt {
    pub username: String,
    pub ip: String,
    pub success: bool,
    pub at: DateTime<Utc>,
}

impl LoginAttempt {
    pub fn new(username: &str, ip: &str, success: bool) -> Self {
        Self {
            username: username.to_string(),
            ip: ip.to_string(),
            success,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook responded with status {0}")]
    Status(reqwest::StatusCode),
}

/// LoginNotifier
///
/// Delivery channel for login attempt notices.
#[async_trait]
pub trait LoginNotifier: Send + Sync {
    async fn notify(&self, attempt: &LoginAttempt) -> Result<(), NotifyError>;
}

/// Posts each attempt as JSON to a configured URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LoginNotifier for WebhookNotifier {
    async fn notify(&self, attempt: &LoginAttempt) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(attempt).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}

/// Writes attempts to the application log. Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl LoginNotifier for LogNotifier {
    async fn notify(&self, attempt: &LoginAttempt) -> Result<(), NotifyError> {
        tracing::info!(
            username = %attempt.username,
            ip = %attempt.ip,
            success = attempt.success,
            at = %attempt.at,
            "login attempt"
        );
        Ok(())
    }
}

/// Picks the notifier matching the configuration.
pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn LoginNotifier> {
    match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    }
}

/// NotificationQueue
///
/// Handle to the background delivery worker. Dispatching never blocks the request and
/// delivery failures are only logged.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<LoginAttempt>,
}

impl NotificationQueue {
    /// Spawns the worker on the current tokio runtime. The worker exits once every
    /// handle has been dropped.
    pub fn spawn(notifier: Arc<dyn LoginNotifier>) -> Self {
        let (tx, mut rx) = mpsc::channel::<LoginAttempt>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(attempt) = rx.recv().await {
                if let Err(e) = notifier.notify(&attempt).await {
                    tracing::warn!(username = %attempt.username, "login notification failed: {}", e);
                }
            }
            tracing::debug!("notification worker stopped");
        });

        Self { tx }
    }

    pub fn dispatch(&self, attempt: LoginAttempt) {
        if let Err(e) = self.tx.try_send(attempt) {
            tracing::warn!("dropping login notification: {}", e);
        }
    }
}
