use super::{Notification, Notifier, NotifyError};
use crate::config::DockhandConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

/// POSTs the notification as JSON to a webhook. Any 2xx counts as delivered.
pub struct WebhookNotifier {
    endpoint: String,
    http_client: Client,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Network(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
            timeout,
        })
    }

    pub fn from_config(config: &DockhandConfig) -> Result<Self, NotifyError> {
        let endpoint = config
            .notify_webhook
            .clone()
            .ok_or(NotifyError::NotConfigured)?;
        Self::with_timeout(endpoint, Duration::from_secs(config.notify_timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        debug!(recipient = %notification.recipient, "Posting notification");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Notification request timed out after {:?}", self.timeout);
                    NotifyError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    error!("Notification request failed: {}", e);
                    NotifyError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        info!(recipient = %notification.recipient, "Notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one request, hands back its body and answers with `status_line`
    async fn one_shot_server(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length {
                        break;
                    }
                }
            }
            let response = format!("{}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok", status_line);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let text = String::from_utf8_lossy(&raw).to_string();
            text.split("\r\n\r\n").nth(1).unwrap_or_default().to_string()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_posts_json_payload() {
        let (url, server) = one_shot_server("HTTP/1.1 200 OK").await;
        let notifier = WebhookNotifier::with_timeout(url, Duration::from_secs(5)).unwrap();
        let notification =
            Notification::new("ops@example.com", "Staging ready", "shop:1 is running").unwrap();

        notifier.send(&notification).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body["recipient"], "ops@example.com");
        assert_eq!(body["subject"], "Staging ready");
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let (url, server) = one_shot_server("HTTP/1.1 503 Service Unavailable").await;
        let notifier = WebhookNotifier::with_timeout(url, Duration::from_secs(5)).unwrap();
        let notification = Notification::new("ops@example.com", "s", "b").unwrap();

        let err = notifier.send(&notification).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 503, .. }));
        server.await.unwrap();
    }

    #[test]
    fn test_from_config_requires_webhook() {
        let config = DockhandConfig::from_lookup(|_| None);
        assert!(matches!(
            WebhookNotifier::from_config(&config),
            Err(NotifyError::NotConfigured)
        ));

        let config = DockhandConfig::from_lookup(|k| {
            (k == "DOCKHAND_NOTIFY_WEBHOOK").then(|| "https://hooks.example.com/x".to_string())
        });
        let notifier = WebhookNotifier::from_config(&config).unwrap();
        assert_eq!(notifier.endpoint(), "https://hooks.example.com/x");
    }
}
