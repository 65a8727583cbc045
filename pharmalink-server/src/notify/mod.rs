//! Push notification dispatch (Expo)
//!
//! Delivery is best-effort: a failed or slow push must never fail the
//! request that triggered it, so dispatch happens on a detached task and
//! failures are only logged.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A single push message addressed to one device token.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PushMessage {
    /// Expo push token of the target device
    pub to: String,
    pub title: String,
    pub body: String,
    /// Extra payload delivered to the app (order id etc.)
    pub data: serde_json::Value,
}

impl PushMessage {
    pub fn new(to: String, title: &str, body: &str, order_id: i64) -> Self {
        Self {
            to,
            title: title.to_string(),
            body: body.to_string(),
            data: json!({ "orderId": order_id }),
        }
    }
}

/// Transport seam for push delivery. Production uses [`ExpoGateway`];
/// tests substitute a recording mock.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, messages: &[PushMessage]) -> Result<(), BoxError>;
}

/// Expo push HTTP gateway.
///
/// Expo accepts a JSON array of messages in a single POST, so one batch
/// per audience is a single request.
pub struct ExpoGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl ExpoGateway {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl PushGateway for ExpoGateway {
    async fn send(&self, messages: &[PushMessage]) -> Result<(), BoxError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(messages)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Expo push failed ({status}): {body}").into());
        }

        Ok(())
    }
}

/// Best-effort push dispatcher.
#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn PushGateway>,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn PushGateway>) -> Self {
        Self { gateway }
    }

    /// Dispatch a batch of messages on a detached task. Returns
    /// immediately; delivery failures are logged, never surfaced.
    pub fn dispatch(&self, messages: Vec<PushMessage>) {
        if messages.is_empty() {
            return;
        }

        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            let count = messages.len();
            if let Err(e) = gateway.send(&messages).await {
                tracing::warn!(count, error = %e, "push dispatch failed");
            } else {
                tracing::debug!(count, "push dispatch succeeded");
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::sync::mpsc;

    /// Recording gateway for tests: forwards each batch to an mpsc channel.
    pub(crate) struct MockGateway {
        tx: mpsc::UnboundedSender<Vec<PushMessage>>,
    }

    impl MockGateway {
        pub(crate) fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<PushMessage>>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx }), rx)
        }
    }

    #[async_trait]
    impl PushGateway for MockGateway {
        async fn send(&self, messages: &[PushMessage]) -> Result<(), BoxError> {
            self.tx.send(messages.to_vec()).map_err(|e| e.to_string())?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_delivers_batch() {
        let (gateway, mut rx) = MockGateway::channel();
        let notifier = Notifier::new(gateway);

        notifier.dispatch(vec![
            PushMessage::new("ExponentPushToken[a]".into(), "t", "b", 1),
            PushMessage::new("ExponentPushToken[b]".into(), "t", "b", 1),
        ]);

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].to, "ExponentPushToken[a]");
        assert_eq!(batch[0].data, json!({ "orderId": 1 }));
    }

    #[tokio::test]
    async fn dispatch_skips_empty_batch() {
        let (gateway, mut rx) = MockGateway::channel();
        let notifier = Notifier::new(gateway);

        notifier.dispatch(vec![]);

        // Channel closes without a send when the batch is empty.
        drop(notifier);
        assert!(rx.recv().await.is_none());
    }
}
