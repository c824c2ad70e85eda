use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Where a push notification is addressed. Topics follow the naming scheme
/// the mobile apps subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyTarget {
    /// Direct delivery to a registered device token.
    Device(String),
    /// Per-user topic, `user_{id}`.
    User(String),
    /// Per-parent topic, `parent_{id}_alerts`.
    Parent(String),
    /// Broadcast topic all warden devices subscribe to.
    WardenAlerts,
    /// Broadcast topic for emergency alerts (wardens and admins).
    SosAlerts,
}

impl NotifyTarget {
    /// FCM addressing for this target: `to` is either a raw device token or
    /// a `/topics/{name}` path.
    pub fn to_field(&self) -> String {
        match self {
            NotifyTarget::Device(token) => token.clone(),
            NotifyTarget::User(id) => format!("/topics/user_{}", id),
            NotifyTarget::Parent(id) => format!("/topics/parent_{}_alerts", id),
            NotifyTarget::WardenAlerts => "/topics/warden_alerts".to_string(),
            NotifyTarget::SosAlerts => "/topics/admin_sos_alerts".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("push transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("push delivery rejected with status {0}")]
    Rejected(u16),
}

/// Push delivery capability. Injected into services so tests can substitute
/// a recording or failing implementation. Delivery is best-effort; callers
/// must treat failures as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        target: NotifyTarget,
        notification: Notification,
        data: Value,
    ) -> Result<(), NotifyError>;
}

/// Fire-and-forget dispatch: failures are logged, never propagated, and the
/// caller does not wait on delivery latency.
pub fn dispatch(
    notifier: &Arc<dyn Notifier>,
    target: NotifyTarget,
    notification: Notification,
    data: Value,
) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        let destination = target.to_field();
        if let Err(e) = notifier.notify(target, notification, data).await {
            tracing::warn!("notification delivery to {} failed: {}", destination, e);
        }
    });
}

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// Firebase Cloud Messaging transport.
pub struct FcmNotifier {
    client: reqwest::Client,
    server_key: String,
}

impl FcmNotifier {
    pub fn new(server_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_key,
        }
    }
}

#[async_trait]
impl Notifier for FcmNotifier {
    async fn notify(
        &self,
        target: NotifyTarget,
        notification: Notification,
        data: Value,
    ) -> Result<(), NotifyError> {
        let payload = json!({
            "to": target.to_field(),
            "notification": {
                "title": notification.title,
                "body": notification.body,
            },
            "data": data,
        });

        let response = self
            .client
            .post(FCM_SEND_URL)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        tracing::debug!("push delivered to {}", target.to_field());
        Ok(())
    }
}

/// Used when no FCM credentials are configured and as the default in tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(
        &self,
        target: NotifyTarget,
        notification: Notification,
        _data: Value,
    ) -> Result<(), NotifyError> {
        tracing::debug!(
            "push suppressed (no transport configured): {} -> {}",
            notification.title,
            target.to_field()
        );
        Ok(())
    }
}
