use async_trait::async_trait;
use gatepass::services::{Notification, Notifier, NotifyError, NotifyTarget};
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct SentPush {
    pub target: NotifyTarget,
    pub title: String,
    pub body: String,
    pub data: Value,
}

/// Captures every push instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentPush>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        target: NotifyTarget,
        notification: Notification,
        data: Value,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentPush {
            target,
            title: notification.title,
            body: notification.body,
            data,
        });
        Ok(())
    }
}

/// Rejects every push, for asserting that delivery failures stay non-fatal.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(
        &self,
        _target: NotifyTarget,
        _notification: Notification,
        _data: Value,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected(500))
    }
}

/// Dispatch is fire-and-forget, so poll until the expected number of pushes
/// has landed.
pub async fn wait_for_pushes(recorder: &Arc<RecordingNotifier>, expected: usize) -> Vec<SentPush> {
    for _ in 0..200 {
        let sent = recorder.sent();
        if sent.len() >= expected {
            return sent;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} pushes, got {}",
        expected,
        recorder.sent().len()
    );
}

/// Lets spawned dispatch tasks run, then returns whatever was captured.
pub async fn settled_pushes(recorder: &Arc<RecordingNotifier>) -> Vec<SentPush> {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    recorder.sent()
}
