use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Discrete user-facing event emitted by the wizard. Presentation is the
/// caller's concern; only this shape is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub summary: String,
    pub detail: String,
}

impl Notification {
    pub fn success(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default sink: structured log lines.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!(summary = %notification.summary, detail = %notification.detail, "notification")
            }
            NotificationKind::Error => {
                tracing::error!(summary = %notification.summary, detail = %notification.detail, "notification")
            }
        }
    }
}
