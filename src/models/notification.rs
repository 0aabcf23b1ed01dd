use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{NotificationKind, NotificationPriority};

/// An event emitted by a workflow operation.
///
/// The workflow returns these as explicit output rather than calling a
/// dispatcher itself, so tests can assert on emissions directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub user_id: Uuid,
    /// The record this event is about (analysis, appointment, ...).
    pub related_id: Uuid,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
}

/// An event persisted to a user's inbox by the store-backed dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredNotification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub user_id: Uuid,
    pub related_id: Uuid,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredNotification {
    pub fn from_event(event: &NotificationEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: event.kind,
            user_id: event.user_id,
            related_id: event.related_id,
            priority: event.priority,
            title: event.title.clone(),
            message: event.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
