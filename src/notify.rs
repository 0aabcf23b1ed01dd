//! Notification dispatch boundary and the persisted inbox.
//!
//! The workflow never calls a dispatcher itself — it returns emitted events,
//! and the orchestration layer forwards them here. `emit` is fire-and-forget:
//! delivery failures stay inside the dispatcher.

use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::db::{self, Collection, Storage};
use crate::models::{NotificationEvent, StoredNotification};
use crate::pipeline::error::WorkflowError;

pub trait NotificationDispatcher: Send + Sync {
    /// Deliver one event. Must not fail the caller.
    fn emit(&self, event: &NotificationEvent);
}

/// Persists events to the `notifications` collection as unread inbox items.
pub struct StoreDispatcher {
    store: Arc<dyn Storage>,
}

impl StoreDispatcher {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }
}

impl NotificationDispatcher for StoreDispatcher {
    fn emit(&self, event: &NotificationEvent) {
        let result = (|| -> Result<(), WorkflowError> {
            let mut inbox: Vec<StoredNotification> =
                db::load_all(self.store.as_ref(), Collection::Notifications)?;
            inbox.push(StoredNotification::from_event(event));
            db::store_all(self.store.as_ref(), Collection::Notifications, &inbox)?;
            Ok(())
        })();

        match result {
            Ok(()) => tracing::debug!(kind = %event.kind, user = %event.user_id, "notification stored"),
            Err(e) => tracing::warn!(kind = %event.kind, error = %e, "failed to persist notification"),
        }
    }
}

/// Gathers events in memory. Test double for asserting on emissions.
#[derive(Default)]
pub struct CollectingDispatcher {
    events: Mutex<Vec<NotificationEvent>>,
}

impl CollectingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationDispatcher for CollectingDispatcher {
    fn emit(&self, event: &NotificationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Inbox queries
// ---------------------------------------------------------------------------

/// A user's notifications, newest first.
pub fn notifications_for_user(
    store: &dyn Storage,
    user_id: Uuid,
    unread_only: bool,
) -> Result<Vec<StoredNotification>, WorkflowError> {
    let mut inbox: Vec<StoredNotification> =
        db::load_all::<StoredNotification>(store, Collection::Notifications)?
            .into_iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .collect();
    inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(inbox)
}

pub fn unread_count(store: &dyn Storage, user_id: Uuid) -> Result<usize, WorkflowError> {
    Ok(notifications_for_user(store, user_id, true)?.len())
}

/// Mark one notification read. Returns false when the id is unknown —
/// marking an already-consumed inbox entry is not worth an error.
pub fn mark_read(store: &dyn Storage, notification_id: Uuid) -> Result<bool, WorkflowError> {
    let mut inbox: Vec<StoredNotification> = db::load_all(store, Collection::Notifications)?;
    match inbox.iter_mut().find(|n| n.id == notification_id) {
        Some(notification) => {
            notification.is_read = true;
            db::store_all(store, Collection::Notifications, &inbox)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Mark all of a user's notifications read. Returns how many changed.
pub fn mark_all_read(store: &dyn Storage, user_id: Uuid) -> Result<usize, WorkflowError> {
    let mut inbox: Vec<StoredNotification> = db::load_all(store, Collection::Notifications)?;
    let mut changed = 0;
    for notification in inbox.iter_mut() {
        if notification.user_id == user_id && !notification.is_read {
            notification.is_read = true;
            changed += 1;
        }
    }
    if changed > 0 {
        db::store_all(store, Collection::Notifications, &inbox)?;
    }
    Ok(changed)
}
