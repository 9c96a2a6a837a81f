use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use shared::domain::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Verb shown while the operation is in flight ("Brand deleting...").
    pub fn progressive(self) -> &'static str {
        match self {
            OperationKind::Create => "creating",
            OperationKind::Update => "updating",
            OperationKind::Delete => "deleting",
        }
    }
}

/// Identity of a toast. A later notification with the same key replaces the
/// earlier one instead of stacking next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub operation: OperationKind,
    pub entity: EntityKind,
}

impl NotificationKey {
    pub fn new(operation: OperationKind, entity: EntityKind) -> Self {
        Self { operation, entity }
    }

    pub fn delete(entity: EntityKind) -> Self {
        Self::new(OperationKind::Delete, entity)
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.operation.as_str(), self.entity.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub key: NotificationKey,
    pub level: NotificationLevel,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn loading(&self, key: NotificationKey, message: &str) {
        self.notify(Notification {
            key,
            level: NotificationLevel::Loading,
            message: message.to_string(),
        });
    }

    fn success(&self, key: NotificationKey, message: &str) {
        self.notify(Notification {
            key,
            level: NotificationLevel::Success,
            message: message.to_string(),
        });
    }

    fn error(&self, key: NotificationKey, message: &str) {
        self.notify(Notification {
            key,
            level: NotificationLevel::Error,
            message: message.to_string(),
        });
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Visible toasts in the order their keys first appeared.
#[derive(Debug, Default)]
pub struct ToastBoard {
    toasts: Mutex<Vec<Notification>>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: NotificationKey) -> Option<Notification> {
        self.lock().iter().find(|t| t.key == key).cloned()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Removes and returns every toast that is no longer loading.
    pub fn take_settled(&self) -> Vec<Notification> {
        let mut toasts = self.lock();
        let (settled, loading): (Vec<_>, Vec<_>) = toasts
            .drain(..)
            .partition(|t| t.level != NotificationLevel::Loading);
        *toasts = loading;
        settled
    }

    pub fn dismiss(&self, key: NotificationKey) {
        self.lock().retain(|t| t.key != key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, notification: Notification) {
        let mut toasts = self.lock();
        match toasts.iter_mut().find(|t| t.key == notification.key) {
            Some(existing) => *existing = notification,
            None => toasts.push(notification),
        }
    }
}
