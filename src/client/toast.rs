use chrono::{DateTime, Duration, Utc};

use crate::config::TOAST_TTL_SECS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub created_at: DateTime<Utc>,
}

/// Transient notifications, oldest first.
#[derive(Debug, Default)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.push_at(message, kind, Utc::now())
    }

    pub fn push_at(&mut self, message: impl Into<String>, kind: ToastKind, now: DateTime<Utc>) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            message: message.into(),
            kind,
            created_at: now,
        });
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Drops toasts older than their lifetime.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = Duration::seconds(TOAST_TTL_SECS);
        self.toasts.retain(|t| now - t.created_at < ttl);
    }

    pub fn active(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_dismissable() {
        let mut queue = ToastQueue::new();
        let a = queue.push("Saved to favorites", ToastKind::Success);
        let b = queue.push("Removed from favorites", ToastKind::Success);
        assert_ne!(a, b);

        queue.dismiss(a);
        assert_eq!(queue.active().len(), 1);
        assert_eq!(queue.last().unwrap().id, b);
    }

    #[test]
    fn toasts_expire() {
        let mut queue = ToastQueue::new();
        let start = Utc::now();
        queue.push_at("old", ToastKind::Info, start);
        queue.push_at("new", ToastKind::Error, start + Duration::seconds(2));

        queue.prune(start + Duration::seconds(3));
        assert_eq!(queue.active().len(), 1);
        assert_eq!(queue.active()[0].message, "new");
    }
}
