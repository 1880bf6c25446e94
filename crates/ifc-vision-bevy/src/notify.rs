//! Notification queue and progress indicator
//!
//! Both are plain resources; whatever draws toasts or a progress bar reads
//! them (or the [`NotificationMessage`]s) each frame.

use bevy::prelude::*;
use ifc_vision_model::{Notification, NotificationSink, Severity};
use std::collections::VecDeque;

/// Label shown while no phase has been reported yet
pub const DEFAULT_PROGRESS_LABEL: &str = "Chargement ...";

/// Emitted once for each notification the controller raises
#[derive(Message, Clone, Debug)]
pub struct NotificationMessage(pub Notification);

/// Most recent notifications, oldest first
#[derive(Resource, Debug)]
pub struct Notifications {
    recent: VecDeque<Notification>,
    /// Raised since the last [`Notifications::drain_new`]
    fresh: Vec<Notification>,
    max_visible: usize,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_capacity(5)
    }
}

impl Notifications {
    pub fn with_capacity(max_visible: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(max_visible),
            fresh: Vec::new(),
            max_visible: max_visible.max(1),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.recent.iter()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.recent.back()
    }

    /// Take notifications raised since the last call
    pub fn drain_new(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.fresh)
    }
}

impl NotificationSink for Notifications {
    fn notify(&mut self, notification: Notification) {
        match notification.severity() {
            Severity::Error => log::warn!("[Notify] {}", notification.message()),
            _ => log::info!("[Notify] {}", notification.message()),
        }
        if self.recent.len() == self.max_visible {
            self.recent.pop_front();
        }
        self.recent.push_back(notification.clone());
        self.fresh.push(notification);
    }
}

/// UI-facing progress state
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct ProgressIndicator {
    pub open: bool,
    /// 0..=100
    pub percent: f32,
    pub label: String,
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self {
            open: false,
            percent: 0.0,
            label: DEFAULT_PROGRESS_LABEL.to_string(),
        }
    }
}

impl ProgressIndicator {
    pub fn open(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    pub fn update(&mut self, phase: &str, percent: f32) {
        self.percent = percent;
        self.label = format!("{} {:.0}%", phase, percent);
    }

    /// Hide and reset the label
    pub fn close(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(i: usize) -> Notification {
        Notification::Failed {
            reason: format!("error {}", i),
        }
    }

    #[test]
    fn test_oldest_notification_is_dropped() {
        let mut notifications = Notifications::with_capacity(5);
        for i in 0..7 {
            notifications.notify(failed(i));
        }
        assert_eq!(notifications.len(), 5);
        assert_eq!(notifications.iter().next(), Some(&failed(2)));
        assert_eq!(notifications.latest(), Some(&failed(6)));
    }

    #[test]
    fn test_drain_new_only_returns_fresh() {
        let mut notifications = Notifications::default();
        notifications.notify(failed(0));
        assert_eq!(notifications.drain_new().len(), 1);
        assert!(notifications.drain_new().is_empty());
        assert_eq!(notifications.len(), 1);
    }

    #[test]
    fn test_progress_close_resets_label() {
        let mut progress = ProgressIndicator::default();
        progress.open();
        progress.update("Scanning entities", 42.0);
        assert!(progress.open);
        assert_eq!(progress.label, "Scanning entities 42%");

        progress.close();
        assert!(!progress.open);
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.label, DEFAULT_PROGRESS_LABEL);
    }
}
