//! Collaborator fakes.

use overflow_core::{ItemId, PlayerId};
use overflow_router::{NotificationSink, NotifyError, PreferenceStore, StoreError};
use std::collections::HashMap;

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    /// Recipient.
    pub player: PlayerId,
    /// Item type moved.
    pub item_id: ItemId,
    /// Units moved.
    pub amount: u32,
}

/// Keeps every notification in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    notices: Vec<Notice>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

impl NotificationSink for RecordingNotifier {
    fn overflow_moved(
        &mut self,
        player: PlayerId,
        item_id: ItemId,
        amount: u32,
    ) -> Result<(), NotifyError> {
        self.notices.push(Notice {
            player,
            item_id,
            amount,
        });
        Ok(())
    }
}

/// Fails every delivery and counts the attempts.
#[derive(Debug, Default, Clone)]
pub struct FailingNotifier {
    /// Number of deliveries attempted.
    pub attempts: u32,
}

impl NotificationSink for FailingNotifier {
    fn overflow_moved(&mut self, player: PlayerId, _: ItemId, _: u32) -> Result<(), NotifyError> {
        self.attempts += 1;
        Err(NotifyError {
            player,
            reason: "client unreachable".to_string(),
        })
    }
}

/// Readable store whose writes always fail.
#[derive(Debug, Default, Clone)]
pub struct ReadOnlyStore {
    values: HashMap<PlayerId, bool>,
}

impl ReadOnlyStore {
    /// Seed the store with fixed values.
    pub fn with_values<I: IntoIterator<Item = (PlayerId, bool)>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl PreferenceStore for ReadOnlyStore {
    fn get(&self, player: PlayerId) -> Option<bool> {
        self.values.get(&player).copied()
    }

    fn set(&mut self, _: PlayerId, _: bool) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only store",
        )))
    }
}
