//! Player-facing message catalog and the chat notification sink.

use overflow_core::{ItemId, PlayerId};
use overflow_router::{NotificationSink, NotifyError};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::info;

/// Keys of every message the plugin sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageKey {
    NoPermission,
    BackpackReceived,
    ToggleOn,
    ToggleOff,
}

/// Message templates with positional `{0}`, `{1}` placeholders.
#[derive(Debug, Clone)]
pub struct Messages {
    templates: HashMap<MessageKey, String>,
}

impl Messages {
    /// Default English catalog.
    pub fn english() -> Self {
        let templates = [
            (
                MessageKey::NoPermission,
                "You do not have permission to use this command.",
            ),
            (
                MessageKey::BackpackReceived,
                "Your inventory is full! {0} {1} has been moved to your backpack.",
            ),
            (
                MessageKey::ToggleOn,
                "Overflow to backpack is now enabled.",
            ),
            (
                MessageKey::ToggleOff,
                "Overflow to backpack is now disabled.",
            ),
        ]
        .into_iter()
        .map(|(key, text)| (key, text.to_string()))
        .collect();
        Self { templates }
    }

    /// Render `key` with positional arguments.
    pub fn render(&self, key: MessageKey, args: &[&dyn Display]) -> String {
        let mut message = self
            .templates
            .get(&key)
            .cloned()
            .unwrap_or_else(|| format!("{key:?}"));
        for (index, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{index}}}"), &arg.to_string());
        }
        message
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::english()
    }
}

/// Collects rendered chat lines instead of sending them to a client.
#[derive(Debug, Default)]
pub struct ChatNotifier {
    messages: Messages,
    item_names: HashMap<ItemId, String>,
    outbox: Vec<(PlayerId, String)>,
}

impl ChatNotifier {
    pub fn new(messages: Messages, item_names: HashMap<ItemId, String>) -> Self {
        Self {
            messages,
            item_names,
            outbox: Vec::new(),
        }
    }

    /// Queue a chat line for `player`.
    pub fn send(&mut self, player: PlayerId, message: String) {
        info!(%player, "{message}");
        self.outbox.push((player, message));
    }

    /// Lines queued so far.
    pub fn outbox(&self) -> &[(PlayerId, String)] {
        &self.outbox
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }
}

impl NotificationSink for ChatNotifier {
    fn overflow_moved(
        &mut self,
        player: PlayerId,
        item_id: ItemId,
        amount: u32,
    ) -> Result<(), NotifyError> {
        let name = self
            .item_names
            .get(&item_id)
            .cloned()
            .unwrap_or_else(|| item_id.to_string());
        let message = self
            .messages
            .render(MessageKey::BackpackReceived, &[&amount, &name]);
        self.send(player, message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_positional_arguments() {
        let messages = Messages::english();
        assert_eq!(
            messages.render(MessageKey::BackpackReceived, &[&50, &"Metal Ore"]),
            "Your inventory is full! 50 Metal Ore has been moved to your backpack."
        );
    }

    #[test]
    fn notifier_uses_item_names() {
        let names = HashMap::from([(ItemId(5), "Stones".to_string())]);
        let mut notifier = ChatNotifier::new(Messages::english(), names);

        notifier.overflow_moved(PlayerId(1), ItemId(5), 30).unwrap();
        notifier.overflow_moved(PlayerId(1), ItemId(6), 2).unwrap();

        assert_eq!(notifier.outbox().len(), 2);
        assert!(notifier.outbox()[0].1.contains("30 Stones"));
        assert!(notifier.outbox()[1].1.contains("2 item#6"));
    }
}
