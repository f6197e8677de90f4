use std::fmt;

use overflow_core::PlayerId;
use overflow_router::{InventorySubstrate, OverflowRouter, PermissionGate, PreferenceStore};

use crate::messages::{ChatNotifier, MessageKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    ToggleOverflow,
}

/// Parse a chat line. Lines that are not commands, or are someone else's
/// commands, yield `Ok(None)`.
pub fn parse_chat(line: &str, toggle_command: &str) -> Result<Option<ChatCommand>, CommandError> {
    let Some(rest) = line.trim().strip_prefix('/') else {
        return Ok(None);
    };
    let mut parts = rest.split_whitespace();
    let Some(name) = parts.next() else {
        return Ok(None);
    };
    if !name.eq_ignore_ascii_case(toggle_command) {
        return Ok(None);
    }
    if let Some(extra) = parts.next() {
        return Err(CommandError::new(format!(
            "/{toggle_command} takes no arguments (got '{extra}')"
        )));
    }
    Ok(Some(ChatCommand::ToggleOverflow))
}

/// Run a chat command and reply to the player through the notifier.
pub fn execute<S, P, G>(
    router: &mut OverflowRouter<S, P, G, ChatNotifier>,
    player: PlayerId,
    command: ChatCommand,
) -> Result<MessageKey, CommandError>
where
    S: InventorySubstrate,
    P: PreferenceStore,
    G: PermissionGate,
{
    let reply = match command {
        ChatCommand::ToggleOverflow => {
            if !router.gate().may_use(player) {
                MessageKey::NoPermission
            } else {
                let enabled = router
                    .toggle_overflow(player)
                    .map_err(|err| CommandError::new(err.to_string()))?;
                if enabled {
                    MessageKey::ToggleOn
                } else {
                    MessageKey::ToggleOff
                }
            }
        }
    };

    let text = router.notifier().messages().render(reply, &[]);
    router.notifier_mut().send(player, text);
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Messages;
    use overflow_router::{MemoryPreferenceStore, OverflowConfig, Permissions, SandboxInventory};

    type ChatRouter =
        OverflowRouter<SandboxInventory, MemoryPreferenceStore, Permissions, ChatNotifier>;

    fn router(permissions: Permissions) -> ChatRouter {
        OverflowRouter::new(
            SandboxInventory::new(),
            MemoryPreferenceStore::new(),
            permissions,
            ChatNotifier::new(Messages::english(), Default::default()),
            OverflowConfig::default(),
        )
    }

    #[test]
    fn parses_only_the_configured_command() {
        assert_eq!(
            parse_chat("/overflow", "overflow"),
            Ok(Some(ChatCommand::ToggleOverflow))
        );
        assert_eq!(
            parse_chat("  /Overflow ", "overflow"),
            Ok(Some(ChatCommand::ToggleOverflow))
        );
        assert_eq!(parse_chat("/bp", "overflow"), Ok(None));
        assert_eq!(parse_chat("overflow", "overflow"), Ok(None));
        assert!(parse_chat("/overflow now", "overflow").is_err());
    }

    #[test]
    fn toggle_reports_new_state() {
        let mut router = router(Permissions::allow_all());
        let player = PlayerId(3);

        assert!(router.overflow_enabled(player));
        assert_eq!(
            execute(&mut router, player, ChatCommand::ToggleOverflow),
            Ok(MessageKey::ToggleOff)
        );
        assert_eq!(
            execute(&mut router, player, ChatCommand::ToggleOverflow),
            Ok(MessageKey::ToggleOn)
        );
        assert_eq!(
            router.notifier().outbox()[0].1,
            "Overflow to backpack is now disabled."
        );
    }

    #[test]
    fn toggle_requires_permission() {
        let mut router = router(Permissions::none());
        let player = PlayerId(3);

        assert_eq!(
            execute(&mut router, player, ChatCommand::ToggleOverflow),
            Ok(MessageKey::NoPermission)
        );
        assert!(router.overflow_enabled(player));
    }
}
