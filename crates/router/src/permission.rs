//! In-memory permission gate.

use crate::substrate::PermissionGate;
use overflow_core::PlayerId;
use std::collections::HashSet;

/// Permission node checked before any routing attempt.
pub const USE_PERMISSION: &str = "overflowtobackpack.use";

/// Grant list for [`USE_PERMISSION`].
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    everyone: bool,
    granted: HashSet<PlayerId>,
}

impl Permissions {
    /// Nobody holds the permission.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every player holds the permission.
    pub fn allow_all() -> Self {
        Self {
            everyone: true,
            granted: HashSet::new(),
        }
    }

    /// Grant the permission to one player.
    pub fn grant(&mut self, player: PlayerId) {
        self.granted.insert(player);
    }

    /// Revoke an individual grant. Has no effect under [`Permissions::allow_all`].
    pub fn revoke(&mut self, player: PlayerId) {
        self.granted.remove(&player);
    }
}

impl PermissionGate for Permissions {
    fn may_use(&self, player: PlayerId) -> bool {
        self.everyone || self.granted.contains(&player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_are_per_player() {
        let mut perms = Permissions::none();
        perms.grant(PlayerId(1));

        assert!(perms.may_use(PlayerId(1)));
        assert!(!perms.may_use(PlayerId(2)));

        perms.revoke(PlayerId(1));
        assert!(!perms.may_use(PlayerId(1)));
    }

    #[test]
    fn allow_all_ignores_revocation() {
        let mut perms = Permissions::allow_all();
        perms.revoke(PlayerId(9));
        assert!(perms.may_use(PlayerId(9)));
    }
}
