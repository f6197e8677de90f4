//! Router configuration.
//!
//! Stored as TOML. Missing keys take their defaults; files written by older
//! releases are upgraded field by field.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

use crate::events::HookKind;

/// Version stamped into freshly written configs.
pub const CONFIG_VERSION: &str = "1.3.1";

/// Feature switches and command naming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OverflowConfig {
    /// Release that last wrote this file.
    pub version: String,
    /// Route resource dispenser yields (regular and bonus).
    pub enable_gathered_resources: bool,
    /// Route collectible pickups as batches.
    pub enable_collectibles: bool,
    /// Route dropped items picked up from the ground.
    pub enable_dropped_items: bool,
    /// Route items moved out of foreign containers.
    pub enable_looted_items: bool,
    /// Notify the player after every overflow move.
    pub send_notification: bool,
    /// Chat command that toggles the per-player preference.
    pub toggle_command: String,
}

impl Default for OverflowConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            enable_gathered_resources: true,
            enable_collectibles: true,
            enable_dropped_items: true,
            enable_looted_items: true,
            send_notification: true,
            toggle_command: "overflow".to_string(),
        }
    }
}

/// Parse `major.minor.patch`; missing or malformed parts count as zero.
fn parse_version(version: &str) -> (u32, u32, u32) {
    let mut parts = version
        .trim()
        .split('.')
        .map(|part| part.parse::<u32>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

impl OverflowConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    ///
    /// A file from an older release is upgraded in memory; call
    /// [`OverflowConfig::save_to_path`] to persist the upgrade.
    pub fn load_from_path(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<OverflowConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    OverflowConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Overflow config not found at {}. Using defaults", path.display());
                }
                OverflowConfig::default()
            }
        };
        config.upgrade();
        config
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Bring a config written by an older release up to [`CONFIG_VERSION`].
    ///
    /// Returns true when anything changed.
    pub fn upgrade(&mut self) -> bool {
        let stored = parse_version(&self.version);
        if stored >= parse_version(CONFIG_VERSION) {
            return false;
        }

        warn!("Config changes detected! Updating from {}", self.version);
        let defaults = OverflowConfig::default();

        if stored < (1, 0, 0) {
            *self = defaults;
            return true;
        }
        if stored < (1, 1, 0) {
            self.enable_looted_items = defaults.enable_looted_items;
        }
        if stored < (1, 2, 0) {
            self.send_notification = defaults.send_notification;
        }
        if stored < (1, 3, 0) {
            self.toggle_command = defaults.toggle_command;
        }

        self.version = CONFIG_VERSION.to_string();
        true
    }

    /// Whether routing is switched on for a hook.
    pub fn hook_enabled(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::Gather | HookKind::GatherBonus => self.enable_gathered_resources,
            HookKind::CollectiblePickup => self.enable_collectibles,
            HookKind::ItemPickup => self.enable_dropped_items,
            HookKind::LootMove => self.enable_looted_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config = OverflowConfig::default();
        assert!(config.enable_gathered_resources);
        assert!(config.enable_collectibles);
        assert!(config.enable_dropped_items);
        assert!(config.enable_looted_items);
        assert!(config.send_notification);
        assert_eq!(config.toggle_command, "overflow");
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config: OverflowConfig = toml::from_str(
            r#"
version = "1.3.1"
enable_collectibles = false
"#,
        )
        .unwrap();
        assert!(!config.enable_collectibles);
        assert!(config.enable_dropped_items);
    }

    #[test]
    fn upgrade_fills_fields_added_since_stored_version() {
        let mut config = OverflowConfig {
            version: "1.1.0".to_string(),
            enable_looted_items: false,
            send_notification: false,
            toggle_command: "bp".to_string(),
            ..OverflowConfig::default()
        };

        assert!(config.upgrade());

        assert!(!config.enable_looted_items);
        assert!(config.send_notification);
        assert_eq!(config.toggle_command, "overflow");
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn pre_release_configs_are_reset() {
        let mut config = OverflowConfig {
            version: "0.9.0".to_string(),
            enable_dropped_items: false,
            ..OverflowConfig::default()
        };

        assert!(config.upgrade());
        assert_eq!(config, OverflowConfig::default());
    }

    #[test]
    fn current_config_is_left_alone() {
        let mut config = OverflowConfig {
            enable_collectibles: false,
            ..OverflowConfig::default()
        };
        assert!(!config.upgrade());
        assert!(!config.enable_collectibles);
    }

    #[test]
    fn hooks_follow_their_switch() {
        let config = OverflowConfig {
            enable_gathered_resources: false,
            enable_looted_items: false,
            ..OverflowConfig::default()
        };
        assert!(!config.hook_enabled(HookKind::Gather));
        assert!(!config.hook_enabled(HookKind::GatherBonus));
        assert!(!config.hook_enabled(HookKind::LootMove));
        assert!(config.hook_enabled(HookKind::ItemPickup));
        assert!(config.hook_enabled(HookKind::CollectiblePickup));
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("overflow-config-{}.toml", std::process::id()));
        let config = OverflowConfig {
            send_notification: false,
            ..OverflowConfig::default()
        };

        config.save_to_path(&path).unwrap();
        assert_eq!(OverflowConfig::load_from_path(&path), config);

        let _ = fs::remove_file(&path);
    }
}
