//! Deterministic scenario runner.
//!
//! A scenario declares players with their containers, optional item names
//! for chat output, and a list of `{tick, player, action}` steps executed in
//! file order. Between steps the router's scheduler is advanced so deferred
//! bonus moves land exactly as they would on a live server.

use anyhow::{Context, Result};
use overflow_core::{ItemId, ItemStack, PlayerId, SimTick};
use overflow_router::{
    BatchSource, HookResponse, ItemLocation, OverflowConfig, OverflowEvent, OverflowRouter,
    Permissions, PlayerInventory, PreferenceStore, RouteOutcome, SandboxInventory, SourceId,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    fs,
    path::Path,
};
use tracing::debug;

use crate::commands;
use crate::messages::{ChatNotifier, MessageKey, Messages};

/// Router wiring used by the scenario runner.
pub type ScenarioRouter<P> = OverflowRouter<SandboxInventory, P, Permissions, ChatNotifier>;

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    items: Vec<ItemName>,
    players: Vec<PlayerDef>,
    steps: Vec<ScenarioStep>,
}

#[derive(Debug, Deserialize)]
struct ItemName {
    id: ItemId,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PlayerDef {
    id: PlayerId,
    #[serde(default = "default_permitted")]
    permitted: bool,
    #[serde(default)]
    inventory: PlayerInventory,
}

fn default_permitted() -> bool {
    true
}

fn default_loot_location() -> ItemLocation {
    ItemLocation::Foreign
}

#[derive(Debug, Clone, Deserialize)]
struct ScenarioStep {
    tick: u64,
    player: PlayerId,
    #[serde(flatten)]
    action: Action,
}

/// One engine-side happening.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Action {
    Pickup {
        item: ItemStack,
    },
    Loot {
        item: ItemStack,
        #[serde(default = "default_loot_location")]
        from: ItemLocation,
    },
    Gather {
        item: ItemStack,
    },
    Bonus {
        item: ItemStack,
    },
    Collectible {
        source: u64,
        yields: Vec<ItemStack>,
    },
    Chat {
        text: String,
    },
    Disconnect,
    RemoveBackpack,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Pickup { .. } => "pickup",
            Action::Loot { .. } => "loot",
            Action::Gather { .. } => "gather",
            Action::Bonus { .. } => "bonus",
            Action::Collectible { .. } => "collectible",
            Action::Chat { .. } => "chat",
            Action::Disconnect => "disconnect",
            Action::RemoveBackpack => "remove_backpack",
        }
    }
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    /// Response handed back to the engine hook.
    Hook(HookResponse),
    /// A deferred move ran on this tick.
    Deferred(RouteOutcome),
    /// A chat command was answered.
    Reply(MessageKey),
    /// A chat command was malformed.
    Rejected(String),
    /// Nothing for the router to do.
    Ignored,
}

/// One line of the scenario report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// Tick the result was produced on.
    pub tick: SimTick,
    /// Player the step concerned; `None` for deferred moves.
    pub player: Option<PlayerId>,
    /// Action name as written in the scenario.
    pub action: &'static str,
    /// Result.
    pub result: StepResult,
}

/// A parsed scenario, ready to run.
#[derive(Debug)]
pub struct Scenario {
    item_names: HashMap<ItemId, String>,
    players: Vec<PlayerDef>,
    pending: VecDeque<ScenarioStep>,
}

impl Scenario {
    /// Load a scenario from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_str(&contents)
    }

    /// Load a scenario from an in-memory JSON string.
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: ScenarioFile = serde_json::from_str(contents)?;
        if file.players.is_empty() {
            anyhow::bail!("scenario declares no players");
        }
        if file.steps.is_empty() {
            anyhow::bail!("scenario contains no steps");
        }

        let known: HashSet<PlayerId> = file.players.iter().map(|player| player.id).collect();
        if known.len() != file.players.len() {
            anyhow::bail!("scenario declares the same player twice");
        }

        let mut last_tick: Option<u64> = None;
        for step in &file.steps {
            if let Some(prev) = last_tick {
                if step.tick < prev {
                    anyhow::bail!("scenario steps must be sorted by tick");
                }
            }
            last_tick = Some(step.tick);

            if !known.contains(&step.player) {
                anyhow::bail!("step at tick {} names undeclared player {}", step.tick, step.player);
            }
        }

        Ok(Self {
            item_names: file
                .items
                .into_iter()
                .map(|item| (item.id, item.name))
                .collect(),
            players: file.players,
            pending: file.steps.into(),
        })
    }

    /// Permission grants declared by the scenario.
    pub fn permissions(&self) -> Permissions {
        let mut permissions = Permissions::none();
        for player in self.players.iter().filter(|player| player.permitted) {
            permissions.grant(player.id);
        }
        permissions
    }

    /// Wire a router to a fresh sandbox holding the scenario's players.
    pub fn build_router<P: PreferenceStore>(
        &self,
        store: P,
        config: OverflowConfig,
    ) -> ScenarioRouter<P> {
        let mut sandbox = SandboxInventory::new();
        for player in &self.players {
            sandbox.add_player(player.id, player.inventory.clone());
        }
        let notifier = ChatNotifier::new(Messages::english(), self.item_names.clone());
        OverflowRouter::new(sandbox, store, self.permissions(), notifier, config)
    }

    /// Run every step, then one extra tick so trailing deferred moves land.
    pub fn run<P: PreferenceStore>(mut self, router: &mut ScenarioRouter<P>) -> Vec<StepRecord> {
        let mut records = Vec::new();
        while let Some(step) = self.pending.pop_front() {
            while router.tasks().now() < SimTick(step.tick) {
                advance(router, &mut records);
            }

            let action = step.action.name();
            let result = match step.action {
                Action::Chat { text } => chat(router, step.player, &text),
                Action::Disconnect => {
                    router.substrate_mut().disconnect(step.player);
                    StepResult::Ignored
                }
                Action::RemoveBackpack => {
                    router.substrate_mut().remove_backpack(step.player);
                    StepResult::Ignored
                }
                Action::Collectible { source, yields } => {
                    let event = OverflowEvent::CollectiblePickup {
                        player: step.player,
                        source: BatchSource {
                            id: SourceId(source),
                            yields,
                        },
                    };
                    StepResult::Hook(router.handle(&event))
                }
                Action::Pickup { item } => {
                    let item = router.substrate_mut().spawn_item(item, ItemLocation::World);
                    StepResult::Hook(router.handle(&OverflowEvent::ItemPickup {
                        player: step.player,
                        item,
                    }))
                }
                Action::Loot { item, from } => {
                    let item = router.substrate_mut().spawn_item(item, from);
                    StepResult::Hook(router.handle(&OverflowEvent::LootMove {
                        player: step.player,
                        item,
                    }))
                }
                Action::Gather { item } => {
                    let item = router.substrate_mut().spawn_item(item, ItemLocation::World);
                    StepResult::Hook(router.handle(&OverflowEvent::Gather {
                        player: step.player,
                        item,
                    }))
                }
                Action::Bonus { item } => {
                    let item = router.substrate_mut().spawn_item(item, ItemLocation::World);
                    StepResult::Hook(router.handle(&OverflowEvent::GatherBonus {
                        player: step.player,
                        item,
                    }))
                }
            };
            debug!(tick = step.tick, player = %step.player, action, ?result, "scenario step");
            records.push(StepRecord {
                tick: router.tasks().now(),
                player: Some(step.player),
                action,
                result,
            });
        }

        advance(router, &mut records);
        records
    }
}

fn advance<P: PreferenceStore>(router: &mut ScenarioRouter<P>, records: &mut Vec<StepRecord>) {
    let outcomes = router.tick();
    let now = router.tasks().now();
    records.extend(outcomes.into_iter().map(|outcome| StepRecord {
        tick: now,
        player: None,
        action: "deferred",
        result: StepResult::Deferred(outcome),
    }));
}

fn chat<P: PreferenceStore>(
    router: &mut ScenarioRouter<P>,
    player: PlayerId,
    text: &str,
) -> StepResult {
    let toggle = router.config().toggle_command.clone();
    match commands::parse_chat(text, &toggle) {
        Ok(Some(command)) => match commands::execute(router, player, command) {
            Ok(reply) => StepResult::Reply(reply),
            Err(err) => StepResult::Rejected(err.to_string()),
        },
        Ok(None) => StepResult::Ignored,
        Err(err) => StepResult::Rejected(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overflow_router::{InventorySubstrate, MemoryPreferenceStore};

    const FULL_PLAYER: &str = r#"{
        "id": 7,
        "inventory": {
            "main": {"capacity": 1, "entries": [{"item_id": 1, "count": 10, "max_stack_size": 10}]},
            "belt": {"capacity": 1, "entries": [{"item_id": 2, "count": 1, "max_stack_size": 1}]},
            "backpack": {"capacity": 4}
        }
    }"#;

    fn scenario(steps: &str) -> Result<Scenario> {
        Scenario::from_str(&format!(
            r#"{{
                "items": [{{"id": 3, "name": "Stones"}}],
                "players": [{FULL_PLAYER}],
                "steps": {steps}
            }}"#
        ))
    }

    fn run(scenario: Scenario) -> (Vec<StepRecord>, ScenarioRouter<MemoryPreferenceStore>) {
        let mut router = scenario.build_router(MemoryPreferenceStore::new(), OverflowConfig::default());
        let records = scenario.run(&mut router);
        (records, router)
    }

    #[test]
    fn scenario_rejects_unsorted_ticks() {
        let err = scenario(
            r#"[
                {"tick": 2, "player": 7, "action": "disconnect"},
                {"tick": 1, "player": 7, "action": "disconnect"}
            ]"#,
        )
        .unwrap_err();
        assert!(
            err.to_string().contains("sorted by tick"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn scenario_rejects_undeclared_players() {
        let err = scenario(r#"[{"tick": 0, "player": 8, "action": "disconnect"}]"#).unwrap_err();
        assert!(err.to_string().contains("undeclared player 8"));
    }

    #[test]
    fn pickup_into_full_inventory_lands_in_backpack() {
        let scenario = scenario(
            r#"[{"tick": 0, "player": 7, "action": "pickup",
                 "item": {"item_id": 3, "count": 50, "max_stack_size": 100}}]"#,
        )
        .unwrap();

        let (records, router) = run(scenario);

        assert_eq!(records[0].result, StepResult::Hook(HookResponse::Handled));
        assert_eq!(
            router
                .substrate()
                .backpack(PlayerId(7))
                .unwrap()
                .count_item(ItemId(3)),
            50
        );
        assert_eq!(
            router.notifier().outbox()[0].1,
            "Your inventory is full! 50 Stones has been moved to your backpack."
        );
    }

    #[test]
    fn bonus_is_reported_on_the_following_tick() {
        let scenario = scenario(
            r#"[{"tick": 4, "player": 7, "action": "bonus",
                 "item": {"item_id": 3, "count": 2, "max_stack_size": 100}}]"#,
        )
        .unwrap();

        let (records, _) = run(scenario);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, SimTick(4));
        assert_eq!(records[0].result, StepResult::Hook(HookResponse::Continue));
        assert_eq!(
            records[1],
            StepRecord {
                tick: SimTick(5),
                player: None,
                action: "deferred",
                result: StepResult::Deferred(RouteOutcome::Overflowed { moved: 2 }),
            }
        );
    }

    #[test]
    fn toggle_command_disables_routing() {
        let scenario = scenario(
            r#"[
                {"tick": 0, "player": 7, "action": "chat", "text": "/overflow"},
                {"tick": 1, "player": 7, "action": "pickup",
                 "item": {"item_id": 3, "count": 5, "max_stack_size": 100}},
                {"tick": 1, "player": 7, "action": "chat", "text": "hello"}
            ]"#,
        )
        .unwrap();

        let (records, router) = run(scenario);

        assert_eq!(records[0].result, StepResult::Reply(MessageKey::ToggleOff));
        assert_eq!(records[1].result, StepResult::Hook(HookResponse::Continue));
        assert_eq!(records[2].result, StepResult::Ignored);
        assert!(router.substrate().backpack(PlayerId(7)).unwrap().is_empty());
    }

    #[test]
    fn unpermitted_players_are_left_alone() {
        let scenario = Scenario::from_str(
            r#"{
                "players": [{"id": 9, "permitted": false, "inventory": {
                    "main": {"capacity": 0}, "belt": {"capacity": 0}, "backpack": {"capacity": 2}
                }}],
                "steps": [{"tick": 0, "player": 9, "action": "pickup",
                           "item": {"item_id": 1, "count": 1, "max_stack_size": 5}}]
            }"#,
        )
        .unwrap();

        let (records, _) = run(scenario);

        assert_eq!(records[0].result, StepResult::Hook(HookResponse::Continue));
    }
}
