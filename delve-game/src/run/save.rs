//! The versioned save payload and its conversion to and from a live run.
//!
//! Everything is copied out by value: the overlay and pending rewards carry
//! ids, build choices are stored as ids and looked up again on load, and
//! buffs and poisons store turns remaining rather than absolute expiry.

use std::collections::{BTreeMap, BTreeSet};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeSet;
use crate::combat::{Combat, CombatLuckState};
use crate::constants::SAVE_VERSION;
use crate::creature::{Creature, TurnEffect};
use crate::item::{Chest, Container, EntityId, IdAllocator, Item, ItemKind, WieldSlot};
use crate::loot::ShopEntry;
use crate::narration::{EnglishNarrator, LogEntry, Narrator, RunLog};
use crate::population::{FloorChest, Mob, ShopClutter};
use crate::procgen::NameGenerator;
use crate::progression::{
    ActiveBuild, BuildChoice, BuildChoiceKind, PendingBossRewards, ShopRewardChoice,
    find_build_choice,
};
use crate::rng::SeededRandom;
use crate::save::SaveError;
use crate::world::{Position, Room, Tile, WorldMap};

use super::{DungeonRun, Overlay, RunState, RunStats};

/// A buff or poison with its expiry stored relative to the owner's turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTimedEffect {
    pub item: Item,
    pub turns_remaining: i32,
}

/// Wielded items keyed by slot name; empty slots are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedWieldpoints {
    pub head: Option<Item>,
    pub chest: Option<Item>,
    pub arms: Option<Item>,
    pub hands: Option<Item>,
    pub legs: Option<Item>,
    pub feet: Option<Item>,
}

impl SavedWieldpoints {
    fn slot_mut(&mut self, slot: WieldSlot) -> &mut Option<Item> {
        match slot {
            WieldSlot::Head => &mut self.head,
            WieldSlot::Chest => &mut self.chest,
            WieldSlot::Arms => &mut self.arms,
            WieldSlot::Hands => &mut self.hands,
            WieldSlot::Legs => &mut self.legs,
            WieldSlot::Feet => &mut self.feet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCreature {
    pub name: String,
    pub position: Position,
    pub attributes: AttributeSet,
    pub alive: bool,
    pub hitpoints: i32,
    pub max_hitpoints: i32,
    pub xp: i32,
    pub next_level_xp: i32,
    pub level: i32,
    pub turn: i32,
    pub gold: i32,
    pub defense_base: i32,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
    pub mob: bool,
    pub in_battle: bool,
    pub damage_dealt_multiplier: f64,
    pub damage_taken_multiplier: f64,
    pub hitpoint_cap_multiplier: f64,
    pub unspent_stat_points: i32,
    pub inventory_capacity: usize,
    pub inventory: Vec<Item>,
    pub wieldpoints: SavedWieldpoints,
    pub buffs: Vec<SavedTimedEffect>,
    pub poisons: Vec<SavedTimedEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMob {
    pub id: EntityId,
    pub room_id: u32,
    pub is_boss: bool,
    #[serde(default)]
    pub pursuit_turns: i32,
    pub creature: SavedCreature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedChestContents {
    pub x: i32,
    pub y: i32,
    pub capacity: usize,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChest {
    pub id: EntityId,
    pub room_id: u32,
    pub chest: SavedChestContents,
}

/// Tiles and explored flags as standard base64, one byte per tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorld {
    pub width: i32,
    pub height: i32,
    pub rooms: Vec<Room>,
    pub cells_base64: String,
    pub explored_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBossRewards {
    pub perk_ids: Vec<String>,
    pub gambit_ids: Vec<String>,
}

/// Version 1 save payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSave {
    pub version: u32,
    pub seed_phrase: String,
    pub seed_number: u32,
    pub rng_state: u32,
    pub next_entity_id: u64,
    pub next_item_id: u64,
    pub floor: i32,
    pub state: RunState,
    pub stats: RunStats,
    pub logs: Vec<LogEntry>,
    pub overlay: Overlay,
    pub world: SavedWorld,
    pub player: SavedCreature,
    pub mobs: Vec<SavedMob>,
    pub chests: Vec<SavedChest>,
    pub current_room_id: Option<u32>,
    pub ai_accum_ms: f64,
    pub shop_stock: Vec<ShopEntry>,
    pub shop_clutter: Vec<ShopClutter>,
    pub room_threat_by_id: Vec<(u32, i32)>,
    pub warned_danger_rooms: Vec<u32>,
    pub danger_protection_armed_rooms: Vec<u32>,
    pub active_perk_ids: Vec<String>,
    pub active_gambit_ids: Vec<String>,
    pub pending_boss_rewards: Option<SavedBossRewards>,
    pub pending_shop_rewards: Option<Vec<ShopRewardChoice>>,
    pub shop_reward_claimed_floors: Vec<i32>,
    #[serde(default)]
    pub combat_luck: CombatLuckState,
    #[serde(default)]
    pub used_names: Vec<String>,
}

fn save_creature(creature: &Creature) -> SavedCreature {
    let mut wieldpoints = SavedWieldpoints::default();
    for (slot, item) in creature.wielded_items() {
        *wieldpoints.slot_mut(slot) = Some(item.clone());
    }
    SavedCreature {
        name: creature.name.clone(),
        position: creature.position,
        attributes: creature.attributes,
        alive: creature.alive,
        hitpoints: creature.hitpoints,
        max_hitpoints: creature.max_hitpoints,
        xp: creature.xp,
        next_level_xp: creature.next_level_xp,
        level: creature.level,
        turn: creature.turn,
        gold: creature.gold,
        defense_base: creature.defense_base,
        attack_bonus: creature.attack_bonus,
        defense_bonus: creature.defense_bonus,
        mob: creature.mob,
        in_battle: creature.in_battle,
        damage_dealt_multiplier: creature.damage_dealt_multiplier,
        damage_taken_multiplier: creature.damage_taken_multiplier,
        hitpoint_cap_multiplier: creature.hitpoint_cap_multiplier,
        unspent_stat_points: creature.unspent_stat_points,
        inventory_capacity: creature.inventory.capacity(),
        inventory: creature.inventory.items().to_vec(),
        wieldpoints,
        buffs: creature
            .buffs
            .iter()
            .map(|buff| SavedTimedEffect {
                turns_remaining: buff.turns_remaining(creature.turn),
                item: buff.clone().into_item(),
            })
            .collect(),
        poisons: creature
            .poisons
            .iter()
            .map(|poison| SavedTimedEffect {
                turns_remaining: poison.turns_remaining(creature.turn),
                item: poison.clone().into_item(),
            })
            .collect(),
    }
}

fn restore_effect<S>(
    saved: SavedTimedEffect,
    turn: i32,
    stats_of: impl Fn(&ItemKind) -> Option<S>,
) -> Result<TurnEffect<S>, SaveError> {
    let stats = stats_of(&saved.item.kind).ok_or_else(|| {
        SaveError::InvalidPayload(format!("item {} is not a timed effect", saved.item.id))
    })?;
    Ok(TurnEffect {
        id: saved.item.id,
        name: saved.item.name,
        value: saved.item.value,
        stats,
        expiry_turn: turn + saved.turns_remaining.max(0),
    })
}

fn restore_container(
    capacity: usize,
    items: Vec<Item>,
    container: &str,
) -> Result<Container, SaveError> {
    let mut restored = Container::new(capacity);
    for item in items {
        restored
            .add(item)
            .map_err(|item| SaveError::ContainerOverflow {
                container: format!("{container} item {}", item.id),
            })?;
    }
    Ok(restored)
}

fn restore_creature(saved: SavedCreature) -> Result<Creature, SaveError> {
    let mut creature = Creature::new(saved.name, saved.position, saved.attributes);
    creature.alive = saved.alive;
    creature.hitpoints = saved.hitpoints;
    creature.max_hitpoints = saved.max_hitpoints;
    creature.xp = saved.xp;
    creature.next_level_xp = saved.next_level_xp;
    creature.level = saved.level;
    creature.turn = saved.turn;
    creature.gold = saved.gold;
    creature.defense_base = saved.defense_base;
    creature.mob = saved.mob;
    creature.in_battle = saved.in_battle;
    creature.damage_dealt_multiplier = saved.damage_dealt_multiplier;
    creature.damage_taken_multiplier = saved.damage_taken_multiplier;
    creature.hitpoint_cap_multiplier = saved.hitpoint_cap_multiplier;
    creature.unspent_stat_points = saved.unspent_stat_points;
    creature.inventory =
        restore_container(saved.inventory_capacity, saved.inventory, "inventory")?;

    let mut wieldpoints = saved.wieldpoints;
    for slot in WieldSlot::ALL {
        let Some(item) = wieldpoints.slot_mut(slot).take() else {
            continue;
        };
        if !item.is_wieldable() {
            return Err(SaveError::InvalidPayload(format!(
                "item {} cannot be wielded at {slot}",
                item.id
            )));
        }
        creature.wield(slot, Some(item));
    }
    // Wielding adjusts the bonuses; the saved totals already include them.
    creature.attack_bonus = saved.attack_bonus;
    creature.defense_bonus = saved.defense_bonus;

    let turn = creature.turn;
    creature.buffs = saved
        .buffs
        .into_iter()
        .map(|entry| {
            restore_effect(entry, turn, |kind| match kind {
                ItemKind::Buff(stats) => Some(*stats),
                _ => None,
            })
        })
        .collect::<Result<_, _>>()?;
    creature.poisons = saved
        .poisons
        .into_iter()
        .map(|entry| {
            restore_effect(entry, turn, |kind| match kind {
                ItemKind::Poison(stats) => Some(*stats),
                _ => None,
            })
        })
        .collect::<Result<_, _>>()?;

    creature.enforce_hitpoint_cap();
    Ok(creature)
}

fn save_world(world: &WorldMap) -> SavedWorld {
    let cells: Vec<u8> = world.cells().iter().map(|tile| tile.as_byte()).collect();
    let explored: Vec<u8> = world.explored().iter().map(|seen| u8::from(*seen)).collect();
    SavedWorld {
        width: world.width(),
        height: world.height(),
        rooms: world.rooms().to_vec(),
        cells_base64: STANDARD.encode(cells),
        explored_base64: STANDARD.encode(explored),
    }
}

fn restore_world(saved: SavedWorld) -> Result<WorldMap, SaveError> {
    let cells = STANDARD
        .decode(saved.cells_base64.as_bytes())
        .map_err(|_| SaveError::MalformedWorld)?;
    let explored = STANDARD
        .decode(saved.explored_base64.as_bytes())
        .map_err(|_| SaveError::MalformedWorld)?;
    if cells.len() != explored.len() {
        return Err(SaveError::MalformedWorld);
    }
    let tiles = cells
        .into_iter()
        .map(Tile::from_byte)
        .collect::<Option<Vec<Tile>>>()
        .ok_or(SaveError::MalformedWorld)?;
    let mut world = WorldMap::from_parts(saved.width, saved.height, saved.rooms, tiles)
        .ok_or(SaveError::MalformedWorld)?;
    if !world.restore_explored(explored.into_iter().map(|byte| byte != 0).collect()) {
        return Err(SaveError::MalformedWorld);
    }
    Ok(world)
}

fn lookup_choices(ids: &[String]) -> Result<Vec<&'static BuildChoice>, SaveError> {
    ids.iter()
        .map(|id| find_build_choice(id).map_err(SaveError::from))
        .collect()
}

impl DungeonRun {
    /// Snapshot the whole run as a save payload.
    #[must_use]
    pub fn to_save(&self) -> RunSave {
        RunSave {
            version: SAVE_VERSION,
            seed_phrase: self.seed_phrase.clone(),
            seed_number: self.seed_number,
            rng_state: self.rng.state(),
            next_entity_id: self.ids.next_entity_id(),
            next_item_id: self.ids.next_item_id(),
            floor: self.floor,
            state: self.state,
            stats: self.stats,
            logs: self.logs.to_vec(),
            overlay: self.overlay,
            world: save_world(&self.world),
            player: save_creature(&self.player),
            mobs: self
                .mobs
                .iter()
                .map(|mob| SavedMob {
                    id: mob.id,
                    room_id: mob.room_id,
                    is_boss: mob.is_boss,
                    pursuit_turns: mob.pursuit_turns,
                    creature: save_creature(&mob.creature),
                })
                .collect(),
            chests: self
                .chests
                .iter()
                .map(|entry| SavedChest {
                    id: entry.id,
                    room_id: entry.room_id,
                    chest: SavedChestContents {
                        x: entry.chest.position.x,
                        y: entry.chest.position.y,
                        capacity: entry.chest.contents.capacity(),
                        items: entry.chest.contents.items().to_vec(),
                    },
                })
                .collect(),
            current_room_id: self.current_room,
            ai_accum_ms: self.ai_accum_ms,
            shop_stock: self.shop_stock.clone(),
            shop_clutter: self.shop_clutter.clone(),
            room_threat_by_id: self.room_threat.iter().map(|(id, t)| (*id, *t)).collect(),
            warned_danger_rooms: self.warned_danger_rooms.iter().copied().collect(),
            danger_protection_armed_rooms: self
                .danger_protection_armed_rooms
                .iter()
                .copied()
                .collect(),
            active_perk_ids: self.build.ids(BuildChoiceKind::Perk),
            active_gambit_ids: self.build.ids(BuildChoiceKind::Gambit),
            pending_boss_rewards: self.pending_boss_rewards.as_ref().map(|pending| {
                SavedBossRewards {
                    perk_ids: pending.perks.iter().map(|c| c.id.to_string()).collect(),
                    gambit_ids: pending.gambits.iter().map(|c| c.id.to_string()).collect(),
                }
            }),
            pending_shop_rewards: self.pending_shop_rewards.clone(),
            shop_reward_claimed_floors: self.shop_reward_claimed_floors.iter().copied().collect(),
            combat_luck: self.combat.snapshot_luck_state(),
            used_names: self.names.used().iter().cloned().collect(),
        }
    }

    /// Rebuild a run narrated in English.
    ///
    /// # Errors
    ///
    /// See [`DungeonRun::from_save_with_narrator`].
    pub fn from_save(save: RunSave) -> Result<Self, SaveError> {
        Self::from_save_with_narrator(save, Box::new(EnglishNarrator))
    }

    /// Rebuild a run from a payload into a fresh value; nothing live is
    /// touched until the whole payload has been accepted.
    ///
    /// # Errors
    ///
    /// Fails on a version mismatch, a malformed map, an unknown build choice
    /// id, or a container holding more items than its capacity.
    pub fn from_save_with_narrator(
        save: RunSave,
        narrator: Box<dyn Narrator>,
    ) -> Result<Self, SaveError> {
        if save.version != SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: save.version,
                expected: SAVE_VERSION,
            });
        }

        let world = restore_world(save.world)?;
        let player = restore_creature(save.player)?;
        let mobs = save
            .mobs
            .into_iter()
            .map(|saved| -> Result<Mob, SaveError> {
                Ok(Mob {
                    id: saved.id,
                    room_id: saved.room_id,
                    is_boss: saved.is_boss,
                    pursuit_turns: saved.pursuit_turns,
                    creature: restore_creature(saved.creature)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let chests = save
            .chests
            .into_iter()
            .map(|saved| -> Result<FloorChest, SaveError> {
                let contents = restore_container(
                    saved.chest.capacity,
                    saved.chest.items,
                    &format!("chest {}", saved.id),
                )?;
                Ok(FloorChest {
                    id: saved.id,
                    room_id: saved.room_id,
                    chest: Chest {
                        position: Position::new(saved.chest.x, saved.chest.y),
                        contents,
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let build = ActiveBuild::from_ids(&save.active_perk_ids, &save.active_gambit_ids)?;
        let pending_boss_rewards = save
            .pending_boss_rewards
            .map(|pending| {
                Ok::<_, SaveError>(PendingBossRewards {
                    perks: lookup_choices(&pending.perk_ids)?,
                    gambits: lookup_choices(&pending.gambit_ids)?,
                })
            })
            .transpose()?;

        let current_room = save
            .current_room_id
            .filter(|id| world.room(*id).is_some())
            .or_else(|| world.room_at(player.position).map(|room| room.id));

        let mut logs = RunLog::default();
        logs.restore(save.logs);
        let mut combat = Combat::new();
        combat.restore_luck_state(&save.combat_luck);
        let mut rng = SeededRandom::new(&save.seed_phrase);
        rng.set_state(save.rng_state);

        Ok(Self {
            seed_phrase: save.seed_phrase,
            seed_number: save.seed_number,
            rng,
            ids: IdAllocator::resume(save.next_item_id, save.next_entity_id),
            names: NameGenerator::from_used(save.used_names.into_iter().collect()),
            combat,
            narrator,
            world,
            player,
            floor: save.floor,
            state: save.state,
            overlay: save.overlay,
            stats: save.stats,
            logs,
            mobs,
            chests,
            current_room,
            ai_accum_ms: save.ai_accum_ms,
            shop_stock: save.shop_stock,
            shop_clutter: save.shop_clutter,
            room_threat: save.room_threat_by_id.into_iter().collect::<BTreeMap<_, _>>(),
            warned_danger_rooms: save.warned_danger_rooms.into_iter().collect::<BTreeSet<_>>(),
            danger_protection_armed_rooms: save
                .danger_protection_armed_rooms
                .into_iter()
                .collect(),
            build,
            pending_boss_rewards,
            pending_shop_rewards: save.pending_shop_rewards,
            shop_reward_claimed_floors: save.shop_reward_claimed_floors.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::PlayerAction;
    use crate::item::{BuffStats, PoisonStats};

    fn played_run() -> DungeonRun {
        let mut run = DungeonRun::new("save-layer").expect("run");
        for step in 0..40 {
            let (dx, dy) = [(1, 0), (0, 1), (-1, 0), (0, -1)][step % 4];
            run.move_player(dx, dy);
            run.tick(500.0);
            if run.battle_enemy().is_some() {
                run.perform_combat(PlayerAction::Normal);
            }
        }
        run
    }

    #[test]
    fn round_trip_preserves_the_run() {
        let run = played_run();
        let restored = DungeonRun::from_save(run.to_save()).expect("restore");
        assert_eq!(restored.seed_phrase(), run.seed_phrase());
        assert_eq!(restored.rng_state(), run.rng_state());
        assert_eq!(restored.floor(), run.floor());
        assert_eq!(restored.player(), run.player());
        assert_eq!(restored.mobs(), run.mobs());
        assert_eq!(restored.chests(), run.chests());
        assert_eq!(restored.world().cells(), run.world().cells());
        assert_eq!(restored.world().explored(), run.world().explored());
        assert_eq!(restored.overlay(), run.overlay());
        assert_eq!(restored.logs(), run.logs());
        assert_eq!(restored.to_save(), run.to_save());
    }

    #[test]
    fn restored_runs_continue_identically() {
        let mut a = played_run();
        let mut b = DungeonRun::from_save(a.to_save()).expect("restore");
        for _ in 0..20 {
            a.tick(450.0);
            b.tick(450.0);
            a.perform_combat(PlayerAction::Offensive);
            b.perform_combat(PlayerAction::Offensive);
            a.move_player(1, 0);
            b.move_player(1, 0);
        }
        assert_eq!(a.to_save(), b.to_save());
    }

    #[test]
    fn timed_effects_store_turns_remaining() {
        let mut run = DungeonRun::new("effects").expect("run");
        run.player.turn = 10;
        let buff = Item::buff(run.ids.item(), "Focus", BuffStats::default());
        run.player.add_buff(buff).expect("buff");
        let poison = Item::poison(run.ids.item(), "Venom", PoisonStats::default());
        run.player.add_poison(poison).expect("poison");
        let attack = run.player.attack_bonus;

        let mut save = run.to_save();
        let lifetime = BuffStats::default().lifetime;
        assert_eq!(save.player.buffs[0].turns_remaining, lifetime);
        save.player.turn = 50;
        save.player.poisons[0].turns_remaining = -3;

        let restored = DungeonRun::from_save(save).expect("restore");
        assert_eq!(restored.player().buffs[0].expiry_turn, 50 + lifetime);
        assert_eq!(restored.player().poisons[0].expiry_turn, 50);
        assert_eq!(restored.player().attack_bonus, attack);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let run = DungeonRun::new("versions").expect("run");
        let mut save = run.to_save();
        save.version = 2;
        assert_eq!(
            DungeonRun::from_save(save).err(),
            Some(SaveError::UnsupportedVersion {
                found: 2,
                expected: 1
            })
        );
    }

    #[test]
    fn short_map_bytes_are_malformed() {
        let run = DungeonRun::new("short-map").expect("run");
        let mut save = run.to_save();
        save.world.cells_base64 = STANDARD.encode([0u8; 10]);
        assert_eq!(
            DungeonRun::from_save(save).err(),
            Some(SaveError::MalformedWorld)
        );
    }

    #[test]
    fn overfull_inventory_fails_to_load() {
        let run = DungeonRun::new("overfull").expect("run");
        let mut save = run.to_save();
        save.player.inventory_capacity = 2;
        assert!(matches!(
            DungeonRun::from_save(save),
            Err(SaveError::ContainerOverflow { .. })
        ));
    }

    #[test]
    fn unknown_build_choice_fails_to_load() {
        let run = DungeonRun::new("unknown-perk").expect("run");
        let mut save = run.to_save();
        save.active_perk_ids.push("perk-made-up".to_string());
        assert_eq!(
            DungeonRun::from_save(save).err(),
            Some(SaveError::UnknownBuildChoice {
                id: "perk-made-up".to_string()
            })
        );
    }

    #[test]
    fn missing_luck_and_names_default_on_load() {
        let run = DungeonRun::new("older-payload").expect("run");
        let mut json = serde_json::to_value(run.to_save()).expect("json");
        let object = json.as_object_mut().expect("object");
        object.remove("combatLuck");
        object.remove("usedNames");
        let save: RunSave = serde_json::from_value(json).expect("payload");
        assert!(save.used_names.is_empty());
        assert!(DungeonRun::from_save(save).is_ok());
    }

    #[test]
    fn won_runs_load_as_cleared_and_stay_frozen() {
        let run = DungeonRun::new("finished").expect("run");
        let mut json = serde_json::to_value(run.to_save()).expect("json");
        json["state"] = serde_json::Value::from("won");
        let save: RunSave = serde_json::from_value(json).expect("payload");
        let mut restored = DungeonRun::from_save(save).expect("restore");
        assert_eq!(restored.state(), RunState::Cleared);

        let position = restored.player().position;
        for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
            restored.move_player(dx, dy);
        }
        assert_eq!(restored.player().position, position);
        assert_eq!(restored.to_save().state, RunState::Cleared);
    }
}
