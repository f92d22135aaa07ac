//! The run orchestrator.
//!
//! [`DungeonRun`] owns every piece of mutable state in a run: the RNG, the
//! id counters, the map, the player, the floor's mobs and chests, the shop
//! and the reward bookkeeping. Callers drive it through a small set of
//! synchronous commands (`move_player`, `tick`, `perform_combat`, the
//! overlay commands in this module and the inventory/shop commands in
//! [`economy`]) and read state back through accessors.
//!
//! Exactly one [`Overlay`] is active at a time. Movement only happens with
//! no overlay open, and the AI clock stops while a battle is on screen.

pub mod economy;
pub mod save;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, STARTING_ATTRS};
use crate::combat::{Combat, CombatResult, PlayerAction, TurnOptions};
use crate::constants::{
    AI_MOVE_MS, CREATURE_XP_MULTIPLIER, DANGER_WARNING_LEVEL_GAP, FLOOR_TRANSITION_HEAL_MINIMUM,
    FLOOR_TRANSITION_HEAL_RATIO, LOG_BATTLE_END, LOG_BATTLE_START, PLAYER_CONSTITUTION_BONUS,
    PLAYER_START_X, PLAYER_START_Y, STARTING_ARMOR_DEFENSE_BONUS, STARTING_BANDAGE_COUNT,
    STARTING_WEAPON_ATTACK_BONUS, STARTING_WEAPON_CRITICAL_MULTIPLIER,
    STARTING_WEAPON_CRITICAL_RANGE, STARTING_WEAPON_DAMAGE_DICE, STARTING_WEAPON_DEFENSE_BONUS,
    SURPRISE_PROTECTION_ATTACK_MULTIPLIER, SURPRISE_PROTECTION_FLEE_BONUS,
};
use crate::creature::Creature;
use crate::dice::{DiceError, DiceSpec};
use crate::item::{EntityId, IdAllocator, Item, WeaponStats, WieldSlot};
use crate::loot::{Potion, ShopEntry};
use crate::narration::{Caption, EnglishNarrator, LogEntry, LogEvent, LogLevel, Narrator, RunLog};
use crate::numbers::floor_f64_to_i32;
use crate::population::{FloorChest, Mob, ShopClutter, populate_floor};
use crate::ai::{ai_step, find_retreat_position};
use crate::procgen::NameGenerator;
use crate::progression::{
    ActiveBuild, BuildChoiceKind, PendingBossRewards, ShopRewardChoice, ShopRewardId,
    ShopRewardOutcome, claim_shop_reward, pending_shop_rewards,
};
use crate::rng::{SeededRandom, make_seed_phrase};
use crate::world::{Position, Room, WorldMap, generate_map};

pub const PLAYER_NAME: &str = "Player";
pub const FISTS_NAME: &str = "Fists";
pub const CLOTH_ARMOR_NAME: &str = "Cloth Armor";
pub const LEATHER_BOOTS_NAME: &str = "Leather Boots";

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Playing,
    Dead,
    /// Reserved for a finite dungeon. Floors currently go on forever, so no
    /// command moves a run here, but saved payloads may carry it.
    #[serde(alias = "won")]
    Cleared,
}

/// The single interaction mode currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Overlay {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Battle {
        mob_id: EntityId,
        /// Where the player stood when the fight began.
        fallback: Position,
        room_id: Option<u32>,
        surprise_protection: bool,
    },
    #[serde(rename_all = "camelCase")]
    Chest { chest_id: EntityId },
    Inventory,
    Shop,
    LevelUp,
    BossReward,
    ShopReward,
}

impl Overlay {
    /// Overlays that only a choice can dismiss.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Battle { .. } | Self::LevelUp | Self::BossReward | Self::ShopReward
        )
    }
}

/// Cumulative run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub vanquished: i32,
    pub gold_earned: i32,
    pub gold_spent: i32,
    pub gold_left_behind: i32,
    pub inventory_value: i32,
    pub xp_gained: i32,
    pub level: i32,
    pub floor_reached: i32,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            vanquished: 0,
            gold_earned: 0,
            gold_spent: 0,
            gold_left_behind: 0,
            inventory_value: 0,
            xp_gained: 0,
            level: 1,
            floor_reached: 1,
        }
    }
}

/// One row of the level-up overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpChoice {
    pub attribute: Attribute,
    pub label: String,
    pub description: String,
    pub value: i32,
    pub modifier: i32,
}

/// Answer to the boss-reward overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossRewardPick<'a> {
    /// Leave the build as it is.
    Descend,
    Choice { kind: BuildChoiceKind, id: &'a str },
}

/// A seeded dungeon run.
#[derive(Debug)]
pub struct DungeonRun {
    seed_phrase: String,
    seed_number: u32,
    rng: SeededRandom,
    ids: IdAllocator,
    names: NameGenerator,
    combat: Combat,
    narrator: Box<dyn Narrator>,
    world: WorldMap,
    player: Creature,
    floor: i32,
    state: RunState,
    overlay: Overlay,
    stats: RunStats,
    logs: RunLog,
    mobs: Vec<Mob>,
    chests: Vec<FloorChest>,
    current_room: Option<u32>,
    ai_accum_ms: f64,
    shop_stock: Vec<ShopEntry>,
    shop_clutter: Vec<ShopClutter>,
    room_threat: BTreeMap<u32, i32>,
    warned_danger_rooms: BTreeSet<u32>,
    danger_protection_armed_rooms: BTreeSet<u32>,
    build: ActiveBuild,
    pending_boss_rewards: Option<PendingBossRewards>,
    pending_shop_rewards: Option<Vec<ShopRewardChoice>>,
    shop_reward_claimed_floors: BTreeSet<i32>,
}

impl DungeonRun {
    /// Start a run narrated in English. A blank seed gets a generated phrase.
    ///
    /// # Errors
    ///
    /// Propagates a [`DiceError`] from floor population.
    pub fn new(seed_input: &str) -> Result<Self, DiceError> {
        Self::with_narrator(seed_input, Box::new(EnglishNarrator))
    }

    /// Start a run with a custom text catalog.
    ///
    /// # Errors
    ///
    /// Propagates a [`DiceError`] from floor population.
    pub fn with_narrator(seed_input: &str, narrator: Box<dyn Narrator>) -> Result<Self, DiceError> {
        let seed_phrase = make_seed_phrase(seed_input);
        let mut rng = SeededRandom::new(&seed_phrase);
        let seed_number = rng.seed();
        let world = generate_map(&mut rng);

        let mut player = Creature::new(
            PLAYER_NAME,
            Position::new(PLAYER_START_X, PLAYER_START_Y),
            STARTING_ATTRS,
        );
        player.max_hitpoints += player.modifier(Attribute::Con) * PLAYER_CONSTITUTION_BONUS;
        player.hitpoints = player.max_hitpoints;

        let mut run = Self {
            seed_phrase,
            seed_number,
            rng,
            ids: IdAllocator::default(),
            names: NameGenerator::default(),
            combat: Combat::new(),
            narrator,
            world,
            player,
            floor: 1,
            state: RunState::Playing,
            overlay: Overlay::None,
            stats: RunStats::default(),
            logs: RunLog::default(),
            mobs: Vec::new(),
            chests: Vec::new(),
            current_room: None,
            ai_accum_ms: 0.0,
            shop_stock: Vec::new(),
            shop_clutter: Vec::new(),
            room_threat: BTreeMap::new(),
            warned_danger_rooms: BTreeSet::new(),
            danger_protection_armed_rooms: BTreeSet::new(),
            build: ActiveBuild::default(),
            pending_boss_rewards: None,
            pending_shop_rewards: None,
            shop_reward_claimed_floors: BTreeSet::new(),
        };

        run.prepare_player_gear()?;
        run.build_floor(true)?;
        for line in run.narrator.intro() {
            run.logs.push(LogEntry::new(line, LogLevel::Info));
        }
        Ok(run)
    }

    fn prepare_player_gear(&mut self) -> Result<(), DiceError> {
        let dice: DiceSpec = STARTING_WEAPON_DAMAGE_DICE.parse()?;
        let fists = Item::weapon(
            self.ids.item(),
            FISTS_NAME,
            WeaponStats::new(
                STARTING_WEAPON_CRITICAL_RANGE,
                STARTING_WEAPON_CRITICAL_MULTIPLIER,
                STARTING_WEAPON_ATTACK_BONUS,
                STARTING_WEAPON_DEFENSE_BONUS,
                dice,
            ),
        );
        let cloth = Item::armor(
            self.ids.item(),
            WieldSlot::Chest,
            CLOTH_ARMOR_NAME,
            0,
            STARTING_ARMOR_DEFENSE_BONUS,
        );
        let boots = Item::armor(
            self.ids.item(),
            WieldSlot::Feet,
            LEATHER_BOOTS_NAME,
            0,
            STARTING_ARMOR_DEFENSE_BONUS,
        );
        self.player.wield(WieldSlot::Hands, Some(fists));
        self.player.wield(WieldSlot::Chest, Some(cloth));
        self.player.wield(WieldSlot::Feet, Some(boots));

        let mut kit: Vec<Item> = (0..STARTING_BANDAGE_COUNT)
            .map(|_| Potion::Bandages.make(&mut self.ids))
            .collect();
        kit.push(Potion::Health.make(&mut self.ids));
        for item in kit {
            if let Err(item) = self.player.give(item) {
                log::warn!("starting kit overflow, dropped {}", item.name);
            }
        }
        Ok(())
    }

    fn build_floor(&mut self, initial: bool) -> Result<(), DiceError> {
        self.world = generate_map(&mut self.rng);
        self.warned_danger_rooms.clear();
        self.danger_protection_armed_rooms.clear();
        self.pending_boss_rewards = None;
        self.pending_shop_rewards = None;

        let population = populate_floor(
            &self.world,
            self.floor,
            &mut self.rng,
            &mut self.names,
            &mut self.ids,
        )?;
        self.mobs = population.mobs;
        self.chests = population.chests;
        self.shop_stock = population.shop_stock;
        self.shop_clutter = population.shop_clutter;
        self.room_threat = population.room_threat;

        let start = self
            .world
            .start_room()
            .or_else(|| self.world.rooms().first())
            .map(Room::center);
        if let Some(center) = start {
            self.player.position = center;
        }
        self.current_room = self.world.room_at(self.player.position).map(|room| room.id);
        self.world.update_fov_default(self.player.position);
        self.ai_accum_ms = 0.0;

        if !initial {
            self.log(&LogEvent::DescendFloor { floor: self.floor }, LogLevel::Success);
        }
        Ok(())
    }

    fn advance_to_next_floor(&mut self) -> Result<(), DiceError> {
        self.floor += 1;
        self.stats.floor_reached = self.floor;

        let cap = self.player.current_max_hitpoints();
        let before = self.player.hitpoints;
        let heal = floor_f64_to_i32(f64::from(cap) * FLOOR_TRANSITION_HEAL_RATIO)
            .max(FLOOR_TRANSITION_HEAL_MINIMUM);
        self.player.hitpoints = (self.player.hitpoints + heal).min(cap);

        self.player.in_battle = false;
        self.overlay = Overlay::None;
        self.build_floor(false)?;

        let healed = self.player.hitpoints - before;
        if healed > 0 {
            self.log(&LogEvent::BreathRecover { healed }, LogLevel::Success);
        }
        self.maybe_open_auto_overlay();
        Ok(())
    }

    fn log(&mut self, event: &LogEvent<'_>, level: LogLevel) {
        let text = self.narrator.narrate(event);
        self.logs.push(LogEntry::new(text, level));
    }

    fn maybe_open_auto_overlay(&mut self) {
        if self.state == RunState::Playing
            && self.overlay == Overlay::None
            && self.player.unspent_stat_points > 0
        {
            self.overlay = Overlay::LevelUp;
        }
    }

    fn warn_if_dangerous_room(&mut self, room_id: u32) {
        let Some(room) = self.world.room(room_id) else {
            return;
        };
        if room.is_start() || room.is_shop() || room.is_boss() {
            return;
        }
        let threat = self.room_threat(room_id);
        if threat < self.player.level + DANGER_WARNING_LEVEL_GAP {
            return;
        }
        if !self.warned_danger_rooms.insert(room_id) {
            return;
        }
        self.danger_protection_armed_rooms.insert(room_id);
        self.log(&LogEvent::DangerWarning { threat }, LogLevel::Warn);
    }

    fn start_battle(&mut self, mob_index: usize, fallback: Position, room_id: Option<u32>) {
        let surprise_protection =
            room_id.is_some_and(|id| self.danger_protection_armed_rooms.remove(&id));
        let mob = &mut self.mobs[mob_index];
        mob.creature.in_battle = true;
        self.player.in_battle = true;
        log::debug!(
            "{LOG_BATTLE_START}: {} {} room={room_id:?} protected={surprise_protection}",
            mob.id,
            mob.creature.name
        );
        self.overlay = Overlay::Battle {
            mob_id: mob.id,
            fallback,
            room_id,
            surprise_protection,
        };
    }

    fn prepare_shop_reward(&mut self) {
        self.pending_shop_rewards = Some(pending_shop_rewards(&self.build, self.narrator.as_ref()));
        self.overlay = Overlay::ShopReward;
    }

    fn open_boss_reward(&mut self) {
        self.pending_boss_rewards = Some(PendingBossRewards::roll(&mut self.rng, &self.build));
        self.overlay = Overlay::BossReward;
    }

    fn finalize_stats(&mut self) {
        let wielded: i32 = self
            .player
            .wielded_items()
            .map(|(_, item)| item.value)
            .sum();
        self.stats.inventory_value = self.player.inventory.total_value() + wielded;
        self.stats.gold_left_behind = self
            .chests
            .iter()
            .map(|entry| entry.chest.contents.gold_total())
            .sum();
        self.stats.level = self.player.level;
        self.stats.floor_reached = self.floor;
    }

    /// Step the player by `(dx, dy)`.
    ///
    /// Walking into a live mob starts a battle and walking into a non-empty
    /// chest opens it; neither moves the player.
    pub fn move_player(&mut self, dx: i32, dy: i32) {
        if self.state != RunState::Playing || self.overlay != Overlay::None {
            return;
        }
        let next = self.player.position.offset(dx, dy);
        if !self.world.is_passable(next.x, next.y) {
            return;
        }

        if let Some(index) = self
            .mobs
            .iter()
            .position(|mob| mob.is_alive() && mob.position() == next)
        {
            let room_id = self.world.room_at(next).map(|room| room.id);
            let enemy = self.mobs[index].creature.name.clone();
            self.start_battle(index, self.player.position, room_id);
            self.log(&LogEvent::EngageEnemy { enemy: &enemy }, LogLevel::Warn);
            return;
        }

        if let Some(chest_id) = self
            .chests
            .iter()
            .find(|entry| entry.chest.position == next && !entry.chest.is_empty())
            .map(|entry| entry.id)
        {
            self.overlay = Overlay::Chest { chest_id };
            self.log(&LogEvent::OpenChest, LogLevel::Info);
            return;
        }

        self.player.position = next;
        let previous = self.current_room;
        self.current_room = self.world.room_at(next).map(|room| room.id);
        if self.current_room != previous
            && let Some(room_id) = self.current_room
        {
            self.enter_room(room_id);
        }
        self.world.update_fov_default(self.player.position);
    }

    fn enter_room(&mut self, room_id: u32) {
        let (is_boss, is_shop) = self
            .world
            .room(room_id)
            .map_or((false, false), |room| (room.is_boss(), room.is_shop()));
        if is_boss {
            self.log(&LogEvent::EnterBossLair, LogLevel::Warn);
        } else if is_shop {
            self.log(&LogEvent::EnterShopRoom, LogLevel::Success);
            if self.shop_reward_claimed_floors.insert(self.floor) {
                self.log(&LogEvent::ShopkeeperTuneup, LogLevel::Success);
                self.prepare_shop_reward();
            }
        }
        self.warn_if_dangerous_room(room_id);
    }

    /// Advance the AI clock by `dt_ms`. Once the clock passes the move
    /// threshold, one AI step runs if no overlay is open.
    pub fn tick(&mut self, dt_ms: f64) {
        if self.state != RunState::Playing || matches!(self.overlay, Overlay::Battle { .. }) {
            return;
        }
        self.ai_accum_ms += dt_ms;
        if self.ai_accum_ms < AI_MOVE_MS {
            return;
        }
        self.ai_accum_ms -= AI_MOVE_MS;

        if self.overlay == Overlay::None
            && let Some(trigger) = ai_step(
                &self.world,
                &mut self.rng,
                &self.player,
                &mut self.mobs,
                &self.chests,
            )
            && let Some(index) = self.mobs.iter().position(|mob| mob.id == trigger.mob_id)
        {
            self.start_battle(index, self.player.position, Some(trigger.room_id));
            self.log(
                &LogEvent::EnemyAttacks {
                    enemy: &trigger.attacker_name,
                },
                LogLevel::Warn,
            );
        }
        self.world.update_fov_default(self.player.position);
    }

    /// Resolve one combat exchange against the engaged mob.
    ///
    /// Returns `None` when no battle is open. A stale battle whose mob is
    /// already gone is closed instead.
    #[allow(clippy::too_many_lines)]
    pub fn perform_combat(&mut self, action: PlayerAction) -> Option<CombatResult> {
        if self.state != RunState::Playing {
            return None;
        }
        let Overlay::Battle {
            mob_id,
            fallback,
            room_id,
            surprise_protection,
        } = self.overlay
        else {
            return None;
        };
        let Some(index) = self
            .mobs
            .iter()
            .position(|mob| mob.id == mob_id && mob.is_alive())
        else {
            self.overlay = Overlay::None;
            self.player.in_battle = false;
            self.maybe_open_auto_overlay();
            return None;
        };

        let options = if surprise_protection {
            self.log(&LogEvent::DangerSenseProtected, LogLevel::Success);
            self.overlay = Overlay::Battle {
                mob_id,
                fallback,
                room_id,
                surprise_protection: false,
            };
            TurnOptions {
                enemy_attack_multiplier: SURPRISE_PROTECTION_ATTACK_MULTIPLIER,
                flee_bonus: SURPRISE_PROTECTION_FLEE_BONUS,
            }
        } else {
            TurnOptions::default()
        };

        let result = self.combat.turn(
            &mut self.rng,
            self.narrator.as_ref(),
            &mut self.player,
            &mut self.mobs[index].creature,
            action,
            options,
        );
        for entry in &result.logs {
            self.logs.push(entry.clone());
        }

        if result.fled {
            self.player.position =
                find_retreat_position(&self.world, &self.mobs, &self.chests, room_id, fallback);
            self.player.in_battle = false;
            self.mobs[index].creature.in_battle = false;
            self.overlay = Overlay::None;
            self.current_room = self.world.room_at(self.player.position).map(|room| room.id);
            log::debug!("{LOG_BATTLE_END}: {mob_id} fled to {}", self.player.position);
            self.log(&LogEvent::Retreat, LogLevel::Info);
            self.world.update_fov_default(self.player.position);
            self.maybe_open_auto_overlay();
            return Some(result);
        }

        if !self.mobs[index].is_alive() {
            self.reward_kill(index);
        }

        if !self.player.alive {
            log::debug!("{LOG_BATTLE_END}: player fell to {mob_id}");
            self.state = RunState::Dead;
            self.finalize_stats();
            return Some(result);
        }

        self.maybe_open_auto_overlay();
        Some(result)
    }

    fn reward_kill(&mut self, index: usize) {
        let mob = &mut self.mobs[index];
        mob.creature.in_battle = false;
        let is_boss = mob.is_boss;
        let gold = mob.creature.gold;
        let xp = floor_f64_to_i32(
            f64::from(mob.creature.max_hitpoints) * f64::from(CREATURE_XP_MULTIPLIER),
        );
        log::debug!("{LOG_BATTLE_END}: {} down, boss={is_boss}", mob.id);

        self.stats.vanquished += 1;
        let gain = self.player.give_xp(xp);
        self.stats.xp_gained += xp;
        if gain.leveled > 0 {
            self.log(
                &LogEvent::WelcomeLevel {
                    level: self.player.level,
                    points: self.player.unspent_stat_points,
                },
                LogLevel::Success,
            );
        }

        self.player.gold += gold;
        self.stats.gold_earned += gold;
        self.log(&LogEvent::LootKillRewards { gold, xp }, LogLevel::Success);

        self.player.in_battle = false;
        self.overlay = Overlay::None;
        self.mobs.retain(Mob::is_alive);

        if is_boss {
            self.log(&LogEvent::BossDownChooseReward, LogLevel::Success);
            self.open_boss_reward();
        } else if !self.mobs.is_empty() {
            self.log(
                &LogEvent::EnemiesRemain {
                    count: self.mobs.len(),
                    floor: self.floor,
                },
                LogLevel::Info,
            );
        }
    }

    pub fn open_inventory(&mut self) {
        if self.state == RunState::Playing && self.overlay == Overlay::None {
            self.overlay = Overlay::Inventory;
        }
    }

    pub fn open_shop(&mut self) {
        if self.state == RunState::Playing && self.overlay == Overlay::None && self.can_open_shop()
        {
            self.overlay = Overlay::Shop;
        }
    }

    /// Close a dismissible overlay. Battles and pending choices stay open.
    pub fn close_overlay(&mut self) {
        if self.overlay.is_blocking() {
            return;
        }
        self.overlay = Overlay::None;
        self.maybe_open_auto_overlay();
    }

    /// Take (or decline) a boss reward, then descend.
    ///
    /// An id that is not on offer is ignored and the overlay stays open.
    ///
    /// # Errors
    ///
    /// Propagates a [`DiceError`] from building the next floor.
    pub fn choose_boss_reward(&mut self, pick: BossRewardPick<'_>) -> Result<(), DiceError> {
        if self.overlay != Overlay::BossReward {
            return Ok(());
        }
        let Some(pending) = &self.pending_boss_rewards else {
            return Ok(());
        };

        match pick {
            BossRewardPick::Descend => {
                self.log(&LogEvent::DescendWithoutModifier, LogLevel::Info);
            }
            BossRewardPick::Choice { kind, id } => {
                let Some(choice) = pending.find(kind, id) else {
                    return Ok(());
                };
                choice.apply_to(&mut self.player);
                self.build.push(choice);
                self.log(
                    &LogEvent::SelectedBuildChoice {
                        kind: choice.kind,
                        name: choice.name,
                    },
                    LogLevel::Success,
                );
            }
        }
        self.pending_boss_rewards = None;
        self.advance_to_next_floor()
    }

    /// Claim the free shop-discovery reward.
    pub fn claim_shop_reward(&mut self, reward: ShopRewardId) {
        if self.overlay != Overlay::ShopReward || self.pending_shop_rewards.is_none() {
            return;
        }
        let outcome = claim_shop_reward(reward, &mut self.player, &mut self.build);
        if let ShopRewardOutcome::FallbackGold(gold) = outcome {
            self.stats.gold_earned += gold;
        }
        self.log(&outcome.event(), LogLevel::Success);
        self.pending_shop_rewards = None;
        self.overlay = Overlay::None;
        self.maybe_open_auto_overlay();
    }

    #[must_use]
    pub fn level_up_choices(&self) -> Vec<LevelUpChoice> {
        Attribute::LEVEL_UP
            .into_iter()
            .map(|attribute| LevelUpChoice {
                attribute,
                label: self.narrator.describe(&Caption::AttributeLabel(attribute)),
                description: self
                    .narrator
                    .describe(&Caption::AttributeDescription(attribute)),
                value: self.player.attributes.get(attribute),
                modifier: self.player.modifier(attribute),
            })
            .collect()
    }

    /// Spend one unspent point from the level-up overlay.
    pub fn allocate_level_up(&mut self, attribute: Attribute) {
        if self.overlay != Overlay::LevelUp || !Attribute::LEVEL_UP.contains(&attribute) {
            return;
        }
        if !self.player.spend_attribute_point(attribute) {
            return;
        }
        self.log(&LogEvent::LevelUpSpent { attribute }, LogLevel::Success);
        if self.player.unspent_stat_points <= 0 {
            self.overlay = Overlay::None;
        }
        self.maybe_open_auto_overlay();
    }

    #[must_use]
    pub fn seed_phrase(&self) -> &str {
        &self.seed_phrase
    }

    #[must_use]
    pub const fn seed_number(&self) -> u32 {
        self.seed_number
    }

    /// Current RNG cursor.
    #[must_use]
    pub const fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    #[must_use]
    pub const fn floor(&self) -> i32 {
        self.floor
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub const fn overlay(&self) -> Overlay {
        self.overlay
    }

    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    #[must_use]
    pub const fn logs(&self) -> &RunLog {
        &self.logs
    }

    #[must_use]
    pub const fn player(&self) -> &Creature {
        &self.player
    }

    #[must_use]
    pub const fn world(&self) -> &WorldMap {
        &self.world
    }

    #[must_use]
    pub fn mobs(&self) -> &[Mob] {
        &self.mobs
    }

    #[must_use]
    pub fn chests(&self) -> &[FloorChest] {
        &self.chests
    }

    #[must_use]
    pub fn shop_clutter(&self) -> &[ShopClutter] {
        &self.shop_clutter
    }

    #[must_use]
    pub fn narrator(&self) -> &dyn Narrator {
        self.narrator.as_ref()
    }

    #[must_use]
    pub const fn ai_accum_ms(&self) -> f64 {
        self.ai_accum_ms
    }

    #[must_use]
    pub fn current_room(&self) -> Option<&Room> {
        self.current_room.and_then(|id| self.world.room(id))
    }

    /// Cached challenge level of a room, 0 when unknown.
    #[must_use]
    pub fn room_threat(&self, room_id: u32) -> i32 {
        self.room_threat.get(&room_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn current_room_threat(&self) -> i32 {
        self.current_room.map_or(0, |id| self.room_threat(id))
    }

    #[must_use]
    pub fn can_open_shop(&self) -> bool {
        self.world
            .room_at(self.player.position)
            .is_some_and(Room::is_shop)
    }

    /// The mob engaged in the open battle.
    #[must_use]
    pub fn battle_enemy(&self) -> Option<&Mob> {
        let Overlay::Battle { mob_id, .. } = self.overlay else {
            return None;
        };
        self.mobs.iter().find(|mob| mob.id == mob_id)
    }

    /// The chest being looted.
    #[must_use]
    pub fn chest(&self) -> Option<&FloorChest> {
        let Overlay::Chest { chest_id } = self.overlay else {
            return None;
        };
        self.chests.iter().find(|entry| entry.id == chest_id)
    }

    #[must_use]
    pub const fn current_build(&self) -> &ActiveBuild {
        &self.build
    }

    #[must_use]
    pub const fn boss_rewards(&self) -> Option<&PendingBossRewards> {
        self.pending_boss_rewards.as_ref()
    }

    #[must_use]
    pub fn shop_reward_choices(&self) -> Option<&[ShopRewardChoice]> {
        self.pending_shop_rewards.as_deref()
    }
}
