//! Mutable creature state shared by the player and monsters.

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeSet};
use crate::constants::{
    CREATURE_GOLD_MULTIPLIER, CREATURE_GOLD_SCALER, DEFAULT_WEAPON_CRITICAL_MULTIPLIER,
    DEFAULT_WEAPON_CRITICAL_RANGE, DEFAULT_WEAPON_DAMAGE_DICE, MOB_CRITICAL_MULTIPLIER_MAXIMUM,
    MOB_CRITICAL_RANGE_MINIMUM, PLAYER_BASE_ATTACK_BONUS, PLAYER_BASE_DEFENSE,
    PLAYER_BASE_DEFENSE_BONUS, PLAYER_CONSTITUTION_BONUS, PLAYER_HP_HEAL_ON_LEVEL_UP,
    PLAYER_HP_PER_LEVEL_MULTIPLIER, PLAYER_INITIAL_HP, PLAYER_INVENTORY_CAPACITY,
    PLAYER_XP_FOR_LEVEL_2, PLAYER_XP_GOAL_MULTIPLIER,
};
use crate::dice::{DiceError, DiceSpec, Roller};
use crate::item::{
    BuffStats, Container, Item, ItemId, ItemKind, PoisonStats, WeaponStats, WieldSlot,
    apply_instant,
};
use crate::numbers::{ceil_f64_to_i32, floor_f64_to_i32};
use crate::world::Position;

/// A buff or poison attached to a creature until `expiry_turn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEffect<S> {
    pub id: ItemId,
    pub name: String,
    pub value: i32,
    pub stats: S,
    pub expiry_turn: i32,
}

impl<S> TurnEffect<S> {
    #[must_use]
    pub const fn has_expired(&self, turn: i32) -> bool {
        turn >= self.expiry_turn
    }

    /// Turns left relative to `turn`, never negative.
    #[must_use]
    pub fn turns_remaining(&self, turn: i32) -> i32 {
        (self.expiry_turn - turn).max(0)
    }
}

pub type ActiveBuff = TurnEffect<BuffStats>;
pub type ActivePoison = TurnEffect<PoisonStats>;

impl ActiveBuff {
    #[must_use]
    pub fn into_item(self) -> Item {
        Item::buff(self.id, self.name, self.stats).with_value(self.value)
    }
}

impl ActivePoison {
    #[must_use]
    pub fn into_item(self) -> Item {
        Item::poison(self.id, self.name, self.stats).with_value(self.value)
    }
}

/// Levels gained by a single XP grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelUps {
    pub leveled: i32,
    pub points_awarded: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    pub name: String,
    pub position: Position,
    pub attributes: AttributeSet,
    pub alive: bool,
    pub hitpoints: i32,
    pub max_hitpoints: i32,
    pub buffs: Vec<ActiveBuff>,
    pub poisons: Vec<ActivePoison>,
    pub xp: i32,
    pub next_level_xp: i32,
    pub level: i32,
    pub turn: i32,
    pub gold: i32,
    pub inventory: Container,
    pub defense_base: i32,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
    pub mob: bool,
    pub in_battle: bool,
    pub damage_dealt_multiplier: f64,
    pub damage_taken_multiplier: f64,
    pub hitpoint_cap_multiplier: f64,
    pub unspent_stat_points: i32,
    wieldpoints: [Option<Item>; 6],
}

impl Creature {
    #[must_use]
    pub fn new(name: impl Into<String>, position: Position, attributes: AttributeSet) -> Self {
        Self {
            name: name.into(),
            position,
            attributes,
            alive: true,
            hitpoints: PLAYER_INITIAL_HP,
            max_hitpoints: PLAYER_INITIAL_HP,
            buffs: Vec::new(),
            poisons: Vec::new(),
            xp: 0,
            next_level_xp: PLAYER_XP_FOR_LEVEL_2,
            level: 1,
            turn: 1,
            gold: 0,
            inventory: Container::new(PLAYER_INVENTORY_CAPACITY),
            defense_base: PLAYER_BASE_DEFENSE,
            attack_bonus: PLAYER_BASE_ATTACK_BONUS,
            defense_bonus: PLAYER_BASE_DEFENSE_BONUS,
            mob: false,
            in_battle: false,
            damage_dealt_multiplier: 1.0,
            damage_taken_multiplier: 1.0,
            hitpoint_cap_multiplier: 1.0,
            unspent_stat_points: 0,
            wieldpoints: Default::default(),
        }
    }

    #[must_use]
    pub const fn modifier(&self, attr: Attribute) -> i32 {
        self.attributes.modifier(attr)
    }

    /// Effective hitpoint cap, `floor(max × cap multiplier)` and at least 1.
    #[must_use]
    pub fn current_max_hitpoints(&self) -> i32 {
        floor_f64_to_i32(f64::from(self.max_hitpoints) * self.hitpoint_cap_multiplier).max(1)
    }

    pub fn enforce_hitpoint_cap(&mut self) {
        self.hitpoints = self.hitpoints.min(self.current_max_hitpoints());
    }

    /// Mob purse: `floor(roll(ceil(maxHP / 15) d20) × 3)`.
    ///
    /// # Errors
    ///
    /// Propagates a [`DiceError`] if the derived notation fails to parse.
    pub fn roll_mob_gold<R: Roller + ?Sized>(&mut self, roller: &mut R) -> Result<(), DiceError> {
        let count = ceil_f64_to_i32(
            f64::from(self.max_hitpoints) / f64::from(CREATURE_GOLD_SCALER),
        )
        .max(1);
        let rolled = roller.roll_named(&format!("{count}d20"))?;
        self.gold = rolled.saturating_mul(CREATURE_GOLD_MULTIPLIER);
        Ok(())
    }

    #[must_use]
    pub const fn wielded(&self, slot: WieldSlot) -> Option<&Item> {
        self.wieldpoints[slot.index()].as_ref()
    }

    /// Iterate equipped items in slot order.
    pub fn wielded_items(&self) -> impl Iterator<Item = (WieldSlot, &Item)> {
        WieldSlot::ALL
            .into_iter()
            .filter_map(|slot| self.wielded(slot).map(|item| (slot, item)))
    }

    #[must_use]
    pub fn weapon(&self) -> Option<&WeaponStats> {
        self.wielded(WieldSlot::Hands).and_then(Item::weapon_stats)
    }

    #[must_use]
    pub fn weapon_damage(&self) -> DiceSpec {
        self.weapon().map_or_else(
            || {
                DEFAULT_WEAPON_DAMAGE_DICE
                    .parse()
                    .unwrap_or_else(|_| unarmed_dice())
            },
            |weapon| weapon.damage().clone(),
        )
    }

    /// Critical threat range; monsters never go below 17.
    #[must_use]
    pub fn weapon_critical_range(&self) -> i32 {
        let Some(weapon) = self.weapon() else {
            return DEFAULT_WEAPON_CRITICAL_RANGE;
        };
        if self.mob {
            weapon.crit_range().max(MOB_CRITICAL_RANGE_MINIMUM)
        } else {
            weapon.crit_range()
        }
    }

    /// Critical multiplier; monsters never exceed 3.
    #[must_use]
    pub fn weapon_critical_multiplier(&self) -> i32 {
        let Some(weapon) = self.weapon() else {
            return DEFAULT_WEAPON_CRITICAL_MULTIPLIER;
        };
        if self.mob {
            weapon.crit_mult().min(MOB_CRITICAL_MULTIPLIER_MAXIMUM)
        } else {
            weapon.crit_mult()
        }
    }

    /// Swap the item in `slot`, keeping the bonus accumulators in step.
    /// Returns whatever was equipped before.
    pub fn wield(&mut self, slot: WieldSlot, item: Option<Item>) -> Option<Item> {
        let previous = self.wieldpoints[slot.index()].take();
        if let Some(current) = &previous {
            self.attack_bonus -= current.attack_bonus();
            self.defense_bonus -= current.defense_bonus();
        }
        if let Some(next) = &item {
            self.attack_bonus += next.attack_bonus();
            self.defense_bonus += next.defense_bonus();
        }
        self.wieldpoints[slot.index()] = item;
        previous
    }

    #[must_use]
    pub fn describe_wields(&self) -> String {
        let lines: Vec<String> = self
            .wielded_items()
            .map(|(slot, item)| format!("{slot}: {}", item.describe()))
            .collect();
        if lines.is_empty() {
            "Wielding nothing.".to_string()
        } else {
            lines.join("\n")
        }
    }

    /// Attach a buff item; non-buff items are handed back.
    ///
    /// # Errors
    ///
    /// Returns the item unchanged when it is not a buff.
    pub fn add_buff(&mut self, item: Item) -> Result<(), Item> {
        let ItemKind::Buff(stats) = item.kind else {
            return Err(item);
        };
        self.hitpoints += stats.hp_buff;
        self.attack_bonus += stats.attack_buff;
        self.defense_bonus += stats.defense_buff;
        self.buffs.push(TurnEffect {
            id: item.id,
            name: item.name,
            value: item.value,
            stats,
            expiry_turn: self.turn + stats.lifetime,
        });
        Ok(())
    }

    /// Attach a poison item; non-poison items are handed back.
    ///
    /// # Errors
    ///
    /// Returns the item unchanged when it is not a poison.
    pub fn add_poison(&mut self, item: Item) -> Result<(), Item> {
        let ItemKind::Poison(stats) = item.kind else {
            return Err(item);
        };
        self.poisons.push(TurnEffect {
            id: item.id,
            name: item.name,
            value: item.value,
            stats,
            expiry_turn: self.turn + stats.lifetime,
        });
        Ok(())
    }

    /// End-of-turn housekeeping: expire buffs, tick poisons, check death,
    /// enforce the cap and advance the turn counter.
    pub fn think(&mut self) {
        if !self.alive {
            return;
        }

        let turn = self.turn;
        let (expired, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.buffs).into_iter().partition(|b| b.has_expired(turn));
        self.buffs = kept;
        for buff in expired {
            self.hitpoints -= buff.stats.hp_buff;
            self.attack_bonus -= buff.stats.attack_buff;
            self.defense_bonus -= buff.stats.defense_buff;
            self.hitpoints = self.hitpoints.max(1);
        }

        for poison in &self.poisons {
            self.hitpoints -= poison.stats.damage_per_turn;
        }
        self.poisons.retain(|p| !p.has_expired(turn));

        if self.hitpoints <= 0 {
            self.alive = false;
            self.hitpoints = 0;
        } else {
            self.enforce_hitpoint_cap();
        }

        self.turn += 1;
    }

    /// Gold goes to the purse; anything else must fit in the inventory.
    ///
    /// # Errors
    ///
    /// Returns the item when the inventory is full.
    pub fn give(&mut self, item: Item) -> Result<(), Item> {
        if let Some(amount) = item.gold_amount() {
            self.gold += amount;
            return Ok(());
        }
        self.inventory.add(item)
    }

    pub const fn spend_gold(&mut self, amount: i32) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }

    /// Add XP, cascading through as many level-ups as it pays for.
    pub fn give_xp(&mut self, xp: i32) -> LevelUps {
        self.xp += xp;
        let mut leveled = 0;
        while self.xp >= self.next_level_xp && self.next_level_xp > 0 {
            self.level += 1;
            leveled += 1;
            self.unspent_stat_points += 1;
            self.next_level_xp = self.next_level_xp.saturating_mul(PLAYER_XP_GOAL_MULTIPLIER);
            self.max_hitpoints =
                floor_f64_to_i32(f64::from(self.max_hitpoints) * PLAYER_HP_PER_LEVEL_MULTIPLIER);
            let heal =
                floor_f64_to_i32(f64::from(self.max_hitpoints) * PLAYER_HP_HEAL_ON_LEVEL_UP);
            self.hitpoints = (self.hitpoints + heal).min(self.current_max_hitpoints());
        }
        self.enforce_hitpoint_cap();
        LevelUps {
            leveled,
            points_awarded: leveled,
        }
    }

    /// Apply an instant item and return the HP delta. Other items do nothing.
    pub fn apply_instant_item(&mut self, item: &Item) -> i32 {
        let ItemKind::InstantEffect { hp_boost, hp_drop } = item.kind else {
            return 0;
        };
        let outcome = apply_instant(
            hp_boost,
            hp_drop,
            self.hitpoints,
            self.current_max_hitpoints(),
        );
        self.hitpoints = outcome.hp;
        outcome.delta
    }

    pub fn grant_attribute_point(&mut self, points: i32) {
        self.unspent_stat_points += points.max(0);
    }

    pub fn spend_attribute_point(&mut self, attr: Attribute) -> bool {
        if self.unspent_stat_points <= 0 {
            return false;
        }
        self.attributes.modify(attr, 1);
        self.unspent_stat_points -= 1;
        if attr == Attribute::Con {
            self.max_hitpoints += PLAYER_CONSTITUTION_BONUS;
            self.hitpoints =
                (self.hitpoints + PLAYER_CONSTITUTION_BONUS).min(self.current_max_hitpoints());
        }
        self.enforce_hitpoint_cap();
        true
    }

    /// Healing items in inventory order.
    pub fn heal_items(&self) -> impl Iterator<Item = &Item> {
        self.inventory
            .items()
            .iter()
            .filter(|item| item.hp_boost().is_some_and(|boost| boost > 0))
    }

    /// The smallest heal that covers the missing HP, else the largest one.
    #[must_use]
    pub fn best_heal_item(&self) -> Option<&Item> {
        let needed = self.max_hitpoints - self.hitpoints;
        let mut heals: Vec<&Item> = self.heal_items().collect();
        heals.sort_by_key(|item| item.hp_boost().unwrap_or(0));
        heals
            .iter()
            .find(|item| item.hp_boost().unwrap_or(0) >= needed)
            .or_else(|| heals.last())
            .copied()
    }

    #[must_use]
    pub fn hitpoint_ratio(&self) -> f64 {
        f64::from(self.hitpoints) / f64::from(self.current_max_hitpoints().max(1))
    }
}

fn unarmed_dice() -> DiceSpec {
    DiceSpec::new(1, 6, 0)
}
