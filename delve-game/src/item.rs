//! Item variants, id allocation and bounded containers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    BUFF_DEFAULT_ATTACK, BUFF_DEFAULT_DEFENSE, BUFF_DEFAULT_HP, CHEST_DEFAULT_CAPACITY,
    DEFAULT_WEAPON_ATTACK_BONUS, DEFAULT_WEAPON_CRITICAL_MULTIPLIER,
    DEFAULT_WEAPON_CRITICAL_RANGE, DEFAULT_WEAPON_DEFENSE_BONUS, PLAYER_CRIT_MINIMUM_MULTIPLIER,
    POISON_DEFAULT_DAMAGE_PER_TURN, TURN_EFFECT_DEFAULT_LIFETIME, WEAPON_CRIT_MAXIMUM_ROLL,
};
use crate::dice::DiceSpec;
use crate::world::Position;

/// Unique, increasing item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Identifier for live entities (mobs, chests, shop services).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity-{}", self.0)
    }
}

/// Run-owned counters for item and entity ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdAllocator {
    next_item_id: u64,
    next_entity_id: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_item_id: 1,
            next_entity_id: 1,
        }
    }
}

impl IdAllocator {
    /// Resume counters from persisted values, never going below 1.
    #[must_use]
    pub fn resume(next_item_id: u64, next_entity_id: u64) -> Self {
        Self {
            next_item_id: next_item_id.max(1),
            next_entity_id: next_entity_id.max(1),
        }
    }

    pub const fn item(&mut self) -> ItemId {
        let id = self.next_item_id;
        self.next_item_id += 1;
        ItemId(id)
    }

    pub const fn entity(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        EntityId(id)
    }

    #[must_use]
    pub const fn next_item_id(&self) -> u64 {
        self.next_item_id
    }

    #[must_use]
    pub const fn next_entity_id(&self) -> u64 {
        self.next_entity_id
    }
}

/// Equipment slots in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WieldSlot {
    Head,
    Chest,
    Arms,
    Hands,
    Legs,
    Feet,
}

impl WieldSlot {
    pub const ALL: [Self; 6] = [
        Self::Head,
        Self::Chest,
        Self::Arms,
        Self::Hands,
        Self::Legs,
        Self::Feet,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Chest => "chest",
            Self::Arms => "arms",
            Self::Hands => "hands",
            Self::Legs => "legs",
            Self::Feet => "feet",
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Head => 0,
            Self::Chest => 1,
            Self::Arms => 2,
            Self::Hands => 3,
            Self::Legs => 4,
            Self::Feet => 5,
        }
    }
}

impl fmt::Display for WieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weapon statistics. The critical multiplier is never below 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WeaponRecord", into = "WeaponRecord")]
pub struct WeaponStats {
    crit_range: i32,
    crit_mult: i32,
    attack_bonus: i32,
    defense_bonus: i32,
    damage: DiceSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeaponRecord {
    crit_range: i32,
    crit_mult: i32,
    attack_bonus: i32,
    defense_bonus: i32,
    damage_dice: DiceSpec,
}

impl From<WeaponRecord> for WeaponStats {
    fn from(record: WeaponRecord) -> Self {
        Self::new(
            record.crit_range,
            record.crit_mult,
            record.attack_bonus,
            record.defense_bonus,
            record.damage_dice,
        )
    }
}

impl From<WeaponStats> for WeaponRecord {
    fn from(stats: WeaponStats) -> Self {
        Self {
            crit_range: stats.crit_range,
            crit_mult: stats.crit_mult,
            attack_bonus: stats.attack_bonus,
            defense_bonus: stats.defense_bonus,
            damage_dice: stats.damage,
        }
    }
}

impl WeaponStats {
    #[must_use]
    pub fn new(
        crit_range: i32,
        crit_mult: i32,
        attack_bonus: i32,
        defense_bonus: i32,
        damage: DiceSpec,
    ) -> Self {
        Self {
            crit_range,
            crit_mult: crit_mult.max(PLAYER_CRIT_MINIMUM_MULTIPLIER),
            attack_bonus,
            defense_bonus,
            damage,
        }
    }

    /// Stats of an unnamed default weapon with the given dice.
    #[must_use]
    pub fn with_dice(damage: DiceSpec) -> Self {
        Self::new(
            DEFAULT_WEAPON_CRITICAL_RANGE,
            DEFAULT_WEAPON_CRITICAL_MULTIPLIER,
            DEFAULT_WEAPON_ATTACK_BONUS,
            DEFAULT_WEAPON_DEFENSE_BONUS,
            damage,
        )
    }

    #[must_use]
    pub const fn crit_range(&self) -> i32 {
        self.crit_range
    }

    #[must_use]
    pub const fn crit_mult(&self) -> i32 {
        self.crit_mult
    }

    #[must_use]
    pub const fn damage(&self) -> &DiceSpec {
        &self.damage
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuffStats {
    pub hp_buff: i32,
    pub attack_buff: i32,
    pub defense_buff: i32,
    pub lifetime: i32,
}

impl Default for BuffStats {
    fn default() -> Self {
        Self {
            hp_buff: BUFF_DEFAULT_HP,
            attack_buff: BUFF_DEFAULT_ATTACK,
            defense_buff: BUFF_DEFAULT_DEFENSE,
            lifetime: TURN_EFFECT_DEFAULT_LIFETIME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoisonStats {
    pub damage_per_turn: i32,
    pub lifetime: i32,
}

impl Default for PoisonStats {
    fn default() -> Self {
        Self {
            damage_per_turn: POISON_DEFAULT_DAMAGE_PER_TURN,
            lifetime: TURN_EFFECT_DEFAULT_LIFETIME,
        }
    }
}

/// Closed set of item variants, tagged by `kind` when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemKind {
    Gold {
        amount: i32,
    },
    #[serde(rename_all = "camelCase")]
    Armor {
        slot: WieldSlot,
        attack_bonus: i32,
        defense_bonus: i32,
    },
    Weapon(WeaponStats),
    #[serde(rename = "instant", rename_all = "camelCase")]
    InstantEffect {
        hp_boost: i32,
        hp_drop: i32,
    },
    Poison(PoisonStats),
    Buff(BuffStats),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub value: i32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    fn build(id: ItemId, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id,
            name: name.into(),
            value: 1,
            kind,
        }
    }

    #[must_use]
    pub fn gold(id: ItemId, amount: i32) -> Self {
        let mut item = Self::build(id, "Gold", ItemKind::Gold { amount });
        item.value = amount;
        item
    }

    #[must_use]
    pub fn armor(
        id: ItemId,
        slot: WieldSlot,
        name: impl Into<String>,
        attack_bonus: i32,
        defense_bonus: i32,
    ) -> Self {
        Self::build(
            id,
            name,
            ItemKind::Armor {
                slot,
                attack_bonus,
                defense_bonus,
            },
        )
    }

    #[must_use]
    pub fn weapon(id: ItemId, name: impl Into<String>, stats: WeaponStats) -> Self {
        Self::build(id, name, ItemKind::Weapon(stats))
    }

    #[must_use]
    pub fn instant(id: ItemId, name: impl Into<String>, hp_boost: i32, hp_drop: i32) -> Self {
        Self::build(id, name, ItemKind::InstantEffect { hp_boost, hp_drop })
    }

    #[must_use]
    pub fn poison(id: ItemId, name: impl Into<String>, stats: PoisonStats) -> Self {
        Self::build(id, name, ItemKind::Poison(stats))
    }

    #[must_use]
    pub fn buff(id: ItemId, name: impl Into<String>, stats: BuffStats) -> Self {
        Self::build(id, name, ItemKind::Buff(stats))
    }

    #[must_use]
    pub const fn with_value(mut self, value: i32) -> Self {
        self.value = value;
        self
    }

    /// Slot this item occupies when wielded, if it is wieldable at all.
    #[must_use]
    pub const fn wield_slot(&self) -> Option<WieldSlot> {
        match &self.kind {
            ItemKind::Armor { slot, .. } => Some(*slot),
            ItemKind::Weapon(_) => Some(WieldSlot::Hands),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_wieldable(&self) -> bool {
        self.wield_slot().is_some()
    }

    #[must_use]
    pub const fn is_gold(&self) -> bool {
        matches!(self.kind, ItemKind::Gold { .. })
    }

    #[must_use]
    pub const fn attack_bonus(&self) -> i32 {
        match &self.kind {
            ItemKind::Armor { attack_bonus, .. } => *attack_bonus,
            ItemKind::Weapon(stats) => stats.attack_bonus,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn defense_bonus(&self) -> i32 {
        match &self.kind {
            ItemKind::Armor { defense_bonus, .. } => *defense_bonus,
            ItemKind::Weapon(stats) => stats.defense_bonus,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn weapon_stats(&self) -> Option<&WeaponStats> {
        match &self.kind {
            ItemKind::Weapon(stats) => Some(stats),
            _ => None,
        }
    }

    /// Heal amount of an instant item, `None` for everything else.
    #[must_use]
    pub const fn hp_boost(&self) -> Option<i32> {
        match &self.kind {
            ItemKind::InstantEffect { hp_boost, .. } => Some(*hp_boost),
            _ => None,
        }
    }

    #[must_use]
    pub const fn gold_amount(&self) -> Option<i32> {
        match &self.kind {
            ItemKind::Gold { amount } => Some(*amount),
            _ => None,
        }
    }

    /// One-line shop and inventory description.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            ItemKind::Gold { amount } => format!("{amount} gold"),
            ItemKind::Armor {
                slot,
                attack_bonus,
                defense_bonus,
            } => format!(
                "Armor {} ({slot}) +{attack_bonus} ATK +{defense_bonus} DEF",
                self.name
            ),
            ItemKind::Weapon(stats) => format!(
                "{} {} crit {}-{WEAPON_CRIT_MAXIMUM_ROLL} x{}",
                self.name, stats.damage, stats.crit_range, stats.crit_mult
            ),
            ItemKind::InstantEffect { hp_boost, .. } => {
                format!("{} heals {hp_boost} HP", self.name)
            }
            ItemKind::Poison(stats) => format!(
                "{} deals {}/turn for {} turns",
                self.name, stats.damage_per_turn, stats.lifetime
            ),
            ItemKind::Buff(stats) => format!(
                "{} +{} HP +{} ATK +{} DEF ({} turns)",
                self.name, stats.hp_buff, stats.attack_buff, stats.defense_buff, stats.lifetime
            ),
        }
    }
}

/// Outcome of applying an instant item to a hitpoint pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantOutcome {
    pub hp: i32,
    pub delta: i32,
}

/// Apply an instant boost/drop, clamped to `[0, max_hp]`.
#[must_use]
pub fn apply_instant(hp_boost: i32, hp_drop: i32, current_hp: i32, max_hp: i32) -> InstantOutcome {
    let next = current_hp
        .saturating_add(hp_boost)
        .saturating_sub(hp_drop)
        .max(0)
        .min(max_hp);
    InstantOutcome {
        hp: next,
        delta: next - current_hp,
    }
}

/// Ordered, capacity-bounded item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    capacity: usize,
    items: Vec<Item>,
}

impl Container {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Append an item, handing it back when the container is full.
    ///
    /// # Errors
    ///
    /// Returns the rejected item when the container is at capacity.
    pub fn add(&mut self, item: Item) -> Result<(), Item> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove by id; absent ids are a no-op.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let idx = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Sum of item values.
    #[must_use]
    pub fn total_value(&self) -> i32 {
        self.items.iter().map(|item| item.value).sum()
    }

    /// Sum of gold amounts held.
    #[must_use]
    pub fn gold_total(&self) -> i32 {
        self.items.iter().filter_map(Item::gold_amount).sum()
    }
}

/// A chest placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chest {
    pub position: Position,
    pub contents: Container,
}

impl Chest {
    #[must_use]
    pub const fn new(position: Position, capacity: usize) -> Self {
        Self {
            position,
            contents: Container::new(capacity),
        }
    }

    #[must_use]
    pub const fn with_default_capacity(position: Position) -> Self {
        Self::new(position, CHEST_DEFAULT_CAPACITY)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dice(notation: &str) -> DiceSpec {
        notation.parse().expect("valid dice")
    }

    #[test]
    fn allocator_hands_out_increasing_ids() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.item(), ItemId(1));
        assert_eq!(ids.item(), ItemId(2));
        assert_eq!(ids.entity(), EntityId(1));
        assert_eq!(ids.next_item_id(), 3);
        assert_eq!(IdAllocator::resume(0, 0), IdAllocator::default());
    }

    #[test]
    fn weapon_crit_multiplier_is_clamped() {
        let stats = WeaponStats::new(19, 1, 0, 0, dice("1d4"));
        assert_eq!(stats.crit_mult(), 2);
        let loaded: WeaponStats = serde_json::from_str(
            r#"{"critRange":20,"critMult":0,"attackBonus":1,"defenseBonus":0,"damageDice":"1d6"}"#,
        )
        .expect("weapon json");
        assert_eq!(loaded.crit_mult(), 2);
    }

    #[test]
    fn gold_value_tracks_amount() {
        let gold = Item::gold(ItemId(7), 42);
        assert_eq!(gold.value, 42);
        assert_eq!(gold.describe(), "42 gold");
        assert!(gold.is_gold());
        assert_eq!(gold.wield_slot(), None);
    }

    #[test]
    fn descriptions_follow_variant() {
        let armor = Item::armor(ItemId(1), WieldSlot::Feet, "Leather Boots", 0, 1);
        assert_eq!(armor.describe(), "Armor Leather Boots (feet) +0 ATK +1 DEF");
        let weapon = Item::weapon(
            ItemId(2),
            "Fists",
            WeaponStats::new(19, 3, 0, 0, dice("1d10")),
        );
        assert_eq!(weapon.describe(), "Fists 1d10 crit 19-20 x3");
        assert_eq!(weapon.wield_slot(), Some(WieldSlot::Hands));
        let buff = Item::buff(ItemId(3), "Fervor", BuffStats::default());
        assert_eq!(buff.describe(), "Fervor +5 HP +2 ATK +2 DEF (5 turns)");
    }

    #[test]
    fn instant_application_clamps() {
        assert_eq!(apply_instant(25, 0, 90, 100), InstantOutcome { hp: 100, delta: 10 });
        assert_eq!(apply_instant(0, 50, 20, 100), InstantOutcome { hp: 0, delta: -20 });
    }

    #[test]
    fn container_respects_capacity() {
        let mut bag = Container::new(2);
        assert!(bag.add(Item::gold(ItemId(1), 1)).is_ok());
        assert!(bag.add(Item::gold(ItemId(2), 1)).is_ok());
        let rejected = bag.add(Item::gold(ItemId(3), 1));
        assert_eq!(rejected.map_err(|item| item.id), Err(ItemId(3)));
        assert_eq!(bag.count(), 2);
        assert!(bag.is_full());
    }

    #[test]
    fn container_remove_missing_is_noop() {
        let mut bag = Container::new(3);
        assert!(bag.add(Item::gold(ItemId(1), 5)).is_ok());
        assert!(bag.remove(ItemId(99)).is_none());
        assert_eq!(bag.count(), 1);
        assert_eq!(bag.remove(ItemId(1)).map(|item| item.value), Some(5));
        assert!(bag.is_empty());
    }

    #[test]
    fn items_serialize_with_kind_tag() {
        let potion = Item::instant(ItemId(4), "Health Potion", 25, 0).with_value(50);
        let json = serde_json::to_value(&potion).expect("serialize");
        assert_eq!(json["kind"], "instant");
        assert_eq!(json["hpBoost"], 25);
        assert_eq!(json["id"], 4);
        let back: Item = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, potion);
    }
}
