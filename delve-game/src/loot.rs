//! Consumables, generated gear pools and shop stock.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::constants::{
    BANDAGES_GOLD_VALUE, BANDAGES_HEAL_HP, COLOSSAL_HEALTH_POTION_GOLD_VALUE,
    COLOSSAL_HEALTH_POTION_HEAL_HP, HEALTH_POTION_GOLD_VALUE, HEALTH_POTION_HEAL_HP,
    HUGE_HEALTH_POTION_GOLD_VALUE, HUGE_HEALTH_POTION_HEAL_HP, INSTAHEAL_GOLD_VALUE,
    INSTAHEAL_HEAL_HP, ITEM_ARMOR_CHALLENGE_ROLL_MAX, ITEM_ARMOR_CHALLENGE_ROLL_MIN,
    ITEM_ARMOR_VALUE_ATTACK_WEIGHT, ITEM_ARMOR_VALUE_DEFENSE_WEIGHT,
    ITEM_DEFAULT_VALUE_MULTIPLIER, ITEM_POOL_GENERATION_COUNT, ITEM_SPECIAL_ROLL_MIN,
    ITEM_SPECIAL_VALUE_MULTIPLIER, ITEM_WEAPON_CHALLENGE_ROLL_MAX, ITEM_WEAPON_CHALLENGE_ROLL_MIN,
    ITEM_WEAPON_MAX_DAMAGE_ROLL_MAX, ITEM_WEAPON_MAX_DAMAGE_ROLL_MIN,
    ITEM_WEAPON_VALUE_DIE_MULTIPLIER, ITEM_WEAPON_VALUE_DIE_SIDES, LARGE_HEALTH_POTION_GOLD_VALUE,
    LARGE_HEALTH_POTION_HEAL_HP, SHOP_SERVICE_COST_BONUS_POINT, SHOP_SERVICE_COST_REMOVE_GAMBIT,
    SHOP_SERVICE_COST_REMOVE_PERK,
};
use crate::dice::{DiceError, Roller};
use crate::item::{EntityId, IdAllocator, Item, ItemId, WieldSlot};
use crate::numbers::floor_f64_to_i32;
use crate::procgen::{NameGenerator, create_armor, create_weapon};
use crate::rng::SeededRandom;

/// Healing consumables, from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Potion {
    Bandages,
    Health,
    Large,
    Huge,
    Colossal,
    Instaheal,
}

impl Potion {
    pub const ALL: [Self; 6] = [
        Self::Bandages,
        Self::Health,
        Self::Large,
        Self::Huge,
        Self::Colossal,
        Self::Instaheal,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bandages => "Bandages",
            Self::Health => "Health Potion",
            Self::Large => "Large Health Potion",
            Self::Huge => "Huge Health Potion",
            Self::Colossal => "Colossal Health Potion",
            Self::Instaheal => "Instaheal",
        }
    }

    #[must_use]
    pub const fn heal(self) -> i32 {
        match self {
            Self::Bandages => BANDAGES_HEAL_HP,
            Self::Health => HEALTH_POTION_HEAL_HP,
            Self::Large => LARGE_HEALTH_POTION_HEAL_HP,
            Self::Huge => HUGE_HEALTH_POTION_HEAL_HP,
            Self::Colossal => COLOSSAL_HEALTH_POTION_HEAL_HP,
            Self::Instaheal => INSTAHEAL_HEAL_HP,
        }
    }

    #[must_use]
    pub const fn gold_value(self) -> i32 {
        match self {
            Self::Bandages => BANDAGES_GOLD_VALUE,
            Self::Health => HEALTH_POTION_GOLD_VALUE,
            Self::Large => LARGE_HEALTH_POTION_GOLD_VALUE,
            Self::Huge => HUGE_HEALTH_POTION_GOLD_VALUE,
            Self::Colossal => COLOSSAL_HEALTH_POTION_GOLD_VALUE,
            Self::Instaheal => INSTAHEAL_GOLD_VALUE,
        }
    }

    /// A fresh instant item with its own id.
    pub fn make(self, ids: &mut IdAllocator) -> Item {
        Item::instant(ids.item(), self.name(), self.heal(), 0).with_value(self.gold_value())
    }
}

/// Weapons and armor rolled once per floor, each sorted by value, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPools {
    pub weapons: Vec<Item>,
    pub armors: Vec<Item>,
}

impl ItemPools {
    /// Take the most valuable remaining weapon.
    pub fn take_weapon(&mut self) -> Option<Item> {
        (!self.weapons.is_empty()).then(|| self.weapons.remove(0))
    }

    /// Take the most valuable remaining armor piece.
    pub fn take_armor(&mut self) -> Option<Item> {
        (!self.armors.is_empty()).then(|| self.armors.remove(0))
    }
}

/// Roll the floor's gear pools.
///
/// Each draw first decides whether the piece is special (worth triple), then
/// picks a slot; hands become weapons and every other slot becomes armor.
///
/// # Errors
///
/// Propagates a [`DiceError`] from weapon creation.
pub fn generate_item_pools(
    rng: &mut SeededRandom,
    names: &mut NameGenerator,
    ids: &mut IdAllocator,
) -> Result<ItemPools, DiceError> {
    let mut pools = ItemPools::default();

    for _ in 0..ITEM_POOL_GENERATION_COUNT {
        let special = rng.d20() >= ITEM_SPECIAL_ROLL_MIN;
        let multiplier = if special {
            ITEM_SPECIAL_VALUE_MULTIPLIER
        } else {
            ITEM_DEFAULT_VALUE_MULTIPLIER
        };
        let slot = rng.choose(&WieldSlot::ALL).unwrap_or(WieldSlot::Hands);
        let name = names.generate(rng, slot, special);

        if slot == WieldSlot::Hands {
            let max_damage = rng.roll(ITEM_WEAPON_MAX_DAMAGE_ROLL_MIN, ITEM_WEAPON_MAX_DAMAGE_ROLL_MAX);
            let level = rng.roll(ITEM_WEAPON_CHALLENGE_ROLL_MIN, ITEM_WEAPON_CHALLENGE_ROLL_MAX);
            let mut weapon = create_weapon(ids, name, max_damage, level, rng)?;
            let base = rng.roll(1, ITEM_WEAPON_VALUE_DIE_SIDES) * ITEM_WEAPON_VALUE_DIE_MULTIPLIER
                + weapon.attack_bonus()
                + weapon.defense_bonus();
            weapon.value = floor_f64_to_i32(f64::from(base) * multiplier);
            pools.weapons.push(weapon);
        } else {
            let level = rng.roll(ITEM_ARMOR_CHALLENGE_ROLL_MIN, ITEM_ARMOR_CHALLENGE_ROLL_MAX);
            let mut armor = create_armor(ids, name, slot, level, rng);
            let base = armor.attack_bonus() * ITEM_ARMOR_VALUE_ATTACK_WEIGHT
                + armor.defense_bonus() * ITEM_ARMOR_VALUE_DEFENSE_WEIGHT;
            armor.value = floor_f64_to_i32(f64::from(base) * multiplier);
            pools.armors.push(armor);
        }
    }

    // Stable, so equal values keep generation order.
    pools.weapons.sort_by_key(|item| Reverse(item.value));
    pools.armors.sort_by_key(|item| Reverse(item.value));
    Ok(pools)
}

/// Non-item purchases offered by every shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShopServiceId {
    BonusPoint,
    RemovePerk,
    RemoveGambit,
}

impl ShopServiceId {
    pub const ALL: [Self; 3] = [Self::BonusPoint, Self::RemovePerk, Self::RemoveGambit];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BonusPoint => "Stat Respec Token",
            Self::RemovePerk => "Perk Reforge",
            Self::RemoveGambit => "Gambit Cleanse",
        }
    }

    #[must_use]
    pub const fn base_cost(self) -> i32 {
        match self {
            Self::BonusPoint => SHOP_SERVICE_COST_BONUS_POINT,
            Self::RemovePerk => SHOP_SERVICE_COST_REMOVE_PERK,
            Self::RemoveGambit => SHOP_SERVICE_COST_REMOVE_GAMBIT,
        }
    }
}

/// What a shop line sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShopGoods {
    Service { id: EntityId, service: ShopServiceId },
    Item { item: Item },
    /// An item line whose item now belongs to the player.
    #[serde(rename = "sold-item")]
    SoldItem { id: ItemId },
}

/// Stable handle used to buy a shop line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopEntryId {
    Service(EntityId),
    Item(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopEntry {
    pub name: String,
    pub value: i32,
    pub sold: bool,
    pub goods: ShopGoods,
}

impl ShopEntry {
    #[must_use]
    pub const fn id(&self) -> ShopEntryId {
        match &self.goods {
            ShopGoods::Service { id, .. } => ShopEntryId::Service(*id),
            ShopGoods::Item { item } => ShopEntryId::Item(item.id),
            ShopGoods::SoldItem { id } => ShopEntryId::Item(*id),
        }
    }

    #[must_use]
    pub const fn service(&self) -> Option<ShopServiceId> {
        match &self.goods {
            ShopGoods::Service { service, .. } => Some(*service),
            ShopGoods::Item { .. } | ShopGoods::SoldItem { .. } => None,
        }
    }

    #[must_use]
    pub const fn item(&self) -> Option<&Item> {
        match &self.goods {
            ShopGoods::Item { item } => Some(item),
            ShopGoods::Service { .. } | ShopGoods::SoldItem { .. } => None,
        }
    }

    /// Mark the line sold. An item line hands its item over.
    pub fn sell(&mut self) -> Option<Item> {
        self.sold = true;
        let id = self.item()?.id;
        match std::mem::replace(&mut self.goods, ShopGoods::SoldItem { id }) {
            ShopGoods::Item { item } => Some(item),
            _ => None,
        }
    }
}

/// Shop lines: the three services first, then one line per item.
pub fn create_shop_stock(items: Vec<Item>, ids: &mut IdAllocator) -> Vec<ShopEntry> {
    let services = ShopServiceId::ALL.into_iter().map(|service| ShopEntry {
        name: service.name().to_string(),
        value: service.base_cost(),
        sold: false,
        goods: ShopGoods::Service {
            id: ids.entity(),
            service,
        },
    });
    let mut stock: Vec<ShopEntry> = services.collect();
    stock.extend(items.into_iter().map(|item| ShopEntry {
        name: item.name.clone(),
        value: item.value,
        sold: false,
        goods: ShopGoods::Item { item },
    }));
    stock
}
