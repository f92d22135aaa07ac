//! Inventory, chest looting and shop purchases.
//!
//! Every command here is a soft operation: an unknown id, a full inventory
//! or an empty purse logs an outcome (or nothing) and leaves state alone.

use crate::attributes::Attribute;
use crate::constants::SHOP_DISCOUNT_FOR_CHARISMA;
use crate::item::{Item, ItemId};
use crate::loot::{ShopEntry, ShopEntryId, ShopServiceId};
use crate::narration::{Caption, LogEvent, LogLevel};
use crate::numbers::floor_f64_to_i32;
use crate::progression::BuildChoiceKind;

use super::{DungeonRun, FISTS_NAME, Overlay};

/// What the inventory screen offers for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryAction {
    Equip,
    Use,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryLine<'a> {
    pub item: &'a Item,
    pub action: InventoryAction,
}

/// A shop line as shown to the player, with its live description and the
/// price after the charisma discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopLine<'a> {
    pub entry: &'a ShopEntry,
    pub description: String,
    pub cost: i32,
}

impl ShopLine<'_> {
    #[must_use]
    pub const fn id(&self) -> ShopEntryId {
        self.entry.id()
    }
}

impl DungeonRun {
    #[must_use]
    pub fn inventory_items(&self) -> Vec<InventoryLine<'_>> {
        self.player
            .inventory
            .items()
            .iter()
            .map(|item| {
                let action = if item.is_wieldable() {
                    InventoryAction::Equip
                } else if item.hp_boost().is_some() {
                    InventoryAction::Use
                } else {
                    InventoryAction::None
                };
                InventoryLine { item, action }
            })
            .collect()
    }

    /// Wield an inventory item. Whatever it replaces goes back to the pack,
    /// except the bare fists the player starts with.
    pub fn equip_item(&mut self, id: ItemId) {
        let Some(slot) = self
            .player
            .inventory
            .get(id)
            .and_then(Item::wield_slot)
        else {
            return;
        };
        let Some(item) = self.player.inventory.remove(id) else {
            return;
        };
        let name = item.name.clone();
        let previous = self.player.wield(slot, Some(item));
        if let Some(previous) = previous
            && previous.name != FISTS_NAME
            && let Err(lost) = self.player.inventory.add(previous)
        {
            log::warn!("no room to stow {} after equipping {name}", lost.name);
        }
        self.log(&LogEvent::EquippedItem { item: &name, slot }, LogLevel::Success);
    }

    /// Drink or apply an instant-effect item.
    pub fn use_inventory_item(&mut self, id: ItemId) {
        if self
            .player
            .inventory
            .get(id)
            .and_then(Item::hp_boost)
            .is_none()
        {
            return;
        }
        let Some(item) = self.player.inventory.remove(id) else {
            return;
        };
        let healed = self.player.apply_instant_item(&item);
        self.log(
            &LogEvent::InventoryItemRestored {
                item: &item.name,
                healed,
            },
            LogLevel::Success,
        );
    }

    pub fn destroy_inventory_item(&mut self, id: ItemId) {
        let Some(item) = self.player.inventory.remove(id) else {
            return;
        };
        self.log(&LogEvent::DestroyedItem { item: &item.name }, LogLevel::Warn);
    }

    fn open_chest_index(&self) -> Option<usize> {
        let Overlay::Chest { chest_id } = self.overlay else {
            return None;
        };
        self.chests.iter().position(|entry| entry.id == chest_id)
    }

    /// Take one item out of the open chest.
    pub fn loot_item(&mut self, id: ItemId) {
        let Some(index) = self.open_chest_index() else {
            return;
        };
        let contents = &self.chests[index].chest.contents;
        let Some(item) = contents.get(id) else {
            return;
        };

        if let Some(amount) = item.gold_amount() {
            self.chests[index].chest.contents.remove(id);
            self.player.gold += amount;
            self.stats.gold_earned += amount;
            self.log(&LogEvent::LootedGold { amount }, LogLevel::Success);
            return;
        }
        if self.player.inventory.is_full() {
            self.log(&LogEvent::InventoryFull, LogLevel::Warn);
            return;
        }

        let Some(item) = self.chests[index].chest.contents.remove(id) else {
            return;
        };
        let name = item.name.clone();
        if let Err(lost) = self.player.inventory.add(item) {
            log::warn!("inventory refused {}", lost.name);
            return;
        }
        self.log(&LogEvent::LootedItem { item: &name }, LogLevel::Success);
    }

    /// Empty the open chest as far as the inventory allows. Gold always
    /// fits; leftovers stay behind in their original order.
    pub fn loot_all(&mut self) {
        let Some(index) = self.open_chest_index() else {
            return;
        };
        let ids: Vec<ItemId> = self.chests[index]
            .chest
            .contents
            .items()
            .iter()
            .map(|item| item.id)
            .collect();

        let mut leftovers = false;
        for id in ids {
            let contents = &self.chests[index].chest.contents;
            let Some(item) = contents.get(id) else {
                continue;
            };
            if let Some(amount) = item.gold_amount() {
                self.chests[index].chest.contents.remove(id);
                self.player.gold += amount;
                self.stats.gold_earned += amount;
                continue;
            }
            if self.player.inventory.is_full() {
                leftovers = true;
                continue;
            }
            if let Some(item) = self.chests[index].chest.contents.remove(id)
                && let Err(lost) = self.player.inventory.add(item)
            {
                log::warn!("inventory refused {}", lost.name);
            }
        }

        if leftovers {
            self.log(&LogEvent::InventoryFullChestLeftovers, LogLevel::Warn);
        } else {
            self.log(&LogEvent::LootedAllChest, LogLevel::Success);
        }
    }

    /// Price of a shop line after the charisma discount, never below 1.
    #[must_use]
    pub fn shop_entry_cost(&self, entry: &ShopEntry) -> i32 {
        let discount =
            SHOP_DISCOUNT_FOR_CHARISMA * f64::from(self.player.modifier(Attribute::Chr));
        let value = f64::from(entry.value);
        floor_f64_to_i32(value - value * discount).max(1)
    }

    /// The shop's stock with descriptions rendered against the current build.
    #[must_use]
    pub fn shop_entries(&self) -> Vec<ShopLine<'_>> {
        self.shop_stock
            .iter()
            .map(|entry| {
                let description = match entry.service() {
                    Some(service) => {
                        let latest = match service {
                            ShopServiceId::BonusPoint => None,
                            ShopServiceId::RemovePerk => self.build.latest(BuildChoiceKind::Perk),
                            ShopServiceId::RemoveGambit => {
                                self.build.latest(BuildChoiceKind::Gambit)
                            }
                        };
                        self.narrator.describe(&Caption::ServiceDescription {
                            service,
                            latest: latest.map(|choice| choice.name),
                        })
                    }
                    None => entry.item().map(Item::describe).unwrap_or_default(),
                };
                ShopLine {
                    entry,
                    description,
                    cost: self.shop_entry_cost(entry),
                }
            })
            .collect()
    }

    /// Buy a shop line. Services must take effect before any gold changes
    /// hands; items need a free inventory slot.
    pub fn buy_shop_entry(&mut self, id: ShopEntryId) {
        let Some(index) = self
            .shop_stock
            .iter()
            .position(|entry| entry.id() == id && !entry.sold)
        else {
            return;
        };
        let cost = self.shop_entry_cost(&self.shop_stock[index]);
        if self.player.gold < cost {
            self.log(&LogEvent::NotEnoughGold, LogLevel::Warn);
            return;
        }

        if let Some(service) = self.shop_stock[index].service() {
            if !self.apply_shop_service(service) {
                return;
            }
        } else {
            let Some(item) = self.shop_stock[index].item() else {
                return;
            };
            if item.is_gold() {
                self.log(&LogEvent::GoldCannotBePurchased, LogLevel::Warn);
                return;
            }
            if self.player.inventory.is_full() {
                self.log(&LogEvent::InventoryFull, LogLevel::Warn);
                return;
            }
        }

        if !self.player.spend_gold(cost) {
            return;
        }
        self.stats.gold_spent += cost;
        let entry = &mut self.shop_stock[index];
        if let Some(item) = entry.sell()
            && let Err(lost) = self.player.inventory.add(item)
        {
            log::warn!("bought {} but the inventory refused it", lost.name);
        }
        let name = self.shop_stock[index].name.clone();
        self.log(&LogEvent::PurchasedEntry { name: &name, cost }, LogLevel::Success);
    }

    fn apply_shop_service(&mut self, service: ShopServiceId) -> bool {
        match service {
            ShopServiceId::BonusPoint => {
                self.player.grant_attribute_point(1);
                self.log(&LogEvent::BoughtRespecToken, LogLevel::Success);
                true
            }
            ShopServiceId::RemovePerk => {
                match self.build.remove_latest(BuildChoiceKind::Perk, &mut self.player) {
                    Some(removed) => {
                        self.log(&LogEvent::RemovedPerk { name: removed.name }, LogLevel::Success);
                        true
                    }
                    None => {
                        self.log(&LogEvent::NoActivePerkToRemove, LogLevel::Warn);
                        false
                    }
                }
            }
            ShopServiceId::RemoveGambit => {
                match self.build.remove_latest(BuildChoiceKind::Gambit, &mut self.player) {
                    Some(removed) => {
                        self.log(
                            &LogEvent::RemovedGambit { name: removed.name },
                            LogLevel::Success,
                        );
                        true
                    }
                    None => {
                        self.log(&LogEvent::NoActiveGambitToRemove, LogLevel::Warn);
                        false
                    }
                }
            }
        }
    }
}
