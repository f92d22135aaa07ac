//! Player-facing run log and the text catalog that renders it.
//!
//! The simulation never formats prose itself. It emits [`LogEvent`] values
//! and short [`Caption`] lookups, and an injected [`Narrator`] turns them into
//! strings. [`EnglishNarrator`] is the stock catalog.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::attributes::Attribute;
use crate::combat::EnemyStyle;
use crate::constants::{LOG_LIMIT, SHOP_REWARD_FALLBACK_GOLD, SHOP_REWARD_HEAL_FALLBACK_RATIO};
use crate::item::WieldSlot;
use crate::loot::ShopServiceId;
use crate::numbers::floor_f64_to_i32;
use crate::progression::{BuildChoiceKind, ShopRewardId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub level: LogLevel,
}

impl LogEntry {
    #[must_use]
    pub fn new(text: impl Into<String>, level: LogLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

/// Bounded ring of the most recent log entries, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunLog {
    entries: VecDeque<LogEntry>,
}

impl RunLog {
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > LOG_LIMIT {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Replace the contents, keeping only the newest entries that fit.
    pub fn restore(&mut self, entries: Vec<LogEntry>) {
        self.entries.clear();
        for entry in entries {
            self.push(entry);
        }
    }
}

/// Everything the simulation can say, with its arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogEvent<'a> {
    // Combat
    PlayerCritical { attacker: &'a str, multiplier: i32 },
    PlayerCriticalMoment { attacker: &'a str, multiplier: i32 },
    EnemyCritical { attacker: &'a str },
    EnemyCriticalDowngrade { attacker: &'a str },
    ReducedDamageHit { attacker: &'a str, armor_class: i32, total: i32 },
    Hit { attacker: &'a str, total: i32, armor_class: i32 },
    Damage { attacker: &'a str, damage: i32, defender: &'a str, remaining_hp: i32 },
    Falls { defender: &'a str },
    OffensiveStance,
    DefensiveStance,
    FleeSuccess { score: i32, dc: i32 },
    FleeSuccessMoment { score: i32, dc: i32 },
    FleeFail { score: i32, dc: i32 },
    FleeFailMoment { score: i32, dc: i32 },
    Heal { item: &'a str, amount: i32 },
    NoHealingItem,
    NoHealingMoment,
    EnemyStyle { enemy: &'a str, style: EnemyStyle },

    // Exploration
    DescendFloor { floor: i32 },
    BreathRecover { healed: i32 },
    DangerWarning { threat: i32 },
    EngageEnemy { enemy: &'a str },
    OpenChest,
    EnterBossLair,
    EnterShopRoom,
    ShopkeeperTuneup,
    EnemyAttacks { enemy: &'a str },
    DangerSenseProtected,
    Retreat,

    // Progression
    WelcomeLevel { level: i32, points: i32 },
    LootKillRewards { gold: i32, xp: i32 },
    BossDownChooseReward,
    EnemiesRemain { count: usize, floor: i32 },
    DescendWithoutModifier,
    SelectedBuildChoice { kind: BuildChoiceKind, name: &'a str },
    ShopRewardBonusPoint,
    ShopRewardRemovedPerk { name: &'a str },
    ShopRewardPerkFallbackGold,
    ShopRewardRemovedGambit { name: &'a str },
    ShopRewardGambitFallbackHeal { amount: i32 },
    LevelUpSpent { attribute: Attribute },

    // Inventory, chests and shop
    EquippedItem { item: &'a str, slot: WieldSlot },
    InventoryItemRestored { item: &'a str, healed: i32 },
    DestroyedItem { item: &'a str },
    LootedGold { amount: i32 },
    LootedItem { item: &'a str },
    InventoryFull,
    InventoryFullChestLeftovers,
    LootedAllChest,
    NotEnoughGold,
    BoughtRespecToken,
    NoActivePerkToRemove,
    RemovedPerk { name: &'a str },
    NoActiveGambitToRemove,
    RemovedGambit { name: &'a str },
    PurchasedEntry { name: &'a str, cost: i32 },
    GoldCannotBePurchased,
}

/// Short labels and descriptions shown next to choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caption<'a> {
    AttributeLabel(Attribute),
    AttributeDescription(Attribute),
    EnemyStyle(EnemyStyle),
    BuildKind(BuildChoiceKind),
    /// `latest` names the perk or gambit a removal service would target.
    ServiceDescription {
        service: ShopServiceId,
        latest: Option<&'a str>,
    },
    RewardTitle(ShopRewardId),
    RewardDescription {
        reward: ShopRewardId,
        latest: Option<&'a str>,
    },
}

/// Renders simulation events into player-facing text.
pub trait Narrator: std::fmt::Debug {
    fn narrate(&self, event: &LogEvent<'_>) -> String;

    fn describe(&self, caption: &Caption<'_>) -> String;

    /// Lines logged when a run starts.
    fn intro(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishNarrator;

fn plural(count: i32, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

impl Narrator for EnglishNarrator {
    #[allow(clippy::too_many_lines)]
    fn narrate(&self, event: &LogEvent<'_>) -> String {
        match *event {
            LogEvent::PlayerCritical {
                attacker,
                multiplier,
            } => format!("{attacker} rolls a CRITICAL hit! Damage x{multiplier}."),
            LogEvent::PlayerCriticalMoment {
                attacker,
                multiplier,
            } => format!("{attacker} rolls a critical hit! Damage multiplied by {multiplier}x."),
            LogEvent::EnemyCritical { attacker } => format!("{attacker} lands a CRITICAL hit!"),
            LogEvent::EnemyCriticalDowngrade { attacker } => {
                format!("{attacker} almost crit, but only lands a normal hit.")
            }
            LogEvent::ReducedDamageHit {
                attacker,
                armor_class,
                total,
            } => format!(
                "{attacker} fails to beat AC {armor_class} ({total}) and deals reduced damage."
            ),
            LogEvent::Hit {
                attacker,
                total,
                armor_class,
            } => format!("{attacker} hits ({total} vs AC {armor_class})."),
            LogEvent::Damage {
                attacker,
                damage,
                defender,
                remaining_hp,
            } => format!(
                "{attacker} deals {damage} damage to {defender} (now {remaining_hp} HP)."
            ),
            LogEvent::Falls { defender } => format!("{defender} falls."),
            LogEvent::OffensiveStance => "You commit to an offensive strike.".to_string(),
            LogEvent::DefensiveStance => "You take a defensive stance.".to_string(),
            LogEvent::FleeSuccess { score, dc } => format!("You escape (roll {score} vs {dc})."),
            LogEvent::FleeSuccessMoment { score, dc } => {
                format!("Escape succeeded ({score} vs {dc}).")
            }
            LogEvent::FleeFail { score, dc } => format!("Retreat failed (roll {score} vs {dc})."),
            LogEvent::FleeFailMoment { score, dc } => format!("Escape failed ({score} vs {dc})."),
            LogEvent::Heal { item, amount } => format!("You use {item} and restore {amount} HP."),
            LogEvent::NoHealingItem => "You have no healing item.".to_string(),
            LogEvent::NoHealingMoment => "No healing item available.".to_string(),
            LogEvent::EnemyStyle { enemy, style } => format!(
                "{enemy} uses {}.",
                self.describe(&Caption::EnemyStyle(style))
            ),

            LogEvent::DescendFloor { floor } => format!("You descend to floor {floor}."),
            LogEvent::BreathRecover { healed } => {
                format!("You catch your breath and recover {healed} HP.")
            }
            LogEvent::DangerWarning { threat } => format!(
                "You sense overwhelming danger here. Recommended level {threat}. First contact grants ambush protection."
            ),
            LogEvent::EngageEnemy { enemy } => format!("You engage {enemy}."),
            LogEvent::OpenChest => "You open a chest.".to_string(),
            LogEvent::EnterBossLair => "You enter the dungeon boss lair.".to_string(),
            LogEvent::EnterShopRoom => "You find the shop room.".to_string(),
            LogEvent::ShopkeeperTuneup => "The shopkeeper offers a free build tune-up.".to_string(),
            LogEvent::EnemyAttacks { enemy } => format!("{enemy} attacks you!"),
            LogEvent::DangerSenseProtected => {
                "Your danger sense blunts the ambush. Enemy opening strike is weakened.".to_string()
            }
            LogEvent::Retreat => "You break line of engagement and retreat.".to_string(),

            LogEvent::WelcomeLevel { level, points } => format!(
                "Welcome to level {level}. ({} to spend)",
                plural(points, "point")
            ),
            LogEvent::LootKillRewards { gold, xp } => {
                format!("Looted {gold} gold and gained {xp} XP.")
            }
            LogEvent::BossDownChooseReward => {
                "The floor boss is down. Choose a Perk, a Gambit, or descend unchanged.".to_string()
            }
            LogEvent::EnemiesRemain { count, floor } => {
                format!("{count} enemies remain on floor {floor}.")
            }
            LogEvent::DescendWithoutModifier => {
                "You descend without taking a new build modifier.".to_string()
            }
            LogEvent::SelectedBuildChoice { kind, name } => format!(
                "Selected {}: {name}.",
                self.describe(&Caption::BuildKind(kind))
            ),
            LogEvent::ShopRewardBonusPoint => "Shop reward: +1 stat point.".to_string(),
            LogEvent::ShopRewardRemovedPerk { name } => format!("Shop reward: removed Perk {name}."),
            LogEvent::ShopRewardPerkFallbackGold => format!(
                "No Perk to remove. You receive {SHOP_REWARD_FALLBACK_GOLD} gold instead."
            ),
            LogEvent::ShopRewardRemovedGambit { name } => {
                format!("Shop reward: removed Gambit {name}.")
            }
            LogEvent::ShopRewardGambitFallbackHeal { amount } => {
                format!("No Gambit to remove. Restored {amount} HP instead.")
            }
            LogEvent::LevelUpSpent { attribute } => format!(
                "Level-up point spent on {}.",
                self.describe(&Caption::AttributeLabel(attribute))
            ),

            LogEvent::EquippedItem { item, slot } => format!("Equipped {item} at {slot}."),
            LogEvent::InventoryItemRestored { item, healed } => {
                format!("{item} restored {healed} HP.")
            }
            LogEvent::DestroyedItem { item } => format!("Destroyed {item}."),
            LogEvent::LootedGold { amount } => format!("Looted {amount} gold."),
            LogEvent::LootedItem { item } => format!("Looted {item}."),
            LogEvent::InventoryFull => "Inventory is full.".to_string(),
            LogEvent::InventoryFullChestLeftovers => {
                "Inventory is full. Some items were left in the chest.".to_string()
            }
            LogEvent::LootedAllChest => "Looted all chest contents.".to_string(),
            LogEvent::NotEnoughGold => "Not enough gold for that purchase.".to_string(),
            LogEvent::BoughtRespecToken => "Purchased a +1 stat point respec token.".to_string(),
            LogEvent::NoActivePerkToRemove => "No active Perk to remove.".to_string(),
            LogEvent::RemovedPerk { name } => format!("Removed Perk {name}."),
            LogEvent::NoActiveGambitToRemove => "No active Gambit to remove.".to_string(),
            LogEvent::RemovedGambit { name } => format!("Removed Gambit {name}."),
            LogEvent::PurchasedEntry { name, cost } => {
                format!("Purchased {name} for {cost} gold.")
            }
            LogEvent::GoldCannotBePurchased => "Gold cannot be purchased.".to_string(),
        }
    }

    fn describe(&self, caption: &Caption<'_>) -> String {
        match *caption {
            Caption::AttributeLabel(attr) => match attr {
                Attribute::Str => "Strength",
                Attribute::Dex => "Dexterity",
                Attribute::Con => "Constitution",
                Attribute::Int => "Intelligence",
                Attribute::Wis => "Wisdom",
                Attribute::Chr => "Charisma",
            }
            .to_string(),
            Caption::AttributeDescription(attr) => match attr {
                Attribute::Str => "Increases hit chance and boosts aggressive builds.",
                Attribute::Dex => "Improves defense and flee reliability.",
                Attribute::Con => "Raises max HP and durability.",
                Attribute::Int => "Aptitude for lore and study.",
                Attribute::Wis => "Aptitude for instincts and awareness.",
                Attribute::Chr => "Improves shop discounts.",
            }
            .to_string(),
            Caption::EnemyStyle(style) => match style {
                EnemyStyle::Guarded => "guarded strike",
                EnemyStyle::Reckless => "reckless swing",
                EnemyStyle::Steady => "steady attack",
            }
            .to_string(),
            Caption::BuildKind(kind) => match kind {
                BuildChoiceKind::Perk => "Perk",
                BuildChoiceKind::Gambit => "Gambit",
            }
            .to_string(),
            Caption::ServiceDescription { service, latest } => match (service, latest) {
                (ShopServiceId::BonusPoint, _) => "Gain 1 stat point immediately.".to_string(),
                (ShopServiceId::RemovePerk, Some(name)) => {
                    format!("Remove your latest Perk: {name}.")
                }
                (ShopServiceId::RemovePerk, None) => {
                    "No active Perk to remove right now.".to_string()
                }
                (ShopServiceId::RemoveGambit, Some(name)) => {
                    format!("Remove your latest Gambit: {name}.")
                }
                (ShopServiceId::RemoveGambit, None) => {
                    "No active Gambit to remove right now.".to_string()
                }
            },
            Caption::RewardTitle(reward) => match reward {
                ShopRewardId::BonusPoint => "Training Insight",
                ShopRewardId::RemovePerk => "Reforge Perk",
                ShopRewardId::RemoveGambit => "Cleanse Gambit",
            }
            .to_string(),
            Caption::RewardDescription { reward, latest } => match (reward, latest) {
                (ShopRewardId::BonusPoint, _) => "Gain 1 bonus stat point.".to_string(),
                (ShopRewardId::RemovePerk, Some(name)) => {
                    format!("Remove your latest Perk: {name}.")
                }
                (ShopRewardId::RemovePerk, None) => format!(
                    "No Perk active. Gain {SHOP_REWARD_FALLBACK_GOLD} gold instead."
                ),
                (ShopRewardId::RemoveGambit, Some(name)) => {
                    format!("Remove your latest Gambit: {name}.")
                }
                (ShopRewardId::RemoveGambit, None) => format!(
                    "No Gambit active. Restore {}% HP instead.",
                    floor_f64_to_i32(SHOP_REWARD_HEAL_FALLBACK_RATIO * 100.0 + 0.5)
                ),
            },
        }
    }

    fn intro(&self) -> Vec<String> {
        [
            "Welcome to the dungeon. Good luck.",
            "Defeat each floor boss to descend and shape your build.",
            "WASD/Arrows move. Step into enemies to battle.",
            "Use Inventory and Shop controls in the side panel.",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_drops_oldest_entries() {
        let mut log = RunLog::default();
        for i in 0..12 {
            log.push(LogEntry::new(format!("line {i}"), LogLevel::Info));
        }
        assert_eq!(log.len(), LOG_LIMIT);
        assert_eq!(log.iter().next().map(|e| e.text.as_str()), Some("line 3"));
        assert_eq!(log.last().map(|e| e.text.as_str()), Some("line 11"));
    }

    #[test]
    fn restore_truncates_to_the_newest() {
        let mut log = RunLog::default();
        let entries: Vec<LogEntry> = (0..15)
            .map(|i| LogEntry::new(i.to_string(), LogLevel::Warn))
            .collect();
        log.restore(entries);
        assert_eq!(log.len(), LOG_LIMIT);
        assert_eq!(log.iter().next().map(|e| e.text.as_str()), Some("6"));
    }

    #[test]
    fn english_catalog_renders_arguments() {
        let narrator = EnglishNarrator;
        assert_eq!(
            narrator.narrate(&LogEvent::WelcomeLevel {
                level: 2,
                points: 1
            }),
            "Welcome to level 2. (1 point to spend)"
        );
        assert_eq!(
            narrator.narrate(&LogEvent::WelcomeLevel {
                level: 3,
                points: 2
            }),
            "Welcome to level 3. (2 points to spend)"
        );
        assert_eq!(
            narrator.narrate(&LogEvent::EnemyStyle {
                enemy: "Goblin",
                style: EnemyStyle::Reckless
            }),
            "Goblin uses reckless swing."
        );
        assert_eq!(
            narrator.narrate(&LogEvent::LevelUpSpent {
                attribute: Attribute::Chr
            }),
            "Level-up point spent on Charisma."
        );
    }

    #[test]
    fn reward_fallbacks_mention_their_substitutes() {
        let narrator = EnglishNarrator;
        let perk = narrator.describe(&Caption::RewardDescription {
            reward: ShopRewardId::RemovePerk,
            latest: None,
        });
        assert_eq!(perk, "No Perk active. Gain 120 gold instead.");
        let gambit = narrator.describe(&Caption::RewardDescription {
            reward: ShopRewardId::RemoveGambit,
            latest: None,
        });
        assert_eq!(gambit, "No Gambit active. Restore 35% HP instead.");
        assert_eq!(narrator.intro().len(), 4);
    }
}
