//! Perks, gambits and the reward choices that hand them out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attributes::Attribute;
use crate::constants::{
    PLAYER_CONSTITUTION_BONUS, SHOP_REWARD_FALLBACK_GOLD, SHOP_REWARD_HEAL_FALLBACK_RATIO,
};
use crate::creature::Creature;
use crate::narration::{Caption, LogEvent, Narrator};
use crate::numbers::floor_f64_to_i32;
use crate::rng::SeededRandom;

/// Number of perks and gambits offered after a boss falls.
pub const BOSS_REWARD_CHOICES: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildChoiceError {
    #[error("Unknown build choice id: {id}")]
    Unknown { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildChoiceKind {
    Perk,
    Gambit,
}

/// A named bundle of stat deltas. Perks only help; gambits trade a drawback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildChoice {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: BuildChoiceKind,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
    pub max_hitpoints: i32,
    pub damage_dealt_multiplier: f64,
    pub damage_taken_multiplier: f64,
    pub hitpoint_cap_multiplier: f64,
    pub attributes: &'static [(Attribute, i32)],
}

impl BuildChoice {
    const fn perk(id: &'static str, name: &'static str, description: &'static str) -> Self {
        Self {
            id,
            name,
            description,
            kind: BuildChoiceKind::Perk,
            attack_bonus: 0,
            defense_bonus: 0,
            max_hitpoints: 0,
            damage_dealt_multiplier: 1.0,
            damage_taken_multiplier: 1.0,
            hitpoint_cap_multiplier: 1.0,
            attributes: &[],
        }
    }

    const fn gambit(id: &'static str, name: &'static str, description: &'static str) -> Self {
        let mut choice = Self::perk(id, name, description);
        choice.kind = BuildChoiceKind::Gambit;
        choice
    }

    /// Deltas in canonical attribute order.
    fn attribute_deltas(&self) -> impl Iterator<Item = (Attribute, i32)> + '_ {
        Attribute::ALL.into_iter().filter_map(|attr| {
            let delta: i32 = self
                .attributes
                .iter()
                .filter(|(a, _)| *a == attr)
                .map(|(_, d)| d)
                .sum();
            (delta != 0).then_some((attr, delta))
        })
    }

    /// Apply every delta. Any growth of the effective cap is also granted as HP.
    pub fn apply_to(&self, player: &mut Creature) {
        let previous_cap = player.current_max_hitpoints();

        player.attack_bonus += self.attack_bonus;
        player.defense_bonus += self.defense_bonus;
        for (attr, delta) in self.attribute_deltas() {
            player.attributes.modify(attr, delta);
            if attr == Attribute::Con {
                player.max_hitpoints =
                    (player.max_hitpoints + delta * PLAYER_CONSTITUTION_BONUS).max(1);
            }
        }
        if self.max_hitpoints != 0 {
            player.max_hitpoints = (player.max_hitpoints + self.max_hitpoints).max(1);
        }
        player.damage_dealt_multiplier *= self.damage_dealt_multiplier;
        player.damage_taken_multiplier *= self.damage_taken_multiplier;
        player.hitpoint_cap_multiplier *= self.hitpoint_cap_multiplier;

        let new_cap = player.current_max_hitpoints();
        if new_cap > previous_cap {
            player.hitpoints += new_cap - previous_cap;
        }
        player.enforce_hitpoint_cap();
    }

    /// Undo [`BuildChoice::apply_to`]. HP gained on apply is not taken back.
    pub fn remove_from(&self, player: &mut Creature) {
        player.attack_bonus -= self.attack_bonus;
        player.defense_bonus -= self.defense_bonus;
        for (attr, delta) in self.attribute_deltas() {
            player.attributes.modify(attr, -delta);
            if attr == Attribute::Con {
                player.max_hitpoints =
                    (player.max_hitpoints - delta * PLAYER_CONSTITUTION_BONUS).max(1);
            }
        }
        if self.max_hitpoints != 0 {
            player.max_hitpoints = (player.max_hitpoints - self.max_hitpoints).max(1);
        }
        player.damage_dealt_multiplier /= self.damage_dealt_multiplier;
        player.damage_taken_multiplier /= self.damage_taken_multiplier;
        player.hitpoint_cap_multiplier /= self.hitpoint_cap_multiplier;
        player.enforce_hitpoint_cap();
    }
}

pub static PERK_POOL: [BuildChoice; 5] = [
    BuildChoice {
        max_hitpoints: 28,
        defense_bonus: 2,
        ..BuildChoice::perk("perk-iron-frame", "Iron Frame", "+28 max HP and +2 DEF.")
    },
    BuildChoice {
        attack_bonus: 3,
        attributes: &[(Attribute::Dex, 1)],
        ..BuildChoice::perk("perk-duelist-instinct", "Duelist Instinct", "+3 ATK and +1 DEX.")
    },
    BuildChoice {
        attributes: &[(Attribute::Str, 2), (Attribute::Chr, 2)],
        ..BuildChoice::perk("perk-scavenger-wits", "Scavenger Wits", "+2 STR and +2 CHR.")
    },
    BuildChoice {
        damage_dealt_multiplier: 1.2,
        ..BuildChoice::perk("perk-relentless-edge", "Relentless Edge", "Deal 20% more damage.")
    },
    BuildChoice {
        damage_taken_multiplier: 0.85,
        ..BuildChoice::perk("perk-warding-shell", "Warding Shell", "Take 15% less damage.")
    },
];

pub static GAMBIT_POOL: [BuildChoice; 5] = [
    BuildChoice {
        damage_dealt_multiplier: 2.0,
        hitpoint_cap_multiplier: 0.5,
        ..BuildChoice::gambit(
            "gambit-blood-oath",
            "Blood Oath",
            "Deal 2x damage, but HP is capped at 50%.",
        )
    },
    BuildChoice {
        attack_bonus: 6,
        defense_bonus: -4,
        ..BuildChoice::gambit(
            "gambit-berserker-stance",
            "Berserker Stance",
            "+6 ATK, but -4 DEF.",
        )
    },
    BuildChoice {
        damage_dealt_multiplier: 1.6,
        max_hitpoints: -25,
        ..BuildChoice::gambit(
            "gambit-hollow-core",
            "Hollow Core",
            "Deal 60% more damage, but lose 25 max HP.",
        )
    },
    BuildChoice {
        damage_dealt_multiplier: 1.35,
        damage_taken_multiplier: 1.7,
        ..BuildChoice::gambit(
            "gambit-mirrored-pain",
            "Mirrored Pain",
            "Deal 35% more damage, but take 70% more damage.",
        )
    },
    BuildChoice {
        attributes: &[(Attribute::Str, 4), (Attribute::Dex, 4), (Attribute::Con, -3)],
        ..BuildChoice::gambit(
            "gambit-brittle-focus",
            "Brittle Focus",
            "+4 STR and +4 DEX, but -3 CON.",
        )
    },
];

#[must_use]
pub fn pool(kind: BuildChoiceKind) -> &'static [BuildChoice] {
    match kind {
        BuildChoiceKind::Perk => &PERK_POOL,
        BuildChoiceKind::Gambit => &GAMBIT_POOL,
    }
}

/// Look a choice up in either pool.
///
/// # Errors
///
/// Returns [`BuildChoiceError::Unknown`] for ids outside both pools.
pub fn find_build_choice(id: &str) -> Result<&'static BuildChoice, BuildChoiceError> {
    PERK_POOL
        .iter()
        .chain(GAMBIT_POOL.iter())
        .find(|choice| choice.id == id)
        .ok_or_else(|| BuildChoiceError::Unknown { id: id.to_string() })
}

/// Perks and gambits the player currently carries, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveBuild {
    pub perks: Vec<&'static BuildChoice>,
    pub gambits: Vec<&'static BuildChoice>,
}

impl ActiveBuild {
    #[must_use]
    pub fn of_kind(&self, kind: BuildChoiceKind) -> &[&'static BuildChoice] {
        match kind {
            BuildChoiceKind::Perk => &self.perks,
            BuildChoiceKind::Gambit => &self.gambits,
        }
    }

    #[must_use]
    pub fn latest(&self, kind: BuildChoiceKind) -> Option<&'static BuildChoice> {
        self.of_kind(kind).last().copied()
    }

    pub fn push(&mut self, choice: &'static BuildChoice) {
        match choice.kind {
            BuildChoiceKind::Perk => self.perks.push(choice),
            BuildChoiceKind::Gambit => self.gambits.push(choice),
        }
    }

    /// Pop the newest choice of `kind` and revert its effects on `player`.
    pub fn remove_latest(
        &mut self,
        kind: BuildChoiceKind,
        player: &mut Creature,
    ) -> Option<&'static BuildChoice> {
        let removed = match kind {
            BuildChoiceKind::Perk => self.perks.pop(),
            BuildChoiceKind::Gambit => self.gambits.pop(),
        }?;
        removed.remove_from(player);
        Some(removed)
    }

    /// Rebuild from saved ids, re-applying nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BuildChoiceError::Unknown`] for any unrecognized id.
    pub fn from_ids(perks: &[String], gambits: &[String]) -> Result<Self, BuildChoiceError> {
        let lookup = |ids: &[String]| -> Result<Vec<&'static BuildChoice>, BuildChoiceError> {
            ids.iter().map(|id| find_build_choice(id)).collect()
        };
        Ok(Self {
            perks: lookup(perks)?,
            gambits: lookup(gambits)?,
        })
    }

    #[must_use]
    pub fn ids(&self, kind: BuildChoiceKind) -> Vec<String> {
        self.of_kind(kind)
            .iter()
            .map(|choice| choice.id.to_string())
            .collect()
    }
}

/// Shuffle the choices of `kind` not already active and keep the first `count`.
/// When too few remain the whole pool is eligible again.
pub fn pick_build_choices(
    kind: BuildChoiceKind,
    count: usize,
    rng: &mut SeededRandom,
    build: &ActiveBuild,
) -> Vec<&'static BuildChoice> {
    let active = build.of_kind(kind);
    let mut available: Vec<&'static BuildChoice> = pool(kind)
        .iter()
        .filter(|choice| !active.iter().any(|held| held.id == choice.id))
        .collect();
    if available.len() < count {
        available = pool(kind).iter().collect();
    }
    let mut picked = rng.shuffle(&available);
    picked.truncate(count);
    picked
}

/// Offers shown after a boss dies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingBossRewards {
    pub perks: Vec<&'static BuildChoice>,
    pub gambits: Vec<&'static BuildChoice>,
}

impl PendingBossRewards {
    #[must_use]
    pub fn roll(rng: &mut SeededRandom, build: &ActiveBuild) -> Self {
        let perks = pick_build_choices(BuildChoiceKind::Perk, BOSS_REWARD_CHOICES, rng, build);
        let gambits = pick_build_choices(BuildChoiceKind::Gambit, BOSS_REWARD_CHOICES, rng, build);
        Self { perks, gambits }
    }

    #[must_use]
    pub fn find(&self, kind: BuildChoiceKind, id: &str) -> Option<&'static BuildChoice> {
        let source = match kind {
            BuildChoiceKind::Perk => &self.perks,
            BuildChoiceKind::Gambit => &self.gambits,
        };
        source.iter().find(|choice| choice.id == id).copied()
    }
}

/// Free rewards offered on first entering a shop room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShopRewardId {
    BonusPoint,
    RemovePerk,
    RemoveGambit,
}

impl ShopRewardId {
    pub const ALL: [Self; 3] = [Self::BonusPoint, Self::RemovePerk, Self::RemoveGambit];
}

/// A shop reward with its text fixed at offer time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopRewardChoice {
    pub id: ShopRewardId,
    pub title: String,
    pub description: String,
}

/// The three shop rewards, described against the current build.
#[must_use]
pub fn pending_shop_rewards(build: &ActiveBuild, narrator: &dyn Narrator) -> Vec<ShopRewardChoice> {
    ShopRewardId::ALL
        .into_iter()
        .map(|reward| {
            let latest = match reward {
                ShopRewardId::BonusPoint => None,
                ShopRewardId::RemovePerk => build.latest(BuildChoiceKind::Perk),
                ShopRewardId::RemoveGambit => build.latest(BuildChoiceKind::Gambit),
            };
            ShopRewardChoice {
                id: reward,
                title: narrator.describe(&Caption::RewardTitle(reward)),
                description: narrator.describe(&Caption::RewardDescription {
                    reward,
                    latest: latest.map(|choice| choice.name),
                }),
            }
        })
        .collect()
}

/// What claiming a shop reward actually did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShopRewardOutcome {
    BonusPoint,
    RemovedPerk(&'static BuildChoice),
    FallbackGold(i32),
    RemovedGambit(&'static BuildChoice),
    FallbackHeal(i32),
}

impl ShopRewardOutcome {
    #[must_use]
    pub const fn event(&self) -> LogEvent<'static> {
        match self {
            Self::BonusPoint => LogEvent::ShopRewardBonusPoint,
            Self::RemovedPerk(choice) => LogEvent::ShopRewardRemovedPerk { name: choice.name },
            Self::FallbackGold(_) => LogEvent::ShopRewardPerkFallbackGold,
            Self::RemovedGambit(choice) => LogEvent::ShopRewardRemovedGambit { name: choice.name },
            Self::FallbackHeal(amount) => LogEvent::ShopRewardGambitFallbackHeal { amount: *amount },
        }
    }
}

/// Grant a shop reward. Removal rewards fall back to gold or healing when
/// nothing of that kind is active.
pub fn claim_shop_reward(
    reward: ShopRewardId,
    player: &mut Creature,
    build: &mut ActiveBuild,
) -> ShopRewardOutcome {
    match reward {
        ShopRewardId::BonusPoint => {
            player.grant_attribute_point(1);
            ShopRewardOutcome::BonusPoint
        }
        ShopRewardId::RemovePerk => build
            .remove_latest(BuildChoiceKind::Perk, player)
            .map_or_else(
                || {
                    player.gold += SHOP_REWARD_FALLBACK_GOLD;
                    ShopRewardOutcome::FallbackGold(SHOP_REWARD_FALLBACK_GOLD)
                },
                ShopRewardOutcome::RemovedPerk,
            ),
        ShopRewardId::RemoveGambit => build
            .remove_latest(BuildChoiceKind::Gambit, player)
            .map_or_else(
                || {
                    let cap = player.current_max_hitpoints();
                    let heal =
                        floor_f64_to_i32(f64::from(cap) * SHOP_REWARD_HEAL_FALLBACK_RATIO).max(1);
                    let before = player.hitpoints;
                    player.hitpoints = (player.hitpoints + heal).min(cap);
                    ShopRewardOutcome::FallbackHeal(player.hitpoints - before)
                },
                ShopRewardOutcome::RemovedGambit,
            ),
    }
}
