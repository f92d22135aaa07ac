//! Name, gear and monster factories scaled by challenge level.

use std::collections::BTreeSet;

use crate::attributes::{Attribute, AttributeSet};
use crate::constants::{
    CHALLENGE_LEVEL_SCALE_UP_FACTOR, CREATURE_BASE_ATTACK_BONUS, CREATURE_BASE_CON,
    CREATURE_BASE_DEFENSE_BONUS, CREATURE_BASE_DEX, CREATURE_BASE_STR, CREATURE_BASELINE_CON,
    CREATURE_BASELINE_DEX, CREATURE_BASELINE_OTHER, CREATURE_BASELINE_STR,
    CREATURE_MAX_DAMAGE_AT_LEVEL_1, CREATURE_MAX_HP_AT_LEVEL_1, CREATURE_MIN_HP_AT_LEVEL_1,
    ITEM_ARMOR_DEFENSE_BASE_MIN, ITEM_ARMOR_DEFENSE_CHALLENGE_BONUS, ITEM_WEAPON_FLAT_BONUS_BASE,
    ITEM_WEAPON_FLAT_BONUS_CHALLENGE_DIVISOR, ITEM_WEAPON_FLAT_BONUS_RANDOM_MAX,
    NAME_GENERATION_FALLBACK_MAX_ID, NAME_GENERATION_MAX_ATTEMPTS,
    PLAYER_CRIT_MAXIMUM_MULTIPLIER, PLAYER_CRIT_MINIMUM_MULTIPLIER, PLAYER_CRIT_MINIMUM_ROLL,
    WEAPON_CRIT_MAXIMUM_ROLL, WEAPON_DAMAGE_FACE_MAX, WEAPON_DAMAGE_FACE_MIN,
};
use crate::creature::Creature;
use crate::dice::{DiceError, DiceSpec};
use crate::item::{IdAllocator, Item, WeaponStats, WieldSlot};
use crate::numbers::{ceil_f64_to_i32, floor_f64_to_i32};
use crate::rng::SeededRandom;
use crate::world::Position;

/// Default display name for generated monsters.
pub const MONSTER_NAME: &str = "Goblin";

const ADJECTIVES: &[&str] = &[
    "ancient", "rusted", "vicious", "sturdy", "ornate", "ashen", "scarred", "silent", "grim",
    "hollow", "tempered", "radiant",
];

const ADVERBS: &[&str] = &[
    "eerily",
    "violently",
    "surprisingly",
    "quietly",
    "wildly",
    "ominously",
];

const ARMOR_SLOTS_FOR_MOBS: [WieldSlot; 3] = [WieldSlot::Chest, WieldSlot::Arms, WieldSlot::Feet];

const fn nouns(slot: WieldSlot) -> &'static [&'static str] {
    match slot {
        WieldSlot::Head => &["Helmet", "Cap", "Mask"],
        WieldSlot::Chest => &["Chestplate", "Shirt", "Vest"],
        WieldSlot::Arms => &["Gauntlets", "Sleeves", "Vambraces"],
        WieldSlot::Hands => &["Sword", "Dagger", "Club", "Mace", "Spear"],
        WieldSlot::Legs => &["Greaves", "Leggings", "Pants"],
        WieldSlot::Feet => &["Boots", "Shoes", "Sandals"],
    }
}

/// Collision-free gear names. The used set is part of the run's saved state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameGenerator {
    seen: BTreeSet<String>,
}

impl NameGenerator {
    #[must_use]
    pub const fn from_used(seen: BTreeSet<String>) -> Self {
        Self { seen }
    }

    #[must_use]
    pub const fn used(&self) -> &BTreeSet<String> {
        &self.seen
    }

    /// `The <adjective> <noun>`, with an adverb in front for special items.
    pub fn generate(&mut self, rng: &mut SeededRandom, slot: WieldSlot, special: bool) -> String {
        let options = nouns(slot);
        for _ in 0..NAME_GENERATION_MAX_ATTEMPTS {
            let noun = rng.choose(options).unwrap_or_default();
            let adjective = rng.choose(ADJECTIVES).unwrap_or_default();
            let value = if special {
                let adverb = rng.choose(ADVERBS).unwrap_or_default();
                format!("The {adverb} {adjective} {noun}")
            } else {
                format!("The {adjective} {noun}")
            };
            if self.seen.insert(value.clone()) {
                return value;
            }
        }

        let adjective = rng.choose(ADJECTIVES).unwrap_or_default();
        let noun = rng.choose(options).unwrap_or_default();
        let number = floor_f64_to_i32(rng.next_float() * NAME_GENERATION_FALLBACK_MAX_ID);
        let fallback = format!("{adjective} {noun} {number}");
        self.seen.insert(fallback.clone());
        fallback
    }
}

/// Weapon whose dice average out near `max_damage`.
///
/// # Errors
///
/// Returns a [`DiceError`] if the derived notation cannot be parsed.
pub fn create_weapon(
    ids: &mut IdAllocator,
    name: String,
    max_damage: i32,
    challenge_level: i32,
    rng: &mut SeededRandom,
) -> Result<Item, DiceError> {
    let damage = rng.int((max_damage / 2).max(1), max_damage.max(2));
    let faces = damage.clamp(WEAPON_DAMAGE_FACE_MIN, WEAPON_DAMAGE_FACE_MAX);
    let count = (damage / faces).max(1);
    let flat_bonus = (ITEM_WEAPON_FLAT_BONUS_BASE
        + challenge_level.div_euclid(ITEM_WEAPON_FLAT_BONUS_CHALLENGE_DIVISOR)
        + rng.int(0, ITEM_WEAPON_FLAT_BONUS_RANDOM_MAX))
    .max(ITEM_WEAPON_FLAT_BONUS_BASE);
    let crit_range = rng.int(PLAYER_CRIT_MINIMUM_ROLL, WEAPON_CRIT_MAXIMUM_ROLL);
    let crit_mult = rng.int(PLAYER_CRIT_MINIMUM_MULTIPLIER, PLAYER_CRIT_MAXIMUM_MULTIPLIER);
    let dice: DiceSpec = format!("{count}d{faces} +{flat_bonus}").parse()?;
    let stats = WeaponStats::new(crit_range, crit_mult, challenge_level + 1, 0, dice);
    Ok(Item::weapon(ids.item(), name, stats))
}

/// Armor with defense in `[1, level + 2]` and attack equal to the level.
pub fn create_armor(
    ids: &mut IdAllocator,
    name: String,
    slot: WieldSlot,
    challenge_level: i32,
    rng: &mut SeededRandom,
) -> Item {
    let defense = rng.int(
        ITEM_ARMOR_DEFENSE_BASE_MIN,
        challenge_level + ITEM_ARMOR_DEFENSE_CHALLENGE_BONUS,
    );
    Item::armor(ids.item(), slot, name, challenge_level, defense)
}

/// Monster stat envelope at a challenge level: `(max damage, min hp, max hp)`.
#[must_use]
pub fn scaled_envelope(challenge_level: i32) -> (i32, i32, i32) {
    let mut max_damage = CREATURE_MAX_DAMAGE_AT_LEVEL_1;
    let mut min_hp = CREATURE_MIN_HP_AT_LEVEL_1;
    let mut max_hp = CREATURE_MAX_HP_AT_LEVEL_1;
    for _ in 0..challenge_level {
        max_damage = ceil_f64_to_i32(f64::from(max_damage) * CHALLENGE_LEVEL_SCALE_UP_FACTOR);
        max_hp = ceil_f64_to_i32(f64::from(max_hp) * CHALLENGE_LEVEL_SCALE_UP_FACTOR);
        min_hp = ceil_f64_to_i32(f64::from(min_hp) * CHALLENGE_LEVEL_SCALE_UP_FACTOR);
    }
    (max_damage, min_hp, max_hp)
}

/// Build an armed monster for a room of the given challenge level.
///
/// # Errors
///
/// Propagates a [`DiceError`] from weapon creation.
pub fn creature_at_level(
    challenge_level: i32,
    names: &mut NameGenerator,
    ids: &mut IdAllocator,
    rng: &mut SeededRandom,
) -> Result<Creature, DiceError> {
    let (max_damage, min_hp, max_hp) = scaled_envelope(challenge_level);

    let mut attributes = AttributeSet::new(
        CREATURE_BASELINE_STR,
        CREATURE_BASELINE_DEX,
        CREATURE_BASELINE_CON,
        CREATURE_BASELINE_OTHER,
        CREATURE_BASELINE_OTHER,
        CREATURE_BASELINE_OTHER,
    );
    attributes.modify(Attribute::Str, CREATURE_BASE_STR);
    attributes.modify(Attribute::Dex, CREATURE_BASE_DEX);
    attributes.modify(Attribute::Con, CREATURE_BASE_CON);

    let mut creature = Creature::new(MONSTER_NAME, Position::default(), attributes);
    creature.attack_bonus = CREATURE_BASE_ATTACK_BONUS;
    creature.defense_bonus = CREATURE_BASE_DEFENSE_BONUS;

    let weapon_name = names.generate(rng, WieldSlot::Hands, false);
    let weapon = create_weapon(ids, weapon_name, max_damage, challenge_level, rng)?;
    let armor_slot = rng.choose(&ARMOR_SLOTS_FOR_MOBS).unwrap_or(WieldSlot::Chest);
    let armor_name = names.generate(rng, armor_slot, false);
    let armor = create_armor(ids, armor_name, armor_slot, challenge_level, rng);

    creature.wield(WieldSlot::Hands, Some(weapon));
    creature.wield(armor_slot, Some(armor));

    creature.max_hitpoints = rng.int(min_hp, max_hp);
    creature.hitpoints = creature.max_hitpoints;
    Ok(creature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_never_repeat() {
        let mut rng = SeededRandom::new("names");
        let mut names = NameGenerator::default();
        let generated: Vec<String> = (0..40)
            .map(|_| names.generate(&mut rng, WieldSlot::Hands, false))
            .collect();
        let unique: BTreeSet<&String> = generated.iter().collect();
        assert_eq!(unique.len(), generated.len());
        assert_eq!(names.used().len(), generated.len());
    }

    #[test]
    fn exhausted_pool_falls_back_to_numbered_names() {
        let mut rng = SeededRandom::new("exhaust");
        let mut names = NameGenerator::default();
        // 12 adjectives × 3 nouns.
        for _ in 0..36 {
            names.generate(&mut rng, WieldSlot::Head, false);
        }
        let extra = names.generate(&mut rng, WieldSlot::Head, false);
        assert!(!extra.starts_with("The "), "got {extra}");
        assert!(extra.rsplit(' ').next().is_some_and(|n| n.parse::<i32>().is_ok()));
    }

    #[test]
    fn special_names_carry_an_adverb() {
        let mut rng = SeededRandom::new("special");
        let mut names = NameGenerator::default();
        let name = names.generate(&mut rng, WieldSlot::Feet, true);
        assert_eq!(name.split(' ').count(), 4);
        assert!(ADVERBS.iter().any(|adverb| name.contains(adverb)));
    }

    #[test]
    fn weapons_stay_inside_their_envelope() {
        let mut rng = SeededRandom::new("weapons");
        let mut ids = IdAllocator::default();
        for level in 0..8 {
            let item = create_weapon(&mut ids, "Test".into(), 24, level, &mut rng).expect("weapon");
            let stats = item.weapon_stats().expect("weapon stats");
            assert!((18..=20).contains(&stats.crit_range()));
            assert!((2..=3).contains(&stats.crit_mult()));
            assert!((2..=20).contains(&stats.damage().faces()));
            assert_eq!(item.attack_bonus(), level + 1);
            assert_eq!(item.defense_bonus(), 0);
        }
    }

    #[test]
    fn armor_defense_tracks_level() {
        let mut rng = SeededRandom::new("armor");
        let mut ids = IdAllocator::default();
        for _ in 0..50 {
            let armor = create_armor(&mut ids, "Plate".into(), WieldSlot::Legs, 3, &mut rng);
            assert!((1..=5).contains(&armor.defense_bonus()));
            assert_eq!(armor.attack_bonus(), 3);
        }
    }

    #[test]
    fn monsters_scale_with_level() {
        assert_eq!(scaled_envelope(0), (9, 20, 40));
        assert_eq!(scaled_envelope(1), (12, 26, 52));
        let mut rng = SeededRandom::new("monsters");
        let mut names = NameGenerator::default();
        let mut ids = IdAllocator::default();
        let mob = creature_at_level(2, &mut names, &mut ids, &mut rng).expect("mob");
        let (_, min_hp, max_hp) = scaled_envelope(2);
        assert!((min_hp..=max_hp).contains(&mob.max_hitpoints));
        assert_eq!(mob.hitpoints, mob.max_hitpoints);
        assert_eq!(mob.attributes.str, 14);
        assert!(mob.weapon().is_some());
        assert_eq!(mob.wielded_items().count(), 2);
    }
}
