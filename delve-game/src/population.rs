//! Floor population: monsters, chests, shop stock and shop clutter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::constants::{
    BOSS_CHALLENGE_LEVEL, BOSS_CON_BONUS_BASE, BOSS_DEX_BONUS_BASE, BOSS_DEX_BONUS_FLOOR_DIVISOR,
    BOSS_HP_SCALE_PER_FLOOR, BOSS_STR_BONUS_BASE, CHEST_ARMOR_ROLL_MIN, CHEST_GOLD_DICE,
    CHEST_GOLD_ROLL_MIN, CHEST_HIGH_TIER_LEVEL, CHEST_LARGE_OR_HEALTH_ROLL_MIN,
    CHEST_MID_TIER_LEVEL, CHEST_TIERED_POTION_ROLL_MIN, CHEST_TOP_POTION_ROLL_MIN,
    CHEST_WEAPON_ROLL_MIN, FLOOR_CHEST_BASE, FLOOR_CHEST_CAPACITY, FLOOR_CHEST_PER_FLOOR,
    FLOOR_DEPTH_SCALE_PER_FLOOR, FLOOR_MOB_BASE, FLOOR_MOB_PER_FLOOR, FLOOR_SCALE_MINIMUM,
    LOG_FLOOR_BUILT, MAXIMUM_CHALLENGE_LEVEL, SHOP_CLUTTER_DENSITY_DIVISOR, SHOP_CLUTTER_SPRITES,
    SHOP_TOP_ARMORS, SHOP_TOP_WEAPONS,
};
use crate::creature::Creature;
use crate::dice::{DiceError, Roller};
use crate::item::{Chest, EntityId, IdAllocator, Item};
use crate::loot::{ItemPools, Potion, ShopEntry, create_shop_stock, generate_item_pools};
use crate::numbers::{ceil_f64_to_i32, floor_f64_to_i32, i32_to_usize};
use crate::procgen::{NameGenerator, creature_at_level};
use crate::rng::SeededRandom;
use crate::world::{Position, Room, WorldMap, random_positions_in_room};

/// Display name of every floor boss.
pub const BOSS_NAME: &str = "Dungeon Boss";

/// A live monster and the room it guards.
#[derive(Debug, Clone, PartialEq)]
pub struct Mob {
    pub id: EntityId,
    pub creature: Creature,
    pub room_id: u32,
    pub is_boss: bool,
    /// AI steps left to keep chasing after the player leaves the home room.
    pub pursuit_turns: i32,
}

impl Mob {
    #[must_use]
    pub const fn position(&self) -> Position {
        self.creature.position
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.creature.alive
    }
}

/// A chest placed on the floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorChest {
    pub id: EntityId,
    pub chest: Chest,
    pub room_id: u32,
}

/// Decorative shop sprite; carries no gameplay meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopClutter {
    pub position: Position,
    pub sprite: u16,
}

/// Everything spawned onto a fresh floor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloorPopulation {
    pub mobs: Vec<Mob>,
    pub chests: Vec<FloorChest>,
    pub shop_stock: Vec<ShopEntry>,
    pub shop_clutter: Vec<ShopClutter>,
    pub room_threat: BTreeMap<u32, i32>,
}

/// Challenge level of a room: interpolated by how far down the map it sits
/// between the start and boss rooms, fixed high for the boss and zero for
/// the start and shop rooms.
#[must_use]
pub fn room_challenge_level(room: &Room, start_y: i32, boss_y: i32, floor: i32) -> i32 {
    let floor_offset = (floor - 1).max(0);
    if room.is_start() || room.is_shop() {
        return 0;
    }
    if room.is_boss() {
        return BOSS_CHALLENGE_LEVEL + floor_offset;
    }
    floor_offset + floor_f64_to_i32(depth_scale(room, start_y, boss_y) * f64::from(MAXIMUM_CHALLENGE_LEVEL))
}

fn depth_scale(room: &Room, start_y: i32, boss_y: i32) -> f64 {
    let span = (boss_y - start_y).max(1);
    (f64::from(room.center().y - start_y) / f64::from(span)).clamp(0.0, 1.0)
}

fn spawn_cap(base: f64, per_floor: f64, floor: i32, scaled: f64) -> i32 {
    ceil_f64_to_i32((base + f64::from(floor) * per_floor) * scaled).max(1)
}

fn strengthen_boss(mob: &mut Creature, floor_offset: i32) {
    mob.name = BOSS_NAME.to_string();
    mob.attributes
        .modify(Attribute::Str, BOSS_STR_BONUS_BASE + floor_offset);
    mob.attributes.modify(
        Attribute::Dex,
        BOSS_DEX_BONUS_BASE + floor_offset.div_euclid(BOSS_DEX_BONUS_FLOOR_DIVISOR),
    );
    mob.attributes
        .modify(Attribute::Con, BOSS_CON_BONUS_BASE + floor_offset);
    let scale = 1.0 + f64::from(floor_offset) * BOSS_HP_SCALE_PER_FLOOR;
    mob.max_hitpoints = floor_f64_to_i32(f64::from(mob.max_hitpoints) * scale).max(1);
    mob.hitpoints = mob.max_hitpoints;
}

fn stash(chest: &mut Chest, item: Item) {
    // Floor chests hold more than the four rolls can produce.
    if let Err(item) = chest.contents.add(item) {
        log::warn!("floor chest full, dropping {}", item.name);
    }
}

fn fill_chest(
    chest: &mut Chest,
    challenge_level: i32,
    pools: &mut ItemPools,
    rng: &mut SeededRandom,
    ids: &mut IdAllocator,
) -> Result<(), DiceError> {
    if rng.d20() >= CHEST_WEAPON_ROLL_MIN
        && let Some(weapon) = pools.take_weapon()
    {
        stash(chest, weapon);
    }
    if rng.d20() >= CHEST_ARMOR_ROLL_MIN
        && let Some(armor) = pools.take_armor()
    {
        stash(chest, armor);
    }
    if rng.d20() >= CHEST_GOLD_ROLL_MIN {
        let amount = rng.roll_named(CHEST_GOLD_DICE)?;
        stash(chest, Item::gold(ids.item(), amount));
    }

    let potion = if rng.d20() >= CHEST_TOP_POTION_ROLL_MIN {
        Some(Potion::Large)
    } else if rng.d20() >= CHEST_LARGE_OR_HEALTH_ROLL_MIN {
        Some(if challenge_level >= CHEST_HIGH_TIER_LEVEL {
            Potion::Large
        } else {
            Potion::Health
        })
    } else if rng.d20() >= CHEST_TIERED_POTION_ROLL_MIN {
        Some(if challenge_level >= CHEST_HIGH_TIER_LEVEL {
            Potion::Large
        } else if challenge_level >= CHEST_MID_TIER_LEVEL {
            Potion::Health
        } else {
            Potion::Bandages
        })
    } else {
        None
    };
    if let Some(potion) = potion {
        stash(chest, potion.make(ids));
    }
    Ok(())
}

/// Spawn a floor's contents onto a generated map.
///
/// # Errors
///
/// Propagates a [`DiceError`] from gear or gold rolls.
#[allow(clippy::too_many_lines)]
pub fn populate_floor(
    world: &WorldMap,
    floor: i32,
    rng: &mut SeededRandom,
    names: &mut NameGenerator,
    ids: &mut IdAllocator,
) -> Result<FloorPopulation, DiceError> {
    let mut pools = generate_item_pools(rng, names, ids)?;
    let mut population = FloorPopulation::default();

    let rooms = world.rooms();
    let (Some(start_room), Some(last_room)) = (world.start_room().or(rooms.first()), rooms.last())
    else {
        return Ok(population);
    };
    let boss_room = world.boss_room().unwrap_or(last_room);
    let start_y = start_room.center().y;
    let boss_y = boss_room.center().y;

    let mut shop_items: Vec<Item> = Potion::ALL.into_iter().map(|p| p.make(ids)).collect();
    shop_items.extend(pools.weapons.drain(..SHOP_TOP_WEAPONS.min(pools.weapons.len())));
    shop_items.extend(pools.armors.drain(..SHOP_TOP_ARMORS.min(pools.armors.len())));
    population.shop_stock = create_shop_stock(shop_items, ids);

    let floor_offset = (floor - 1).max(0);
    for room in rooms {
        let challenge_level = room_challenge_level(room, start_y, boss_y, floor);
        population.room_threat.insert(room.id, challenge_level);

        if room.is_shop() {
            let count = ceil_f64_to_i32(
                f64::from(room.area()) / f64::from(SHOP_CLUTTER_DENSITY_DIVISOR),
            )
            .max(1);
            for position in random_positions_in_room(room, rng, i32_to_usize(count), &[], 0) {
                let sprite = rng.choose(&SHOP_CLUTTER_SPRITES).unwrap_or_default();
                population.shop_clutter.push(ShopClutter { position, sprite });
            }
            continue;
        }

        let scaled = (depth_scale(room, start_y, boss_y)
            + f64::from(floor) * FLOOR_DEPTH_SCALE_PER_FLOOR)
            .max(FLOOR_SCALE_MINIMUM);

        let mob_count = if room.is_boss() {
            1
        } else if room.is_start() {
            0
        } else {
            rng.roll(1, spawn_cap(FLOOR_MOB_BASE, FLOOR_MOB_PER_FLOOR, floor, scaled))
        };
        let mob_positions = random_positions_in_room(room, rng, i32_to_usize(mob_count), &[], 0);

        let chest_count = rng.roll(
            1,
            spawn_cap(FLOOR_CHEST_BASE, FLOOR_CHEST_PER_FLOOR, floor, scaled),
        );
        let chest_positions =
            random_positions_in_room(room, rng, i32_to_usize(chest_count), &mob_positions, 1);

        for position in &mob_positions {
            let mut creature = creature_at_level(challenge_level, names, ids, rng)?;
            if room.is_boss() {
                strengthen_boss(&mut creature, floor_offset);
            }
            creature.mob = true;
            creature.position = *position;
            creature.roll_mob_gold(rng)?;
            population.mobs.push(Mob {
                id: ids.entity(),
                creature,
                room_id: room.id,
                is_boss: room.is_boss(),
                pursuit_turns: 0,
            });
        }

        for position in chest_positions {
            let mut chest = Chest::new(position, FLOOR_CHEST_CAPACITY);
            fill_chest(&mut chest, challenge_level, &mut pools, rng, ids)?;
            if !chest.is_empty() {
                population.chests.push(FloorChest {
                    id: ids.entity(),
                    chest,
                    room_id: room.id,
                });
            }
        }
    }

    log::debug!(
        "{LOG_FLOOR_BUILT}: floor={floor} rooms={} mobs={} chests={}",
        rooms.len(),
        population.mobs.len(),
        population.chests.len()
    );
    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loot::ShopEntryId;
    use crate::world::generate_map;

    fn build(seed: &str, floor: i32) -> (WorldMap, FloorPopulation) {
        let mut rng = SeededRandom::new(seed);
        let world = generate_map(&mut rng);
        let mut names = NameGenerator::default();
        let mut ids = IdAllocator::default();
        let population =
            populate_floor(&world, floor, &mut rng, &mut names, &mut ids).expect("population");
        (world, population)
    }

    #[test]
    fn exactly_one_boss_sits_in_the_boss_room() {
        let (world, population) = build("population-boss", 1);
        let bosses: Vec<&Mob> = population.mobs.iter().filter(|m| m.is_boss).collect();
        assert_eq!(bosses.len(), 1);
        let boss_room = world.boss_room().expect("boss room");
        assert_eq!(bosses[0].room_id, boss_room.id);
        assert_eq!(bosses[0].creature.name, BOSS_NAME);
        assert!(boss_room.contains(bosses[0].position()));
        assert_eq!(population.room_threat.get(&boss_room.id), Some(&BOSS_CHALLENGE_LEVEL));
    }

    #[test]
    fn start_and_shop_rooms_stay_quiet() {
        let (world, population) = build("population-quiet", 1);
        for room in world.rooms().iter().filter(|r| r.is_start() || r.is_shop()) {
            assert_eq!(population.room_threat.get(&room.id), Some(&0));
            assert!(population.mobs.iter().all(|m| m.room_id != room.id));
        }
        let shop = world.shop_room().expect("shop room");
        assert!(population.chests.iter().all(|c| c.room_id != shop.id));
        assert!(!population.shop_clutter.is_empty());
        assert!(population.shop_clutter.iter().all(|c| shop.contains(c.position)));
    }

    #[test]
    fn every_mob_is_flagged_and_placed_in_its_room() {
        let (world, population) = build("population-mobs", 2);
        assert!(!population.mobs.is_empty());
        for mob in &population.mobs {
            let room = world.room(mob.room_id).expect("room");
            assert!(mob.creature.mob);
            assert!(room.contains(mob.position()));
            assert!(mob.creature.gold >= 3);
        }
    }

    #[test]
    fn chests_are_never_empty_and_never_on_mobs() {
        let (_, population) = build("population-chests", 1);
        for floor_chest in &population.chests {
            assert!(!floor_chest.chest.is_empty());
            assert!(
                population
                    .mobs
                    .iter()
                    .all(|m| m.position() != floor_chest.chest.position)
            );
        }
    }

    #[test]
    fn shop_stock_has_services_potions_and_top_gear() {
        let (_, population) = build("population-shop", 1);
        let stock = &population.shop_stock;
        assert_eq!(stock.len(), 3 + 6 + SHOP_TOP_WEAPONS + SHOP_TOP_ARMORS);
        assert!(stock[..3].iter().all(|e| matches!(e.id(), ShopEntryId::Service(_))));
        assert_eq!(stock[3].name, "Bandages");
        assert_eq!(stock[8].name, "Instaheal");
    }

    #[test]
    fn deeper_floors_raise_threat() {
        let (world, shallow) = build("population-depth", 1);
        let (_, deep) = build("population-depth", 4);
        for room in world.rooms().iter().filter(|r| !r.is_start() && !r.is_shop()) {
            let a = shallow.room_threat.get(&room.id).copied().unwrap_or_default();
            let b = deep.room_threat.get(&room.id).copied().unwrap_or_default();
            assert_eq!(b, a + 3);
        }
    }

    #[test]
    fn challenge_levels_interpolate_by_depth() {
        let room = Room {
            id: 3,
            x: 10,
            y: 30,
            w: 4,
            h: 4,
            attrs: crate::world::RoomAttrs::NONE,
        };
        assert_eq!(room_challenge_level(&room, 8, 56, 1), 5);
        assert_eq!(room_challenge_level(&room, 8, 56, 3), 7);
        assert_eq!(room_challenge_level(&room, 40, 56, 1), 0);
    }
}
