//! Monster movement: home-room aggro with a short pursuit leash, walking
//! home, idle wandering, and the retreat search used after a flee.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::constants::{
    AI_LEASH_PURSUIT_TURNS, AI_WANDER_MOVE_ROLL_MIN, AI_WANDER_ROLL_MAX, LOG_AI_AMBUSH,
};
use crate::creature::Creature;
use crate::item::EntityId;
use crate::population::{FloorChest, Mob};
use crate::rng::SeededRandom;
use crate::world::{CARDINAL_STEPS, Position, Room, WorldMap};

/// A mob reached the player and wants to fight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleTrigger {
    pub mob_id: EntityId,
    pub room_id: u32,
    pub attacker_name: String,
}

fn occupied_tiles(player: Option<&Creature>, mobs: &[Mob], chests: &[FloorChest]) -> HashSet<Position> {
    let mut occupied: HashSet<Position> = HashSet::new();
    if let Some(player) = player {
        occupied.insert(player.position);
    }
    occupied.extend(
        chests
            .iter()
            .filter(|c| !c.chest.is_empty())
            .map(|c| c.chest.position),
    );
    occupied.extend(mobs.iter().filter(|m| m.is_alive()).map(Mob::position));
    occupied
}

/// Move `mob` one tile along `path` if the first tile is free.
fn step_along(mob: &mut Mob, path: &[Position], occupied: &mut HashSet<Position>) {
    let Some(&next) = path.first() else {
        return;
    };
    if occupied.contains(&next) {
        return;
    }
    occupied.remove(&mob.creature.position);
    mob.creature.position = next;
    occupied.insert(next);
}

fn wander(mob: &mut Mob, world: &WorldMap, rng: &mut SeededRandom, occupied: &mut HashSet<Position>) {
    if rng.int(1, AI_WANDER_ROLL_MAX) < AI_WANDER_MOVE_ROLL_MIN {
        return;
    }
    let here = mob.creature.position;
    let steps: Vec<Position> = CARDINAL_STEPS
        .iter()
        .map(|step| here.offset(step.x, step.y))
        .collect();
    for next in rng.shuffle(&steps) {
        if !world.is_passable(next.x, next.y) {
            continue;
        }
        if world.room_at(next).map(|room| room.id) != Some(mob.room_id) {
            continue;
        }
        if occupied.contains(&next) {
            continue;
        }
        occupied.remove(&here);
        mob.creature.position = next;
        occupied.insert(next);
        break;
    }
}

/// Advance every idle mob by one step.
///
/// Mobs move in list order and see each other's new positions. The first mob
/// that ends up adjacent to the player stops the step and returns a trigger.
pub fn ai_step(
    world: &WorldMap,
    rng: &mut SeededRandom,
    player: &Creature,
    mobs: &mut [Mob],
    chests: &[FloorChest],
) -> Option<BattleTrigger> {
    let homes: HashMap<u32, &Room> = world.rooms().iter().map(|room| (room.id, room)).collect();
    let mut occupied = occupied_tiles(Some(player), mobs, chests);
    let player_room = world.room_at(player.position).map(|room| room.id);

    for mob in mobs.iter_mut() {
        if !mob.is_alive() || mob.creature.in_battle {
            continue;
        }

        let mob_room = world.room_at(mob.creature.position).map(|room| room.id);
        let in_home = mob_room == Some(mob.room_id);
        let home_aggro = in_home && player_room == Some(mob.room_id);
        if home_aggro {
            mob.pursuit_turns = AI_LEASH_PURSUIT_TURNS;
        }

        if home_aggro || mob.pursuit_turns > 0 {
            let mut blocked = occupied.clone();
            blocked.remove(&mob.creature.position);
            let path = world.path_to(mob.creature.position, player.position, &blocked);
            if path.len() == 1 {
                let room_id = player_room.or(mob_room).unwrap_or(mob.room_id);
                log::debug!(
                    "{LOG_AI_AMBUSH}: {} {} engages in room {room_id}",
                    mob.id,
                    mob.creature.name
                );
                return Some(BattleTrigger {
                    mob_id: mob.id,
                    room_id,
                    attacker_name: mob.creature.name.clone(),
                });
            }
            step_along(mob, &path, &mut occupied);
            if !home_aggro && !mob.is_boss {
                mob.pursuit_turns = (mob.pursuit_turns - 1).max(0);
            }
            continue;
        }

        if !in_home && let Some(home) = homes.get(&mob.room_id) {
            let mut blocked = occupied.clone();
            blocked.remove(&mob.creature.position);
            let path = world.path_to(mob.creature.position, home.center(), &blocked);
            step_along(mob, &path, &mut occupied);
            continue;
        }

        wander(mob, world, rng, &mut occupied);
    }
    None
}

/// Nearest free tile outside `battle_room`, searched breadth-first from
/// `fallback`. Returns `fallback` when no battle room is known or nothing
/// outside is reachable.
#[must_use]
pub fn find_retreat_position(
    world: &WorldMap,
    mobs: &[Mob],
    chests: &[FloorChest],
    battle_room: Option<u32>,
    fallback: Position,
) -> Position {
    let Some(battle_room) = battle_room else {
        return fallback;
    };

    let mut occupied = occupied_tiles(None, mobs, chests);
    occupied.remove(&fallback);

    let mut frontier = VecDeque::from([fallback]);
    let mut seen = HashSet::from([fallback]);
    while let Some(current) = frontier.pop_front() {
        let outside = world.room_at(current).map(|room| room.id) != Some(battle_room);
        if outside && !occupied.contains(&current) {
            return current;
        }
        for step in CARDINAL_STEPS {
            let next = current.offset(step.x, step.y);
            if !world.is_passable(next.x, next.y) {
                continue;
            }
            if seen.insert(next) {
                frontier.push_back(next);
            }
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;
    use crate::item::Chest;
    use crate::world::{RoomAttrs, Tile};

    const WIDTH: i32 = 14;
    const HEIGHT: i32 = 5;

    /// Two 4x3 rooms joined by a hall along y = 2.
    fn twin_rooms() -> WorldMap {
        let rooms = vec![
            Room {
                id: 0,
                x: 1,
                y: 1,
                w: 4,
                h: 3,
                attrs: RoomAttrs::START,
            },
            Room {
                id: 1,
                x: 9,
                y: 1,
                w: 4,
                h: 3,
                attrs: RoomAttrs::NONE,
            },
        ];
        let mut cells = vec![Tile::Empty; (WIDTH * HEIGHT) as usize];
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let pos = Position::new(x, y);
                let idx = (y * WIDTH + x) as usize;
                if rooms.iter().any(|room| room.contains(pos)) {
                    cells[idx] = Tile::Room;
                } else if y == 2 && (5..=8).contains(&x) {
                    cells[idx] = Tile::Hall;
                }
            }
        }
        WorldMap::from_parts(WIDTH, HEIGHT, rooms, cells).expect("grid")
    }

    fn creature_at(x: i32, y: i32) -> Creature {
        Creature::new("Goblin", Position::new(x, y), AttributeSet::default())
    }

    fn mob(id: u64, x: i32, y: i32, room_id: u32) -> Mob {
        let mut creature = creature_at(x, y);
        creature.mob = true;
        Mob {
            id: EntityId(id),
            creature,
            room_id,
            is_boss: false,
            pursuit_turns: 0,
        }
    }

    #[test]
    fn adjacent_mob_in_home_room_starts_a_battle() {
        let world = twin_rooms();
        let mut rng = SeededRandom::new("ai-adjacent");
        let player = creature_at(10, 2);
        let mut mobs = vec![mob(7, 11, 2, 1)];
        let trigger = ai_step(&world, &mut rng, &player, &mut mobs, &[]).expect("battle");
        assert_eq!(trigger.mob_id, EntityId(7));
        assert_eq!(trigger.room_id, 1);
        assert_eq!(trigger.attacker_name, "Goblin");
    }

    #[test]
    fn home_aggro_closes_distance_and_arms_the_leash() {
        let world = twin_rooms();
        let mut rng = SeededRandom::new("ai-aggro");
        let player = creature_at(9, 1);
        let mut mobs = vec![mob(1, 12, 3, 1)];
        assert!(ai_step(&world, &mut rng, &player, &mut mobs, &[]).is_none());
        assert_eq!(mobs[0].pursuit_turns, AI_LEASH_PURSUIT_TURNS);
        let here = mobs[0].position();
        assert_eq!((here.x - 9).abs() + (here.y - 1).abs(), 4);
    }

    #[test]
    fn pursuit_outside_home_burns_the_leash() {
        let world = twin_rooms();
        let mut rng = SeededRandom::new("ai-leash");
        let player = creature_at(2, 2);
        let mut mobs = vec![mob(1, 9, 2, 1)];
        mobs[0].pursuit_turns = 2;
        ai_step(&world, &mut rng, &player, &mut mobs, &[]);
        assert_eq!(mobs[0].position(), Position::new(8, 2));
        assert_eq!(mobs[0].pursuit_turns, 1);
        ai_step(&world, &mut rng, &player, &mut mobs, &[]);
        assert_eq!(mobs[0].position(), Position::new(7, 2));
        assert_eq!(mobs[0].pursuit_turns, 0);
        ai_step(&world, &mut rng, &player, &mut mobs, &[]);
        assert_eq!(mobs[0].position(), Position::new(8, 2), "heads home");
    }

    #[test]
    fn bosses_never_lose_the_scent() {
        let world = twin_rooms();
        let mut rng = SeededRandom::new("ai-boss");
        let player = creature_at(2, 2);
        let mut boss = mob(1, 8, 2, 1);
        boss.is_boss = true;
        boss.pursuit_turns = 1;
        let mut mobs = vec![boss];
        ai_step(&world, &mut rng, &player, &mut mobs, &[]);
        assert_eq!(mobs[0].pursuit_turns, 1);
        assert_eq!(mobs[0].position(), Position::new(7, 2));
    }

    #[test]
    fn wandering_mobs_stay_home_and_off_chests() {
        let world = twin_rooms();
        let mut rng = SeededRandom::new("ai-wander");
        let player = creature_at(2, 2);
        let mut chest = Chest::with_default_capacity(Position::new(10, 2));
        chest
            .contents
            .add(crate::item::Item::gold(crate::item::ItemId(1), 5))
            .expect("room");
        let chests = vec![FloorChest {
            id: EntityId(99),
            chest,
            room_id: 1,
        }];
        let mut mobs = vec![mob(1, 11, 2, 1), mob(2, 12, 3, 1)];
        for _ in 0..200 {
            assert!(ai_step(&world, &mut rng, &player, &mut mobs, &chests).is_none());
            for m in &mobs {
                assert_eq!(world.room_at(m.position()).map(|r| r.id), Some(1));
                assert_ne!(m.position(), Position::new(10, 2));
            }
            assert_ne!(mobs[0].position(), mobs[1].position());
        }
    }

    #[test]
    fn mobs_in_battle_or_dead_hold_still() {
        let world = twin_rooms();
        let mut rng = SeededRandom::new("ai-still");
        let player = creature_at(9, 1);
        let mut busy = mob(1, 12, 3, 1);
        busy.creature.in_battle = true;
        let mut dead = mob(2, 12, 1, 1);
        dead.creature.alive = false;
        let mut mobs = vec![busy, dead];
        ai_step(&world, &mut rng, &player, &mut mobs, &[]);
        assert_eq!(mobs[0].position(), Position::new(12, 3));
        assert_eq!(mobs[1].position(), Position::new(12, 1));
    }

    #[test]
    fn retreat_leaves_the_battle_room() {
        let world = twin_rooms();
        let spot = find_retreat_position(&world, &[], &[], Some(1), Position::new(9, 2));
        assert_eq!(spot, Position::new(8, 2));
        let blocked = vec![mob(3, 8, 2, 1)];
        let spot = find_retreat_position(&world, &blocked, &[], Some(1), Position::new(9, 2));
        assert_eq!(spot, Position::new(7, 2));
    }

    #[test]
    fn retreat_without_a_room_keeps_the_fallback() {
        let world = twin_rooms();
        let fallback = Position::new(6, 2);
        assert_eq!(find_retreat_position(&world, &[], &[], None, fallback), fallback);
    }
}
