//! Tile grid, room layout and the carving generator.
//!
//! A floor is a fixed start room in the top-left, a boss room near the
//! bottom-right, and a scatter of random rooms between them. Rooms are joined
//! by a nearest-neighbour spanning pass plus a few extra edges, then a handful
//! of random-walk branches roughen the corridors into a labyrinth.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::constants::{
    BOSS_ROOM_EDGE_OFFSET, BOSS_ROOM_SIZE, CORRIDOR_ENDPOINT_PADDING, EXTRA_EDGE_DIVISOR,
    FOV_DEFAULT_RADIUS, LABYRINTH_AREA_PER_BRANCH, LABYRINTH_BRANCH_MINIMUM,
    LABYRINTH_SIDE_BRANCH_CHANCE, LABYRINTH_STEPS_MAX, LABYRINTH_STEPS_MIN,
    LABYRINTH_TURN_CHANCE, ROOM_DENSITY, ROOM_OVERLAP_PADDING, ROOM_PLACEMENT_ATTEMPTS,
    ROOM_POSITION_MAX_TRIES, ROOM_SIZE_DIVISOR, ROOM_SIZE_MINIMUM, ROOM_TARGET_MINIMUM,
    SHOP_ROOM_PERCENTILE, START_ROOM_SIZE, WORLD_HEIGHT, WORLD_WIDTH,
};
use crate::numbers::{floor_f64_to_i32, i32_to_usize, usize_to_i32};
use crate::rng::SeededRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Unit steps in the order the generator and pathfinder expand them.
pub const CARDINAL_STEPS: [Position; 4] = [
    Position::new(1, 0),
    Position::new(-1, 0),
    Position::new(0, 1),
    Position::new(0, -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    #[default]
    Empty = 0,
    Room = 1,
    Hall = 2,
}

impl Tile {
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Empty),
            1 => Some(Self::Room),
            2 => Some(Self::Hall),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Room | Self::Hall)
    }
}

/// Room attribute bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomAttrs(u8);

impl RoomAttrs {
    pub const NONE: Self = Self(0);
    pub const START: Self = Self(1);
    pub const BOSS: Self = Self(2);
    pub const SHOP: Self = Self(4);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for RoomAttrs {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub attrs: RoomAttrs,
}

impl Room {
    #[must_use]
    pub const fn center(&self) -> Position {
        Position::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    #[must_use]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x && pos.x < self.x + self.w && pos.y >= self.y && pos.y < self.y + self.h
    }

    #[must_use]
    pub const fn is_start(&self) -> bool {
        self.attrs.contains(RoomAttrs::START)
    }

    #[must_use]
    pub const fn is_boss(&self) -> bool {
        self.attrs.contains(RoomAttrs::BOSS)
    }

    #[must_use]
    pub const fn is_shop(&self) -> bool {
        self.attrs.contains(RoomAttrs::SHOP)
    }

    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.center().distance(other.center())
    }

    #[must_use]
    pub const fn area(&self) -> i32 {
        self.w * self.h
    }

    const fn overlaps(&self, other: &Self, padding: i32) -> bool {
        let (ax, ay) = (self.x - padding, self.y - padding);
        let (aw, ah) = (self.w + padding * 2, self.h + padding * 2);
        let (bx, by) = (other.x - padding, other.y - padding);
        let (bw, bh) = (other.w + padding * 2, other.h + padding * 2);
        ax < bx + bw && ax + aw > bx && ay < by + bh && ay + ah > by
    }
}

/// Uniform point inside a room, shrunk by `padding` on every side.
pub fn random_point_in_room(room: &Room, rng: &mut SeededRandom, padding: i32) -> Position {
    let x = rng.int(room.x + padding, room.x + room.w - 1 - padding);
    let y = rng.int(room.y + padding, room.y + room.h - 1 - padding);
    Position::new(x, y)
}

/// Up to `count` distinct points in a room, avoiding `keepouts`.
pub fn random_positions_in_room(
    room: &Room,
    rng: &mut SeededRandom,
    count: usize,
    keepouts: &[Position],
    padding: i32,
) -> Vec<Position> {
    let mut taken: HashSet<Position> = keepouts.iter().copied().collect();
    let mut output = Vec::with_capacity(count);
    for _ in 0..count {
        for _ in 0..ROOM_POSITION_MAX_TRIES {
            let point = random_point_in_room(room, rng, padding);
            if taken.insert(point) {
                output.push(point);
                break;
            }
        }
    }
    output
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldMap {
    width: i32,
    height: i32,
    rooms: Vec<Room>,
    cells: Vec<Tile>,
    visible: Vec<bool>,
    explored: Vec<bool>,
}

impl WorldMap {
    /// Wrap a carved grid. Returns `None` when the cell count does not match.
    #[must_use]
    pub fn from_parts(width: i32, height: i32, rooms: Vec<Room>, cells: Vec<Tile>) -> Option<Self> {
        let area = i32_to_usize(width).checked_mul(i32_to_usize(height))?;
        if width <= 0 || height <= 0 || cells.len() != area {
            return None;
        }
        Some(Self {
            width,
            height,
            rooms,
            cells,
            visible: vec![false; area],
            explored: vec![false; area],
        })
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Rooms sorted by distance from the start room; index 0 is the start.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[must_use]
    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    #[must_use]
    pub fn start_room(&self) -> Option<&Room> {
        self.rooms.iter().find(|room| room.is_start()).or(self.rooms.first())
    }

    #[must_use]
    pub fn boss_room(&self) -> Option<&Room> {
        self.rooms.iter().find(|room| room.is_boss())
    }

    #[must_use]
    pub fn shop_room(&self) -> Option<&Room> {
        self.rooms.iter().find(|room| room.is_shop())
    }

    #[must_use]
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    #[must_use]
    pub fn explored(&self) -> &[bool] {
        &self.explored
    }

    /// Overwrite the explored mask. Returns `false` on a size mismatch.
    pub fn restore_explored(&mut self, explored: Vec<bool>) -> bool {
        if explored.len() != self.explored.len() {
            return false;
        }
        self.explored = explored;
        true
    }

    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(i32_to_usize(y * self.width + x))
    }

    #[must_use]
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        self.index(x, y)
            .and_then(|idx| self.cells.get(idx).copied())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_passable()
    }

    #[must_use]
    pub fn is_visible(&self, pos: Position) -> bool {
        self.index(pos.x, pos.y)
            .and_then(|idx| self.visible.get(idx).copied())
            .unwrap_or(false)
    }

    #[must_use]
    pub fn is_explored(&self, pos: Position) -> bool {
        self.index(pos.x, pos.y)
            .and_then(|idx| self.explored.get(idx).copied())
            .unwrap_or(false)
    }

    #[must_use]
    pub fn room_at(&self, pos: Position) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains(pos))
    }

    /// Bresenham walk from `a` to `b`; any impassable tile after `a` blocks.
    #[must_use]
    pub fn line_of_sight(&self, a: Position, b: Position) -> bool {
        let (mut x, mut y) = (a.x, a.y);
        let dx = (b.x - x).abs();
        let sx = if x < b.x { 1 } else { -1 };
        let dy = -(b.y - y).abs();
        let sy = if y < b.y { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            if !(x == a.x && y == a.y) && !self.is_passable(x, y) {
                return false;
            }
            if x == b.x && y == b.y {
                return true;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Recompute the visible set around `origin` and fold it into explored.
    pub fn update_fov(&mut self, origin: Position, radius: i32) {
        self.visible.fill(false);
        let min_x = (origin.x - radius).max(0);
        let max_x = (origin.x + radius).min(self.width - 1);
        let min_y = (origin.y - radius).max(0);
        let max_y = (origin.y + radius).min(self.height - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (dx, dy) = (x - origin.x, y - origin.y);
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                if !self.line_of_sight(origin, Position::new(x, y)) {
                    continue;
                }
                if let Some(idx) = self.index(x, y) {
                    self.visible[idx] = true;
                    self.explored[idx] = true;
                }
            }
        }
    }

    pub fn update_fov_default(&mut self, origin: Position) {
        self.update_fov(origin, FOV_DEFAULT_RADIUS);
    }

    /// Breadth-first path from `start` to `end` over passable tiles.
    ///
    /// The start tile is excluded from the result. Tiles in `blocked` are
    /// skipped except for `end` itself. Unreachable targets yield an empty path.
    #[must_use]
    pub fn path_to(
        &self,
        start: Position,
        end: Position,
        blocked: &HashSet<Position>,
    ) -> Vec<Position> {
        if start == end {
            return Vec::new();
        }

        let mut frontier = VecDeque::from([start]);
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut seen: HashSet<Position> = HashSet::from([start]);

        while let Some(current) = frontier.pop_front() {
            if current == end {
                break;
            }
            for step in CARDINAL_STEPS {
                let next = current.offset(step.x, step.y);
                if !self.is_passable(next.x, next.y) {
                    continue;
                }
                if blocked.contains(&next) && next != end {
                    continue;
                }
                if !seen.insert(next) {
                    continue;
                }
                came_from.insert(next, current);
                frontier.push_back(next);
            }
        }

        let mut path = Vec::new();
        let mut step = end;
        while step != start {
            path.push(step);
            match came_from.get(&step) {
                Some(prev) => step = *prev,
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }
}

// Generation ---------------------------------------------------------------

struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Tile>,
}

impl Grid {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![Tile::Empty; i32_to_usize(width) * i32_to_usize(height)],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && x < self.width && y >= 0 && y < self.height)
            .then(|| i32_to_usize(y * self.width + x))
    }

    fn get(&self, x: i32, y: i32) -> Tile {
        self.index(x, y)
            .and_then(|idx| self.cells.get(idx).copied())
            .unwrap_or_default()
    }

    /// Write only over empty tiles.
    fn fill_empty(&mut self, x: i32, y: i32, tile: Tile) {
        if let Some(idx) = self.index(x, y)
            && self.cells[idx] == Tile::Empty
        {
            self.cells[idx] = tile;
        }
    }

    fn carve_room(&mut self, room: &Room) {
        for y in room.y..room.y + room.h {
            for x in room.x..room.x + room.w {
                if let Some(idx) = self.index(x, y) {
                    self.cells[idx] = Tile::Room;
                }
            }
        }
    }

    /// L-shaped corridor: horizontal run first, then vertical.
    fn carve_tunnel(&mut self, from: Position, to: Position) {
        let (mut x, mut y) = (from.x, from.y);
        let x_step = if to.x >= from.x { 1 } else { -1 };
        while x != to.x {
            self.fill_empty(x, y, Tile::Hall);
            x += x_step;
        }
        let y_step = if to.y >= from.y { 1 } else { -1 };
        while y != to.y {
            self.fill_empty(x, y, Tile::Hall);
            y += y_step;
        }
        self.fill_empty(x, y, Tile::Hall);
    }

    const fn interior(&self, pos: Position) -> bool {
        pos.x >= 1 && pos.y >= 1 && pos.x < self.width - 1 && pos.y < self.height - 1
    }

    fn carve_labyrinth_branches(&mut self, rng: &mut SeededRandom) {
        let mut hall_starts = Vec::new();
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                if self.get(x, y) == Tile::Hall {
                    hall_starts.push(Position::new(x, y));
                }
            }
        }
        if hall_starts.is_empty() {
            return;
        }

        let branches = i32_to_usize(self.width * self.height / LABYRINTH_AREA_PER_BRANCH)
            .max(LABYRINTH_BRANCH_MINIMUM);
        for _ in 0..branches {
            let Some(mut cursor) = rng.choose(&hall_starts) else {
                return;
            };
            let Some(mut direction) = rng.choose(&CARDINAL_STEPS) else {
                return;
            };
            let steps = rng.int(LABYRINTH_STEPS_MIN, LABYRINTH_STEPS_MAX);

            for _ in 0..steps {
                if rng.chance(LABYRINTH_TURN_CHANCE) {
                    let options: Vec<Position> = CARDINAL_STEPS
                        .into_iter()
                        .filter(|c| !(c.x == -direction.x && c.y == -direction.y))
                        .collect();
                    direction = rng.choose(&options).unwrap_or(direction);
                }

                let next = cursor.offset(direction.x, direction.y);
                if !self.interior(next) {
                    break;
                }
                if self.get(next.x, next.y) == Tile::Room {
                    break;
                }
                self.fill_empty(next.x, next.y, Tile::Hall);
                cursor = next;

                if rng.chance(LABYRINTH_SIDE_BRANCH_CHANCE) {
                    let sides: Vec<Position> = CARDINAL_STEPS
                        .into_iter()
                        .filter(|c| *c != direction)
                        .collect();
                    if let Some(side) = rng.choose(&sides) {
                        let branch = cursor.offset(side.x, side.y);
                        if branch.x > 0
                            && branch.y > 0
                            && branch.x < self.width - 1
                            && branch.y < self.height - 1
                        {
                            self.fill_empty(branch.x, branch.y, Tile::Hall);
                        }
                    }
                }
            }
        }
    }
}

/// Greedy spanning pass from the first room plus a few shuffled extra edges.
fn connect_rooms(rooms: &[Room], rng: &mut SeededRandom) -> Vec<(Room, Room)> {
    let mut edges: Vec<(Room, Room)> = Vec::new();
    let Some(first) = rooms.first() else {
        return edges;
    };
    let mut connected: HashSet<u32> = HashSet::from([first.id]);

    while connected.len() < rooms.len() {
        let mut best: Option<(Room, Room)> = None;
        let mut best_distance = f64::MAX;
        for room in rooms.iter().filter(|r| connected.contains(&r.id)) {
            for target in rooms.iter().filter(|r| !connected.contains(&r.id)) {
                let distance = room.distance_to(target);
                if distance < best_distance {
                    best_distance = distance;
                    best = Some((*room, *target));
                }
            }
        }
        let Some(edge) = best else {
            break;
        };
        connected.insert(edge.1.id);
        edges.push(edge);
    }

    let mut extra_candidates = Vec::new();
    for (i, a) in rooms.iter().enumerate() {
        for b in &rooms[i + 1..] {
            let exists = edges.iter().any(|(x, y)| {
                (x.id == a.id && y.id == b.id) || (x.id == b.id && y.id == a.id)
            });
            if !exists {
                extra_candidates.push((*a, *b));
            }
        }
    }

    let extras = (rooms.len() / EXTRA_EDGE_DIVISOR).max(1);
    let shuffled = rng.shuffle(&extra_candidates);
    edges.extend(shuffled.into_iter().take(extras));
    edges
}

/// Carve a complete floor from the shared stream.
pub fn generate_map(rng: &mut SeededRandom) -> WorldMap {
    let (width, height) = (WORLD_WIDTH, WORLD_HEIGHT);
    let mut grid = Grid::new(width, height);
    let mut next_room_id = 1_u32;

    let start_room = Room {
        id: next_room_id,
        x: 1,
        y: 1,
        w: START_ROOM_SIZE,
        h: START_ROOM_SIZE,
        attrs: RoomAttrs::START,
    };
    next_room_id += 1;
    let boss_room = Room {
        id: next_room_id,
        x: width - BOSS_ROOM_EDGE_OFFSET,
        y: height - BOSS_ROOM_EDGE_OFFSET,
        w: BOSS_ROOM_SIZE,
        h: BOSS_ROOM_SIZE,
        attrs: RoomAttrs::BOSS,
    };
    next_room_id += 1;
    let mut rooms = vec![start_room, boss_room];

    let target_rects = i32_to_usize(floor_f64_to_i32(ROOM_DENSITY * f64::from(width * height)))
        .max(ROOM_TARGET_MINIMUM);
    let max_w = width / ROOM_SIZE_DIVISOR;
    let max_h = height / ROOM_SIZE_DIVISOR;
    let min_w = (max_w / 2).max(ROOM_SIZE_MINIMUM);
    let min_h = (max_h / 2).max(ROOM_SIZE_MINIMUM);

    for _ in 0..target_rects {
        let room_w = rng.int(min_w, max_w);
        let room_h = rng.int(min_h, max_h);
        for _ in 0..ROOM_PLACEMENT_ATTEMPTS {
            let candidate = Room {
                id: next_room_id,
                x: rng.int(1, width - room_w - 2),
                y: rng.int(1, height - room_h - 2),
                w: room_w,
                h: room_h,
                attrs: RoomAttrs::NONE,
            };
            if rooms
                .iter()
                .all(|other| !candidate.overlaps(other, ROOM_OVERLAP_PADDING))
            {
                rooms.push(candidate);
                next_room_id += 1;
                break;
            }
        }
    }

    rooms.sort_by(|a, b| {
        a.distance_to(&start_room)
            .total_cmp(&b.distance_to(&start_room))
    });
    let eligible: Vec<usize> = rooms
        .iter()
        .enumerate()
        .filter(|(_, room)| !room.attrs.intersects(RoomAttrs::START | RoomAttrs::BOSS))
        .map(|(idx, _)| idx)
        .collect();
    if !eligible.is_empty() {
        let pick = i32_to_usize(floor_f64_to_i32(
            f64::from(usize_to_i32(eligible.len())) * SHOP_ROOM_PERCENTILE,
        ))
        .min(eligible.len() - 1);
        rooms[eligible[pick]].attrs.insert(RoomAttrs::SHOP);
    }

    for room in &rooms {
        grid.carve_room(room);
    }
    for (a, b) in connect_rooms(&rooms, rng) {
        let from = random_point_in_room(&a, rng, CORRIDOR_ENDPOINT_PADDING);
        let to = random_point_in_room(&b, rng, CORRIDOR_ENDPOINT_PADDING);
        grid.carve_tunnel(from, to);
    }
    grid.carve_labyrinth_branches(rng);

    let area = grid.cells.len();
    WorldMap {
        width,
        height,
        rooms,
        cells: grid.cells,
        visible: vec![false; area],
        explored: vec![false; area],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reachable_from(map: &WorldMap, origin: Position) -> HashSet<Position> {
        let mut seen = HashSet::from([origin]);
        let mut queue = VecDeque::from([origin]);
        while let Some(pos) = queue.pop_front() {
            for step in CARDINAL_STEPS {
                let next = pos.offset(step.x, step.y);
                if map.is_passable(next.x, next.y) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    #[test]
    fn every_room_is_reachable_from_start() {
        for seed in ["alpha", "beta", "gamma", "delta", "epsilon"] {
            let mut rng = SeededRandom::new(seed);
            let map = generate_map(&mut rng);
            let start = map.start_room().map(Room::center).expect("start room");
            let reachable = reachable_from(&map, start);
            for room in map.rooms() {
                assert!(
                    reachable.contains(&room.center()),
                    "room {} unreachable for seed {seed}",
                    room.id
                );
            }
        }
    }

    #[test]
    fn exactly_one_boss_and_shop_room() {
        let mut rng = SeededRandom::new("layout");
        let map = generate_map(&mut rng);
        assert_eq!(map.rooms().iter().filter(|r| r.is_boss()).count(), 1);
        assert_eq!(map.rooms().iter().filter(|r| r.is_shop()).count(), 1);
        assert!(map.rooms()[0].is_start());
        let boss = map.boss_room().expect("boss room");
        assert_eq!((boss.x, boss.y), (WORLD_WIDTH - 10, WORLD_HEIGHT - 10));
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_map(&mut SeededRandom::new("same"));
        let b = generate_map(&mut SeededRandom::new("same"));
        assert_eq!(a.cells(), b.cells());
        assert_eq!(a.rooms(), b.rooms());
    }

    #[test]
    fn path_excludes_start_and_allows_blocked_goal() {
        let cells = vec![Tile::Room; 25];
        let map = WorldMap::from_parts(5, 5, Vec::new(), cells).expect("grid");
        let start = Position::new(0, 0);
        let goal = Position::new(3, 0);
        assert!(map.path_to(start, start, &HashSet::new()).is_empty());
        let blocked = HashSet::from([goal]);
        let path = map.path_to(start, goal, &blocked);
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some(&goal));
        assert_ne!(path.first(), Some(&start));
    }

    #[test]
    fn unreachable_path_is_empty() {
        let mut cells = vec![Tile::Room; 25];
        for y in 0..5 {
            cells[y * 5 + 2] = Tile::Empty;
        }
        let map = WorldMap::from_parts(5, 5, Vec::new(), cells).expect("grid");
        assert!(map
            .path_to(Position::new(0, 0), Position::new(4, 4), &HashSet::new())
            .is_empty());
    }

    #[test]
    fn walls_block_sight_and_fov_accumulates() {
        let mut cells = vec![Tile::Room; 49];
        cells[3 * 7 + 3] = Tile::Empty;
        let mut map = WorldMap::from_parts(7, 7, Vec::new(), cells).expect("grid");
        assert!(!map.line_of_sight(Position::new(1, 3), Position::new(5, 3)));
        assert!(map.line_of_sight(Position::new(1, 1), Position::new(5, 1)));

        map.update_fov(Position::new(0, 0), 2);
        assert!(map.is_visible(Position::new(2, 0)));
        assert!(!map.is_visible(Position::new(2, 2)), "outside the radius");
        map.update_fov(Position::new(6, 6), 2);
        assert!(!map.is_visible(Position::new(2, 0)));
        assert!(map.is_explored(Position::new(2, 0)));
    }

    #[test]
    fn random_positions_are_distinct_and_avoid_keepouts() {
        let room = Room {
            id: 9,
            x: 2,
            y: 2,
            w: 3,
            h: 3,
            attrs: RoomAttrs::NONE,
        };
        let mut rng = SeededRandom::new("spots");
        let keepout = [Position::new(3, 3)];
        let spots = random_positions_in_room(&room, &mut rng, 8, &keepout, 0);
        assert_eq!(spots.len(), 8);
        let unique: HashSet<_> = spots.iter().collect();
        assert_eq!(unique.len(), 8);
        assert!(!spots.contains(&Position::new(3, 3)));
        assert!(spots.iter().all(|p| room.contains(*p)));
    }
}
