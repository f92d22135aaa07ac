//! Centralized balance and tuning constants for the Delve simulation.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together means gameplay can only be adjusted via reviewed
//! code changes, never through external assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_FLOOR_BUILT: &str = "log.floor.built";
pub(crate) const LOG_BATTLE_START: &str = "log.battle.start";
pub(crate) const LOG_BATTLE_END: &str = "log.battle.end";
pub(crate) const LOG_AI_AMBUSH: &str = "log.ai.ambush";
pub(crate) const LOG_SAVE_ENCODED: &str = "log.save.encoded";
pub(crate) const LOG_SAVE_DECODED: &str = "log.save.decoded";

// World --------------------------------------------------------------------
pub const WORLD_WIDTH: i32 = 64;
pub const WORLD_HEIGHT: i32 = 64;
pub const FOV_DEFAULT_RADIUS: i32 = 8;
pub(crate) const START_ROOM_SIZE: i32 = 8;
pub(crate) const BOSS_ROOM_SIZE: i32 = 8;
pub(crate) const BOSS_ROOM_EDGE_OFFSET: i32 = 10;
pub(crate) const ROOM_DENSITY: f64 = 0.005;
pub(crate) const ROOM_TARGET_MINIMUM: usize = 8;
pub(crate) const ROOM_PLACEMENT_ATTEMPTS: usize = 200;
pub(crate) const ROOM_SIZE_DIVISOR: i32 = 8;
pub(crate) const ROOM_SIZE_MINIMUM: i32 = 4;
pub(crate) const ROOM_OVERLAP_PADDING: i32 = 1;
pub(crate) const SHOP_ROOM_PERCENTILE: f64 = 0.65;
pub(crate) const EXTRA_EDGE_DIVISOR: usize = 5;
pub(crate) const CORRIDOR_ENDPOINT_PADDING: i32 = 1;
pub(crate) const LABYRINTH_BRANCH_MINIMUM: usize = 16;
pub(crate) const LABYRINTH_AREA_PER_BRANCH: i32 = 180;
pub(crate) const LABYRINTH_STEPS_MIN: i32 = 7;
pub(crate) const LABYRINTH_STEPS_MAX: i32 = 28;
pub(crate) const LABYRINTH_TURN_CHANCE: f64 = 0.35;
pub(crate) const LABYRINTH_SIDE_BRANCH_CHANCE: f64 = 0.15;
pub(crate) const ROOM_POSITION_MAX_TRIES: usize = 5000;

// Player baseline ----------------------------------------------------------
pub const PLAYER_INITIAL_HP: i32 = 30;
pub const PLAYER_CONSTITUTION_BONUS: i32 = 5;
pub const PLAYER_START_X: i32 = 4;
pub const PLAYER_START_Y: i32 = 4;
pub const PLAYER_BASE_ATTACK_BONUS: i32 = 2;
pub const PLAYER_BASE_DEFENSE_BONUS: i32 = 2;
pub const PLAYER_BASE_DEFENSE: i32 = 5;
pub const PLAYER_INVENTORY_CAPACITY: usize = 10;

// Challenge scaling --------------------------------------------------------
pub const CHALLENGE_LEVEL_SCALE_UP_FACTOR: f64 = 1.3;
pub const MAXIMUM_CHALLENGE_LEVEL: i32 = 10;
pub const BOSS_CHALLENGE_LEVEL: i32 = MAXIMUM_CHALLENGE_LEVEL + 5;
pub const FLOOR_DEPTH_SCALE_PER_FLOOR: f64 = 0.02;

// Critical tuning ----------------------------------------------------------
pub const PLAYER_CRIT_MINIMUM_ROLL: i32 = 18;
pub const PLAYER_CRIT_MINIMUM_MULTIPLIER: i32 = 2;
pub const PLAYER_CRIT_MAXIMUM_MULTIPLIER: i32 = 3;
pub const WEAPON_CRIT_MAXIMUM_ROLL: i32 = 20;
pub const DEFAULT_WEAPON_CRITICAL_RANGE: i32 = 20;
pub const DEFAULT_WEAPON_CRITICAL_MULTIPLIER: i32 = 2;
pub const DEFAULT_WEAPON_DAMAGE_DICE: &str = "1d6";
pub const DEFAULT_WEAPON_ATTACK_BONUS: i32 = 4;
pub const DEFAULT_WEAPON_DEFENSE_BONUS: i32 = -1;
pub const MOB_CRITICAL_RANGE_MINIMUM: i32 = 17;
pub const MOB_CRITICAL_MULTIPLIER_MAXIMUM: i32 = 3;

// Creature baselines -------------------------------------------------------
pub const CREATURE_MAX_DAMAGE_AT_LEVEL_1: i32 = 9;
pub const CREATURE_MAX_HP_AT_LEVEL_1: i32 = 40;
pub const CREATURE_MIN_HP_AT_LEVEL_1: i32 = CREATURE_MAX_HP_AT_LEVEL_1 / 2;
pub const CREATURE_BASE_STR: i32 = 6;
pub const CREATURE_BASE_DEX: i32 = 4;
pub const CREATURE_BASE_CON: i32 = 2;
pub const CREATURE_BASELINE_STR: i32 = 8;
pub const CREATURE_BASELINE_DEX: i32 = 8;
pub const CREATURE_BASELINE_CON: i32 = 8;
pub const CREATURE_BASELINE_OTHER: i32 = 8;
pub const CREATURE_BASE_ATTACK_BONUS: i32 = 0;
pub const CREATURE_BASE_DEFENSE_BONUS: i32 = 0;
pub const CREATURE_GOLD_SCALER: i32 = 15;
pub const CREATURE_GOLD_MULTIPLIER: i32 = 3;
pub const CREATURE_XP_MULTIPLIER: i32 = 2;

// Level scaling ------------------------------------------------------------
pub const PLAYER_HP_PER_LEVEL_MULTIPLIER: f64 = 1.5;
pub const PLAYER_HP_HEAL_ON_LEVEL_UP: f64 = 0.75;
pub const PLAYER_XP_FOR_LEVEL_2: i32 = 128;
pub const PLAYER_XP_GOAL_MULTIPLIER: i32 = 4;

// Combat tuning ------------------------------------------------------------
pub const MAXIMUM_INEFFECTIVE_DAMAGE_MULTIPLIER: f64 = 0.5;
pub const COMBAT_OFFENSIVE_ATTACK_MULTIPLIER: f64 = 2.0;
pub const COMBAT_OFFENSIVE_DEFENSE_MULTIPLIER: f64 = 0.3;
pub const COMBAT_DEFENSIVE_ATTACK_MULTIPLIER: f64 = 0.5;
pub const COMBAT_DEFENSIVE_DEFENSE_MULTIPLIER: f64 = 1.5;
pub const ARMOR_CLASS_BASE: f64 = 10.0;
pub const FLEE_DIE_SIDES: i32 = 20;
pub const FLEE_BASE_DC: i32 = 11;

// Luck window --------------------------------------------------------------
pub const PLAYER_LUCK_HISTORY_SIZE: usize = 8;
pub const PLAYER_LUCK_LOW_ROLL_THRESHOLD: i32 = 8;
pub const PLAYER_LUCK_LOW_ROLL_TRIGGER: i32 = 4;
pub const PLAYER_LUCK_BONUS_PER_LOW_ROLL: i32 = 1;
pub const PLAYER_LUCK_MAX_HISTORY_BONUS: i32 = 3;
pub const PLAYER_LUCK_BONUS_PER_MISS_STREAK: i32 = 1;
pub const PLAYER_LUCK_MAX_MISS_STREAK_BONUS: i32 = 3;
pub const PLAYER_LUCK_LOW_HP_RATIO: f64 = 0.3;
pub const PLAYER_LUCK_LOW_HP_BONUS: i32 = 2;
pub const PLAYER_LUCK_CRITICAL_HP_RATIO: f64 = 0.15;
pub const PLAYER_LUCK_CRITICAL_HP_EXTRA_BONUS: i32 = 1;
pub const PLAYER_LUCK_MAX_TOTAL_BONUS: i32 = 6;

// Enemy behavior profiles --------------------------------------------------
pub const ENEMY_STYLE_LOW_HP_RATIO: f64 = 0.35;
pub const ENEMY_STYLE_GUARDED_CHANCE_PERCENT: i32 = 45;
pub const ENEMY_STYLE_RECKLESS_CHANCE_PERCENT: i32 = 30;
pub const ENEMY_STYLE_GUARDED_ATTACK_MULTIPLIER: f64 = 0.65;
pub const ENEMY_STYLE_GUARDED_DEFENSE_MULTIPLIER: f64 = 1.4;
pub const ENEMY_STYLE_RECKLESS_ATTACK_MULTIPLIER: f64 = 1.6;
pub const ENEMY_STYLE_RECKLESS_DEFENSE_MULTIPLIER: f64 = 0.7;
pub const ENEMY_STYLE_STEADY_ATTACK_MULTIPLIER: f64 = 1.0;
pub const ENEMY_STYLE_STEADY_DEFENSE_MULTIPLIER: f64 = 1.0;

// Economy/shop -------------------------------------------------------------
pub const SHOP_DISCOUNT_FOR_CHARISMA: f64 = 0.05;
pub const SHOP_SERVICE_COST_BONUS_POINT: i32 = 180;
pub const SHOP_SERVICE_COST_REMOVE_PERK: i32 = 260;
pub const SHOP_SERVICE_COST_REMOVE_GAMBIT: i32 = 240;
pub const SHOP_REWARD_FALLBACK_GOLD: i32 = 120;

// Consumables --------------------------------------------------------------
pub const BANDAGES_HEAL_HP: i32 = 5;
pub const HEALTH_POTION_HEAL_HP: i32 = BANDAGES_HEAL_HP * 5;
pub const LARGE_HEALTH_POTION_HEAL_HP: i32 = HEALTH_POTION_HEAL_HP * 2;
pub const HUGE_HEALTH_POTION_HEAL_HP: i32 = HEALTH_POTION_HEAL_HP * 4;
pub const COLOSSAL_HEALTH_POTION_HEAL_HP: i32 = HEALTH_POTION_HEAL_HP * 10;
pub const INSTAHEAL_HEAL_HP: i32 = 1_000_000_000;
pub const BANDAGES_GOLD_VALUE: i32 = 10;
pub const HEALTH_POTION_GOLD_VALUE: i32 = 50;
pub const LARGE_HEALTH_POTION_GOLD_VALUE: i32 = 250;
pub const HUGE_HEALTH_POTION_GOLD_VALUE: i32 = 750;
pub const COLOSSAL_HEALTH_POTION_GOLD_VALUE: i32 = 1250;
pub const INSTAHEAL_GOLD_VALUE: i32 = 15_000;
pub const STARTING_BANDAGE_COUNT: usize = 5;

// Starting weapon loadout --------------------------------------------------
pub const STARTING_WEAPON_CRITICAL_RANGE: i32 = 19;
pub const STARTING_WEAPON_CRITICAL_MULTIPLIER: i32 = 3;
pub const STARTING_WEAPON_ATTACK_BONUS: i32 = 0;
pub const STARTING_WEAPON_DEFENSE_BONUS: i32 = 0;
pub const STARTING_WEAPON_DAMAGE_DICE: &str = "1d10";
pub const STARTING_ARMOR_DEFENSE_BONUS: i32 = 1;

// Turn-based items ---------------------------------------------------------
pub const TURN_EFFECT_DEFAULT_LIFETIME: i32 = 5;
pub const POISON_DEFAULT_DAMAGE_PER_TURN: i32 = 5;
pub const BUFF_DEFAULT_HP: i32 = 5;
pub const BUFF_DEFAULT_ATTACK: i32 = 2;
pub const BUFF_DEFAULT_DEFENSE: i32 = 2;

// Containers ---------------------------------------------------------------
pub const CHEST_DEFAULT_CAPACITY: usize = 5;
pub const FLOOR_CHEST_CAPACITY: usize = 6;

// Procgen loot knobs -------------------------------------------------------
pub const ITEM_POOL_GENERATION_COUNT: usize = 260;
pub const ITEM_SPECIAL_ROLL_MIN: i32 = 19;
pub const ITEM_SPECIAL_VALUE_MULTIPLIER: f64 = 3.0;
pub const ITEM_DEFAULT_VALUE_MULTIPLIER: f64 = 1.0;
pub const NAME_GENERATION_MAX_ATTEMPTS: usize = 200;
pub const NAME_GENERATION_FALLBACK_MAX_ID: f64 = 100_000.0;
pub const ITEM_WEAPON_MAX_DAMAGE_ROLL_MIN: i32 = 6;
pub const ITEM_WEAPON_MAX_DAMAGE_ROLL_MAX: i32 = 24;
pub const WEAPON_DAMAGE_FACE_MIN: i32 = 2;
pub const WEAPON_DAMAGE_FACE_MAX: i32 = 20;
pub const ITEM_WEAPON_CHALLENGE_ROLL_MIN: i32 = 1;
pub const ITEM_WEAPON_CHALLENGE_ROLL_MAX: i32 = 6;
pub const ITEM_WEAPON_FLAT_BONUS_BASE: i32 = 1;
pub const ITEM_WEAPON_FLAT_BONUS_CHALLENGE_DIVISOR: i32 = 2;
pub const ITEM_WEAPON_FLAT_BONUS_RANDOM_MAX: i32 = 3;
pub const ITEM_ARMOR_CHALLENGE_ROLL_MIN: i32 = 1;
pub const ITEM_ARMOR_CHALLENGE_ROLL_MAX: i32 = 6;
pub const ITEM_ARMOR_DEFENSE_BASE_MIN: i32 = 1;
pub const ITEM_ARMOR_DEFENSE_CHALLENGE_BONUS: i32 = 2;
pub const ITEM_WEAPON_VALUE_DIE_SIDES: i32 = 8;
pub const ITEM_WEAPON_VALUE_DIE_MULTIPLIER: i32 = 10;
pub const ITEM_ARMOR_VALUE_ATTACK_WEIGHT: i32 = 3;
pub const ITEM_ARMOR_VALUE_DEFENSE_WEIGHT: i32 = 2;
pub const SHOP_TOP_WEAPONS: usize = 5;
pub const SHOP_TOP_ARMORS: usize = 5;
pub const SHOP_CLUTTER_DENSITY_DIVISOR: i32 = 3;
pub const SHOP_CLUTTER_SPRITES: [u16; 8] = [88, 89, 90, 91, 92, 93, 94, 95];

// Mob/chest spawn formulas -------------------------------------------------
pub const FLOOR_MOB_BASE: f64 = 3.0;
pub const FLOOR_MOB_PER_FLOOR: f64 = 0.5;
pub const FLOOR_CHEST_BASE: f64 = 5.0;
pub const FLOOR_CHEST_PER_FLOOR: f64 = 0.4;
pub const FLOOR_SCALE_MINIMUM: f64 = 0.2;
pub const BOSS_STR_BONUS_BASE: i32 = 8;
pub const BOSS_DEX_BONUS_BASE: i32 = 4;
pub const BOSS_DEX_BONUS_FLOOR_DIVISOR: i32 = 2;
pub const BOSS_CON_BONUS_BASE: i32 = 6;
pub const BOSS_HP_SCALE_PER_FLOOR: f64 = 0.16;

// Chest loot odds (d20) ----------------------------------------------------
pub const CHEST_WEAPON_ROLL_MIN: i32 = 13;
pub const CHEST_ARMOR_ROLL_MIN: i32 = 16;
pub const CHEST_GOLD_ROLL_MIN: i32 = 8;
pub const CHEST_TOP_POTION_ROLL_MIN: i32 = 20;
pub const CHEST_LARGE_OR_HEALTH_ROLL_MIN: i32 = 19;
pub const CHEST_TIERED_POTION_ROLL_MIN: i32 = 18;
pub const CHEST_HIGH_TIER_LEVEL: i32 = 8;
pub const CHEST_MID_TIER_LEVEL: i32 = 5;
pub const CHEST_GOLD_DICE: &str = "6d20";

// Floor transition/healing -------------------------------------------------
pub const FLOOR_TRANSITION_HEAL_RATIO: f64 = 0.35;
pub const FLOOR_TRANSITION_HEAL_MINIMUM: i32 = 4;
pub const SHOP_REWARD_HEAL_FALLBACK_RATIO: f64 = 0.35;

// AI -----------------------------------------------------------------------
pub const AI_MOVE_MS: f64 = 450.0;
pub const AI_WANDER_ROLL_MAX: i32 = 12;
pub const AI_WANDER_MOVE_ROLL_MIN: i32 = 9;
pub const AI_LEASH_PURSUIT_TURNS: i32 = 2;

// Run log and danger sense -------------------------------------------------
pub const LOG_LIMIT: usize = 9;
pub const DANGER_WARNING_LEVEL_GAP: i32 = 2;
pub const SURPRISE_PROTECTION_ATTACK_MULTIPLIER: f64 = 0.35;
pub const SURPRISE_PROTECTION_FLEE_BONUS: i32 = 6;

// Save tokens --------------------------------------------------------------
pub const SAVE_VERSION: u32 = 1;
pub const SAVE_TOKEN_PREFIX: &str = "std1.";
pub const SAVE_QUERY_PARAM: &str = "save";
pub const MAX_SHAREABLE_URL_LENGTH: usize = 1800;
