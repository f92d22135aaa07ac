//! Turn resolution between the player and one enemy.
//!
//! A turn is the player's action followed, if the enemy still stands, by the
//! enemy's styled attack and then end-of-turn housekeeping on both sides.
//! The player's to-hit rolls carry a bounded luck correction fed by recent
//! d20 history, the current miss streak and how hurt the player is.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::attributes::Attribute;
use crate::constants::{
    ARMOR_CLASS_BASE, COMBAT_DEFENSIVE_ATTACK_MULTIPLIER, COMBAT_DEFENSIVE_DEFENSE_MULTIPLIER,
    COMBAT_OFFENSIVE_ATTACK_MULTIPLIER, COMBAT_OFFENSIVE_DEFENSE_MULTIPLIER,
    ENEMY_STYLE_GUARDED_ATTACK_MULTIPLIER, ENEMY_STYLE_GUARDED_CHANCE_PERCENT,
    ENEMY_STYLE_GUARDED_DEFENSE_MULTIPLIER, ENEMY_STYLE_LOW_HP_RATIO,
    ENEMY_STYLE_RECKLESS_ATTACK_MULTIPLIER, ENEMY_STYLE_RECKLESS_CHANCE_PERCENT,
    ENEMY_STYLE_RECKLESS_DEFENSE_MULTIPLIER, ENEMY_STYLE_STEADY_ATTACK_MULTIPLIER,
    ENEMY_STYLE_STEADY_DEFENSE_MULTIPLIER, FLEE_BASE_DC, FLEE_DIE_SIDES,
    MAXIMUM_INEFFECTIVE_DAMAGE_MULTIPLIER, PLAYER_LUCK_BONUS_PER_LOW_ROLL,
    PLAYER_LUCK_BONUS_PER_MISS_STREAK, PLAYER_LUCK_CRITICAL_HP_EXTRA_BONUS,
    PLAYER_LUCK_CRITICAL_HP_RATIO, PLAYER_LUCK_HISTORY_SIZE, PLAYER_LUCK_LOW_HP_BONUS,
    PLAYER_LUCK_LOW_HP_RATIO, PLAYER_LUCK_LOW_ROLL_THRESHOLD, PLAYER_LUCK_LOW_ROLL_TRIGGER,
    PLAYER_LUCK_MAX_HISTORY_BONUS, PLAYER_LUCK_MAX_MISS_STREAK_BONUS,
    PLAYER_LUCK_MAX_TOTAL_BONUS,
};
use crate::creature::Creature;
use crate::dice::Roller;
use crate::narration::{LogEntry, LogEvent, LogLevel, Narrator};
use crate::numbers::{ceil_f64_to_i32, usize_to_i32};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerAction {
    Normal,
    Offensive,
    Defensive,
    Heal,
    Flee,
}

impl PlayerAction {
    pub const ALL: [Self; 5] = [
        Self::Normal,
        Self::Offensive,
        Self::Defensive,
        Self::Heal,
        Self::Flee,
    ];

    /// Player attack and defense multipliers for this stance.
    #[must_use]
    pub const fn stance_multipliers(self) -> (f64, f64) {
        match self {
            Self::Offensive => (
                COMBAT_OFFENSIVE_ATTACK_MULTIPLIER,
                COMBAT_OFFENSIVE_DEFENSE_MULTIPLIER,
            ),
            Self::Defensive => (
                COMBAT_DEFENSIVE_ATTACK_MULTIPLIER,
                COMBAT_DEFENSIVE_DEFENSE_MULTIPLIER,
            ),
            _ => (1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyStyle {
    Guarded,
    Reckless,
    Steady,
}

impl EnemyStyle {
    #[must_use]
    pub const fn multipliers(self) -> (f64, f64) {
        match self {
            Self::Guarded => (
                ENEMY_STYLE_GUARDED_ATTACK_MULTIPLIER,
                ENEMY_STYLE_GUARDED_DEFENSE_MULTIPLIER,
            ),
            Self::Reckless => (
                ENEMY_STYLE_RECKLESS_ATTACK_MULTIPLIER,
                ENEMY_STYLE_RECKLESS_DEFENSE_MULTIPLIER,
            ),
            Self::Steady => (
                ENEMY_STYLE_STEADY_ATTACK_MULTIPLIER,
                ENEMY_STYLE_STEADY_DEFENSE_MULTIPLIER,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollPhase {
    ToHit,
    CritCheck,
    CritConfirm,
    Flee,
}

/// Structured playback record of a combat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CombatMoment {
    Text {
        text: String,
        level: LogLevel,
    },
    Roll {
        phase: RollPhase,
        actor: String,
        defender: String,
        roll: i32,
        bonus: i32,
        total: i32,
        target: i32,
        success: bool,
    },
    #[serde(rename_all = "camelCase")]
    Damage {
        actor: String,
        defender: String,
        dice: String,
        roll: i32,
        multiplier: f64,
        #[serde(rename = "final")]
        final_damage: i32,
        remaining_hp: i32,
    },
    Heal {
        actor: String,
        item: String,
        amount: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombatResult {
    pub over: bool,
    pub fled: bool,
    pub logs: Vec<LogEntry>,
    pub moments: Vec<CombatMoment>,
}

/// Per-turn modifiers supplied by the run (ambush protection).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnOptions {
    pub enemy_attack_multiplier: f64,
    pub flee_bonus: i32,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            enemy_attack_multiplier: 1.0,
            flee_bonus: 0,
        }
    }
}

/// Persisted luck window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatLuckState {
    pub recent_player_d20_rolls: Vec<i32>,
    pub player_miss_streak: i32,
}

/// `ceil(10 + defense bonus × multiplier + dex modifier)`.
#[must_use]
pub fn armor_class_for(defender: &Creature, defense_multiplier: f64) -> i32 {
    ceil_f64_to_i32(
        ARMOR_CLASS_BASE
            + f64::from(defender.defense_bonus) * defense_multiplier
            + f64::from(defender.modifier(Attribute::Dex)),
    )
}

/// Luck correction in `[0, 6]` for a given window and HP ratio.
#[must_use]
pub fn player_luck_bonus(state: &CombatLuckState, hp_ratio: f64) -> i32 {
    let low_rolls = usize_to_i32(
        state
            .recent_player_d20_rolls
            .iter()
            .filter(|roll| **roll <= PLAYER_LUCK_LOW_ROLL_THRESHOLD)
            .count(),
    );
    let trigger_excess = (low_rolls - PLAYER_LUCK_LOW_ROLL_TRIGGER + 1).max(0);
    let history_bonus =
        (trigger_excess * PLAYER_LUCK_BONUS_PER_LOW_ROLL).min(PLAYER_LUCK_MAX_HISTORY_BONUS);
    let streak_bonus = (state.player_miss_streak * PLAYER_LUCK_BONUS_PER_MISS_STREAK)
        .min(PLAYER_LUCK_MAX_MISS_STREAK_BONUS);

    let mut hp_bonus = 0;
    if hp_ratio <= PLAYER_LUCK_LOW_HP_RATIO {
        hp_bonus += PLAYER_LUCK_LOW_HP_BONUS;
    }
    if hp_ratio <= PLAYER_LUCK_CRITICAL_HP_RATIO {
        hp_bonus += PLAYER_LUCK_CRITICAL_HP_EXTRA_BONUS;
    }

    (history_bonus + streak_bonus + hp_bonus).clamp(0, PLAYER_LUCK_MAX_TOTAL_BONUS)
}

/// Collects logs and moments for one turn.
struct Transcript<'n> {
    narrator: &'n dyn Narrator,
    logs: Vec<LogEntry>,
    moments: Vec<CombatMoment>,
}

impl<'n> Transcript<'n> {
    fn new(narrator: &'n dyn Narrator) -> Self {
        Self {
            narrator,
            logs: Vec::new(),
            moments: Vec::new(),
        }
    }

    fn log(&mut self, event: &LogEvent<'_>, level: LogLevel) {
        self.logs
            .push(LogEntry::new(self.narrator.narrate(event), level));
    }

    fn text(&mut self, event: &LogEvent<'_>, level: LogLevel) {
        self.moments.push(CombatMoment::Text {
            text: self.narrator.narrate(event),
            level,
        });
    }

    /// Same line in the log and in the moment stream.
    fn both(&mut self, event: &LogEvent<'_>, level: LogLevel) {
        let text = self.narrator.narrate(event);
        self.logs.push(LogEntry::new(text.clone(), level));
        self.moments.push(CombatMoment::Text { text, level });
    }

    fn finish(self, over: bool, fled: bool) -> CombatResult {
        CombatResult {
            over,
            fled,
            logs: self.logs,
            moments: self.moments,
        }
    }
}

/// Combat resolver. Owns only the player's luck window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combat {
    recent_rolls: VecDeque<i32>,
    miss_streak: i32,
}

impl Combat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot_luck_state(&self) -> CombatLuckState {
        CombatLuckState {
            recent_player_d20_rolls: self.recent_rolls.iter().copied().collect(),
            player_miss_streak: self.miss_streak,
        }
    }

    /// Restore a window, flooring rolls at 1, keeping the newest 8 and
    /// flooring the streak at 0.
    pub fn restore_luck_state(&mut self, state: &CombatLuckState) {
        let rolls = &state.recent_player_d20_rolls;
        let skip = rolls.len().saturating_sub(PLAYER_LUCK_HISTORY_SIZE);
        self.recent_rolls = rolls.iter().skip(skip).map(|roll| (*roll).max(1)).collect();
        self.miss_streak = state.player_miss_streak.max(0);
    }

    fn luck_bonus(&self, player: &Creature) -> i32 {
        let ratio =
            f64::from(player.hitpoints) / f64::from(player.current_max_hitpoints().max(1));
        player_luck_bonus(&self.snapshot_luck_state(), ratio)
    }

    fn record_player_roll(&mut self, roll: i32, success: bool) {
        self.recent_rolls.push_back(roll);
        while self.recent_rolls.len() > PLAYER_LUCK_HISTORY_SIZE {
            self.recent_rolls.pop_front();
        }
        if success {
            self.miss_streak = 0;
        } else {
            self.miss_streak += 1;
        }
    }

    #[allow(clippy::too_many_lines)]
    fn attack<R: Roller + ?Sized>(
        &mut self,
        roller: &mut R,
        out: &mut Transcript<'_>,
        attacker: &Creature,
        defender: &mut Creature,
        attack_multiplier: f64,
        defense_multiplier: f64,
    ) {
        if !attacker.alive || !defender.alive {
            return;
        }

        let armor_class = armor_class_for(defender, defense_multiplier);
        let attack_roll = roller.d20();
        let attack_bonus = attacker.attack_bonus + attacker.modifier(Attribute::Str);
        let luck = if attacker.mob {
            0
        } else {
            self.luck_bonus(attacker)
        };
        let total_bonus = attack_bonus + luck;
        let crit_range = attacker.weapon_critical_range();
        let mut damage_multiplier = 1.0_f64;

        if attack_roll >= crit_range {
            out.moments.push(CombatMoment::Roll {
                phase: RollPhase::CritCheck,
                actor: attacker.name.clone(),
                defender: defender.name.clone(),
                roll: attack_roll,
                bonus: 0,
                total: attack_roll,
                target: crit_range,
                success: true,
            });

            if attacker.mob {
                let confirm = roller.d20() + attack_bonus;
                let confirmed = confirm > armor_class;
                out.moments.push(CombatMoment::Roll {
                    phase: RollPhase::CritConfirm,
                    actor: attacker.name.clone(),
                    defender: defender.name.clone(),
                    roll: confirm - attack_bonus,
                    bonus: attack_bonus,
                    total: confirm,
                    target: armor_class,
                    success: confirmed,
                });
                if confirmed {
                    damage_multiplier = f64::from(attacker.weapon_critical_multiplier());
                    out.log(
                        &LogEvent::EnemyCritical {
                            attacker: &attacker.name,
                        },
                        LogLevel::Success,
                    );
                } else {
                    out.log(
                        &LogEvent::EnemyCriticalDowngrade {
                            attacker: &attacker.name,
                        },
                        LogLevel::Info,
                    );
                }
            } else {
                let multiplier = attacker.weapon_critical_multiplier();
                damage_multiplier = f64::from(multiplier);
                out.log(
                    &LogEvent::PlayerCritical {
                        attacker: &attacker.name,
                        multiplier,
                    },
                    LogLevel::Success,
                );
                out.text(
                    &LogEvent::PlayerCriticalMoment {
                        attacker: &attacker.name,
                        multiplier,
                    },
                    LogLevel::Success,
                );
                self.record_player_roll(attack_roll, true);
            }
        } else {
            let total = attack_roll + total_bonus;
            let hit = total > armor_class;
            out.moments.push(CombatMoment::Roll {
                phase: RollPhase::ToHit,
                actor: attacker.name.clone(),
                defender: defender.name.clone(),
                roll: attack_roll,
                bonus: total_bonus,
                total,
                target: armor_class,
                success: hit,
            });
            if !attacker.mob {
                self.record_player_roll(attack_roll, hit);
            }
            if hit {
                out.log(
                    &LogEvent::Hit {
                        attacker: &attacker.name,
                        total,
                        armor_class,
                    },
                    LogLevel::Success,
                );
            } else {
                // A failed check still lands a glancing blow.
                damage_multiplier *= f64::from(total.max(1)) / f64::from(armor_class.max(1))
                    * MAXIMUM_INEFFECTIVE_DAMAGE_MULTIPLIER;
                out.log(
                    &LogEvent::ReducedDamageHit {
                        attacker: &attacker.name,
                        armor_class,
                        total,
                    },
                    LogLevel::Warn,
                );
            }
        }

        let dice = attacker.weapon_damage();
        let damage_roll = roller.roll_dice(&dice);
        let multiplier = damage_multiplier
            * attack_multiplier
            * attacker.damage_dealt_multiplier
            * defender.damage_taken_multiplier;
        let final_damage = ceil_f64_to_i32(f64::from(damage_roll) * multiplier).max(1);
        defender.hitpoints -= final_damage;
        let remaining_hp = defender.hitpoints.max(0);
        out.log(
            &LogEvent::Damage {
                attacker: &attacker.name,
                damage: final_damage,
                defender: &defender.name,
                remaining_hp,
            },
            LogLevel::Info,
        );

        let falls = defender.hitpoints <= 0;
        if falls {
            defender.hitpoints = 0;
            defender.alive = false;
        }

        out.moments.push(CombatMoment::Damage {
            actor: attacker.name.clone(),
            defender: defender.name.clone(),
            dice: dice.to_string(),
            roll: damage_roll,
            multiplier,
            final_damage,
            remaining_hp,
        });

        if falls {
            let level = if defender.mob {
                LogLevel::Success
            } else {
                LogLevel::Warn
            };
            out.both(
                &LogEvent::Falls {
                    defender: &defender.name,
                },
                level,
            );
        }
    }

    fn enemy_style<R: Roller + ?Sized>(roller: &mut R, enemy: &Creature) -> EnemyStyle {
        let ratio = f64::from(enemy.hitpoints) / f64::from(enemy.max_hitpoints.max(1));
        if ratio < ENEMY_STYLE_LOW_HP_RATIO
            && roller.roll(1, 100) <= ENEMY_STYLE_GUARDED_CHANCE_PERCENT
        {
            return EnemyStyle::Guarded;
        }
        if roller.roll(1, 100) <= ENEMY_STYLE_RECKLESS_CHANCE_PERCENT {
            return EnemyStyle::Reckless;
        }
        EnemyStyle::Steady
    }

    /// Resolve one full exchange.
    pub fn turn<R: Roller + ?Sized>(
        &mut self,
        roller: &mut R,
        narrator: &dyn Narrator,
        player: &mut Creature,
        enemy: &mut Creature,
        action: PlayerAction,
        options: TurnOptions,
    ) -> CombatResult {
        let mut out = Transcript::new(narrator);
        if !player.alive || !enemy.alive {
            return out.finish(true, false);
        }

        let (player_atk, player_def) = action.stance_multipliers();
        match action {
            PlayerAction::Offensive => out.both(&LogEvent::OffensiveStance, LogLevel::Warn),
            PlayerAction::Defensive => out.both(&LogEvent::DefensiveStance, LogLevel::Info),
            _ => {}
        }

        match action {
            PlayerAction::Flee => {
                let flee_roll = roller.roll(1, FLEE_DIE_SIDES);
                let bonus = player.modifier(Attribute::Dex)
                    + options.flee_bonus
                    + self.luck_bonus(player);
                let score = flee_roll + bonus;
                let dc = FLEE_BASE_DC + enemy.modifier(Attribute::Dex);
                let escaped = score >= dc;
                out.moments.push(CombatMoment::Roll {
                    phase: RollPhase::Flee,
                    actor: player.name.clone(),
                    defender: enemy.name.clone(),
                    roll: flee_roll,
                    bonus,
                    total: score,
                    target: dc,
                    success: escaped,
                });
                self.record_player_roll(flee_roll, escaped);
                if escaped {
                    out.log(&LogEvent::FleeSuccess { score, dc }, LogLevel::Success);
                    out.text(&LogEvent::FleeSuccessMoment { score, dc }, LogLevel::Success);
                    return out.finish(true, true);
                }
                out.log(&LogEvent::FleeFail { score, dc }, LogLevel::Warn);
                out.text(&LogEvent::FleeFailMoment { score, dc }, LogLevel::Warn);
            }
            PlayerAction::Heal => {
                let picked = player.best_heal_item().map(|item| item.id);
                match picked.and_then(|id| player.inventory.remove(id)) {
                    Some(item) => {
                        let amount = player.apply_instant_item(&item);
                        out.log(
                            &LogEvent::Heal {
                                item: &item.name,
                                amount,
                            },
                            LogLevel::Success,
                        );
                        out.moments.push(CombatMoment::Heal {
                            actor: player.name.clone(),
                            item: item.name,
                            amount,
                        });
                    }
                    None => {
                        out.log(&LogEvent::NoHealingItem, LogLevel::Warn);
                        out.text(&LogEvent::NoHealingMoment, LogLevel::Warn);
                    }
                }
            }
            _ => self.attack(roller, &mut out, player, enemy, player_atk, 1.0),
        }

        if enemy.alive {
            let style = Self::enemy_style(roller, enemy);
            out.both(
                &LogEvent::EnemyStyle {
                    enemy: &enemy.name,
                    style,
                },
                LogLevel::Info,
            );
            let (style_atk, style_def) = style.multipliers();
            self.attack(
                roller,
                &mut out,
                enemy,
                player,
                style_atk * options.enemy_attack_multiplier.max(0.0),
                player_def * style_def,
            );
        }

        player.think();
        enemy.think();

        let over = !player.alive || !enemy.alive;
        out.finish(over, false)
    }
}

/// Whether the heal action has anything to use.
#[must_use]
pub fn can_player_heal(player: &Creature) -> bool {
    player.heal_items().next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;
    use crate::dice::DiceSpec;
    use crate::narration::EnglishNarrator;
    use crate::procgen::{NameGenerator, creature_at_level};
    use crate::rng::SeededRandom;
    use crate::world::Position;

    /// Scripted rolls, clamped into range; empty queues yield the low bound.
    struct FixedDice {
        queue: VecDeque<i32>,
    }

    impl FixedDice {
        fn new(rolls: &[i32]) -> Self {
            Self {
                queue: rolls.iter().copied().collect(),
            }
        }
    }

    impl Roller for FixedDice {
        fn roll(&mut self, low: i32, high: i32) -> i32 {
            let next = self.queue.pop_front().unwrap_or(low);
            next.clamp(low, high.max(low))
        }

        fn roll_dice(&mut self, _dice: &DiceSpec) -> i32 {
            1
        }
    }

    fn creature(name: &str, hp: i32) -> Creature {
        let mut c = Creature::new(name, Position::new(0, 0), AttributeSet::uniform(10));
        c.hitpoints = hp;
        c.max_hitpoints = hp;
        c.attack_bonus = 0;
        c.defense_bonus = 0;
        c
    }

    #[test]
    fn level_zero_mobs_stay_hittable() {
        let mut rng = SeededRandom::new("mob-ac-range");
        let mut names = NameGenerator::default();
        let mut ids = crate::item::IdAllocator::default();
        for _ in 0..80 {
            let mob = creature_at_level(0, &mut names, &mut ids, &mut rng).expect("mob");
            assert!(armor_class_for(&mob, 1.0) <= 14);
        }
    }

    #[test]
    fn luck_is_neutral_when_healthy() {
        let state = CombatLuckState {
            recent_player_d20_rolls: vec![12, 14, 16, 18],
            player_miss_streak: 0,
        };
        assert_eq!(player_luck_bonus(&state, 0.9), 0);
    }

    #[test]
    fn luck_grows_under_pressure_and_stays_clamped() {
        let state = CombatLuckState {
            recent_player_d20_rolls: (1..=8).collect(),
            player_miss_streak: 3,
        };
        let bonus = player_luck_bonus(&state, 0.1);
        assert!(bonus >= 4);
        assert!(bonus <= PLAYER_LUCK_MAX_TOTAL_BONUS);
        let maxed = CombatLuckState {
            recent_player_d20_rolls: vec![1; 8],
            player_miss_streak: 50,
        };
        assert_eq!(player_luck_bonus(&maxed, 0.0), PLAYER_LUCK_MAX_TOTAL_BONUS);
    }

    #[test]
    fn luck_turns_a_miss_into_a_hit() {
        let mut player = creature("Player", 100);
        player.hitpoints = 10;
        let mut enemy = creature("Goblin", 100);
        enemy.defense_bonus = 1;
        enemy.mob = true;

        let mut combat = Combat::new();
        combat.restore_luck_state(&CombatLuckState {
            recent_player_d20_rolls: (1..=8).collect(),
            player_miss_streak: 2,
        });
        let mut dice = FixedDice::new(&[9, 80, 9]);
        let result = combat.turn(
            &mut dice,
            &EnglishNarrator,
            &mut player,
            &mut enemy,
            PlayerAction::Normal,
            TurnOptions::default(),
        );

        let roll = result.moments.iter().find_map(|moment| match moment {
            CombatMoment::Roll {
                phase: RollPhase::ToHit,
                actor,
                bonus,
                success,
                ..
            } if actor == "Player" => Some((*bonus, *success)),
            _ => None,
        });
        let (bonus, success) = roll.expect("player to-hit moment");
        assert!(bonus > 0);
        assert!(success);
    }

    #[test]
    fn finishing_blow_reports_damage_before_the_fall() {
        let mut player = creature("Player", 10);
        let mut goblin = creature("Goblin", 1);
        goblin.mob = true;
        let mut combat = Combat::new();
        let mut dice = FixedDice::new(&[11]);
        let result = combat.turn(
            &mut dice,
            &EnglishNarrator,
            &mut player,
            &mut goblin,
            PlayerAction::Normal,
            TurnOptions::default(),
        );

        let damage_idx = result.moments.iter().position(|m| {
            matches!(m, CombatMoment::Damage { actor, defender, .. }
                if actor == "Player" && defender == "Goblin")
        });
        let falls_idx = result.moments.iter().position(|m| {
            matches!(m, CombatMoment::Text { text, .. } if text == "Goblin falls.")
        });
        let damage_idx = damage_idx.expect("damage moment");
        let falls_idx = falls_idx.expect("falls moment");
        assert!(falls_idx > damage_idx);
        assert!(result.over);
        assert!(!goblin.alive);
    }

    #[test]
    fn restore_sanitizes_the_window() {
        let mut combat = Combat::new();
        combat.restore_luck_state(&CombatLuckState {
            recent_player_d20_rolls: vec![-3, 0, 1, 2, 3, 4, 5, 6, 7, 8],
            player_miss_streak: -4,
        });
        let snapshot = combat.snapshot_luck_state();
        assert_eq!(snapshot.recent_player_d20_rolls, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(snapshot.player_miss_streak, 0);
    }

    #[test]
    fn successful_flee_ends_without_enemy_action() {
        let mut player = creature("Player", 30);
        let mut enemy = creature("Goblin", 30);
        enemy.mob = true;
        let mut combat = Combat::new();
        let mut dice = FixedDice::new(&[20]);
        let result = combat.turn(
            &mut dice,
            &EnglishNarrator,
            &mut player,
            &mut enemy,
            PlayerAction::Flee,
            TurnOptions::default(),
        );
        assert!(result.over && result.fled);
        assert_eq!(player.hitpoints, 30);
        assert_eq!(player.turn, 1, "no housekeeping after an escape");
        assert_eq!(combat.snapshot_luck_state().recent_player_d20_rolls, vec![20]);
    }

    #[test]
    fn failed_flee_counts_as_a_miss_and_enemy_acts() {
        let mut player = creature("Player", 30);
        let mut enemy = creature("Goblin", 30);
        enemy.mob = true;
        let mut combat = Combat::new();
        let mut dice = FixedDice::new(&[1]);
        let result = combat.turn(
            &mut dice,
            &EnglishNarrator,
            &mut player,
            &mut enemy,
            PlayerAction::Flee,
            TurnOptions::default(),
        );
        assert!(!result.fled);
        assert_eq!(combat.snapshot_luck_state().player_miss_streak, 1);
        assert!(player.hitpoints < 30);
        assert!(result.logs.iter().any(|l| l.text.starts_with("Retreat failed")));
    }

    #[test]
    fn heal_without_items_warns() {
        let mut player = creature("Player", 30);
        let mut enemy = creature("Goblin", 30);
        enemy.mob = true;
        let mut combat = Combat::new();
        let mut dice = FixedDice::new(&[]);
        let result = combat.turn(
            &mut dice,
            &EnglishNarrator,
            &mut player,
            &mut enemy,
            PlayerAction::Heal,
            TurnOptions::default(),
        );
        assert_eq!(
            result.logs.first().map(|l| (l.text.as_str(), l.level)),
            Some(("You have no healing item.", LogLevel::Warn))
        );
        assert!(!can_player_heal(&player));
    }

    #[test]
    fn glancing_blows_still_deal_damage() {
        let mut player = creature("Player", 30);
        let mut enemy = creature("Goblin", 30);
        enemy.mob = true;
        enemy.defense_bonus = 10;
        let mut combat = Combat::new();
        let mut dice = FixedDice::new(&[2]);
        let result = combat.turn(
            &mut dice,
            &EnglishNarrator,
            &mut player,
            &mut enemy,
            PlayerAction::Normal,
            TurnOptions::default(),
        );
        assert_eq!(enemy.hitpoints, 29);
        assert!(result
            .logs
            .iter()
            .any(|l| l.level == LogLevel::Warn && l.text.contains("reduced damage")));
    }

    #[test]
    fn stance_multipliers_match_actions() {
        assert_eq!(PlayerAction::Offensive.stance_multipliers(), (2.0, 0.3));
        assert_eq!(PlayerAction::Defensive.stance_multipliers(), (0.5, 1.5));
        assert_eq!(PlayerAction::Heal.stance_multipliers(), (1.0, 1.0));
    }
}
