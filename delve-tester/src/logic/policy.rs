use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use delve_game::{
    Attribute, BossRewardPick, BuildChoiceKind, DungeonRun, InventoryAction, Overlay,
    PlayerAction, Position, RunState, ShopRewardId,
};

/// Milliseconds of wall time the pilot lets pass after each step.
pub const STEP_MS: f64 = 150.0;

/// Overlay answers allowed per step before the pilot gives up on a stuck run.
const OVERLAY_GUARD: usize = 200;

const WANDER: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Policy interface for automated play.
pub trait PlayerPolicy {
    /// Name used in reports.
    fn name(&self) -> &'static str;

    /// Pick the action for the next battle turn.
    fn battle_action(&mut self, run: &DungeonRun) -> PlayerAction;

    /// Pick where a level-up point goes.
    fn level_up(&mut self, run: &DungeonRun) -> Attribute;

    /// Pick a boss reward. `None` descends without one.
    fn boss_reward(&mut self, run: &DungeonRun) -> Option<(BuildChoiceKind, &'static str)>;

    /// Pick the reward offered for finding the shop.
    fn shop_reward(&mut self, run: &DungeonRun) -> ShopRewardId;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Aggressive,
    Cautious,
}

impl GameplayStrategy {
    pub const ALL: [Self; 2] = [Self::Aggressive, Self::Cautious];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::Cautious => "Cautious",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Cautious => Box::new(CautiousPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Swings every turn, stacks strength, takes the first perk on offer.
struct AggressivePolicy;

/// Heals when hurt, runs when nearly dead, builds constitution and skips
/// gambits.
struct CautiousPolicy;

fn hurt_below(run: &DungeonRun, fraction: f64) -> bool {
    let player = run.player();
    f64::from(player.hitpoints) < f64::from(player.current_max_hitpoints()) * fraction
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "aggressive"
    }

    fn battle_action(&mut self, run: &DungeonRun) -> PlayerAction {
        if hurt_below(run, 0.25) {
            PlayerAction::Heal
        } else {
            PlayerAction::Offensive
        }
    }

    fn level_up(&mut self, _run: &DungeonRun) -> Attribute {
        Attribute::Str
    }

    fn boss_reward(&mut self, run: &DungeonRun) -> Option<(BuildChoiceKind, &'static str)> {
        let rewards = run.boss_rewards()?;
        rewards
            .perks
            .first()
            .or_else(|| rewards.gambits.first())
            .map(|choice| (choice.kind, choice.id))
    }

    fn shop_reward(&mut self, _run: &DungeonRun) -> ShopRewardId {
        ShopRewardId::BonusPoint
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "cautious"
    }

    fn battle_action(&mut self, run: &DungeonRun) -> PlayerAction {
        if hurt_below(run, 0.2) {
            PlayerAction::Flee
        } else if hurt_below(run, 0.5) {
            PlayerAction::Heal
        } else {
            PlayerAction::Defensive
        }
    }

    fn level_up(&mut self, run: &DungeonRun) -> Attribute {
        if run.player().level % 2 == 0 {
            Attribute::Dex
        } else {
            Attribute::Con
        }
    }

    fn boss_reward(&mut self, run: &DungeonRun) -> Option<(BuildChoiceKind, &'static str)> {
        run.boss_rewards()?
            .perks
            .first()
            .map(|choice| (choice.kind, choice.id))
    }

    fn shop_reward(&mut self, run: &DungeonRun) -> ShopRewardId {
        if run.current_build().gambits.is_empty() {
            ShopRewardId::BonusPoint
        } else {
            ShopRewardId::RemoveGambit
        }
    }
}

/// What a pilot saw while driving a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PilotReport {
    pub steps: usize,
    pub battles: usize,
    pub purchases: usize,
    pub dead: bool,
}

/// Drives a run with a policy: walks toward the nearest mob, fights, loots,
/// spends points and picks rewards.
pub struct Pilot {
    policy: Box<dyn PlayerPolicy>,
    report: PilotReport,
}

impl Pilot {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            policy: strategy.create_policy(),
            report: PilotReport::default(),
        }
    }

    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Play until the run ends or `max_steps` have passed.
    ///
    /// # Errors
    ///
    /// Fails when an overlay never resolves or the core rejects a reward.
    pub fn play(&mut self, run: &mut DungeonRun, max_steps: usize) -> Result<PilotReport> {
        for _ in 0..max_steps {
            if run.state() != RunState::Playing {
                break;
            }
            self.step(run)?;
        }
        self.report.dead = run.state() == RunState::Dead;
        Ok(self.report)
    }

    /// Answer open overlays, then take one step and let time pass.
    ///
    /// # Errors
    ///
    /// Fails when an overlay never resolves or the core rejects a reward.
    pub fn step(&mut self, run: &mut DungeonRun) -> Result<()> {
        self.settle(run)?;
        if run.state() != RunState::Playing {
            return Ok(());
        }
        tend_inventory(run);
        self.visit_shop(run);

        match nearest_mob_step(run) {
            Some((dx, dy)) => run.move_player(dx, dy),
            None => {
                let (dx, dy) = WANDER[self.report.steps % WANDER.len()];
                run.move_player(dx, dy);
            }
        }
        run.tick(STEP_MS);
        self.report.steps += 1;
        Ok(())
    }

    /// Resolve whatever overlay is open so exploration can continue.
    ///
    /// # Errors
    ///
    /// Fails when overlays keep reopening or a boss reward is rejected.
    pub fn settle(&mut self, run: &mut DungeonRun) -> Result<()> {
        for _ in 0..OVERLAY_GUARD {
            if run.state() != RunState::Playing {
                return Ok(());
            }
            match run.overlay() {
                Overlay::None => return Ok(()),
                Overlay::Battle { .. } => {
                    let action = self.policy.battle_action(run);
                    if let Some(result) = run.perform_combat(action)
                        && result.over
                    {
                        self.report.battles += 1;
                    }
                }
                Overlay::Chest { .. } => {
                    run.loot_all();
                    run.close_overlay();
                }
                Overlay::LevelUp => {
                    let attribute = self.policy.level_up(run);
                    run.allocate_level_up(attribute);
                }
                Overlay::BossReward => {
                    let pick = match self.policy.boss_reward(run) {
                        Some((kind, id)) => BossRewardPick::Choice { kind, id },
                        None => BossRewardPick::Descend,
                    };
                    run.choose_boss_reward(pick)
                        .context("boss reward was rejected")?;
                }
                Overlay::ShopReward => {
                    let reward = self.policy.shop_reward(run);
                    run.claim_shop_reward(reward);
                }
                Overlay::Inventory | Overlay::Shop => run.close_overlay(),
            }
        }
        anyhow::bail!(
            "overlay {:?} still open after {OVERLAY_GUARD} answers",
            run.overlay()
        )
    }

    fn visit_shop(&mut self, run: &mut DungeonRun) {
        if !run.can_open_shop() {
            return;
        }
        run.open_shop();
        let gold = run.player().gold;
        let pick = run
            .shop_entries()
            .iter()
            .filter(|line| !line.entry.sold && line.cost <= gold)
            .min_by_key(|line| line.cost)
            .map(delve_game::ShopLine::id);
        if let Some(id) = pick {
            let before = run.player().gold;
            run.buy_shop_entry(id);
            if run.player().gold < before {
                self.report.purchases += 1;
            }
        }
        if run.overlay() == Overlay::Shop {
            run.close_overlay();
        }
    }
}

/// Drink the first healing item once below half health.
fn tend_inventory(run: &mut DungeonRun) {
    if !hurt_below(run, 0.5) {
        return;
    }
    let potion = run
        .inventory_items()
        .iter()
        .find(|line| line.action == InventoryAction::Use)
        .map(|line| line.item.id);
    if let Some(id) = potion {
        run.use_inventory_item(id);
    }
}

/// First step along the shortest path to the closest reachable live mob.
fn nearest_mob_step(run: &DungeonRun) -> Option<(i32, i32)> {
    let here = run.player().position;
    let blocked: HashSet<Position> = run
        .mobs()
        .iter()
        .filter(|mob| mob.is_alive())
        .map(delve_game::Mob::position)
        .collect();
    run.mobs()
        .iter()
        .filter(|mob| mob.is_alive())
        .map(|mob| run.world().path_to(here, mob.position(), &blocked))
        .filter(|path| !path.is_empty())
        .min_by_key(Vec::len)
        .and_then(|path| path.first().copied())
        .map(|next| (next.x - here.x, next.y - here.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_have_distinct_labels() {
        let labels: HashSet<&str> = GameplayStrategy::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), GameplayStrategy::ALL.len());
        assert_eq!(GameplayStrategy::Cautious.to_string(), "Cautious");
    }

    #[test]
    fn pilot_leaves_no_overlay_open() {
        let mut run = DungeonRun::new("pilot-settle").expect("run");
        let mut pilot = Pilot::new(GameplayStrategy::Aggressive);
        run.open_inventory();
        pilot.settle(&mut run).expect("settle");
        assert_eq!(run.overlay(), Overlay::None);
    }

    #[test]
    fn pilot_counts_its_steps() {
        let mut run = DungeonRun::new("pilot-steps").expect("run");
        let mut pilot = Pilot::new(GameplayStrategy::Cautious);
        let report = pilot.play(&mut run, 25).expect("play");
        assert!(report.steps <= 25);
        assert_eq!(report.dead, run.state() == RunState::Dead);
        assert_eq!(pilot.policy_name(), "cautious");
    }

    #[test]
    fn nearest_mob_step_is_a_single_cardinal_move() {
        let run = DungeonRun::new("pilot-path").expect("run");
        if let Some((dx, dy)) = nearest_mob_step(&run) {
            assert_eq!(dx.abs() + dy.abs(), 1);
        }
    }
}
