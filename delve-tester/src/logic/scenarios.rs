use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;

use anyhow::{Context, Result, ensure};
use delve_game::{DungeonRun, Engine, Overlay, RunState, SaveStorage, encode_save_token};

use super::policy::{GameplayStrategy, Pilot, STEP_MS};

/// Inputs for one scenario iteration.
#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub seed: String,
    pub iteration: usize,
    pub max_steps: usize,
    pub verbose: bool,
}

impl ScenarioCtx {
    #[must_use]
    pub fn strategy(&self) -> GameplayStrategy {
        GameplayStrategy::ALL[self.iteration % GameplayStrategy::ALL.len()]
    }
}

/// Where a scenario iteration left its run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub steps: usize,
    pub floor: i32,
    pub level: i32,
    pub vanquished: i32,
    pub dead: bool,
}

impl ScenarioOutcome {
    fn of(run: &DungeonRun, steps: usize) -> Self {
        Self {
            steps,
            floor: run.floor(),
            level: run.player().level,
            vanquished: run.stats().vanquished,
            dead: run.state() == RunState::Dead,
        }
    }
}

type ScenarioFn = fn(&ScenarioCtx) -> Result<ScenarioOutcome>;

pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    run: ScenarioFn,
}

impl Scenario {
    /// Run one iteration.
    ///
    /// # Errors
    ///
    /// Returns the first broken expectation.
    pub fn run(&self, ctx: &ScenarioCtx) -> Result<ScenarioOutcome> {
        (self.run)(ctx).with_context(|| format!("{} (seed {})", self.key, ctx.seed))
    }
}

pub static SCENARIOS: [Scenario; 4] = [
    Scenario {
        key: "smoke",
        description: "Start a run, walk each direction and let time pass",
        run: smoke,
    },
    Scenario {
        key: "determinism",
        description: "Same seed and inputs end with identical save tokens",
        run: determinism,
    },
    Scenario {
        key: "save-roundtrip",
        description: "Save mid-run, reload, continue in lockstep with the original",
        run: save_roundtrip,
    },
    Scenario {
        key: "autoplay",
        description: "Policy-driven play until death or the step cap",
        run: autoplay,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.description))
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.key == name)
}

/// Keeps tokens for the length of one scenario.
#[derive(Default)]
struct MemoryStorage {
    tokens: RefCell<HashMap<String, String>>,
}

impl SaveStorage for MemoryStorage {
    type Error = Infallible;

    fn store_token(&self, slot: &str, token: &str) -> Result<(), Self::Error> {
        self.tokens
            .borrow_mut()
            .insert(slot.to_string(), token.to_string());
        Ok(())
    }

    fn load_token(&self, slot: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.tokens.borrow().get(slot).cloned())
    }

    fn delete_token(&self, slot: &str) -> Result<(), Self::Error> {
        self.tokens.borrow_mut().remove(slot);
        Ok(())
    }
}

fn check_bookkeeping(run: &DungeonRun) -> Result<()> {
    let player = run.player();
    let stats = run.stats();
    ensure!(run.logs().len() <= 9, "run log grew to {}", run.logs().len());
    ensure!(
        stats.floor_reached == run.floor(),
        "floor_reached {} but floor {}",
        stats.floor_reached,
        run.floor()
    );
    ensure!(player.gold >= 0, "negative gold {}", player.gold);
    ensure!(
        player.hitpoints <= player.current_max_hitpoints(),
        "hitpoints {} above cap {}",
        player.hitpoints,
        player.current_max_hitpoints()
    );
    match run.state() {
        RunState::Dead => {
            ensure!(!player.alive, "dead run with a living player");
        }
        _ => {
            ensure!(player.hitpoints > 0, "living run at {} hp", player.hitpoints);
        }
    }
    Ok(())
}

fn smoke(ctx: &ScenarioCtx) -> Result<ScenarioOutcome> {
    let mut run = DungeonRun::new(&ctx.seed).context("new run")?;
    ensure!(run.floor() == 1, "fresh run starts on floor {}", run.floor());
    ensure!(run.overlay() == Overlay::None, "fresh run opened {:?}", run.overlay());
    ensure!(run.seed_phrase() == ctx.seed.trim(), "seed phrase changed");

    let mut pilot = Pilot::new(ctx.strategy());
    for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
        run.move_player(dx, dy);
        run.tick(STEP_MS);
        pilot.settle(&mut run)?;
    }
    check_bookkeeping(&run)?;
    Ok(ScenarioOutcome::of(&run, 4))
}

fn determinism(ctx: &ScenarioCtx) -> Result<ScenarioOutcome> {
    let mut first = DungeonRun::new(&ctx.seed)?;
    let mut second = DungeonRun::new(&ctx.seed)?;
    let report = Pilot::new(ctx.strategy()).play(&mut first, ctx.max_steps)?;
    Pilot::new(ctx.strategy()).play(&mut second, ctx.max_steps)?;
    ensure!(
        encode_save_token(&first)? == encode_save_token(&second)?,
        "runs diverged after {} steps",
        report.steps
    );
    Ok(ScenarioOutcome::of(&first, report.steps))
}

fn save_roundtrip(ctx: &ScenarioCtx) -> Result<ScenarioOutcome> {
    let engine = Engine::new(MemoryStorage::default());
    let mut original = engine.new_run(&ctx.seed)?;
    let half = ctx.max_steps / 2;
    let mut pilot = Pilot::new(ctx.strategy());
    pilot.play(&mut original, half)?;

    engine.save_latest(&original)?;
    let mut resumed = engine
        .load_latest()?
        .context("latest save vanished from storage")?;
    ensure!(
        resumed.to_save() == original.to_save(),
        "reloaded run differs from the saved one"
    );

    let tail = ctx.max_steps - half;
    let report = Pilot::new(ctx.strategy()).play(&mut original, tail)?;
    Pilot::new(ctx.strategy()).play(&mut resumed, tail)?;
    ensure!(
        resumed.to_save() == original.to_save(),
        "reloaded run drifted from the original"
    );
    check_bookkeeping(&resumed)?;
    Ok(ScenarioOutcome::of(&resumed, half + report.steps))
}

fn autoplay(ctx: &ScenarioCtx) -> Result<ScenarioOutcome> {
    let mut run = DungeonRun::new(&ctx.seed)?;
    let mut pilot = Pilot::new(ctx.strategy());
    let report = pilot.play(&mut run, ctx.max_steps)?;
    check_bookkeeping(&run)?;
    if ctx.verbose {
        println!(
            "  {} [{}]: {} steps, {} battles, {} purchases, floor {}, dead {}",
            ctx.seed,
            pilot.policy_name(),
            report.steps,
            report.battles,
            report.purchases,
            run.floor(),
            report.dead
        );
    }
    Ok(ScenarioOutcome::of(&run, report.steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(seed: &str) -> ScenarioCtx {
        ScenarioCtx {
            seed: seed.to_string(),
            iteration: 0,
            max_steps: 60,
            verbose: false,
        }
    }

    #[test]
    fn every_scenario_is_listed_once() {
        let keys: Vec<&str> = list_scenarios().map(|(key, _)| key).collect();
        assert_eq!(keys, ["smoke", "determinism", "save-roundtrip", "autoplay"]);
        assert!(get_scenario("autoplay").is_some());
        assert!(get_scenario("vehicle-system").is_none());
    }

    #[test]
    fn scenarios_pass_on_a_fixed_seed() {
        for scenario in &SCENARIOS {
            let outcome = scenario.run(&ctx("tester-fixed")).expect(scenario.key);
            assert!(outcome.floor >= 1);
        }
    }

    #[test]
    fn strategy_alternates_by_iteration() {
        let mut context = ctx("alt");
        assert_eq!(context.strategy(), GameplayStrategy::Aggressive);
        context.iteration = 1;
        assert_eq!(context.strategy(), GameplayStrategy::Cautious);
    }
}
