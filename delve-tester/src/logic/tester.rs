use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::{Scenario, ScenarioCtx};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    max_steps: usize,
}

impl LogicTester {
    pub const fn new(verbose: bool, max_steps: usize) -> Self {
        Self { verbose, max_steps }
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[String],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {seed})",
                        scenario.key.bright_white()
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &Scenario,
        seed: &str,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let ctx = ScenarioCtx {
                seed: iteration_seed(seed, i),
                iteration: i,
                max_steps: self.max_steps,
                verbose: self.verbose,
            };
            let start_time = Instant::now();
            let outcome = scenario.run(&ctx);
            log::debug!(
                "{} seed={} iteration={i} ok={} elapsed={:?}",
                scenario.key,
                ctx.seed,
                outcome.is_ok(),
                start_time.elapsed()
            );
            match outcome {
                Ok(outcome) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) steps:{} floor:{} level:{} kills:{} dead:{}",
                            i + 1,
                            iterations,
                            outcome.steps,
                            outcome.floor,
                            outcome.level,
                            outcome.vanquished,
                            outcome.dead
                        );
                    }
                }
                Err(err) => {
                    let message = format!(
                        "Iteration {} (seed '{}', strategy {}): {err:#}",
                        i + 1,
                        ctx.seed,
                        ctx.strategy()
                    );
                    if self.verbose {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(u32::MAX)
        };

        ScenarioResult {
            scenario_name: format!("{} [{seed}]", scenario.key),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

/// The first iteration plays the seed as given; later ones get a suffix.
fn iteration_seed(seed: &str, iteration: usize) -> String {
    if iteration == 0 {
        seed.to_string()
    } else {
        format!("{seed}-{iteration}")
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;

    #[test]
    fn iteration_seeds_are_distinct() {
        assert_eq!(iteration_seed("abc", 0), "abc");
        assert_eq!(iteration_seed("abc", 2), "abc-2");
    }

    #[test]
    fn smoke_passes_every_iteration() {
        let tester = LogicTester::new(false, 20);
        let scenario = get_scenario("smoke").expect("smoke");
        let results = tester.run_scenario(scenario, &["alpha".to_string(), "beta".to_string()], 2);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.performance_data.len(), 2);
        }
        assert_eq!(results[0].scenario_name, "smoke [alpha]");
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).expect("json");
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
        let back: ScenarioResult = serde_json::from_value(json).expect("parse");
        assert_eq!(back.average_duration, Duration::from_millis(12));
    }
}
