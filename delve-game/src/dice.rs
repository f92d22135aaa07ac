//! Dice notation parsing and rolling.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::rng::SeededRandom;

static DICE_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)^([1-9][0-9]*)\s*d\s*([1-9][0-9]*)(?:\s*([+-])\s*([0-9]+))?$").ok()
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice: {notation}")]
    InvalidNotation { notation: String },
}

/// Parsed `NdM[+/-K]` notation that remembers its original spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceSpec {
    notation: String,
    count: i32,
    faces: i32,
    modifier: i32,
}

impl DiceSpec {
    /// Build from parts, rendering the canonical `NdM[+/-K]` notation.
    #[must_use]
    pub fn new(count: i32, faces: i32, modifier: i32) -> Self {
        let notation = match modifier {
            0 => format!("{count}d{faces}"),
            m if m > 0 => format!("{count}d{faces}+{m}"),
            m => format!("{count}d{faces}{m}"),
        };
        Self {
            notation,
            count,
            faces,
            modifier,
        }
    }

    #[must_use]
    pub const fn count(&self) -> i32 {
        self.count
    }

    #[must_use]
    pub const fn faces(&self) -> i32 {
        self.faces
    }

    #[must_use]
    pub const fn modifier(&self) -> i32 {
        self.modifier
    }

    #[must_use]
    pub fn notation(&self) -> &str {
        &self.notation
    }

    /// Inclusive bounds of a roll, computed without drawing.
    #[must_use]
    pub const fn min_max(&self) -> (i32, i32) {
        (
            self.count.saturating_add(self.modifier),
            self.count.saturating_mul(self.faces).saturating_add(self.modifier),
        )
    }
}

impl FromStr for DiceSpec {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DiceError::InvalidNotation {
            notation: s.to_string(),
        };
        let caps = DICE_RE
            .as_ref()
            .and_then(|re| re.captures(s.trim()))
            .ok_or_else(invalid)?;
        let parse = |idx: usize| -> Result<i32, DiceError> {
            caps.get(idx)
                .map_or(Ok(0), |m| m.as_str().parse::<i32>().map_err(|_| invalid()))
        };
        let count = parse(1)?;
        let faces = parse(2)?;
        let magnitude = parse(4)?;
        let modifier = match caps.get(3).map(|m| m.as_str()) {
            Some("-") => -magnitude,
            _ => magnitude,
        };
        Ok(Self {
            notation: s.to_string(),
            count,
            faces,
            modifier,
        })
    }
}

impl TryFrom<String> for DiceSpec {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceSpec> for String {
    fn from(value: DiceSpec) -> Self {
        value.notation
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.notation)
    }
}

/// Source of die rolls for combat and population.
pub trait Roller {
    /// Roll an integer in `[max(1, low), high]`.
    fn roll(&mut self, low: i32, high: i32) -> i32;

    fn d20(&mut self) -> i32 {
        self.roll(1, 20)
    }

    /// Sum `count` rolls of a `faces`-sided die plus the modifier.
    fn roll_dice(&mut self, dice: &DiceSpec) -> i32 {
        let mut total = 0_i32;
        for _ in 0..dice.count() {
            total = total.saturating_add(self.roll(1, dice.faces()));
        }
        total.saturating_add(dice.modifier())
    }

    /// Parse and roll a notation string.
    ///
    /// # Errors
    ///
    /// Returns [`DiceError::InvalidNotation`] when the notation does not parse.
    fn roll_named(&mut self, notation: &str) -> Result<i32, DiceError> {
        let dice: DiceSpec = notation.parse()?;
        Ok(self.roll_dice(&dice))
    }

    /// Bounds of a notation string without consuming any randomness.
    ///
    /// # Errors
    ///
    /// Returns [`DiceError::InvalidNotation`] when the notation does not parse.
    fn min_max(&self, notation: &str) -> Result<(i32, i32), DiceError> {
        notation.parse::<DiceSpec>().map(|dice| dice.min_max())
    }
}

/// Dice view over the shared seeded stream.
#[derive(Debug)]
pub struct Dice<'a> {
    rng: &'a mut SeededRandom,
}

impl<'a> Dice<'a> {
    pub const fn new(rng: &'a mut SeededRandom) -> Self {
        Self { rng }
    }
}

impl Roller for Dice<'_> {
    fn roll(&mut self, low: i32, high: i32) -> i32 {
        self.rng.int(low.max(1), high)
    }
}

impl Roller for SeededRandom {
    fn roll(&mut self, low: i32, high: i32) -> i32 {
        self.int(low.max(1), high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_modifier_dice_always_hit_the_same_total() {
        let mut rng = SeededRandom::new("dice");
        let mut dice = Dice::new(&mut rng);
        for _ in 0..50 {
            assert_eq!(dice.roll_named("1d1+5"), Ok(6));
        }
    }

    #[test]
    fn bounds_for_negative_modifier() {
        let mut rng = SeededRandom::new("bounds");
        let dice = Dice::new(&mut rng);
        assert_eq!(dice.min_max("3d6-2"), Ok((1, 16)));
    }

    #[test]
    fn min_max_does_not_consume_the_stream() {
        let mut rng = SeededRandom::new("pure");
        let before = rng.state();
        assert_eq!(rng.min_max("2d8 + 3"), Ok((5, 19)));
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn rolls_stay_inside_bounds() {
        let mut rng = SeededRandom::new("range");
        let mut dice = Dice::new(&mut rng);
        for _ in 0..200 {
            let v = dice.roll_named("3d6-2").unwrap_or(i32::MIN);
            assert!((1..=16).contains(&v));
        }
    }

    #[test]
    fn notation_is_case_and_space_tolerant() {
        let spec: DiceSpec = " 2 D 10 + 4 ".parse().expect("valid notation");
        assert_eq!((spec.count(), spec.faces(), spec.modifier()), (2, 10, 4));
        let spaced: DiceSpec = "1d12 +3".parse().expect("valid notation");
        assert_eq!(spaced.modifier(), 3);
        assert_eq!(spaced.to_string(), "1d12 +3");
    }

    #[test]
    fn invalid_notation_is_rejected() {
        for bad in ["", "d6", "0d6", "2d0", "2x6", "2d6+", "2d6*3"] {
            assert!(bad.parse::<DiceSpec>().is_err(), "{bad} should not parse");
        }
        let mut rng = SeededRandom::new("bad");
        assert_eq!(
            rng.roll_named("banana"),
            Err(DiceError::InvalidNotation {
                notation: "banana".to_string()
            })
        );
    }

    #[test]
    fn roll_floors_the_low_bound_at_one() {
        let mut rng = SeededRandom::new("low");
        for _ in 0..100 {
            assert!(rng.roll(-10, 2) >= 1);
        }
    }

    #[test]
    fn serde_uses_the_notation_string() {
        let spec: DiceSpec = "1d6".parse().expect("valid notation");
        let json = serde_json::to_string(&spec).expect("serialize");
        assert_eq!(json, "\"1d6\"");
        let back: DiceSpec = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, spec);
        assert!(serde_json::from_str::<DiceSpec>("\"nope\"").is_err());
    }
}
