//! Six-stat attribute block with D&D-style modifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute identifiers in their canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Chr,
}

impl Attribute {
    pub const ALL: [Self; 6] = [
        Self::Str,
        Self::Dex,
        Self::Con,
        Self::Int,
        Self::Wis,
        Self::Chr,
    ];

    /// Attributes that can be raised from the level-up screen.
    pub const LEVEL_UP: [Self; 4] = [Self::Str, Self::Dex, Self::Con, Self::Chr];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Dex => "dex",
            Self::Con => "con",
            Self::Int => "int",
            Self::Wis => "wis",
            Self::Chr => "chr",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.key() == key)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub chr: i32,
}

impl Default for AttributeSet {
    fn default() -> Self {
        DEFAULT_ATTRS
    }
}

/// Baseline block used when no explicit stats are given.
pub const DEFAULT_ATTRS: AttributeSet = AttributeSet::new(14, 12, 14, 10, 10, 10);

/// Player stats at the start of a run.
pub const STARTING_ATTRS: AttributeSet = AttributeSet::new(16, 14, 14, 10, 10, 10);

impl AttributeSet {
    #[must_use]
    pub const fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, chr: i32) -> Self {
        Self {
            str,
            dex,
            con,
            int,
            wis,
            chr,
        }
    }

    /// Every stat at the same value.
    #[must_use]
    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value, value, value)
    }

    #[must_use]
    pub const fn get(&self, attr: Attribute) -> i32 {
        match attr {
            Attribute::Str => self.str,
            Attribute::Dex => self.dex,
            Attribute::Con => self.con,
            Attribute::Int => self.int,
            Attribute::Wis => self.wis,
            Attribute::Chr => self.chr,
        }
    }

    const fn slot_mut(&mut self, attr: Attribute) -> &mut i32 {
        match attr {
            Attribute::Str => &mut self.str,
            Attribute::Dex => &mut self.dex,
            Attribute::Con => &mut self.con,
            Attribute::Int => &mut self.int,
            Attribute::Wis => &mut self.wis,
            Attribute::Chr => &mut self.chr,
        }
    }

    pub const fn modify(&mut self, attr: Attribute, amount: i32) {
        let slot = self.slot_mut(attr);
        *slot = slot.saturating_add(amount);
    }

    /// `floor((value - 10) / 2)`.
    #[must_use]
    pub const fn modifier(&self, attr: Attribute) -> i32 {
        (self.get(attr) - 10).div_euclid(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_floor_toward_negative_infinity() {
        let attrs = AttributeSet::new(10, 11, 9, 8, 20, 1);
        assert_eq!(attrs.modifier(Attribute::Str), 0);
        assert_eq!(attrs.modifier(Attribute::Dex), 0);
        assert_eq!(attrs.modifier(Attribute::Con), -1);
        assert_eq!(attrs.modifier(Attribute::Int), -1);
        assert_eq!(attrs.modifier(Attribute::Wis), 5);
        assert_eq!(attrs.modifier(Attribute::Chr), -5);
    }

    #[test]
    fn modify_applies_deltas_in_place() {
        let mut attrs = STARTING_ATTRS;
        attrs.modify(Attribute::Con, -3);
        attrs.modify(Attribute::Chr, 2);
        assert_eq!(attrs.con, 11);
        assert_eq!(attrs.chr, 12);
        assert_eq!(attrs.modifier(Attribute::Str), 3);
    }

    #[test]
    fn keys_round_trip() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::from_key(attr.key()), Some(attr));
        }
        assert_eq!(Attribute::from_key("luck"), None);
        assert_eq!(AttributeSet::default(), DEFAULT_ATTRS);
    }
}
