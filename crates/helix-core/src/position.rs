//! Fuzzy position parsing: `Position::from_string` turns one GenBank
//! position token (`100`, `<100`, `>100`, `?100`, `(95.100)`,
//! `one-of(95,100)`, `?`) into a [`Position`], converting from 1-based
//! inclusive GenBank coordinates to 0-based half-open as it goes.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A position within a feature location, possibly fuzzy.
///
/// `monomer_position` is the single integer used for ordering and
/// arithmetic across all variants; fuzzy kinds (`Within`, `OneOf`) carry an
/// explicit `default` used for that purpose, chosen by the offset the
/// position was parsed with (see [`Position::from_string`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Position {
    Exact(i64),
    Before(i64),
    After(i64),
    Within { default: i64, low: i64, high: i64 },
    OneOf { default: i64, choices: Vec<i64> },
    Uncertain(i64),
    Unknown,
}

impl Position {
    /// The integer used for ordering and coordinate arithmetic.
    pub fn monomer_position(&self) -> i64 {
        match self {
            Position::Exact(n) | Position::Before(n) | Position::After(n) | Position::Uncertain(n) => *n,
            Position::Within { default, .. } => *default,
            Position::OneOf { default, .. } => *default,
            Position::Unknown => 0,
        }
    }

    /// Parse one GenBank position token.
    ///
    /// `offset` must be `0` (for an end position: 1-based inclusive end ==
    /// 0-based exclusive end, no shift needed) or `-1` (for a start
    /// position: 1-based inclusive start -> 0-based inclusive start).
    pub fn from_string(text: &str, offset: i64) -> Result<Position, PositionParseError> {
        debug_assert!(offset == 0 || offset == -1, "offset must be 0 or -1");
        let text = text.trim();

        if text == "?" {
            return Ok(Position::Unknown);
        }
        if let Some(rest) = text.strip_prefix('?') {
            let n: i64 = rest
                .parse()
                .map_err(|_| PositionParseError::Malformed(text.to_string()))?;
            return Ok(Position::Uncertain(n + offset));
        }
        if let Some(rest) = text.strip_prefix('<') {
            let n: i64 = rest
                .parse()
                .map_err(|_| PositionParseError::Malformed(text.to_string()))?;
            return Ok(Position::Before(n + offset));
        }
        if let Some(rest) = text.strip_prefix('>') {
            let n: i64 = rest
                .parse()
                .map_err(|_| PositionParseError::Malformed(text.to_string()))?;
            return Ok(Position::After(n + offset));
        }
        if let Some(caps) = within_regex().captures(text) {
            let low: i64 = caps[1].parse().unwrap();
            let high: i64 = caps[2].parse().unwrap();
            let default = if offset == -1 { low } else { high };
            return Ok(Position::Within {
                default: default + offset,
                low: low + offset,
                high: high + offset,
            });
        }
        if let Some(caps) = one_of_regex().captures(text) {
            let choices: Vec<i64> = caps[1]
                .split(',')
                .map(|p| p.trim().parse::<i64>())
                .collect::<Result<_, _>>()
                .map_err(|_| PositionParseError::Malformed(text.to_string()))?;
            if choices.is_empty() {
                return Err(PositionParseError::Malformed(text.to_string()));
            }
            let default = if offset == -1 {
                *choices.iter().min().unwrap()
            } else {
                *choices.iter().max().unwrap()
            };
            return Ok(Position::OneOf {
                default: default + offset,
                choices: choices.into_iter().map(|c| c + offset).collect(),
            });
        }

        let n: i64 = text
            .parse()
            .map_err(|_| PositionParseError::Malformed(text.to_string()))?;
        Ok(Position::Exact(n + offset))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    /// Ordering is total over [`Position::monomer_position`], not over
    /// structural equality: two positions of different fuzzy kinds that
    /// share a `monomer_position` compare equal without being `==`.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.monomer_position().cmp(&other.monomer_position())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionParseError {
    #[error("malformed position: {0}")]
    Malformed(String),
}

fn within_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\((-?\d+)\.(-?\d+)\)$").unwrap())
}

fn one_of_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^one-of\(([^)]+)\)$").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_start_and_end() {
        assert_eq!(Position::from_string("100", -1).unwrap(), Position::Exact(99));
        assert_eq!(Position::from_string("100", 0).unwrap(), Position::Exact(100));
    }

    #[test]
    fn unknown_and_uncertain() {
        assert_eq!(Position::from_string("?", -1).unwrap(), Position::Unknown);
        assert_eq!(Position::from_string("?10", -1).unwrap(), Position::Uncertain(9));
    }

    #[test]
    fn before_after() {
        assert_eq!(Position::from_string("<5", -1).unwrap(), Position::Before(4));
        assert_eq!(Position::from_string(">5", 0).unwrap(), Position::After(5));
    }

    #[test]
    fn within_default_depends_on_offset() {
        let start = Position::from_string("(95.100)", -1).unwrap();
        assert_eq!(start.monomer_position(), 94);
        let end = Position::from_string("(95.100)", 0).unwrap();
        assert_eq!(end.monomer_position(), 100);
    }

    #[test]
    fn one_of_default_is_min_or_max() {
        let start = Position::from_string("one-of(95,100,110)", -1).unwrap();
        assert_eq!(start.monomer_position(), 94);
        let end = Position::from_string("one-of(95,100,110)", 0).unwrap();
        assert_eq!(end.monomer_position(), 110);
    }

    #[test]
    fn ordering_is_by_monomer_position() {
        let a = Position::Exact(5);
        let b = Position::Before(10);
        assert!(a < b);
    }
}
