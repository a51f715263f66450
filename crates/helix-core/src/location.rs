//! The feature-location expression grammar: `join(...)`, `order(...)`,
//! `bond(...)`, `complement(...)`, fuzzy positions, and origin-wrapping on
//! circular molecules.
//!
//! `Location::from_string` is the only entry point callers need; internally
//! it recurses through [`strip_complement`] and [`split_top_level_commas`]
//! down to [`SimpleLocation::from_string`] for each leaf.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::position::{Position, PositionParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strand {
    Forward,
    Reverse,
    /// Not yet resolved against an enclosing operator/complement, or the
    /// molecule has no meaningful strandedness (protein).
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundOp {
    Join,
    Order,
    Bond,
}

/// A single contiguous span, optionally on another record (`reference`)
/// and another database (`ref_db`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleLocation {
    pub start: Position,
    pub end: Position,
    pub strand: Strand,
    pub reference: Option<String>,
    pub ref_db: Option<String>,
}

impl SimpleLocation {
    /// `(start, end)` as plain integers, per each position's
    /// `monomer_position`.
    pub fn bounds(&self) -> (i64, i64) {
        (self.start.monomer_position(), self.end.monomer_position())
    }

    fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            strand: Strand::Undefined,
            reference: None,
            ref_db: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    Simple(SimpleLocation),
    Compound {
        operation: CompoundOp,
        parts: Vec<SimpleLocation>,
    },
}

impl Location {
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            Location::Simple(s) => s.bounds(),
            Location::Compound { parts, .. } => {
                let start = parts.iter().map(|p| p.start.monomer_position()).min().unwrap_or(0);
                let end = parts.iter().map(|p| p.end.monomer_position()).max().unwrap_or(0);
                (start, end)
            }
        }
    }

    /// Parse a complete feature (or reference) location expression.
    ///
    /// `length` is the sequence length, used for origin-wrap detection on
    /// circular molecules. `stranded` selects the default strand applied
    /// when no `complement(...)` wrapper is present: `Forward` for nucleic
    /// acids, `Undefined` for protein.
    pub fn from_string(
        text: &str,
        length: i64,
        circular: bool,
        stranded: bool,
    ) -> Result<Location, LocationError> {
        let mut owned = text.trim().to_string();
        while owned.contains(",)") {
            tracing::warn!("location {owned:?} has a trailing comma before ')', repairing");
            owned = owned.replace(",)", ")");
        }

        let parsed = parse_expr(owned.trim(), length, circular)?;
        let default_strand = if stranded { Strand::Forward } else { Strand::Undefined };

        let resolved = match parsed {
            Location::Simple(mut s) => {
                if s.strand == Strand::Undefined {
                    s.strand = default_strand;
                }
                Location::Simple(s)
            }
            Location::Compound { operation, mut parts } => {
                for p in &mut parts {
                    if p.strand == Strand::Undefined {
                        p.strand = default_strand;
                    }
                }
                Location::Compound { operation, parts }
            }
        };

        for part_start in resolved.part_starts() {
            if part_start < 0 {
                return Err(LocationError::NegativeStart);
            }
        }

        Ok(resolved)
    }

    fn part_starts(&self) -> Vec<i64> {
        match self {
            Location::Simple(s) => vec![s.start.monomer_position()],
            Location::Compound { parts, .. } => {
                parts.iter().map(|p| p.start.monomer_position()).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("operators may not nest")]
    NestedOperators,
    #[error("complement(complement(...)) is not allowed")]
    DoubleComplement,
    #[error("location wraps the origin but the molecule is not circular")]
    OriginWrapNotCircular,
    #[error("resolved start position is negative")]
    NegativeStart,
    #[error("malformed location: {0}")]
    Malformed(String),
    #[error(transparent)]
    Position(#[from] PositionParseError),
}

/// Recursively parses one location expression: a `complement(...)` wrapper,
/// an operator call (`join`/`order`/`bond`), or a leaf simple location
/// (which may itself expand into an origin-wrap `Compound`).
fn parse_expr(text: &str, length: i64, circular: bool) -> Result<Location, LocationError> {
    let text = text.trim();

    if let Some(inner) = strip_complement(text) {
        let parsed = parse_expr(inner, length, circular)?;
        return Ok(apply_reverse(parsed)?);
    }

    if let Some((operation, interior)) = detect_operator(text) {
        let sub_exprs = split_top_level_commas(interior);
        if sub_exprs.is_empty() {
            return Err(LocationError::Malformed(text.to_string()));
        }
        let mut parts = Vec::new();
        for sub in &sub_exprs {
            if is_operator_expr(sub) {
                return Err(LocationError::NestedOperators);
            }
            match parse_expr(sub, length, circular)? {
                Location::Simple(s) => parts.push(s),
                Location::Compound { parts: mut inner_parts, .. } => parts.append(&mut inner_parts),
            }
        }
        return Ok(if parts.len() == 1 {
            Location::Simple(parts.into_iter().next().unwrap())
        } else {
            Location::Compound { operation, parts }
        });
    }

    SimpleLocation::from_string(text, length, circular)
}

fn apply_reverse(loc: Location) -> Result<Location, LocationError> {
    match loc {
        Location::Simple(mut s) => {
            if s.strand == Strand::Reverse {
                return Err(LocationError::DoubleComplement);
            }
            s.strand = Strand::Reverse;
            Ok(Location::Simple(s))
        }
        Location::Compound { operation, mut parts } => {
            if parts.iter().any(|p| p.strand == Strand::Reverse) {
                return Err(LocationError::DoubleComplement);
            }
            for p in &mut parts {
                p.strand = Strand::Reverse;
            }
            parts.reverse();
            Ok(Location::Compound { operation, parts })
        }
    }
}

fn strip_complement(text: &str) -> Option<&str> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("complement(") {
        rest.strip_suffix(')')
    } else {
        None
    }
}

fn detect_operator(text: &str) -> Option<(CompoundOp, &str)> {
    let text = text.trim();
    for (prefix, op) in [
        ("join(", CompoundOp::Join),
        ("order(", CompoundOp::Order),
        ("bond(", CompoundOp::Bond),
    ] {
        if let Some(rest) = text.strip_prefix(prefix) {
            if let Some(inner) = rest.strip_suffix(')') {
                return Some((op, inner));
            }
        }
    }
    None
}

fn is_operator_expr(text: &str) -> bool {
    let text = strip_complement(text).unwrap_or(text);
    detect_operator(text).is_some()
}

/// Splits a `join(...)`/`order(...)`/`bond(...)` interior into its
/// comma-separated sub-locations, respecting parenthesis nesting so that
/// `complement(join(1..3,5..7))` is not split at its inner commas.
///
/// This realizes the same "keep only the real separators" behavior the
/// spec describes for its `_any_location` splitter regex, via a forward
/// paren-depth scan rather than a captured regex split.
fn split_top_level_commas(interior: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in interior.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

impl SimpleLocation {
    /// Parses one leaf location: `[reference:]primitive`, where
    /// `primitive` is a plain pair, a between-bases insertion point, a
    /// `bond(N)` wrapper, or a solo fuzzy position. `complement(...)` and
    /// `join`/`order`/`bond` operator calls are handled by the caller
    /// ([`Location::from_string`]) before this is reached.
    pub fn from_string(text: &str, length: i64, circular: bool) -> Result<Location, LocationError> {
        let text = text.trim();

        if let Some(caps) = fast_pair_regex().captures(text) {
            let s: i64 = caps[1].parse().unwrap();
            let e: i64 = caps[2].parse().unwrap();
            if s - 1 >= 0 && s - 1 < e {
                return Ok(Location::Simple(SimpleLocation::new(
                    Position::Exact(s - 1),
                    Position::Exact(e),
                )));
            }
        }

        let (reference, rest) = match reference_regex().captures(text) {
            Some(caps) => (Some(caps[1].to_string()), text[caps[0].len()..].to_string()),
            None => (None, text.to_string()),
        };
        let rest = rest.trim();

        if let Some(inner) = strip_bond(rest) {
            tracing::warn!("dropping bond qualifier in location {text:?}");
            return solo_location(inner, reference, None);
        }

        if let Some((a, b)) = split_dotdot(rest) {
            return pair_location(&a, &b, reference, None, length, circular);
        }

        if let Some((a, b)) = split_between(rest) {
            let a_val: i64 = a.parse().map_err(|_| LocationError::Malformed(text.to_string()))?;
            let b_val: i64 = b.parse().map_err(|_| LocationError::Malformed(text.to_string()))?;
            let valid = b_val == a_val + 1 || (a_val == length && b_val == 1);
            if !valid {
                return Err(LocationError::Malformed(format!(
                    "invalid between-bases location: {text}"
                )));
            }
            let mut loc = SimpleLocation::new(Position::Exact(a_val), Position::Exact(a_val));
            loc.reference = reference;
            return Ok(Location::Simple(loc));
        }

        solo_location(rest, reference, None)
    }
}

fn strip_bond(text: &str) -> Option<&str> {
    text.strip_prefix("bond(").and_then(|r| r.strip_suffix(')'))
}

/// Splits `A..B` at the top-level `..`, being careful not to match the
/// `.` inside a `(low.high)` within-position token.
fn split_dotdot(text: &str) -> Option<(String, String)> {
    if let Some(caps) = pair_regex().captures(text) {
        return Some((caps[1].to_string(), caps[2].to_string()));
    }
    None
}

fn split_between(text: &str) -> Option<(String, String)> {
    let caps = between_regex().captures(text)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

fn pair_location(
    a: &str,
    b: &str,
    reference: Option<String>,
    ref_db: Option<String>,
    length: i64,
    circular: bool,
) -> Result<Location, LocationError> {
    let start = Position::from_string(a, -1)?;
    let end = Position::from_string(b, 0)?;

    if start.monomer_position() > end.monomer_position() {
        if !circular {
            return Err(LocationError::OriginWrapNotCircular);
        }
        tracing::warn!("location ({a}..{b}) wraps the origin of a circular molecule");
        let mut first = SimpleLocation::new(start, Position::Exact(length));
        first.reference = reference.clone();
        first.ref_db = ref_db.clone();
        let mut second = SimpleLocation::new(Position::Exact(0), end);
        second.reference = reference;
        second.ref_db = ref_db;
        return Ok(Location::Compound {
            operation: CompoundOp::Join,
            parts: vec![first, second],
        });
    }

    let mut loc = SimpleLocation::new(start, end);
    loc.reference = reference;
    loc.ref_db = ref_db;
    Ok(Location::Simple(loc))
}

fn solo_location(
    text: &str,
    reference: Option<String>,
    ref_db: Option<String>,
) -> Result<Location, LocationError> {
    let start = Position::from_string(text, -1)?;
    let end = Position::from_string(text, 0)?;
    let mut loc = SimpleLocation::new(start, end);
    loc.reference = reference;
    loc.ref_db = ref_db;
    Ok(Location::Simple(loc))
}

fn fast_pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.\.(\d+)$").unwrap())
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9_.|]*[a-zA-Z0-9]?:)").unwrap())
}

const POS_TOKEN: &str = r"(?:[<>?]?\d+|one-of\([^()]*\)|\(\d+\.\d+\))";

fn pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"^({POS_TOKEN})\.\.({POS_TOKEN})$")).unwrap())
}

fn between_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\^(\d+)$").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_pair_fast_path() {
        let loc = Location::from_string("123..456", 1000, false, true).unwrap();
        assert_eq!(loc.bounds(), (122, 456));
        match loc {
            Location::Simple(s) => assert_eq!(s.strand, Strand::Forward),
            _ => panic!("expected Simple"),
        }
    }

    #[test]
    fn join_of_two_ranges() {
        let loc = Location::from_string("join(1..10,20..30)", 1000, false, true).unwrap();
        match loc {
            Location::Compound { operation, parts } => {
                assert_eq!(operation, CompoundOp::Join);
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0].bounds(), (0, 10));
                assert_eq!(parts[1].bounds(), (19, 30));
            }
            _ => panic!("expected Compound"),
        }
    }

    #[test]
    fn complement_of_join_reverses_order_and_strand() {
        let loc = Location::from_string("complement(join(1..10, 20..30))", 1000, false, true).unwrap();
        match loc {
            Location::Compound { operation, parts } => {
                assert_eq!(operation, CompoundOp::Join);
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0].bounds(), (19, 30));
                assert_eq!(parts[1].bounds(), (0, 10));
                assert!(parts.iter().all(|p| p.strand == Strand::Reverse));
            }
            _ => panic!("expected Compound"),
        }
    }

    #[test]
    fn complement_of_join_with_one_part_reversed_is_double_complement() {
        let err = Location::from_string(
            "complement(join(1..3,complement(5..7)))",
            1000,
            false,
            true,
        )
        .unwrap_err();
        assert_eq!(err, LocationError::DoubleComplement);
    }

    #[test]
    fn nested_operators_rejected() {
        let err = Location::from_string("order(join(1..3,5..7),10..20)", 1000, false, true).unwrap_err();
        assert_eq!(err, LocationError::NestedOperators);
    }

    #[test]
    fn origin_wrap_requires_circular() {
        let err = Location::from_string("100..50", 200, false, true).unwrap_err();
        assert_eq!(err, LocationError::OriginWrapNotCircular);
    }

    #[test]
    fn origin_wrap_on_circular_synthesizes_join() {
        let loc = Location::from_string("2000..100", 2000, true, true).unwrap();
        match loc {
            Location::Compound { operation, parts } => {
                assert_eq!(operation, CompoundOp::Join);
                assert_eq!(parts[0].bounds(), (1999, 2000));
                assert_eq!(parts[1].bounds(), (0, 100));
            }
            _ => panic!("expected Compound from origin wrap"),
        }
    }

    #[test]
    fn trailing_comma_is_repaired() {
        let loc = Location::from_string("join(1..10,20..30,)", 1000, false, true).unwrap();
        assert!(matches!(loc, Location::Compound { .. }));
    }

    #[test]
    fn between_bases_insertion_point() {
        let loc = Location::from_string("5^6", 1000, false, true).unwrap();
        match loc {
            Location::Simple(s) => assert_eq!(s.bounds(), (5, 5)),
            _ => panic!("expected Simple"),
        }
    }

    #[test]
    fn between_bases_rejects_non_adjacent() {
        assert!(Location::from_string("5^9", 1000, false, true).is_err());
    }

    #[test]
    fn reference_prefix_is_captured() {
        let loc = Location::from_string("J01749.1:1..100", 1000, false, true).unwrap();
        match loc {
            Location::Simple(s) => assert_eq!(s.reference.as_deref(), Some("J01749.1:")),
            _ => panic!("expected Simple"),
        }
    }

    #[test]
    fn bond_qualifier_is_dropped_with_warning() {
        let loc = Location::from_string("bond(150)", 1000, false, true).unwrap();
        match loc {
            Location::Simple(s) => assert_eq!(s.bounds(), (149, 150)),
            _ => panic!("expected Simple"),
        }
    }

    #[test]
    fn protein_locations_default_to_undefined_strand() {
        let loc = Location::from_string("10..50", 1000, false, false).unwrap();
        match loc {
            Location::Simple(s) => assert_eq!(s.strand, Strand::Undefined),
            _ => panic!("expected Simple"),
        }
    }
}
