//! Symbol validation, folding, and complement/ambiguity tables for the
//! alphabets a [`crate::sequence::Sequence`] can be built over.
//!
//! Three static tables cover DNA, RNA, and Protein. Each is a plain
//! `match`-driven table, not a runtime-built collection: there is nothing to
//! initialize, so `AlphabetTable::DNA` etc. are usable as `const`s.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single character from an alphabet. Case is preserved on construction;
/// equivalence between symbols is case-insensitive (see [`AlphabetTable::fold`]).
pub type Symbol = char;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("unsupported operation {op} for alphabet {alphabet}")]
    Unsupported { alphabet: &'static str, op: &'static str },
}

/// The kind of alphabet a [`Sequence`](crate::sequence::Sequence) is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphabetTable {
    Dna,
    Rna,
    Protein,
}

impl AlphabetTable {
    pub const DNA: AlphabetTable = AlphabetTable::Dna;
    pub const RNA: AlphabetTable = AlphabetTable::Rna;
    pub const PROTEIN: AlphabetTable = AlphabetTable::Protein;

    /// Canonical name, as it would appear in a GenBank `moltype` field.
    pub fn name(&self) -> &'static str {
        match self {
            AlphabetTable::Dna => "DNA",
            AlphabetTable::Rna => "RNA",
            AlphabetTable::Protein => "protein",
        }
    }

    pub fn has_gaps(&self) -> bool {
        matches!(self, AlphabetTable::Dna | AlphabetTable::Rna)
    }

    pub fn has_ambiguity(&self) -> bool {
        matches!(self, AlphabetTable::Dna | AlphabetTable::Rna)
    }

    pub fn has_terminations(&self) -> bool {
        matches!(self, AlphabetTable::Protein)
    }

    pub fn complement_supported(&self) -> bool {
        matches!(self, AlphabetTable::Dna | AlphabetTable::Rna)
    }

    /// Canonical upper-case form of a symbol, used for table lookups.
    pub fn fold(&self, sym: Symbol) -> Symbol {
        sym.to_ascii_uppercase()
    }

    /// True if `sym` (in either case) belongs to this alphabet.
    pub fn valid(&self, sym: Symbol) -> bool {
        let folded = self.fold(sym);
        match self {
            AlphabetTable::Dna => matches!(folded, 'A' | 'C' | 'G' | 'T' | '-')
                || Self::dna_ambiguity_code(folded).is_some(),
            AlphabetTable::Rna => matches!(folded, 'A' | 'C' | 'G' | 'U' | '-')
                || Self::dna_ambiguity_code(folded).is_some(),
            AlphabetTable::Protein => matches!(
                folded,
                'A' | 'R' | 'N' | 'D' | 'C' | 'Q' | 'E' | 'G' | 'H' | 'I' | 'L' | 'K' | 'M' | 'F'
                    | 'P' | 'S' | 'T' | 'W' | 'Y' | 'V' | 'U' | 'O' | 'X' | '*' | '-'
            ),
        }
    }

    /// Validates every symbol in `buf[offset..offset + length]`.
    ///
    /// Returns `false` on the first symbol that is not a member of this
    /// alphabet (in either case); returns `true` for an empty slice.
    pub fn validate(&self, buf: &[Symbol], offset: usize, length: usize) -> bool {
        let end = offset.saturating_add(length).min(buf.len());
        if offset >= buf.len() {
            return length == 0;
        }
        buf[offset..end].iter().all(|&s| self.valid(s))
    }

    /// The complement of a single symbol, if this alphabet supports
    /// complementation.
    pub fn complement(&self, sym: Symbol) -> Option<Symbol> {
        if !self.complement_supported() {
            return None;
        }
        let lower = sym.is_ascii_lowercase();
        let folded = self.fold(sym);
        let complemented = match (self, folded) {
            (AlphabetTable::Dna, 'A') => 'T',
            (AlphabetTable::Dna, 'T') => 'A',
            (AlphabetTable::Rna, 'A') => 'U',
            (AlphabetTable::Rna, 'U') => 'A',
            (_, 'C') => 'G',
            (_, 'G') => 'C',
            (_, '-') => '-',
            (_, 'R') => 'Y',
            (_, 'Y') => 'R',
            (_, 'S') => 'S',
            (_, 'W') => 'W',
            (_, 'K') => 'M',
            (_, 'M') => 'K',
            (_, 'B') => 'V',
            (_, 'V') => 'B',
            (_, 'D') => 'H',
            (_, 'H') => 'D',
            (_, 'N') => 'N',
            _ => return None,
        };
        Some(if lower {
            complemented.to_ascii_lowercase()
        } else {
            complemented
        })
    }

    /// The set of symbols this alphabet treats as a gap.
    pub fn gap_symbols(&self) -> BTreeSet<Symbol> {
        if self.has_gaps() {
            BTreeSet::from(['-'])
        } else {
            BTreeSet::new()
        }
    }

    /// The set of unambiguous symbols an ambiguity code expands to, if
    /// `sym` is a recognized ambiguity code for this alphabet.
    pub fn ambiguous_expansion(&self, sym: Symbol) -> Option<BTreeSet<Symbol>> {
        if !self.has_ambiguity() {
            return None;
        }
        let bases: &[char] = match (self, self.fold(sym)) {
            (AlphabetTable::Dna, 'R') => &['A', 'G'],
            (AlphabetTable::Dna, 'Y') => &['C', 'T'],
            (AlphabetTable::Rna, 'R') => &['A', 'G'],
            (AlphabetTable::Rna, 'Y') => &['C', 'U'],
            (_, 'S') => &['G', 'C'],
            (_, 'W') => &['A', 'T'],
            (_, 'K') => &['G', 'T'],
            (_, 'M') => &['A', 'C'],
            (_, 'B') => &['C', 'G', 'T'],
            (_, 'D') => &['A', 'G', 'T'],
            (_, 'H') => &['A', 'C', 'T'],
            (_, 'V') => &['A', 'C', 'G'],
            (_, 'N') => &['A', 'C', 'G', 'T'],
            _ => return None,
        };
        Some(bases.iter().copied().collect())
    }

    /// The get-consensus operation is out of scope for this parser; any
    /// call fails with [`AlphabetError::Unsupported`].
    pub fn get_consensus(&self, _buf: &[Symbol]) -> Result<Symbol, AlphabetError> {
        Err(AlphabetError::Unsupported {
            alphabet: self.name(),
            op: "get_consensus",
        })
    }

    fn dna_ambiguity_code(folded: Symbol) -> Option<()> {
        matches!(
            folded,
            'R' | 'Y' | 'S' | 'W' | 'K' | 'M' | 'B' | 'D' | 'H' | 'V' | 'N'
        )
        .then_some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dna_valid_both_cases() {
        assert!(AlphabetTable::DNA.valid('a'));
        assert!(AlphabetTable::DNA.valid('A'));
        assert!(AlphabetTable::DNA.valid('-'));
        assert!(!AlphabetTable::DNA.valid('U'));
    }

    #[test]
    fn dna_ambiguity_codes_are_valid() {
        assert!(AlphabetTable::DNA.valid('N'));
        assert!(AlphabetTable::DNA.valid('m'));
    }

    #[test]
    fn rna_uses_u_not_t() {
        assert!(AlphabetTable::RNA.valid('u'));
        assert!(!AlphabetTable::RNA.valid('t'));
    }

    #[test]
    fn validate_stops_at_first_invalid_symbol() {
        let buf: Vec<Symbol> = "ACGTX".chars().collect();
        assert!(!AlphabetTable::DNA.validate(&buf, 0, buf.len()));
        assert!(AlphabetTable::DNA.validate(&buf, 0, 4));
    }

    #[test]
    fn complement_preserves_case() {
        assert_eq!(AlphabetTable::DNA.complement('a'), Some('t'));
        assert_eq!(AlphabetTable::DNA.complement('C'), Some('G'));
        assert_eq!(AlphabetTable::DNA.complement('-'), Some('-'));
    }

    #[test]
    fn protein_complement_unsupported() {
        assert!(!AlphabetTable::PROTEIN.complement_supported());
        assert_eq!(AlphabetTable::PROTEIN.complement('A'), None);
    }

    #[test]
    fn ambiguity_expansion() {
        let set = AlphabetTable::DNA.ambiguous_expansion('M').unwrap();
        assert_eq!(set, BTreeSet::from(['A', 'C']));
        assert!(AlphabetTable::DNA.ambiguous_expansion('A').is_none());
    }

    #[test]
    fn get_consensus_is_unsupported() {
        assert!(AlphabetTable::DNA.get_consensus(&['A', 'C']).is_err());
    }
}
