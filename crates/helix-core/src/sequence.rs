//! The symbol buffer plus its metadata bag: [`Sequence`] pairs a flat
//! `Vec<Symbol>` with free-form annotation maps and a feature table, per the
//! `AlphabetTable`-parameterized record model this crate builds on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alphabet::{AlphabetTable, Symbol};
use crate::feature::Feature;

/// The crate's stand-in for an open-ended annotation value. Tagged the same
/// way [`crate::location::Location`] tags its variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MetadataValue {
    Text(String),
    Integer(i64),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    pub fn text(s: impl Into<String>) -> Self {
        MetadataValue::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("symbol {0:?} is not a member of the sequence's alphabet")]
    InvalidSymbol(Symbol),
    #[error("index {index} out of range for sequence of length {len}")]
    OutOfRange { index: usize, len: usize },
    #[error("operation {op} is unsupported for alphabet {alphabet}")]
    Unsupported { alphabet: &'static str, op: &'static str },
}

/// A biological sequence: an ordered buffer of [`Symbol`]s over a declared
/// [`AlphabetTable`], plus the annotation maps and feature table that travel
/// with it through a parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub alphabet: AlphabetTable,
    pub data: Vec<Symbol>,
    #[serde(default)]
    pub metadata: HashMap<String, MetadataValue>,
    #[serde(default)]
    pub annotations: HashMap<String, MetadataValue>,
    #[serde(default)]
    pub letter_annotations: HashMap<String, Vec<MetadataValue>>,
    #[serde(default)]
    pub dbxrefs: Vec<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Sequence {
    /// Builds a sequence from raw text. When `validate` is true, every
    /// symbol must be a member of `alphabet` (in either case) or this fails
    /// with [`SequenceError::InvalidSymbol`], naming the first offender.
    pub fn new(alphabet: AlphabetTable, text: impl AsRef<str>, validate: bool) -> Result<Self, SequenceError> {
        let data: Vec<Symbol> = text.as_ref().chars().collect();
        if validate {
            if let Some(&bad) = data.iter().find(|&&s| !alphabet.valid(s)) {
                return Err(SequenceError::InvalidSymbol(bad));
            }
        }
        Ok(Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            alphabet,
            data,
            metadata: HashMap::new(),
            annotations: HashMap::new(),
            letter_annotations: HashMap::new(),
            dbxrefs: Vec::new(),
            features: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Symbol, SequenceError> {
        self.data.get(index).copied().ok_or(SequenceError::OutOfRange {
            index,
            len: self.data.len(),
        })
    }

    /// A shallow copy of `self` restricted to `[start, start + length)`:
    /// `data` and every length-`|data|` `letter_annotations` vector are
    /// sliced; `metadata`, `annotations`, `dbxrefs` and `features` are
    /// carried over unchanged, since Rust has no shared-pointer equivalent
    /// of a view into those maps.
    pub fn subsequence(&self, start: usize, length: usize) -> Result<Sequence, SequenceError> {
        let end = start.checked_add(length).ok_or(SequenceError::OutOfRange {
            index: start,
            len: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(SequenceError::OutOfRange {
                index: end,
                len: self.data.len(),
            });
        }
        let letter_annotations = self
            .letter_annotations
            .iter()
            .map(|(k, v)| (k.clone(), v[start..end].to_vec()))
            .collect();
        Ok(Sequence {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            alphabet: self.alphabet,
            data: self.data[start..end].to_vec(),
            metadata: self.metadata.clone(),
            annotations: self.annotations.clone(),
            letter_annotations,
            dbxrefs: self.dbxrefs.clone(),
            features: self.features.clone(),
        })
    }

    /// A new sequence with `data` (and every `letter_annotations` vector)
    /// reversed. Feature locations are defined over the original coordinate
    /// frame and are not remapped, so the result carries no features.
    pub fn reverse(&self) -> Sequence {
        let mut data = self.data.clone();
        data.reverse();
        let letter_annotations = self
            .letter_annotations
            .iter()
            .map(|(k, v)| {
                let mut v = v.clone();
                v.reverse();
                (k.clone(), v)
            })
            .collect();
        Sequence {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            alphabet: self.alphabet,
            data,
            metadata: self.metadata.clone(),
            annotations: self.annotations.clone(),
            letter_annotations,
            dbxrefs: self.dbxrefs.clone(),
            features: Vec::new(),
        }
    }

    /// Complements every symbol in place (order preserved). Fails with
    /// [`SequenceError::Unsupported`] if the alphabet has no complement
    /// table (protein).
    pub fn complement(&self) -> Result<Sequence, SequenceError> {
        if !self.alphabet.complement_supported() {
            return Err(SequenceError::Unsupported {
                alphabet: self.alphabet.name(),
                op: "complement",
            });
        }
        let data = self
            .data
            .iter()
            .map(|&s| self.alphabet.complement(s).unwrap_or(s))
            .collect();
        Ok(Sequence {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            alphabet: self.alphabet,
            data,
            metadata: self.metadata.clone(),
            annotations: self.annotations.clone(),
            letter_annotations: self.letter_annotations.clone(),
            dbxrefs: self.dbxrefs.clone(),
            features: Vec::new(),
        })
    }

    /// `complement().reverse()`, with the feature list dropped by both.
    pub fn reverse_complement(&self) -> Result<Sequence, SequenceError> {
        Ok(self.complement()?.reverse())
    }

    /// The lowest index at or after `from` whose symbol is not a gap, or
    /// `-1` if none remains.
    pub fn index_of_non_gap(&self, from: usize) -> i64 {
        let gaps = self.alphabet.gap_symbols();
        self.data
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, s)| !gaps.contains(s))
            .map(|(i, _)| i as i64)
            .unwrap_or(-1)
    }

    /// The highest index at or before `to` whose symbol is not a gap, or
    /// `-1` if none remains.
    pub fn last_index_of_non_gap(&self, to: usize) -> i64 {
        if self.data.is_empty() {
            return -1;
        }
        let gaps = self.alphabet.gap_symbols();
        let upper = to.min(self.data.len() - 1);
        self.data[..=upper]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, s)| !gaps.contains(s))
            .map(|(i, _)| i as i64)
            .unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_symbol() {
        let err = Sequence::new(AlphabetTable::DNA, "ACGX", true).unwrap_err();
        assert_eq!(err, SequenceError::InvalidSymbol('X'));
    }

    #[test]
    fn new_skips_validation_when_asked() {
        let seq = Sequence::new(AlphabetTable::DNA, "ACGX", false).unwrap();
        assert_eq!(seq.len(), 4);
    }

    #[test]
    fn subsequence_slices_data_and_letter_annotations() {
        let mut seq = Sequence::new(AlphabetTable::DNA, "ACGTACGT", true).unwrap();
        seq.letter_annotations.insert(
            "quality".to_string(),
            (0..8).map(MetadataValue::Integer).collect(),
        );
        let sub = seq.subsequence(2, 3).unwrap();
        assert_eq!(sub.data, vec!['G', 'T', 'A']);
        assert_eq!(
            sub.letter_annotations["quality"],
            vec![MetadataValue::Integer(2), MetadataValue::Integer(3), MetadataValue::Integer(4)]
        );
    }

    #[test]
    fn subsequence_out_of_range() {
        let seq = Sequence::new(AlphabetTable::DNA, "ACGT", true).unwrap();
        assert!(seq.subsequence(2, 10).is_err());
    }

    #[test]
    fn reverse_then_reverse_is_symbol_wise_identity() {
        let seq = Sequence::new(AlphabetTable::DNA, "ACGTACGT", true).unwrap();
        assert_eq!(seq.reverse().reverse().data, seq.data);
    }

    #[test]
    fn complement_preserves_length_and_order() {
        let seq = Sequence::new(AlphabetTable::DNA, "ACGT", true).unwrap();
        let comp = seq.complement().unwrap();
        assert_eq!(comp.data, vec!['T', 'G', 'C', 'A']);
    }

    #[test]
    fn reverse_complement_of_palindrome() {
        let seq = Sequence::new(AlphabetTable::DNA, "GAATTC", true).unwrap();
        let rc = seq.reverse_complement().unwrap();
        assert_eq!(rc.data, seq.data);
    }

    #[test]
    fn protein_complement_is_unsupported() {
        let seq = Sequence::new(AlphabetTable::PROTEIN, "MKV", true).unwrap();
        assert!(seq.complement().is_err());
    }

    #[test]
    fn index_of_non_gap_skips_gaps() {
        let seq = Sequence::new(AlphabetTable::DNA, "--AC--GT", false).unwrap();
        assert_eq!(seq.index_of_non_gap(0), 2);
        assert_eq!(seq.last_index_of_non_gap(7), 7);
        assert_eq!(seq.index_of_non_gap(8), -1);
    }
}
