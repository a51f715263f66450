//! The scanner's public contract: a typed callback interface driven by
//! [`crate::genbank::GenBankScanner`], plus [`SequenceConsumer`], the
//! default implementation that assembles a [`Sequence`].

use std::collections::HashSet;

use helix_core::feature::{Feature, Qualifier};
use helix_core::location::{Location, SimpleLocation, Strand};
use helix_core::position::Position;
use helix_core::reference::Reference;
use helix_core::sequence::{MetadataValue, Sequence};

use crate::ParseError;

/// Every callback the scanner invokes while driving a parse. Implementers
/// may substitute an alternative consumer to build a different downstream
/// model from the same scan.
pub trait RecordConsumer {
    fn locus(&mut self, value: &str) -> Result<(), ParseError>;
    fn size(&mut self, value: &str) -> Result<(), ParseError>;
    fn residue_type(&mut self, value: &str) -> Result<(), ParseError>;
    fn topology(&mut self, value: &str) -> Result<(), ParseError>;
    fn molecule_type(&mut self, value: &str) -> Result<(), ParseError>;
    fn data_file_division(&mut self, value: &str) -> Result<(), ParseError>;
    fn date(&mut self, value: &str) -> Result<(), ParseError>;

    fn definition(&mut self, value: &str) -> Result<(), ParseError>;
    fn accession(&mut self, value: &str) -> Result<(), ParseError>;
    fn version(&mut self, value: &str) -> Result<(), ParseError>;
    fn version_suffix(&mut self, value: &str) -> Result<(), ParseError>;
    fn project(&mut self, value: &str) -> Result<(), ParseError>;
    fn dblink(&mut self, value: &str) -> Result<(), ParseError>;
    fn nid(&mut self, value: &str) -> Result<(), ParseError>;
    fn pid(&mut self, value: &str) -> Result<(), ParseError>;
    fn gi(&mut self, value: &str) -> Result<(), ParseError>;
    fn keywords(&mut self, value: &str) -> Result<(), ParseError>;
    fn segment(&mut self, value: &str) -> Result<(), ParseError>;
    fn source(&mut self, value: &str) -> Result<(), ParseError>;
    fn organism(&mut self, value: &str) -> Result<(), ParseError>;
    fn taxonomy(&mut self, value: &str) -> Result<(), ParseError>;

    fn reference_num(&mut self, value: &str) -> Result<(), ParseError>;
    fn reference_bases(&mut self, value: &str) -> Result<(), ParseError>;
    fn authors(&mut self, value: &str) -> Result<(), ParseError>;
    fn consortium(&mut self, value: &str) -> Result<(), ParseError>;
    fn title(&mut self, value: &str) -> Result<(), ParseError>;
    fn journal(&mut self, value: &str) -> Result<(), ParseError>;
    fn medline_id(&mut self, value: &str) -> Result<(), ParseError>;
    fn pubmed_id(&mut self, value: &str) -> Result<(), ParseError>;
    fn remark(&mut self, value: &str) -> Result<(), ParseError>;

    fn comment(&mut self, value: &str) -> Result<(), ParseError>;

    fn feature_key(&mut self, key: &str) -> Result<(), ParseError>;
    fn location(&mut self, value: &str) -> Result<(), ParseError>;
    fn feature_qualifier(&mut self, key: &str, value: Option<&str>) -> Result<(), ParseError>;

    fn base_number(&mut self, value: &str) -> Result<(), ParseError>;
    fn sequence(&mut self, value: &str) -> Result<(), ParseError>;
    fn record_end(&mut self) -> Result<(), ParseError>;
}

/// Qualifier keys whose value is stored with all internal whitespace
/// removed rather than preserved verbatim. `translation` is the canonical
/// example: GenBank wraps it across lines with no real whitespace meaning.
fn remove_space_keys() -> &'static HashSet<&'static str> {
    use std::sync::OnceLock;
    static KEYS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    KEYS.get_or_init(|| HashSet::from(["translation"]))
}

/// Builds a [`Sequence`] from scanner callbacks. One instance is used per
/// record; [`RecordIterator`](crate::iterator::RecordIterator) creates a
/// fresh one for each.
pub struct SequenceConsumer {
    pub sequence: Sequence,
    declared_size: Option<usize>,
    circular: bool,
    id_set: bool,
    accessions: Vec<String>,
    current_reference: Option<Reference>,
    current_feature: Option<(String, Option<String>, Vec<Qualifier>)>,
    sequence_buf: String,
}

impl Default for SequenceConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceConsumer {
    pub fn new() -> Self {
        Self {
            sequence: Sequence::new(helix_core::alphabet::AlphabetTable::DNA, "", false)
                .expect("empty text always validates"),
            declared_size: None,
            circular: false,
            id_set: false,
            accessions: Vec::new(),
            current_reference: None,
            current_feature: None,
            sequence_buf: String::new(),
        }
    }

    fn annotate_text(&mut self, key: &str, value: impl Into<String>) {
        self.sequence
            .annotations
            .insert(key.to_string(), MetadataValue::Text(value.into()));
    }

    fn push_list(&mut self, key: &str, value: impl Into<String>) {
        let entry = self
            .sequence
            .annotations
            .entry(key.to_string())
            .or_insert_with(|| MetadataValue::List(Vec::new()));
        if let MetadataValue::List(items) = entry {
            items.push(MetadataValue::Text(value.into()));
        }
    }

    fn finalize_reference(&mut self) {
        if let Some(r) = self.current_reference.take() {
            self.push_reference(r);
        }
    }

    fn push_reference(&mut self, r: Reference) {
        let entry = self
            .sequence
            .annotations
            .entry("references".to_string())
            .or_insert_with(|| MetadataValue::List(Vec::new()));
        if let MetadataValue::List(items) = entry {
            items.push(MetadataValue::List(vec![
                MetadataValue::Integer(r.number as i64),
                MetadataValue::Text(r.authors.unwrap_or_default()),
                MetadataValue::Text(r.title.unwrap_or_default()),
                MetadataValue::Text(r.journal.unwrap_or_default()),
            ]));
        }
    }

    fn finalize_feature(&mut self) -> Result<(), ParseError> {
        let Some((key, location_text, qualifiers)) = self.current_feature.take() else {
            return Ok(());
        };
        let length = self.declared_size.unwrap_or(0) as i64;
        let stranded = self.sequence.alphabet.complement_supported();
        let location_text = location_text.unwrap_or_default();
        let location = Location::from_string(&location_text, length, self.circular, stranded)
            .map_err(|e| ParseError::LocationParseError(e.to_string()))?;
        let mut feature = Feature::new(key, location);
        feature.qualifiers = qualifiers;
        self.sequence.features.push(feature);
        Ok(())
    }
}

impl RecordConsumer for SequenceConsumer {
    fn locus(&mut self, value: &str) -> Result<(), ParseError> {
        self.sequence.name = value.to_string();
        Ok(())
    }

    fn size(&mut self, value: &str) -> Result<(), ParseError> {
        let n: usize = value
            .parse()
            .map_err(|_| ParseError::BadHeaderField(format!("size {value:?}")))?;
        self.declared_size = Some(n);
        Ok(())
    }

    fn residue_type(&mut self, value: &str) -> Result<(), ParseError> {
        let alphabet = match value.to_ascii_lowercase().as_str() {
            "bp" => helix_core::alphabet::AlphabetTable::DNA,
            "aa" => helix_core::alphabet::AlphabetTable::PROTEIN,
            "rc" => helix_core::alphabet::AlphabetTable::RNA,
            other => return Err(ParseError::BadHeaderField(format!("residue type {other:?}"))),
        };
        self.sequence.alphabet = alphabet;
        self.annotate_text("residue_type", value);
        Ok(())
    }

    fn topology(&mut self, value: &str) -> Result<(), ParseError> {
        self.circular = value.eq_ignore_ascii_case("circular");
        self.annotate_text("topology", value.to_ascii_lowercase());
        Ok(())
    }

    fn molecule_type(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("molecule_type", value);
        Ok(())
    }

    fn data_file_division(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("data_file_division", value);
        Ok(())
    }

    fn date(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("date", value);
        Ok(())
    }

    fn definition(&mut self, value: &str) -> Result<(), ParseError> {
        self.sequence.description = value.trim_end_matches('.').to_string();
        Ok(())
    }

    fn accession(&mut self, value: &str) -> Result<(), ParseError> {
        for token in value.split([' ', ';']).filter(|s| !s.is_empty()) {
            if !self.id_set {
                self.sequence.id = token.to_string();
                self.id_set = true;
            }
            if !self.accessions.iter().any(|a| a == token) {
                self.accessions.push(token.to_string());
                self.push_list("accessions", token);
            }
        }
        Ok(())
    }

    fn version(&mut self, value: &str) -> Result<(), ParseError> {
        match value.rsplit_once('.') {
            Some((acc, suffix)) if suffix.chars().all(|c| c.is_ascii_digit()) && !suffix.is_empty() => {
                self.accession(acc)?;
                self.version_suffix(suffix)?;
            }
            _ => {
                self.sequence.id = value.to_string();
                self.id_set = true;
            }
        }
        Ok(())
    }

    fn version_suffix(&mut self, value: &str) -> Result<(), ParseError> {
        let n: i64 = value
            .parse()
            .map_err(|_| ParseError::BadHeaderField(format!("sequence version {value:?}")))?;
        if n < 0 {
            return Err(ParseError::BadHeaderField(format!("sequence version {value:?}")));
        }
        self.sequence
            .annotations
            .insert("sequence_version".to_string(), MetadataValue::Integer(n));
        Ok(())
    }

    fn project(&mut self, value: &str) -> Result<(), ParseError> {
        self.dblink(value)
    }

    fn dblink(&mut self, value: &str) -> Result<(), ParseError> {
        let normalized: String = value
            .split_whitespace()
            .map(|tok| tok.trim_end_matches(':'))
            .collect::<Vec<_>>()
            .join(":");
        if !self.sequence.dbxrefs.iter().any(|d| d == &normalized) {
            self.sequence.dbxrefs.push(normalized);
        }
        Ok(())
    }

    fn nid(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("nid", value);
        Ok(())
    }

    fn pid(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("pid", value);
        Ok(())
    }

    fn gi(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("gi", value);
        Ok(())
    }

    fn keywords(&mut self, value: &str) -> Result<(), ParseError> {
        for kw in value.split(';') {
            let kw = kw.trim().trim_end_matches('.').trim();
            if !kw.is_empty() {
                self.push_list("keywords", kw);
            }
        }
        Ok(())
    }

    fn segment(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("segment", value);
        Ok(())
    }

    fn source(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("source", value);
        Ok(())
    }

    fn organism(&mut self, value: &str) -> Result<(), ParseError> {
        self.annotate_text("organism", value);
        Ok(())
    }

    fn taxonomy(&mut self, value: &str) -> Result<(), ParseError> {
        for entry in value.split(';').flat_map(|s| s.split('\n')) {
            let entry = entry.trim().trim_end_matches('.').trim();
            if !entry.is_empty() {
                self.push_list("taxonomy", entry);
            }
        }
        Ok(())
    }

    fn reference_num(&mut self, value: &str) -> Result<(), ParseError> {
        self.finalize_reference();
        let n: u32 = value
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or("0")
            .parse()
            .unwrap_or(0);
        self.current_reference = Some(Reference::new(n));
        Ok(())
    }

    fn reference_bases(&mut self, value: &str) -> Result<(), ParseError> {
        let locations = parse_reference_bases(value)?;
        if let Some(r) = self.current_reference.as_mut() {
            r.bases_ref = locations;
        }
        Ok(())
    }

    fn authors(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some(r) = self.current_reference.as_mut() {
            r.authors = Some(value.to_string());
        }
        Ok(())
    }

    fn consortium(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some(r) = self.current_reference.as_mut() {
            r.consortium = Some(value.to_string());
        }
        Ok(())
    }

    fn title(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some(r) = self.current_reference.as_mut() {
            r.title = Some(value.to_string());
        }
        Ok(())
    }

    fn journal(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some(r) = self.current_reference.as_mut() {
            r.journal = Some(value.to_string());
        }
        Ok(())
    }

    fn medline_id(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some(r) = self.current_reference.as_mut() {
            r.medline_id = Some(value.to_string());
        }
        Ok(())
    }

    fn pubmed_id(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some(r) = self.current_reference.as_mut() {
            r.pubmed_id = Some(value.to_string());
        }
        Ok(())
    }

    fn remark(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some(r) = self.current_reference.as_mut() {
            r.remark = Some(value.to_string());
        }
        Ok(())
    }

    fn comment(&mut self, value: &str) -> Result<(), ParseError> {
        self.push_list("comments", value);
        Ok(())
    }

    fn feature_key(&mut self, key: &str) -> Result<(), ParseError> {
        self.finalize_feature()?;
        self.current_feature = Some((key.to_string(), None, Vec::new()));
        Ok(())
    }

    fn location(&mut self, value: &str) -> Result<(), ParseError> {
        if let Some((_, loc, _)) = self.current_feature.as_mut() {
            *loc = Some(value.to_string());
        }
        Ok(())
    }

    fn feature_qualifier(&mut self, key: &str, value: Option<&str>) -> Result<(), ParseError> {
        let Some((_, _, qualifiers)) = self.current_feature.as_mut() else {
            return Ok(());
        };
        let cleaned = value.map(|v| {
            if remove_space_keys().contains(key) {
                v.trim_matches('"').chars().filter(|c| !c.is_whitespace()).collect()
            } else {
                v.to_string()
            }
        });
        qualifiers.push(Qualifier {
            key: key.to_string(),
            value: cleaned,
        });
        Ok(())
    }

    fn base_number(&mut self, _value: &str) -> Result<(), ParseError> {
        Ok(())
    }

    fn sequence(&mut self, value: &str) -> Result<(), ParseError> {
        self.sequence_buf.push_str(value);
        Ok(())
    }

    fn record_end(&mut self) -> Result<(), ParseError> {
        self.finalize_reference();
        self.finalize_feature()?;

        if let Some(declared) = self.declared_size {
            if self.sequence_buf.len() != declared {
                return Err(ParseError::LengthMismatch {
                    declared,
                    actual: self.sequence_buf.len(),
                });
            }
        }

        let alphabet = self.sequence.alphabet;
        let data: Vec<char> = self.sequence_buf.chars().collect();
        if let Some(&bad) = data.iter().find(|&&c| !alphabet.valid(c)) {
            return Err(ParseError::InvalidSymbol(bad));
        }
        self.sequence.data = data;
        Ok(())
    }
}

/// Parses a `REFERENCE`'s `(bases 1 to 100; 200 to 300)` / `(residues 1 to
/// 100)` / `(sites)` / `(bases)` annotation into 0-based half-open
/// [`SimpleLocation`]s. The literal no-range forms (`(sites)`, `(bases)`)
/// yield an empty list; anything else fails with `BadReferenceBases`.
fn parse_reference_bases(text: &str) -> Result<Vec<SimpleLocation>, ParseError> {
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| ParseError::BadReferenceBases(text.to_string()))?;

    let inner = inner
        .strip_prefix("bases")
        .or_else(|| inner.strip_prefix("residues"))
        .unwrap_or(inner)
        .trim();

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut locations = Vec::new();
    for clause in inner.split(';') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let (a, b) = clause
            .split_once(" to ")
            .ok_or_else(|| ParseError::BadReferenceBases(text.to_string()))?;
        let a: i64 = a
            .trim()
            .parse()
            .map_err(|_| ParseError::BadReferenceBases(text.to_string()))?;
        let b: i64 = b
            .trim()
            .parse()
            .map_err(|_| ParseError::BadReferenceBases(text.to_string()))?;
        locations.push(SimpleLocation {
            start: Position::Exact(a - 1),
            end: Position::Exact(b),
            strand: Strand::Undefined,
            reference: None,
            ref_db: None,
        });
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_bases_single_range() {
        let locs = parse_reference_bases("(bases 1 to 100)").unwrap();
        assert_eq!(locs.len(), 1);
        assert_eq!(locs[0].bounds(), (0, 100));
    }

    #[test]
    fn reference_bases_multiple_ranges() {
        let locs = parse_reference_bases("(bases 1 to 100; 200 to 300)").unwrap();
        assert_eq!(locs.len(), 2);
        assert_eq!(locs[1].bounds(), (199, 300));
    }

    #[test]
    fn reference_bases_sites_is_empty_not_an_error() {
        let locs = parse_reference_bases("(sites)").unwrap();
        assert!(locs.is_empty());
    }

    #[test]
    fn reference_bases_malformed_fails() {
        assert!(parse_reference_bases("garbage").is_err());
    }

    #[test]
    fn accession_first_seen_becomes_id() {
        let mut c = SequenceConsumer::new();
        c.accession("AJ131352; AJ999999").unwrap();
        assert_eq!(c.sequence.id, "AJ131352");
        assert_eq!(c.accessions, vec!["AJ131352", "AJ999999"]);
    }

    #[test]
    fn version_with_suffix_splits() {
        let mut c = SequenceConsumer::new();
        c.version("AJ131352.1").unwrap();
        assert_eq!(c.sequence.id, "AJ131352");
        assert_eq!(
            c.sequence.annotations.get("sequence_version"),
            Some(&MetadataValue::Integer(1))
        );
    }
}
