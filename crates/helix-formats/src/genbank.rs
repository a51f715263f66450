//! The GenBank specialization of the INSDC scanner skeleton: `LOCUS`
//! dialect detection, the footer/sequence block, and structured-comment
//! recognition.

use crate::consumer::RecordConsumer;
use crate::insdc::{InsdcConfig, InsdcDialect};
use crate::scanner::LineScanner;
use crate::ParseError;

const CONFIG: InsdcConfig = InsdcConfig {
    record_start: "LOCUS       ",
    header_width: 12,
    feature_start_markers: &["FEATURES             Location/Qualifiers", "FEATURES"],
    feature_end_markers: &[],
    feature_qualifier_indent: 21,
    sequence_headers: &["CONTIG", "ORIGIN", "BASE COUNT", "WGS", "TSA", "TLS"],
};

/// Drives a GenBank-flavored record through the shared INSDC skeleton.
#[derive(Default)]
pub struct GenBankScanner;

impl InsdcDialect for GenBankScanner {
    fn config(&self) -> &InsdcConfig {
        &CONFIG
    }

    fn parse_locus_line(
        &self,
        line: &str,
        consumer: &mut dyn RecordConsumer,
    ) -> Result<(), ParseError> {
        if let Some(fields) = detect_dialect(line) {
            apply_locus_fields(&fields, consumer)
        } else {
            Err(ParseError::UnrecognizedLocus(line.to_string()))
        }
    }

    fn parse_footer(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
    ) -> Result<(), ParseError> {
        loop {
            let Some(line) = scanner.peek() else {
                return Err(ParseError::PrematureEnd(scanner.line_number()));
            };
            if line == "//" {
                return Ok(());
            }
            if line.starts_with("CONTIG") {
                scanner.consume();
                return Ok(());
            }
            if line.starts_with("ORIGIN") {
                scanner.consume();
                return parse_sequence_block(scanner, consumer);
            }
            if CONFIG.sequence_headers.iter().any(|h| line.starts_with(h)) || is_misc_footer_line(line) {
                scanner.consume();
                continue;
            }
            return Err(ParseError::PrematureEnd(scanner.line_number()));
        }
    }
}

fn is_misc_footer_line(line: &str) -> bool {
    line.len() > 12 && line[..12].chars().all(|c| c == ' ') && !line.trim().is_empty()
}

/// Reads the `ORIGIN` sequence block: each line begins with a right-aligned
/// integer in columns 1..9, a space at column 10, and residues from column
/// 11 on, in blank-separated groups.
fn parse_sequence_block(
    scanner: &mut LineScanner,
    consumer: &mut dyn RecordConsumer,
) -> Result<(), ParseError> {
    loop {
        let Some(line) = scanner.peek() else {
            return Err(ParseError::PrematureEnd(scanner.line_number()));
        };
        if line == "//" || line.starts_with("CONTIG") {
            return Ok(());
        }
        if line.trim().is_empty() {
            tracing::warn!("blank line inside sequence block at line {}", scanner.line_number());
            scanner.consume();
            continue;
        }

        match read_sequence_line(line) {
            Some((number, residues)) => {
                consumer.base_number(&number.to_string())?;
                consumer.sequence(&residues)?;
                scanner.consume();
            }
            None => {
                let repaired = &line[1.min(line.len())..];
                if let Some((number, residues)) = read_sequence_line(repaired) {
                    tracing::warn!(
                        "malformed indentation on sequence line {}, repairing",
                        scanner.line_number()
                    );
                    consumer.base_number(&number.to_string())?;
                    consumer.sequence(&residues)?;
                    scanner.consume();
                } else {
                    return Err(ParseError::MalformedSequenceLine(scanner.line_number()));
                }
            }
        }
    }
}

fn read_sequence_line(line: &str) -> Option<(u64, String)> {
    if line.len() < 10 {
        return None;
    }
    let number_field = line.get(0..9)?;
    let number: u64 = number_field.trim().parse().ok()?;
    if !line.as_bytes().get(9).is_some_and(|&b| b == b' ') {
        return None;
    }
    let payload = line.get(10..).unwrap_or("");
    let residues: String = payload
        .split_whitespace()
        .flat_map(|group| group.chars())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    Some((number, residues))
}

struct LocusFields {
    name: String,
    size: Option<String>,
    residue_type: Option<String>,
    molecule_type: Option<String>,
    topology: Option<String>,
    division: Option<String>,
    date: Option<String>,
}

fn apply_locus_fields(fields: &LocusFields, consumer: &mut dyn RecordConsumer) -> Result<(), ParseError> {
    consumer.locus(&fields.name)?;
    if let Some(size) = &fields.size {
        consumer.size(size)?;
    }
    if let Some(rt) = &fields.residue_type {
        consumer.residue_type(rt)?;
    }
    if let Some(mt) = &fields.molecule_type {
        consumer.molecule_type(mt)?;
    }
    if let Some(topology) = &fields.topology {
        consumer.topology(topology)?;
    }
    if let Some(division) = &fields.division {
        consumer.data_file_division(division)?;
    }
    if let Some(date) = &fields.date {
        consumer.date(date)?;
    }
    Ok(())
}

/// Tries each historical `LOCUS` layout in order; the first whose
/// signature matches wins. Field extraction beyond the signature check is
/// shared across dialects: residue-unit marks molecule type and size,
/// `linear`/`circular` mark topology, a three-uppercase-letter token marks
/// the division, and the last date-shaped token marks the date.
fn detect_dialect(line: &str) -> Option<LocusFields> {
    // `full_tokens` keeps the leading "LOCUS" keyword so the indices below
    // line up with the dialect table, which counts it as token 0.
    let full_tokens: Vec<&str> = line.split_whitespace().collect();
    let rest = line.strip_prefix("LOCUS").unwrap_or(line).trim_start();
    let tokens: Vec<&str> = rest.split_whitespace().collect();

    if tokens.is_empty() {
        return None;
    }

    let is_residue_unit = |s: &str| matches!(s, "bp" | "aa" | "rc");

    // Old fixed-column: residue-unit token at byte range [29, 33), blank at [55, 62).
    if line.len() >= 62 {
        let residue_field = &line[29..33];
        let blank_field = &line[55..62];
        if matches!(residue_field, " bp " | " aa " | " rc ") && blank_field.trim().is_empty() {
            return Some(from_tokens(&tokens, &is_residue_unit));
        }
    }

    // New fixed-column: residue-unit at [40, 44), topology at [54, 64).
    if line.len() >= 64 {
        let residue_field = line[40..44].trim();
        let topology_field = line[54..64].trim();
        if is_residue_unit(residue_field) && matches!(topology_field, "" | "linear" | "circular") {
            return Some(from_tokens(&tokens, &is_residue_unit));
        }
    }

    // Truncated: "LOCUS " followed by a single name field.
    if tokens.len() == 1 {
        return Some(LocusFields {
            name: tokens[0].to_string(),
            size: None,
            residue_type: None,
            molecule_type: None,
            topology: None,
            division: None,
            date: None,
        });
    }

    // Invalid-spacing: 8 tokens (LOCUS included), bp|aa at index 3, linear|circular at index 5.
    if full_tokens.len() == 8
        && is_residue_unit(full_tokens[3])
        && matches!(full_tokens[5], "linear" | "circular")
    {
        return Some(from_tokens(&tokens, &is_residue_unit));
    }

    // EnsEMBL: 7 tokens, bp|aa at index 3.
    if full_tokens.len() == 7 && is_residue_unit(full_tokens[3]) {
        return Some(from_tokens(&tokens, &is_residue_unit));
    }

    // EMBOSS: at least 4 tokens, bp|aa at index 3.
    if full_tokens.len() >= 4 && is_residue_unit(full_tokens[3]) {
        return Some(from_tokens(&tokens, &is_residue_unit));
    }

    // Pseudo-GenBank: at least 4 tokens, bp|aa as the last token.
    if full_tokens.len() >= 4 && is_residue_unit(full_tokens[full_tokens.len() - 1]) {
        return Some(from_tokens(&tokens, &is_residue_unit));
    }

    None
}

fn from_tokens(tokens: &[&str], is_residue_unit: &impl Fn(&str) -> bool) -> LocusFields {
    let name = tokens[0].to_string();
    let residue_index = tokens.iter().position(|t| is_residue_unit(t));

    let size = residue_index
        .and_then(|i| i.checked_sub(1))
        .map(|i| tokens[i])
        .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string);

    let residue_type = residue_index.map(|i| tokens[i].to_string());

    let molecule_type = residue_index
        .and_then(|i| tokens.get(i + 1))
        .filter(|t| !matches!(**t, "linear" | "circular"))
        .map(|t| t.to_string());

    let topology = tokens
        .iter()
        .find(|t| matches!(**t, "linear" | "circular"))
        .map(|t| t.to_string());

    let division = tokens
        .iter()
        .rev()
        .skip(1)
        .find(|t| t.len() == 3 && t.chars().all(|c| c.is_ascii_uppercase()))
        .map(|t| t.to_string());

    let date = tokens
        .last()
        .filter(|t| t.len() >= 9 && t.contains('-'))
        .map(|t| t.to_string());

    LocusFields {
        name,
        size,
        residue_type,
        molecule_type,
        topology,
        division,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_locus_has_only_a_name() {
        let fields = detect_dialect("LOCUS       U00096").unwrap();
        assert_eq!(fields.name, "U00096");
        assert!(fields.size.is_none());
        assert!(fields.topology.is_none());
    }

    #[test]
    fn eight_token_locus_line_parses_fields() {
        let fields = detect_dialect("LOCUS       AJ131352 1104 bp DNA linear PLN 14-NOV-2006").unwrap();
        assert_eq!(fields.name, "AJ131352");
        assert_eq!(fields.size.as_deref(), Some("1104"));
        assert_eq!(fields.residue_type.as_deref(), Some("bp"));
        assert_eq!(fields.molecule_type.as_deref(), Some("DNA"));
        assert_eq!(fields.topology.as_deref(), Some("linear"));
        assert_eq!(fields.division.as_deref(), Some("PLN"));
        assert_eq!(fields.date.as_deref(), Some("14-NOV-2006"));
    }

    #[test]
    fn unrecognized_locus_has_no_residue_unit_and_many_tokens() {
        assert!(detect_dialect("LOCUS       a b").is_none());
    }

    #[test]
    fn sequence_line_strips_whitespace_and_upcases() {
        let (n, seq) = read_sequence_line("        1 atcgatcgat cgatcgatcg").unwrap();
        assert_eq!(n, 1);
        assert_eq!(seq, "ATCGATCGATCGATCGATCG");
    }

    #[test]
    fn sequence_line_requires_column_ten_space() {
        assert!(read_sequence_line("1234567890atcg").is_none());
    }
}
