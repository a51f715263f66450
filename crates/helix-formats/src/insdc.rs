//! The shared skeleton for INSDC-style flat files (GenBank, and by
//! extension EMBL-like formats, though only the GenBank specialization is
//! implemented in this crate): find the record start, accumulate header
//! lines, drive feature-table parsing, and hand off to the format-specific
//! footer/sequence reader.

use crate::consumer::RecordConsumer;
use crate::scanner::LineScanner;
use crate::ParseError;

/// The layout constants that parameterize an INSDC-style scanner.
pub struct InsdcConfig {
    pub record_start: &'static str,
    pub header_width: usize,
    pub feature_start_markers: &'static [&'static str],
    pub feature_end_markers: &'static [&'static str],
    pub feature_qualifier_indent: usize,
    pub sequence_headers: &'static [&'static str],
}

/// Format-specific behavior an [`InsdcScanner`] delegates to: recognizing
/// the first line of a record and reading the footer/sequence block.
/// `GenBankScanner` is this crate's only implementor.
pub trait InsdcDialect {
    fn config(&self) -> &InsdcConfig;

    fn parse_locus_line(
        &self,
        line: &str,
        consumer: &mut dyn RecordConsumer,
    ) -> Result<(), ParseError>;

    fn parse_footer(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
    ) -> Result<(), ParseError>;
}

/// Drives one dialect through a full record: `find_start -> header ->
/// features -> footer -> record_end`.
pub struct InsdcScanner<D: InsdcDialect> {
    pub dialect: D,
}

impl<D: InsdcDialect> InsdcScanner<D> {
    pub fn new(dialect: D) -> Self {
        Self { dialect }
    }

    /// Skips blank lines, a leftover `//` from a previous record, and any
    /// preamble, returning once the next non-empty line begins with
    /// `record_start`. `Ok(None)` signals clean EOF; binary-looking content
    /// (a digit as the first non-blank character) fails with `NotText`.
    pub fn find_start(&self, scanner: &mut LineScanner) -> Result<bool, ParseError> {
        loop {
            let Some(line) = scanner.peek() else {
                return Ok(false);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "//" {
                scanner.consume();
                continue;
            }
            if trimmed.starts_with(self.dialect.config().record_start.trim_end()) {
                return Ok(true);
            }
            if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ParseError::NotText(scanner.line_number()));
            }
            scanner.consume();
        }
    }

    /// Accumulates header lines (everything between the `LOCUS`/`ID` line
    /// and the first feature-table or sequence marker), dispatching known
    /// INSDC section keywords to the consumer as it goes.
    pub fn parse_header(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
    ) -> Result<(), ParseError> {
        let cfg = self.dialect.config();
        let locus_line = scanner
            .consume()
            .ok_or(ParseError::PrematureEnd(scanner.line_number()))?;
        self.dialect.parse_locus_line(locus_line, consumer)?;

        loop {
            let Some(line) = scanner.peek() else {
                return Err(ParseError::PrematureEnd(scanner.line_number()));
            };
            if line == "//" {
                return Err(ParseError::PrematureEnd(scanner.line_number()));
            }
            if cfg.feature_start_markers.iter().any(|m| line.starts_with(m))
                || cfg.sequence_headers.iter().any(|h| line.starts_with(h))
            {
                return Ok(());
            }
            self.parse_header_line(scanner, consumer)?;
        }
    }

    fn parse_header_line(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
    ) -> Result<(), ParseError> {
        let width = self.dialect.config().header_width;
        let line = scanner.consume().expect("checked by caller");
        let keyword_field = if line.len() >= width { &line[..width] } else { line };
        let keyword = keyword_field.trim();
        let body_start = width.min(line.len());
        let mut value = line[body_start..].trim().to_string();

        let continuation = |l: &str| -> bool {
            l.len() > body_start && l[..body_start].chars().all(|c| c == ' ') && !l.trim().is_empty()
        };

        let collect_continuations = |scanner: &mut LineScanner, value: &mut String| {
            while let Some(next) = scanner.peek() {
                if !continuation(next) {
                    break;
                }
                value.push(' ');
                value.push_str(next[body_start.min(next.len())..].trim());
                scanner.consume();
            }
        };

        match keyword {
            "DEFINITION" => {
                collect_continuations(scanner, &mut value);
                consumer.definition(&value)
            }
            "ACCESSION" => consumer.accession(&value),
            "VERSION" => consumer.version(&value),
            "DBLINK" => consumer.dblink(&value),
            "PROJECT" => consumer.project(&value),
            "NID" => consumer.nid(&value),
            "PID" => consumer.pid(&value),
            "GI" => consumer.gi(&value),
            "KEYWORDS" => {
                collect_continuations(scanner, &mut value);
                consumer.keywords(&value)
            }
            "SEGMENT" => consumer.segment(&value),
            "SOURCE" => {
                consumer.source(&value)?;
                while let Some(next) = scanner.peek() {
                    let trimmed = next.trim_start();
                    if let Some(org) = trimmed.strip_prefix("ORGANISM") {
                        consumer.organism(org.trim())?;
                        scanner.consume();
                        let mut taxonomy = String::new();
                        while let Some(tax_line) = scanner.peek() {
                            if !continuation(tax_line) {
                                break;
                            }
                            taxonomy.push_str(tax_line.trim());
                            taxonomy.push('\n');
                            scanner.consume();
                        }
                        if !taxonomy.is_empty() {
                            consumer.taxonomy(&taxonomy)?;
                        }
                    } else if continuation(next) {
                        scanner.consume();
                    } else {
                        break;
                    }
                }
                Ok(())
            }
            "REFERENCE" => {
                consumer.reference_num(&value)?;
                while let Some(next) = scanner.peek() {
                    if !continuation(next) {
                        break;
                    }
                    self.parse_reference_field(scanner, consumer)?;
                }
                Ok(())
            }
            "COMMENT" => {
                let mut comment = value.clone();
                while let Some(next) = scanner.peek() {
                    if next.trim().is_empty() {
                        comment.push('\n');
                        scanner.consume();
                    } else if continuation(next) {
                        comment.push(' ');
                        comment.push_str(next.trim());
                        scanner.consume();
                    } else {
                        break;
                    }
                }
                consumer.comment(comment.trim())
            }
            _ => Ok(()),
        }
    }

    fn parse_reference_field(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
    ) -> Result<(), ParseError> {
        let width = self.dialect.config().header_width;
        let line = scanner.consume().expect("checked by caller");
        let sub_keyword = line.trim_start().split_whitespace().next().unwrap_or("");
        let body_start = line.find(sub_keyword).map(|i| i + sub_keyword.len()).unwrap_or(width);
        let body_start = body_start.max(width.min(line.len()));
        let mut value = line.get(body_start..).unwrap_or("").trim().to_string();

        while let Some(next) = scanner.peek() {
            let is_continuation =
                next.len() > width && next[..width].chars().all(|c| c == ' ') && !next.trim().is_empty();
            if !is_continuation {
                break;
            }
            value.push(' ');
            value.push_str(next[width..].trim());
            scanner.consume();
        }

        match sub_keyword {
            "AUTHORS" => consumer.authors(&value),
            "CONSRTM" => consumer.consortium(&value),
            "TITLE" => consumer.title(&value),
            "JOURNAL" => consumer.journal(&value),
            "MEDLINE" => consumer.medline_id(&value),
            "PUBMED" => consumer.pubmed_id(&value),
            "REMARK" => consumer.remark(&value),
            _ => Ok(()),
        }
    }

    /// Reads the feature table: each block starts with a key in columns
    /// `5..feature_qualifier_indent` and continues through every line whose
    /// leading `feature_qualifier_indent` columns are blank.
    pub fn parse_features(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
        skip: bool,
    ) -> Result<(), ParseError> {
        let cfg = self.dialect.config();
        scanner.consume();

        loop {
            let Some(line) = scanner.peek() else {
                return Err(ParseError::PrematureEnd(scanner.line_number()));
            };
            if line == "//" || cfg.sequence_headers.iter().any(|h| line.starts_with(h)) {
                return Ok(());
            }
            if cfg.feature_end_markers.iter().any(|m| line.starts_with(m)) {
                scanner.consume();
                continue;
            }
            self.parse_feature_block(scanner, consumer, skip)?;
        }
    }

    fn parse_feature_block(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
        skip: bool,
    ) -> Result<(), ParseError> {
        let indent = self.dialect.config().feature_qualifier_indent;
        let line = scanner.consume().expect("checked by caller");

        let key_field_end = indent.min(line.len());
        let key = line.get(5.min(line.len())..key_field_end).unwrap_or("").trim();
        if key.is_empty() {
            tracing::warn!("skipping over-indented or empty feature key on line {}", scanner.line_number());
            return Ok(());
        }
        let mut location = line.get(indent.min(line.len())..).unwrap_or("").trim().to_string();

        let is_body_line = |l: &str| -> bool {
            l.len() >= indent && l[..indent].chars().all(|c| c == ' ') && !l.trim().is_empty()
        };

        while let Some(next) = scanner.peek() {
            if !is_body_line(next) {
                break;
            }
            let body = next[indent..].trim_start();
            if body.starts_with('/') {
                break;
            }
            let open_parens = location.matches('(').count();
            let close_parens = location.matches(')').count();
            if location.ends_with(',') || open_parens > close_parens {
                location.push_str(body.trim());
            } else {
                tracing::warn!("non-standard location continuation on line {}", scanner.line_number());
                location.push_str(body.trim());
            }
            scanner.consume();
        }

        if !skip {
            consumer.feature_key(key)?;
            consumer.location(&location)?;
        }

        while let Some(next) = scanner.peek() {
            if !is_body_line(next) {
                break;
            }
            let body = &next[indent..];
            if !body.trim_start().starts_with('/') {
                break;
            }
            self.parse_qualifier(scanner, consumer, skip)?;
        }

        Ok(())
    }

    fn parse_qualifier(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
        skip: bool,
    ) -> Result<(), ParseError> {
        let indent = self.dialect.config().feature_qualifier_indent;
        let line = scanner.consume().expect("checked by caller");
        let content = line[indent..].trim_start().strip_prefix('/').unwrap_or("");

        let (key, mut raw_value) = match content.split_once('=') {
            Some((k, v)) if v.is_empty() => (k.to_string(), None),
            Some((k, v)) => (k.to_string(), Some(v.to_string())),
            None => (content.to_string(), None),
        };

        if let Some(v) = raw_value.as_mut() {
            if v.starts_with('"') && !(v.len() > 1 && v.ends_with('"')) {
                while let Some(next) = scanner.peek() {
                    let is_body = next.len() >= indent && next[..indent].chars().all(|c| c == ' ');
                    if !is_body {
                        break;
                    }
                    let body = next[indent..].to_string();
                    v.push('\n');
                    v.push_str(&body);
                    scanner.consume();
                    if body.trim_end().ends_with('"') {
                        break;
                    }
                }
            } else {
                while let Some(next) = scanner.peek() {
                    let is_body = next.len() >= indent
                        && next[..indent].chars().all(|c| c == ' ')
                        && !next.trim().is_empty();
                    if !is_body || next[indent..].trim_start().starts_with('/') {
                        break;
                    }
                    v.push('\n');
                    v.push_str(next[indent..].trim());
                    scanner.consume();
                }
            }
        }

        if !skip {
            consumer.feature_qualifier(&key, raw_value.as_deref())?;
        }
        Ok(())
    }

    /// Orchestrates one full record. Returns `Ok(false)` at clean EOF,
    /// `Ok(true)` after a record was fed to `consumer`.
    pub fn feed(
        &self,
        scanner: &mut LineScanner,
        consumer: &mut dyn RecordConsumer,
        do_features: bool,
    ) -> Result<bool, ParseError> {
        if !self.find_start(scanner)? {
            return Ok(false);
        }
        self.parse_header(scanner, consumer)?;

        let cfg = self.dialect.config();
        if let Some(line) = scanner.peek() {
            if cfg.feature_start_markers.iter().any(|m| line.starts_with(m)) {
                self.parse_features(scanner, consumer, !do_features)?;
            }
        }

        self.dialect.parse_footer(scanner, consumer)?;

        match scanner.peek() {
            Some("//") => {
                scanner.consume();
            }
            Some(_) => return Err(ParseError::PrematureEnd(scanner.line_number())),
            None => return Err(ParseError::PrematureEnd(scanner.line_number())),
        }

        consumer.record_end()?;
        Ok(true)
    }
}
