//! Yields successive records from a stream until EOF.

use helix_core::sequence::Sequence;

use crate::consumer::SequenceConsumer;
use crate::genbank::GenBankScanner;
use crate::insdc::InsdcScanner;
use crate::scanner::LineScanner;
use crate::ParseError;

/// Repeatedly feeds a [`LineScanner`] through a [`GenBankScanner`], handing
/// each record a fresh [`SequenceConsumer`]. Iteration stops at clean EOF.
/// A structural failure is yielded for the record that caused it, but the
/// iterator keeps going afterward: `find_start` resynchronizes on the next
/// `LOCUS ` line, so the next call to `next()` attempts the record after
/// the failed one.
pub struct RecordIterator<'a> {
    scanner: LineScanner<'a>,
    driver: InsdcScanner<GenBankScanner>,
    do_features: bool,
    done: bool,
}

impl<'a> RecordIterator<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            scanner: LineScanner::new(source),
            driver: InsdcScanner::new(GenBankScanner),
            do_features: true,
            done: false,
        }
    }

    /// When `false`, feature blocks are skipped (not parsed into
    /// qualifiers); header and sequence parsing are unaffected.
    pub fn with_features(mut self, do_features: bool) -> Self {
        self.do_features = do_features;
        self
    }
}

impl Iterator for RecordIterator<'_> {
    type Item = Result<Sequence, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut consumer = SequenceConsumer::new();
        match self.driver.feed(&mut self.scanner, &mut consumer, self.do_features) {
            Ok(true) => Some(Ok(consumer.sequence)),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}
