pub mod consumer;
pub mod genbank;
pub mod insdc;
pub mod iterator;
pub mod scanner;

use thiserror::Error;

/// Every way a parse can fail. Structural errors (`UnrecognizedLocus`,
/// `PrematureEnd`, `LengthMismatch`, ...) abort the current record;
/// locally-recoverable malformations (over-indented keys, a trailing
/// comma, a `bond` qualifier) are reported through the `tracing` crate as
/// warnings instead and do not appear here.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("binary-looking content before the first record, at line {0}")]
    NotText(usize),
    #[error("no LOCUS dialect matched: {0:?}")]
    UnrecognizedLocus(String),
    #[error("malformed header field: {0}")]
    BadHeaderField(String),
    #[error("unexpected end of input at line {0}")]
    PrematureEnd(usize),
    #[error("malformed sequence line at line {0}")]
    MalformedSequenceLine(usize),
    #[error("declared size {declared} does not match {actual} parsed residues")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("feature or reference location error: {0}")]
    LocationParseError(String),
    #[error("malformed reference bases annotation: {0}")]
    BadReferenceBases(String),
    #[error("sequence contains a symbol the alphabet rejects: {0:?}")]
    InvalidSymbol(char),
    #[error("qualifier continuation at line {0} has no open qualifier")]
    OrphanContinuation(usize),
}
