//! A pull-based reader over a text source: one line of look-ahead, no
//! backtracking beyond the current line.

/// Wraps a text source as a cursor over its lines, with one line of
/// look-ahead. Lines are split on `\n`; a trailing `\r` is trimmed so both
/// Unix and Windows line endings read the same.
pub struct LineScanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let lines = source
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        Self { lines, pos: 0 }
    }

    /// The current line without advancing, or `None` at EOF.
    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// The current line, advancing past it.
    pub fn consume(&mut self) -> Option<&'a str> {
        let line = self.peek();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// 1-based line number of the current cursor position, for error messages.
    pub fn line_number(&self) -> usize {
        self.pos + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_advance() {
        let mut s = LineScanner::new("a\nb\nc");
        assert_eq!(s.peek(), Some("a"));
        assert_eq!(s.peek(), Some("a"));
        assert_eq!(s.consume(), Some("a"));
        assert_eq!(s.peek(), Some("b"));
    }

    #[test]
    fn eof_after_last_line() {
        let mut s = LineScanner::new("a\nb");
        s.consume();
        s.consume();
        assert!(s.at_eof());
        assert_eq!(s.consume(), None);
    }

    #[test]
    fn strips_carriage_return() {
        let mut s = LineScanner::new("a\r\nb\r\n");
        assert_eq!(s.consume(), Some("a"));
        assert_eq!(s.consume(), Some("b"));
        assert_eq!(s.consume(), Some(""));
    }
}
