//! Fixed-capacity line buffer

use std::fmt;

/// Capacity of a line, terminator included
pub const LINE_CAPACITY: usize = 1024;

/// A line of at most `LINE_CAPACITY - 1` bytes
///
/// Writes past the capacity are dropped (never splitting a UTF-8 sequence)
/// and remembered, so the caller can tell that the line was cut.
#[derive(Debug, Clone, Default)]
pub struct BoundedLine {
    text: String,
    truncated: bool,
}

impl BoundedLine {
    pub fn new() -> Self {
        Self {
            text: String::with_capacity(LINE_CAPACITY),
            truncated: false,
        }
    }

    /// Build a line from pieces
    pub fn from_parts(parts: &[&str]) -> Self {
        let mut line = Self::new();
        for part in parts {
            line.push_str(part);
        }
        line
    }

    pub fn push_str(&mut self, s: &str) {
        let room = LINE_CAPACITY - 1 - self.text.len();
        if s.len() <= room {
            self.text.push_str(s);
            return;
        }

        let mut cut = room;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.text.push_str(&s[..cut]);
        self.truncated = true;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether some input did not fit
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Write for BoundedLine {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl fmt::Display for BoundedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_short_line() {
        let line = BoundedLine::from_parts(&["{}", " ", "hello"]);
        assert_eq!(line.as_str(), "{} hello");
        assert!(!line.truncated());
    }

    #[test]
    fn test_exact_fit() {
        let text = "a".repeat(LINE_CAPACITY - 1);
        let line = BoundedLine::from_parts(&[&text]);
        assert_eq!(line.len(), LINE_CAPACITY - 1);
        assert!(!line.truncated());
    }

    #[test]
    fn test_truncation() {
        let mut line = BoundedLine::new();
        write!(line, "{}", "b".repeat(2000)).unwrap();
        assert_eq!(line.len(), LINE_CAPACITY - 1);
        assert!(line.truncated());

        // further writes are dropped
        line.push_str("more");
        assert_eq!(line.len(), LINE_CAPACITY - 1);
    }

    #[test]
    fn test_cut_on_char_boundary() {
        let mut line = BoundedLine::new();
        line.push_str(&"a".repeat(LINE_CAPACITY - 2));
        line.push_str("é");
        assert_eq!(line.len(), LINE_CAPACITY - 2);
        assert!(line.truncated());
        assert!(line.as_str().is_char_boundary(line.len()));
    }
}
