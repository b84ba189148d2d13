use std::ops::Range;
use std::sync::Arc;

/// A single source line of a [`DocumentSnapshot`].
///
/// `from..to` is a byte range into the document text that excludes the
/// line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the first character of the line.
    pub from: usize,
    /// Byte offset one past the last character of the line.
    pub to: usize,
}

impl Line {
    /// The byte range covered by this line.
    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }

    /// Length of the line in bytes.
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    /// Whether the line holds no characters.
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// An immutable view of the document text split into lines.
///
/// Snapshots are cheap to clone and are rebuilt by the engine after every edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    text: Arc<str>,
    line_ranges: Arc<[Range<usize>]>,
}

impl DocumentSnapshot {
    /// Builds a snapshot, splitting `text` on `\n` or `\r\n`.
    ///
    /// A trailing newline yields a final empty line and an empty text has
    /// exactly one empty line. A lone `\r` is ordinary line content.
    pub fn from_text(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let mut line_ranges = Vec::new();
        let mut start = 0;

        for (index, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                let end = if index > start && text.as_bytes()[index - 1] == b'\r' {
                    index - 1
                } else {
                    index
                };
                line_ranges.push(start..end);
                start = index + 1;
            }
        }
        line_ranges.push(start..text.len());

        Self {
            text,
            line_ranges: line_ranges.into(),
        }
    }

    /// The full document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the document in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the document holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines, always at least one.
    pub fn line_count(&self) -> usize {
        self.line_ranges.len()
    }

    /// Returns the line with the given 1-based number.
    pub fn line(&self, number: usize) -> Option<Line> {
        let range = self.line_ranges.get(number.checked_sub(1)?)?;
        Some(Line {
            number,
            from: range.start,
            to: range.end,
        })
    }

    /// Returns the line containing the byte offset `pos`.
    pub fn line_at(&self, pos: usize) -> Option<Line> {
        if pos > self.text.len() {
            return None;
        }
        let index = self
            .line_ranges
            .partition_point(|range| range.end < pos)
            .min(self.line_ranges.len() - 1);
        self.line(index + 1)
    }

    /// Iterates over all lines in document order.
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.line_ranges
            .iter()
            .enumerate()
            .map(|(index, range)| Line {
                number: index + 1,
                from: range.start,
                to: range.end,
            })
    }

    /// The text of a line, without its terminator.
    pub fn line_text(&self, line: &Line) -> &str {
        &self.text[line.range()]
    }
}

impl Default for DocumentSnapshot {
    fn default() -> Self {
        Self::from_text("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_one_line() {
        let doc = DocumentSnapshot::from_text("");
        assert_eq!(doc.line_count(), 1);

        let line = doc.line(1).unwrap();
        assert!(line.is_empty());
        assert_eq!(line.range(), 0..0);
    }

    #[test]
    fn test_trailing_newline_adds_empty_line() {
        let doc = DocumentSnapshot::from_text("a\n");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line(2).unwrap().range(), 2..2);
    }

    #[test]
    fn test_line_ranges_exclude_terminator() {
        let doc = DocumentSnapshot::from_text("let x = 1;\n\nfoo()");
        let lines: Vec<_> = doc.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(doc.line_text(&lines[0]), "let x = 1;");
        assert_eq!(doc.line_text(&lines[1]), "");
        assert_eq!(doc.line_text(&lines[2]), "foo()");
        assert_eq!(lines[2].number, 3);
    }

    #[test]
    fn test_line_lookup_out_of_range() {
        let doc = DocumentSnapshot::from_text("one\ntwo");
        assert!(doc.line(0).is_none());
        assert!(doc.line(3).is_none());
    }

    #[test]
    fn test_line_at_offset() {
        let doc = DocumentSnapshot::from_text("ab\ncd");
        assert_eq!(doc.line_at(0).unwrap().number, 1);
        assert_eq!(doc.line_at(2).unwrap().number, 1);
        assert_eq!(doc.line_at(3).unwrap().number, 2);
        assert_eq!(doc.line_at(5).unwrap().number, 2);
        assert!(doc.line_at(6).is_none());
    }

    #[test]
    fn test_crlf_terminator_excluded() {
        let doc = DocumentSnapshot::from_text("ab\r\ncd\r\n");
        let lines: Vec<_> = doc.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].range(), 0..2);
        assert_eq!(doc.line_text(&lines[1]), "cd");
        assert_eq!(lines[2].range(), 8..8);
    }

    #[test]
    fn test_lone_carriage_return_is_content() {
        let doc = DocumentSnapshot::from_text("a\rb\n\r");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line_text(&doc.line(1).unwrap()), "a\rb");
        assert_eq!(doc.line_text(&doc.line(2).unwrap()), "\r");
    }
}
