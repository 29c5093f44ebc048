//! Line-oriented cursor over a [`Segments`] view of the source.

use super::segment::{Segment, Segments, split_lines};
use crate::utils::{is_punct, is_space};

/// Options for [`Reader::find_closure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindClosureOptions {
    /// Track nested `open`/`close` pairs instead of failing on a second opener.
    pub nesting: bool,
    /// Allow the closure to span lines.
    pub newline: bool,
}

/// A saved reader location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the current segment.
    pub line: usize,
    /// Byte offset into the current segment.
    pub column: usize,
    padding: usize,
}

#[derive(Debug, Clone)]
pub struct Reader<'a> {
    source: &'a str,
    segments: Segments,
    line: usize,
    pos: usize,
    padding: usize,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str, segments: Segments) -> Self {
        let mut reader = Self {
            source,
            segments,
            line: 0,
            pos: 0,
            padding: 0,
        };
        reader.seek_line(0);
        reader
    }

    /// A reader over every line of `source`.
    pub fn from_source(source: &'a str) -> Self {
        Self::new(source, split_lines(source))
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn segments(&self) -> &Segments {
        &self.segments
    }

    pub fn value(&self, segment: Segment) -> &'a str {
        segment.raw(self.source)
    }

    pub fn is_eof(&self) -> bool {
        self.line >= self.segments.len()
    }

    /// Remaining bytes of the current line, including its newline.
    pub fn peek_line(&self) -> Option<&'a str> {
        let segment = self.segments.get(self.line)?;
        Some(&self.source[self.pos..segment.end])
    }

    /// Remaining part of the current line as a segment.
    pub fn peek_line_segment(&self) -> Option<Segment> {
        let segment = self.segments.get(self.line)?;
        Some(Segment::with_padding(self.pos, segment.end, self.padding))
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.peek_line()
            .and_then(|line| line.as_bytes().first().copied())
    }

    pub fn peek_char(&self) -> Option<char> {
        self.peek_line().and_then(|line| line.chars().next())
    }

    /// The character just before the cursor within the current line, if any.
    pub fn prev_char(&self) -> Option<char> {
        let segment = self.segments.get(self.line)?;
        self.source[segment.start..self.pos].chars().next_back()
    }

    /// Virtual spaces pending before the cursor.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Visual column of the cursor on the current line, with tabs expanded.
    pub fn line_offset(&self) -> usize {
        let Some(segment) = self.segments.get(self.line) else {
            return 0;
        };
        let mut column: usize = 0;
        for b in self.source[segment.start..self.pos].bytes() {
            column = if b == b'\t' { column + 4 - column % 4 } else { column + 1 };
        }
        column.saturating_sub(self.padding)
    }

    /// Moves `n` bytes forward, crossing into following lines as needed.
    pub fn advance(&mut self, mut n: usize) {
        if n > 0 {
            self.padding = 0;
        }
        while n > 0 {
            let Some(segment) = self.segments.get(self.line) else {
                return;
            };
            let remaining = segment.end - self.pos;
            if n < remaining {
                self.pos += n;
                return;
            }
            n -= remaining;
            self.advance_line();
        }
    }

    pub fn advance_and_set_padding(&mut self, n: usize, padding: usize) {
        self.advance(n);
        if !self.is_eof() {
            self.padding = padding;
        }
    }

    pub fn advance_line(&mut self) {
        self.seek_line(self.line + 1);
    }

    /// Moves to the start of line `line`.
    pub fn seek_line(&mut self, line: usize) {
        self.line = line;
        match self.segments.get(line) {
            Some(segment) => {
                self.pos = segment.start;
                self.padding = segment.padding;
            }
            None => {
                self.line = self.segments.len();
                self.pos = self.segments.last().map_or(0, |s| s.end);
                self.padding = 0;
            }
        }
    }

    pub fn position(&self) -> Position {
        let start = self.segments.get(self.line).map_or(self.pos, |s| s.start);
        Position {
            line: self.line,
            column: self.pos - start,
            padding: self.padding,
        }
    }

    pub fn set_position(&mut self, position: Position) {
        self.seek_line(position.line);
        if !self.is_eof() {
            self.pos += position.column;
            self.padding = position.padding;
        }
    }

    /// Absolute byte offset of the cursor in the source.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// The text between two positions as segments, one per line fragment.
    pub fn between(&self, from: Position, to: Position) -> Segments {
        let mut out = Segments::new();
        for line in from.line..=to.line.min(self.segments.len().saturating_sub(1)) {
            let Some(segment) = self.segments.get(line) else {
                break;
            };
            let start = if line == from.line {
                segment.start + from.column
            } else {
                segment.start
            };
            let end = if line == to.line {
                segment.start + to.column
            } else {
                segment.end
            };
            if start < end {
                out.push(Segment::new(start, end));
            }
        }
        out
    }

    /// Everything from the cursor to the end of the last line, concatenated.
    pub fn rest(&self) -> String {
        let mut out = String::new();
        if let Some(line) = self.peek_line() {
            out.push_str(line);
        }
        for segment in self.segments.iter().skip(self.line + 1) {
            out.push_str(segment.raw(self.source));
        }
        out
    }

    /// Skips spaces, tabs and newlines.
    ///
    /// Returns the indentation width of the final position on its line (tabs
    /// expanded to the next multiple of four, padding included) and the number
    /// of raw whitespace bytes consumed.
    pub fn skip_spaces(&mut self) -> (usize, usize) {
        let mut width = 0;
        let mut spaces = 0;
        while let Some(line) = self.peek_line() {
            let mut column = self.line_offset();
            width += self.padding;
            let mut consumed = 0;
            let mut found = false;
            for b in line.bytes() {
                match b {
                    b' ' => {
                        width += 1;
                        column += 1;
                    }
                    b'\t' => {
                        let tab = 4 - column % 4;
                        width += tab;
                        column += tab;
                    }
                    _ if is_space(b) => {}
                    _ => {
                        found = true;
                        break;
                    }
                }
                consumed += 1;
                spaces += 1;
            }
            if found {
                if consumed > 0 {
                    self.advance(consumed);
                }
                break;
            }
            self.advance_line();
            width = 0;
        }
        (width, spaces)
    }

    /// Skips whole blank lines, returning how many were skipped.
    pub fn skip_blank_lines(&mut self) -> usize {
        let mut count = 0;
        while let Some(line) = self.peek_line() {
            if !line.bytes().all(is_space) {
                break;
            }
            self.advance_line();
            count += 1;
        }
        count
    }

    /// Scans for the byte closing a construct opened just before the cursor.
    ///
    /// On success the reader sits after the closer and the content between
    /// opener and closer is returned, one segment per line fragment. On
    /// failure the reader is left where it was.
    pub fn find_closure(
        &mut self,
        open: u8,
        close: u8,
        options: FindClosureOptions,
    ) -> Option<Segments> {
        let saved = self.position();
        let mut depth = 1;
        let mut found = Segments::new();
        while let Some(segment) = self.peek_line_segment() {
            let bytes = self.source[segment.start..segment.end].as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                let c = bytes[i];
                if c == b'\\' && i + 1 < bytes.len() && is_punct(bytes[i + 1]) {
                    i += 2;
                    continue;
                }
                if c == close {
                    depth -= 1;
                    if depth == 0 {
                        found.push(segment.with_end(segment.start + i));
                        self.advance(i + 1);
                        return Some(found);
                    }
                } else if c == open {
                    if !options.nesting {
                        self.set_position(saved);
                        return None;
                    }
                    depth += 1;
                }
                i += 1;
            }
            if !options.newline {
                break;
            }
            found.push(segment);
            self.advance_line();
        }
        self.set_position(saved);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_advance_across_lines() {
        let mut reader = Reader::from_source("ab\ncd\n");
        assert_eq!(reader.peek_line(), Some("ab\n"));
        reader.advance(3);
        assert_eq!(reader.position().line, 1);
        assert_eq!(reader.peek_byte(), Some(b'c'));
        reader.advance(3);
        assert!(reader.is_eof());
        assert_eq!(reader.peek_line(), None);
    }

    #[test]
    fn test_skip_blank_lines() {
        let mut reader = Reader::from_source("\n  \n\téa\n");
        assert_eq!(reader.skip_blank_lines(), 2);
        assert_eq!(reader.position().line, 2);
        reader.advance(1);
        assert_eq!(reader.peek_char(), Some('é'));
        assert_eq!(reader.skip_blank_lines(), 0);
    }

    #[test]
    fn test_skip_spaces_counts_width_and_bytes() {
        let mut reader = Reader::from_source(" \tfoo");
        let (width, spaces) = reader.skip_spaces();
        assert_eq!(width, 4);
        assert_eq!(spaces, 2);
        assert_eq!(reader.peek_byte(), Some(b'f'));
    }

    #[test]
    fn test_skip_spaces_crosses_newline() {
        let mut reader = Reader::from_source("a  \n  b");
        reader.advance(1);
        let (width, spaces) = reader.skip_spaces();
        assert_eq!(width, 2);
        assert_eq!(spaces, 5);
        assert_eq!(reader.peek_byte(), Some(b'b'));
    }

    #[test]
    fn test_find_closure_single_line() {
        let source = "[foo] rest";
        let mut reader = Reader::from_source(source);
        reader.advance(1);
        let segments = reader
            .find_closure(b'[', b']', FindClosureOptions::default())
            .unwrap();
        assert_eq!(segments.value(source), "foo");
        assert_eq!(reader.peek_byte(), Some(b' '));
    }

    #[test]
    fn test_find_closure_escaped_closer() {
        let source = "[a\\]b]";
        let mut reader = Reader::from_source(source);
        reader.advance(1);
        let segments = reader
            .find_closure(b'[', b']', FindClosureOptions::default())
            .unwrap();
        assert_eq!(segments.value(source), "a\\]b");
    }

    #[test]
    fn test_find_closure_multiline() {
        let source = "(foo\nbar) x";
        let mut reader = Reader::from_source(source);
        reader.advance(1);
        let options = FindClosureOptions {
            nesting: false,
            newline: true,
        };
        let segments = reader.find_closure(b'(', b')', options).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments.value(source), "foo\nbar");
        assert_eq!(reader.position().line, 1);
    }

    #[test]
    fn test_find_closure_nesting() {
        let source = "(a(b)c) d";
        let mut reader = Reader::from_source(source);
        reader.advance(1);
        let options = FindClosureOptions {
            nesting: true,
            newline: false,
        };
        let segments = reader.find_closure(b'(', b')', options).unwrap();
        assert_eq!(segments.value(source), "a(b)c");
    }

    #[test]
    fn test_find_closure_not_found_restores_position() {
        let source = "\"abc\ndef";
        let mut reader = Reader::from_source(source);
        reader.advance(1);
        let before = reader.position();
        let options = FindClosureOptions {
            nesting: false,
            newline: true,
        };
        assert!(reader.find_closure(b'"', b'"', options).is_none());
        assert_eq!(reader.position(), before);
    }

    #[test]
    fn test_find_closure_rejects_unnested_opener() {
        let source = "[a[b]";
        let mut reader = Reader::from_source(source);
        reader.advance(1);
        assert!(
            reader
                .find_closure(b'[', b']', FindClosureOptions::default())
                .is_none()
        );
        assert_eq!(reader.peek_byte(), Some(b'a'));
    }

    #[test]
    fn test_between_and_rest() {
        let source = "ab\ncd\nef";
        let mut reader = Reader::from_source(source);
        reader.advance(1);
        let from = reader.position();
        reader.advance(3);
        assert_eq!(reader.rest(), "d\nef");
        let to = reader.position();
        assert_eq!(reader.between(from, to).value(source), "b\nc");
    }

    #[test]
    fn test_line_offset_expands_tabs() {
        let mut reader = Reader::from_source("\tx");
        reader.advance(1);
        assert_eq!(reader.line_offset(), 4);
    }
}
