use std::cmp;
use std::io::{self, Read};
use std::str;

use failure::Error;

use crate::error::MalformedMapping;
use crate::util;

const INITIAL_BUFFER_SIZE: usize = 4096 * 4;

#[derive(Copy, Clone, Debug)]
struct Mark {
    pos: usize,
    line_number: usize,
    bof: bool,
    eol: bool,
    eof: bool,
}

enum Column {
    /// The expected literal didn't match, nothing was consumed
    NoMatch,
    /// Already at the end of the line
    Missing,
    Matched,
    Text(String),
}

/// A cursor over line and column structured text.
///
/// Columns are separated by a single separator byte and lines may be indented
/// with a repeated indentation byte. Marks save the cursor so it can be reset later.
/// While any mark is outstanding the buffer only grows, so the marked content stays valid.
pub struct ColumnFileReader<R> {
    reader: R,
    indentation: u8,
    separator: u8,
    buffer: Vec<u8>,
    pos: usize,
    limit: usize,
    line_number: usize,
    bof: bool,
    eol: bool,
    eof: bool,
    marks: Vec<Mark>,
}
impl<R: Read> ColumnFileReader<R> {
    pub fn new(reader: R, indentation: u8, separator: u8) -> ColumnFileReader<R> {
        ColumnFileReader {
            reader, indentation, separator,
            buffer: vec![0; INITIAL_BUFFER_SIZE],
            pos: 0,
            limit: 0,
            line_number: 1,
            bof: true,
            eol: false,
            eof: false,
            marks: Vec::new(),
        }
    }
    /// Consumes the next column, returning `None` if the line has no more columns.
    ///
    /// An empty column gives an empty string.
    #[inline]
    pub fn next_col(&mut self, unescape: bool) -> Result<Option<String>, Error> {
        self.read(unescape, true, true, None).map(Column::into_text)
    }
    /// Consumes the next column only if it is exactly `expected`
    #[inline]
    pub fn next_col_matching(&mut self, expected: &str) -> Result<bool, Error> {
        Ok(match self.read(false, true, true, Some(expected))? {
            Column::Matched => true,
            _ => false,
        })
    }
    #[inline]
    pub fn peek_col(&mut self, unescape: bool) -> Result<Option<String>, Error> {
        self.read(unescape, false, true, None).map(Column::into_text)
    }
    /// Consumes the rest of the line as a single string
    #[inline]
    pub fn next_cols(&mut self, unescape: bool) -> Result<Option<String>, Error> {
        self.read(unescape, true, false, None).map(Column::into_text)
    }
    #[inline]
    pub fn peek_cols(&mut self, unescape: bool) -> Result<Option<String>, Error> {
        self.read(unescape, false, false, None).map(Column::into_text)
    }
    /// Consumes a numeric column, negative values meaning absent
    pub fn next_int_col(&mut self) -> Result<Option<u32>, Error> {
        match self.next_col(false)? {
            Some(text) => match text.parse::<i64>() {
                Ok(value) if value < 0 => Ok(None),
                Ok(value) if value <= i64::from(u32::max_value()) => Ok(Some(value as u32)),
                _ => Err(self.malformed(format!("invalid number {:?}", text))),
            },
            None => Ok(None),
        }
    }
    /// Consumes a column that must be present and non-empty
    pub fn require_col(&mut self, unescape: bool, what: &str) -> Result<String, Error> {
        match self.next_col(unescape)? {
            Some(ref text) if text.is_empty() => Err(self.malformed(format!("empty {}", what))),
            Some(text) => Ok(text),
            None => Err(self.malformed(format!("missing {}", what))),
        }
    }
    /// Advances to the next line if it starts with exactly `indent` indentation bytes.
    ///
    /// Blank lines are skipped when `indent == 0`.
    /// Returns `false` at the end of input or if the next line is indented less,
    /// in which case the cursor stays where it was.
    pub fn next_line(&mut self, indent: usize) -> Result<bool, Error> {
        loop {
            while self.pos < self.limit {
                if self.buffer[self.pos] == b'\n' {
                    if indent == 0 {
                        if !self.fill_buffer(2, false, true)? {
                            return Ok(false)
                        }
                        let next = self.buffer[self.pos + 1];
                        if next == b'\n' || next == b'\r' {
                            self.pos += 1;
                            self.line_number += 1;
                            self.bof = false;
                            continue;
                        }
                    }
                    if !self.fill_buffer(indent + 1, false, true)? {
                        return Ok(false)
                    }
                    let line_start = self.pos + 1;
                    if self.buffer[line_start..line_start + indent].iter().any(|&c| c != self.indentation) {
                        return Ok(false)
                    }
                    self.pos = line_start + indent;
                    self.line_number += 1;
                    self.bof = false;
                    self.eol = false;
                    return Ok(true)
                }
                self.pos += 1;
                self.bof = false;
            }
            if !self.fill_buffer(1, false, true)? {
                return Ok(false)
            }
        }
    }
    /// Whether the current line has more indentation than the last `next_line` asked for
    pub fn has_extra_indents(&mut self) -> Result<bool, Error> {
        Ok(self.fill_buffer(1, false, false)? && self.buffer[self.pos] == self.indentation)
    }
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }
    #[inline]
    pub fn is_at_bof(&self) -> bool {
        self.bof
    }
    #[inline]
    pub fn is_at_eol(&self) -> bool {
        self.eol
    }
    #[inline]
    pub fn is_at_eof(&self) -> bool {
        self.eof
    }
    /// Saves the cursor, returning the 1-based index of the new mark
    pub fn mark(&mut self) -> usize {
        if self.marks.is_empty() && self.pos > 0 {
            self.compact();
        }
        self.marks.push(Mark {
            pos: self.pos,
            line_number: self.line_number,
            bof: self.bof,
            eol: self.eol,
            eof: self.eof,
        });
        self.marks.len()
    }
    /// Restores the most recent mark, which stays outstanding
    #[inline]
    pub fn reset(&mut self) {
        let index = self.marks.len();
        self.reset_to(index)
    }
    /// Restores the mark with the given index, discarding every later mark
    pub fn reset_to(&mut self, index: usize) {
        assert!(index >= 1 && index <= self.marks.len(), "Invalid mark index {}", index);
        self.marks.truncate(index);
        let mark = self.marks[index - 1];
        self.pos = mark.pos;
        self.line_number = mark.line_number;
        self.bof = mark.bof;
        self.eol = mark.eol;
        self.eof = mark.eof;
    }
    #[inline]
    pub fn discard_mark(&mut self) {
        assert!(self.marks.pop().is_some(), "Not marked");
    }
    #[cold]
    pub fn malformed<S: Into<String>>(&self, reason: S) -> Error {
        MalformedMapping::new(self.line_number, reason).into()
    }
    fn compact(&mut self) {
        debug_assert!(self.marks.is_empty());
        self.buffer.copy_within(self.pos..self.limit, 0);
        self.limit -= self.pos;
        self.pos = 0;
    }
    fn read(
        &mut self,
        unescape: bool,
        consume: bool,
        stop_at_next_col: bool,
        expected: Option<&str>,
    ) -> Result<Column, Error> {
        if self.eol {
            return Ok(if expected.is_some() { Column::NoMatch } else { Column::Missing })
        }
        let expected = expected.map(str::as_bytes);
        let consume = consume || expected.is_some();
        if let Some(expected) = expected {
            if !expected.is_empty() && self.pos + expected.len() >= self.limit
                && !self.fill_buffer(expected.len(), !consume, false)? {
                return Ok(Column::NoMatch)
            }
        }
        let mut end = self.pos;
        let mut content_read = 0;
        let mut stop = None;
        let mut read_anything = false;
        let mut escaped = false;
        let mut is_separator = false;
        let mut filled = true;
        'fill: loop {
            while end < self.limit {
                let c = self.buffer[end];
                is_separator = c == self.separator;
                read_anything = true;
                if let Some(expected) = expected {
                    if (content_read < expected.len() && c != expected[content_read])
                        || content_read > expected.len() {
                        return Ok(Column::NoMatch)
                    }
                }
                if c == b'\n' || c == b'\r' || (is_separator && stop_at_next_col) {
                    stop = Some(end);
                    if !is_separator && consume {
                        self.eol = true;
                    }
                    break 'fill;
                } else if unescape && c == b'\\' {
                    escaped = true;
                }
                content_read += 1;
                end += 1;
            }
            let old_pos = self.pos;
            filled = self.fill_buffer(end - self.pos + 1, !consume, consume)?;
            // compaction may have moved the content
            end = end - old_pos + self.pos;
            if !filled {
                break;
            }
        }
        if let Some(expected) = expected {
            if content_read != expected.len() {
                // the input ended inside a longer column
                self.eol = false;
                self.eof = false;
                return Ok(Column::NoMatch)
            }
        }
        let result = if expected.is_some() {
            Column::Matched
        } else if end == self.pos {
            if read_anything { Column::Text(String::new()) } else { Column::Missing }
        } else {
            let line_number = self.line_number;
            let raw = str::from_utf8(&self.buffer[self.pos..end])
                .map_err(|_| MalformedMapping::new(line_number, "invalid UTF-8"))?;
            if escaped {
                Column::Text(util::unescape(raw)
                    .map_err(|e| MalformedMapping::new(line_number, e.to_string()))?)
            } else {
                Column::Text(raw.to_owned())
            }
        };
        if consume {
            if read_anything {
                self.bof = false;
            }
            if let Some(stop) = stop {
                self.pos = stop;
                if is_separator && self.fill_buffer(1, false, false)? {
                    self.pos += 1;
                }
            }
            if !filled {
                self.eof = true;
                self.eol = true;
            }
            if self.eol && !self.eof {
                // find out whether the line break is the last thing in the input
                let chars = if self.buffer[self.pos] == b'\r' { 2 } else { 1 };
                if end + chars >= self.limit {
                    self.fill_buffer(chars, false, true)?;
                }
            }
        }
        Ok(result)
    }
    /// Makes sure `count` bytes are available starting at the cursor
    fn fill_buffer(&mut self, count: usize, prevent_compaction: bool, mark_eof: bool) -> io::Result<bool> {
        let available = self.limit - self.pos;
        if available >= count {
            return Ok(true)
        }
        let required = count - available;
        if self.pos + count > self.buffer.len() {
            if !self.marks.is_empty() || prevent_compaction {
                let new_len = cmp::max(self.pos + count, self.buffer.len() * 2);
                self.buffer.resize(new_len, 0);
            } else {
                if count > self.buffer.len() {
                    let new_len = cmp::max(count, self.buffer.len() * 2);
                    self.buffer.resize(new_len, 0);
                }
                self.compact();
            }
        }
        let required_limit = self.limit + required;
        loop {
            let read = match self.reader.read(&mut self.buffer[self.limit..]) {
                Ok(read) => read,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if read == 0 {
                if mark_eof {
                    self.eof = true;
                    self.eol = true;
                }
                return Ok(false)
            }
            self.limit += read;
            if self.limit >= required_limit {
                return Ok(true)
            }
        }
    }
}
impl Column {
    #[inline]
    fn into_text(self) -> Option<String> {
        match self {
            Column::Text(text) => Some(text),
            Column::Matched | Column::NoMatch | Column::Missing => None,
        }
    }
}
