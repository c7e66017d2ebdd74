//! Decoder — one logfmt line into ordered key/value pairs.
//!
//! Works on raw bytes: every delimiter in the grammar is ASCII, so multi-byte
//! UTF-8 sequences pass through untouched and input that is not valid UTF-8 is
//! never rejected (invalid sequences become U+FFFD when a token is emitted).

use super::model::{Pair, SyntaxError, SyntaxErrorKind};

/// Whitespace separating pairs.
#[inline]
pub(crate) fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// True for an empty or whitespace-only line.
#[inline]
pub(crate) fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|&b| is_space(b))
}

/// Decode a single line. Fails on the first malformed token; a blank line
/// decodes to no pairs.
pub fn decode(line: impl AsRef<[u8]>) -> Result<Vec<Pair>, SyntaxError> {
    Pairs::new(line.as_ref()).collect()
}

/// Streaming form of [`decode`]. Stops after yielding the first error.
#[derive(Debug, Clone)]
pub struct Pairs<'a> {
    line: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Pairs<'a> {
    pub fn new(line: &'a [u8]) -> Self {
        Self {
            line,
            pos: 0,
            failed: false,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.line.get(self.pos).copied()
    }

    fn fail(&mut self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        self.failed = true;
        SyntaxError::new(kind, offset, String::from_utf8_lossy(self.line))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if is_space(b)) {
            self.pos += 1;
        }
    }

    fn read_pair(&mut self) -> Result<Pair, SyntaxError> {
        let key = self.read_key()?;
        let value = if self.peek() == Some(b'"') {
            self.read_quoted()?
        } else {
            self.read_bare()
        };
        Ok(Pair { key, value })
    }

    /// Key run, then the mandatory `=`.
    fn read_key(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'=' || b == b'"' || is_space(b) {
                break;
            }
            self.pos += 1;
        }

        if self.pos == start {
            return Err(self.fail(SyntaxErrorKind::EmptyKey, start));
        }
        let key = lossy(&self.line[start..self.pos]);

        if self.peek() != Some(b'=') {
            let at = self.pos;
            return Err(self.fail(SyntaxErrorKind::MissingEquals, at));
        }
        self.pos += 1;
        Ok(key)
    }

    fn read_bare(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if !is_space(b)) {
            self.pos += 1;
        }
        lossy(&self.line[start..self.pos])
    }

    fn read_quoted(&mut self) -> Result<String, SyntaxError> {
        let open = self.pos;
        self.pos += 1;

        let mut value = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.fail(SyntaxErrorKind::UnterminatedQuote, open)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => self.read_escape(&mut value),
                Some(b) => {
                    value.push(b);
                    self.pos += 1;
                }
            }
        }

        match self.peek() {
            Some(b) if !is_space(b) => {
                let at = self.pos;
                Err(self.fail(SyntaxErrorKind::UnexpectedAfterQuote, at))
            }
            _ => Ok(lossy(&value)),
        }
    }

    /// `self.pos` is on the backslash. Unknown sequences keep the backslash
    /// and leave the following byte to the caller.
    fn read_escape(&mut self, out: &mut Vec<u8>) {
        let rest = &self.line[self.pos..];
        let simple = match rest.get(1) {
            Some(b'"') => Some(b'"'),
            Some(b'\\') => Some(b'\\'),
            Some(b'/') => Some(b'/'),
            Some(b'b') => Some(0x08),
            Some(b'f') => Some(0x0c),
            Some(b'n') => Some(b'\n'),
            Some(b'r') => Some(b'\r'),
            Some(b't') => Some(b'\t'),
            _ => None,
        };
        if let Some(b) = simple {
            out.push(b);
            self.pos += 2;
            return;
        }

        if let Some((ch, len)) = unicode_escape(rest) {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            self.pos += len;
            return;
        }

        out.push(b'\\');
        self.pos += 1;
    }
}

impl Iterator for Pairs<'_> {
    type Item = Result<Pair, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        self.peek()?;
        Some(self.read_pair())
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Four hex digits following `\u` at the start of `s`.
fn hex4(s: &[u8]) -> Option<u32> {
    let digits = s.get(2..6)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let text = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(text, 16).ok()
}

/// Decode `\uXXXX` (or a `\uXXXX\uXXXX` surrogate pair) at the start of `s`.
/// Returns the char and the number of bytes consumed.
fn unicode_escape(s: &[u8]) -> Option<(char, usize)> {
    if s.get(1) != Some(&b'u') {
        return None;
    }
    let unit = hex4(s)?;

    match unit {
        0xD800..=0xDBFF => {
            let low = s
                .get(6..)
                .filter(|tail| tail.starts_with(b"\\u"))
                .and_then(hex4)
                .filter(|low| (0xDC00..=0xDFFF).contains(low));
            match low {
                Some(low) => {
                    let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    Some((char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER), 12))
                }
                None => Some((char::REPLACEMENT_CHARACTER, 6)),
            }
        }
        0xDC00..=0xDFFF => Some((char::REPLACEMENT_CHARACTER, 6)),
        _ => Some((char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER), 6)),
    }
}
