use thiserror::Error;

/// One decoded `key=value` token, in line order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Pair {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// What went wrong while scanning a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SyntaxErrorKind {
    /// `=` or `"` where a key should start
    #[error("missing key")]
    EmptyKey,

    /// Key followed by whitespace, a quote or end of line
    #[error("expected '=' after key")]
    MissingEquals,

    /// End of line reached inside a quoted value
    #[error("unterminated quoted value")]
    UnterminatedQuote,

    /// Closing quote not followed by whitespace or end of line
    #[error("unexpected character after quoted value")]
    UnexpectedAfterQuote,
}

/// A line that does not follow the `key=value` grammar.
///
/// Carries the raw line so callers can log or report it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}: {line:?}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset into `line` where scanning stopped
    pub offset: usize,
    pub line: String,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, offset: usize, line: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            line: line.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Syntax error on line {line_no}: {source}")]
    Syntax {
        /// 1-based line number within the parsed buffer
        line_no: usize,
        #[source]
        source: SyntaxError,
    },

    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),
}

impl ParseError {
    /// The underlying syntax error, if this is one.
    pub fn syntax(&self) -> Option<&SyntaxError> {
        match self {
            ParseError::Syntax { source, .. } => Some(source),
            ParseError::LineTooLarge(..) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_from_tuple() {
        let pair: Pair = ("lvl", "info").into();
        assert_eq!(pair, Pair::new("lvl", "info"));
    }

    #[test]
    fn test_syntax_error_display_includes_raw_line() {
        let err = SyntaxError::new(SyntaxErrorKind::MissingEquals, 1, "i am garbage data.");
        let msg = err.to_string();
        assert!(msg.contains("expected '='"), "unexpected message: {}", msg);
        assert!(msg.contains("i am garbage data."), "unexpected message: {}", msg);
    }

    #[test]
    fn test_parse_error_display_includes_line_number() {
        let err = ParseError::Syntax {
            line_no: 3,
            source: SyntaxError::new(SyntaxErrorKind::EmptyKey, 0, "=oops"),
        };
        assert!(err.to_string().starts_with("Syntax error on line 3:"));
        assert_eq!(err.syntax().map(|e| e.kind), Some(SyntaxErrorKind::EmptyKey));
    }

    #[test]
    fn test_line_too_large_has_no_syntax_error() {
        let err = ParseError::LineTooLarge(2048, 1024);
        assert!(err.syntax().is_none());
        assert_eq!(err.to_string(), "Line too large: 2048 bytes (max: 1024 bytes)");
    }
}
