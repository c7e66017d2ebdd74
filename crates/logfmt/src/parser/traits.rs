pub use super::model::{Pair, ParseError, SyntaxError, SyntaxErrorKind};
pub use crate::record::Record;

pub trait RecordParser: Send + Sync {
    /// Parse a whole buffer, one record per non-blank line.
    /// Fails on the first bad line and returns no records.
    fn parse(&self, buf: &[u8]) -> Result<Vec<Record>, ParseError>;

    /// Parse exactly one line into exactly one record.
    fn parse_line(&self, line: &str) -> Result<Record, ParseError>;
}
