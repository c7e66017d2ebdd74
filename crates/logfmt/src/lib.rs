// logfmt: line-oriented key=value text into structured records.

// Core
pub mod parser;
pub mod record;
pub mod clock;

// Ambient
pub mod conf;
pub mod runtime;

pub use clock::{Clock, FixedClock, SystemClock};
pub use parser::{decode, encode, LogfmtParser, Pair, ParseError, RecordParser, SyntaxError, SyntaxErrorKind};
pub use record::{FieldValue, Record};
