//! logfmt decoding and record assembly
//!
//! # Architecture
//!
//! - `decode.rs`: line → ordered key/value pairs (the tokenizer)
//! - `logfmt.rs`: buffer → lines → pairs → records (the assembler)
//! - `encode.rs`: pairs → canonical logfmt line
//! - `traits.rs`: the `RecordParser` seam
//! - `metrics.rs`: per-parser counters
//!
//! Parsing is synchronous and pure apart from the injected clock and the
//! relaxed metric counters. Batches fail fast: one malformed line fails the
//! whole call and no records are returned.

pub mod traits;
pub mod model;
pub mod decode;
pub mod encode;
pub mod logfmt;
pub mod metrics;

// Re-export commonly used types
pub use traits::RecordParser;
pub use model::{EncodeError, Pair, ParseError, SyntaxError, SyntaxErrorKind};
pub use decode::{decode, Pairs};
pub use encode::{encode, encode_pairs};
pub use logfmt::LogfmtParser;
pub use metrics::{MetricsSnapshot, ParserMetrics};
