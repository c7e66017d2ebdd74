use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::decode::{decode, is_blank};
use super::metrics::{MetricErrorType, ParserMetrics};
use super::traits::*;
use crate::clock::{Clock, SystemClock};
use crate::record::{Fields, Tags};

/// Builds one [`Record`] per logfmt line.
///
/// Every decoded pair becomes a string field; no tags are derived from the
/// line. All records of one call share a single timestamp read from the
/// clock. Clones share the clock and the metrics.
#[derive(Clone)]
pub struct LogfmtParser {
    metric_name: String,
    default_tags: Tags,
    max_line_size: Option<usize>,
    clock: Arc<dyn Clock>,
    metrics: Arc<ParserMetrics>,
}

impl LogfmtParser {
    /// Parser stamping `metric_name` on every record, timed by the wall clock.
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
            default_tags: Tags::new(),
            max_line_size: None,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(ParserMetrics::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Tags copied onto every record.
    pub fn with_default_tags(mut self, tags: Tags) -> Self {
        self.default_tags = tags;
        self
    }

    /// Reject lines longer than `max` bytes.
    pub fn with_max_line_size(mut self, max: usize) -> Self {
        self.max_line_size = Some(max);
        self
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn default_tags(&self) -> &Tags {
        &self.default_tags
    }

    pub fn max_line_size(&self) -> Option<usize> {
        self.max_line_size
    }

    pub fn metrics(&self) -> &Arc<ParserMetrics> {
        &self.metrics
    }

    fn decode_line(&self, line: &[u8], line_no: usize) -> Result<Vec<Pair>, ParseError> {
        if let Some(max) = self.max_line_size {
            if line.len() > max {
                self.metrics.record_error(MetricErrorType::TooLarge);
                debug!(line_no, len = line.len(), max, "Rejected oversized logfmt line");
                return Err(ParseError::LineTooLarge(line.len(), max));
            }
        }

        decode(line).map_err(|source| {
            self.metrics.record_error(MetricErrorType::Syntax);
            debug!(line_no, kind = %source.kind, offset = source.offset, "Rejected logfmt line");
            ParseError::Syntax { line_no, source }
        })
    }

    fn build_record(&self, pairs: Vec<Pair>, timestamp: DateTime<Utc>) -> Record {
        let mut fields = Fields::new();
        for Pair { key, value } in pairs {
            fields.insert(key, value.into());
        }
        trace!(name = %self.metric_name, fields = fields.len(), "Built record");
        Record::new(self.metric_name.clone(), self.default_tags.clone(), fields, timestamp)
    }

    fn parse_buffer(&self, buf: &[u8]) -> Result<Vec<Record>, ParseError> {
        let timestamp = self.clock.now();
        let mut records = Vec::new();

        for (idx, line) in split_lines(buf).enumerate() {
            self.metrics.record_line();
            if is_blank(line) {
                self.metrics.record_blank();
                continue;
            }
            let pairs = self.decode_line(line, idx + 1)?;
            records.push(self.build_record(pairs, timestamp));
        }

        self.metrics.record_records(records.len());
        Ok(records)
    }
}

impl RecordParser for LogfmtParser {
    fn parse(&self, buf: &[u8]) -> Result<Vec<Record>, ParseError> {
        let started = Instant::now();
        let result = self.parse_buffer(buf);
        self.metrics
            .record_call(elapsed_nanos(started), result.is_ok());
        result
    }

    fn parse_line(&self, line: &str) -> Result<Record, ParseError> {
        let started = Instant::now();
        let timestamp = self.clock.now();
        let line = first_line(line.as_bytes());

        self.metrics.record_line();
        let result = self
            .decode_line(line, 1)
            .map(|pairs| self.build_record(pairs, timestamp));

        if result.is_ok() {
            self.metrics.record_records(1);
        }
        self.metrics
            .record_call(elapsed_nanos(started), result.is_ok());
        result
    }
}

impl fmt::Debug for LogfmtParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogfmtParser")
            .field("metric_name", &self.metric_name)
            .field("default_tags", &self.default_tags)
            .field("max_line_size", &self.max_line_size)
            .finish_non_exhaustive()
    }
}

fn elapsed_nanos(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

/// The first line of `buf`, split the same way as a batch. Anything after
/// the first line feed is not part of the record.
fn first_line(buf: &[u8]) -> &[u8] {
    split_lines(buf).next().unwrap_or_default()
}

/// Lines of `buf` without their terminators. A trailing `\n` does not start
/// another line, and an empty buffer has no lines at all.
fn split_lines(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = (!buf.is_empty()).then(|| buf.strip_suffix(b"\n").unwrap_or(buf));
    body.into_iter()
        .flat_map(|body| body.split(|&b| b == b'\n'))
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::record::FieldValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parser(name: &str) -> LogfmtParser {
        LogfmtParser::new(name).with_clock(FixedClock::epoch())
    }

    fn fields(list: &[(&str, &str)]) -> Fields {
        list.iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_parse_no_bytes_returns_no_records() {
        let records = parser("").parse(b"").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_returns_all_the_fields() {
        let records = parser("testlog")
            .parse(br#"ts=2018-07-24T19:43:40.275Z lvl=info msg="http request" method=POST"#)
            .unwrap();

        let expected = Record::new(
            "testlog",
            Tags::new(),
            fields(&[
                ("ts", "2018-07-24T19:43:40.275Z"),
                ("lvl", "info"),
                ("msg", "http request"),
                ("method", "POST"),
            ]),
            DateTime::<Utc>::UNIX_EPOCH,
        );
        assert_eq!(records, vec![expected]);
    }

    #[test]
    fn test_parse_garbage_returns_error_and_no_records() {
        let err = parser("testlog").parse(b"i am garbage data.").unwrap_err();
        match err {
            ParseError::Syntax { line_no, source } => {
                assert_eq!(line_no, 1);
                assert_eq!(source.kind, SyntaxErrorKind::MissingEquals);
                assert_eq!(source.line, "i am garbage data.");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_one_bad_line_fails_whole_batch() {
        let buf = b"a=1\nb=2\nc\nd=4\n";
        let err = parser("batch").parse(buf).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line_no: 3, .. }), "got {:?}", err);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_trailing_newline() {
        let buf = b"a=1\n\n   \nb=2\r\nc=3\n";
        let p = parser("multi");
        let records = p.parse(buf).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].fields(), &fields(&[("a", "1")]));
        assert_eq!(records[1].fields(), &fields(&[("b", "2")]));
        assert_eq!(records[2].fields(), &fields(&[("c", "3")]));

        let snap = p.metrics().snapshot();
        assert_eq!(snap.lines_seen, 5);
        assert_eq!(snap.blank_lines, 2);
        assert_eq!(snap.records_produced, 3);
    }

    #[test]
    fn test_parse_duplicate_key_last_wins() {
        let records = parser("dup").parse(b"a=1 a=2").unwrap();
        assert_eq!(records[0].fields(), &fields(&[("a", "2")]));
    }

    #[test]
    fn test_parse_field_count_matches_distinct_keys() {
        let records = parser("n").parse(b"k1=a k2=b k3=\"c d\" k4=").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields().len(), 4);
        assert_eq!(records[0].name(), "n");
        assert!(records[0].tags().is_empty());
    }

    #[test]
    fn test_parse_reads_clock_once_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let clock = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as i64;
            DateTime::from_timestamp(n, 0).unwrap_or_default()
        };
        let p = LogfmtParser::new("clocked").with_clock(clock);

        let records = p.parse(b"a=1\nb=2\nc=3").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(records.iter().all(|r| r.timestamp() == records[0].timestamp()));

        p.parse(b"").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parse_applies_default_tags() {
        let mut tags = Tags::new();
        tags.insert("host".to_string(), "web-01".to_string());
        let records = parser("tagged")
            .with_default_tags(tags.clone())
            .parse(b"lvl=info")
            .unwrap();
        assert_eq!(records[0].tags(), &tags);
        assert!(records[0].field("host").is_none());
    }

    #[test]
    fn test_parse_rejects_oversized_line() {
        let p = parser("small").with_max_line_size(8);
        assert_eq!(p.parse(b"a=1\nb=123456789"), Err(ParseError::LineTooLarge(11, 8)));
        assert!(p.parse(b"a=1\nb=1234").is_ok());
        assert_eq!(p.metrics().snapshot().lines_too_large, 1);
    }

    #[test]
    fn test_parse_line_returns_all_fields() {
        let record = parser("testlog")
            .parse_line(r#"ts=2018-07-24T19:43:35.207268Z lvl=error msg="Write failed" log_id=09R4e4Rl000"#)
            .unwrap();

        let expected = Record::new(
            "testlog",
            Tags::new(),
            fields(&[
                ("ts", "2018-07-24T19:43:35.207268Z"),
                ("lvl", "error"),
                ("msg", "Write failed"),
                ("log_id", "09R4e4Rl000"),
            ]),
            DateTime::<Utc>::UNIX_EPOCH,
        );
        assert_eq!(record, expected);
    }

    #[test]
    fn test_parse_line_blank_is_empty_record() {
        let record = parser("").parse_line("").unwrap();
        assert_eq!(record.name(), "");
        assert!(record.fields().is_empty());
        assert!(record.tags().is_empty());
        assert_eq!(record.timestamp(), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_parse_line_ignores_line_terminator() {
        let record = parser("t").parse_line("a=1\r\n").unwrap();
        assert_eq!(record.fields(), &fields(&[("a", "1")]));
    }

    #[test]
    fn test_parse_line_reads_only_first_line() {
        let record = parser("t").parse_line("a=1\nb=2").unwrap();
        assert_eq!(record.fields(), &fields(&[("a", "1")]));
    }

    #[test]
    fn test_parse_line_quote_does_not_cross_line_feed() {
        let p = parser("t");
        let single = p.parse_line("msg=\"x\ny\"").unwrap_err();
        let batch = p.parse(b"msg=\"x\ny\"").unwrap_err();

        assert_eq!(single.syntax().map(|e| e.kind), Some(SyntaxErrorKind::UnterminatedQuote));
        assert_eq!(single, batch);
    }

    #[test]
    fn test_parse_line_forwards_syntax_error() {
        let err = parser("t").parse_line(r#"msg="unterminated"#).unwrap_err();
        assert_eq!(err.syntax().map(|e| e.kind), Some(SyntaxErrorKind::UnterminatedQuote));
    }

    #[test]
    fn test_escaped_quote_field() {
        let record = parser("t").parse_line(r#"msg="she said \"hi\"""#).unwrap();
        assert_eq!(record.field("msg"), Some(&FieldValue::from(r#"she said "hi""#)));
    }

    #[test]
    fn test_split_lines() {
        let lines = |buf: &[u8]| split_lines(buf).map(|l| l.to_vec()).collect::<Vec<_>>();
        assert!(lines(b"").is_empty());
        assert_eq!(lines(b"\n"), vec![b"".to_vec()]);
        assert_eq!(lines(b"a\nb"), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(lines(b"a\r\nb\r\n"), vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_parser_is_shareable_across_threads() {
        let p = Arc::new(parser("threads"));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || p.parse(format!("worker={}", i).as_bytes()))
            })
            .collect();

        for handle in handles {
            let records = handle.join().unwrap().unwrap();
            assert_eq!(records.len(), 1);
        }
        assert_eq!(p.metrics().snapshot().records_produced, 4);
    }
}
