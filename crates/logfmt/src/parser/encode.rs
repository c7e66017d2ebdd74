//! Encoder — pairs back into one canonical logfmt line.
//!
//! Values are written bare when the decoder would read them back unchanged,
//! and quoted otherwise.

use std::fmt::Write;

use super::model::{EncodeError, Pair};

/// Join pairs as `key=value` separated by single spaces.
pub fn encode<I, K, V>(pairs: I) -> Result<String, EncodeError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push(' ');
        }
        write_pair(&mut out, key.as_ref(), value.as_ref())?;
    }
    Ok(out)
}

/// [`encode`] for already decoded pairs.
pub fn encode_pairs(pairs: &[Pair]) -> Result<String, EncodeError> {
    encode(pairs.iter().map(|p| (p.key.as_str(), p.value.as_str())))
}

/// Append a single `key=value` token to `out`.
pub fn write_pair(out: &mut String, key: &str, value: &str) -> Result<(), EncodeError> {
    if !is_valid_key(key) {
        return Err(EncodeError::InvalidKey(key.to_string()));
    }
    out.push_str(key);
    out.push('=');
    if needs_quotes(value) {
        write_quoted(out, value);
    } else {
        out.push_str(value);
    }
    Ok(())
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| c == '=' || c == '"' || c.is_whitespace() || c.is_control())
}

fn needs_quotes(value: &str) -> bool {
    value
        .chars()
        .any(|c| c == '"' || c == '\\' || c == '=' || c.is_whitespace() || c.is_control())
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                // Writing into a String cannot fail.
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode::decode;
    use proptest::prelude::*;

    #[test]
    fn test_encode_bare_values() {
        let line = encode([("lvl", "info"), ("method", "POST")]).unwrap();
        assert_eq!(line, "lvl=info method=POST");
    }

    #[test]
    fn test_encode_empty_value_stays_bare() {
        assert_eq!(encode([("a", ""), ("b", "1")]).unwrap(), "a= b=1");
    }

    #[test]
    fn test_encode_quotes_whitespace_and_specials() {
        assert_eq!(encode([("msg", "http request")]).unwrap(), r#"msg="http request""#);
        assert_eq!(encode([("msg", r#"she said "hi""#)]).unwrap(), r#"msg="she said \"hi\"""#);
        assert_eq!(encode([("path", r"C:\tmp")]).unwrap(), r#"path="C:\\tmp""#);
        assert_eq!(encode([("q", "a=b")]).unwrap(), r#"q="a=b""#);
        assert_eq!(encode([("c", "x\u{1}y\n")]).unwrap(), r#"c="x\u0001y\n""#);
    }

    #[test]
    fn test_encode_rejects_bad_keys() {
        for key in ["", "a=b", "has space", "q\"", "tab\there"] {
            assert_eq!(
                encode([(key, "v")]),
                Err(EncodeError::InvalidKey(key.to_string())),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_encode_pairs_matches_decode() {
        let line = r#"ts=2018-07-24T19:43:40.275Z lvl=info msg="http request" method=POST"#;
        let pairs = decode(line).unwrap();
        assert_eq!(encode_pairs(&pairs).unwrap(), line);
    }

    fn arb_key() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_.:/-]{1,12}"
    }

    fn arb_value() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Za-z0-9_.:/-]{0,12}",
            "[ a-z\"\\\\=\t\n\r]{0,12}",
            any::<String>(),
        ]
    }

    proptest! {
        #[test]
        fn prop_encode_then_decode_round_trips(
            pairs in prop::collection::vec((arb_key(), arb_value()), 0..8)
        ) {
            let pairs: Vec<Pair> = pairs.into_iter().map(Pair::from).collect();
            let line = encode_pairs(&pairs).unwrap();
            prop_assert_eq!(decode(&line).unwrap(), pairs);
        }

        #[test]
        fn prop_decode_encode_decode_is_stable(
            pairs in prop::collection::vec((arb_key(), arb_value()), 0..8)
        ) {
            let line = encode(pairs).unwrap();
            let first = decode(&line).unwrap();
            let second = decode(encode_pairs(&first).unwrap()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
