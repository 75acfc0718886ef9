//! InfluxDB line protocol parser.
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Metrics without a
//! timestamp are stamped from the injected [`Clock`].

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::clock::{Clock, SystemClock};
use crate::config::Precision;
use crate::error::ParseError;
use crate::metric::{FieldValue, Metric};
use crate::parser::Parser;

/// Line protocol parser with a configurable timestamp precision.
#[derive(Clone)]
pub struct LineProtocolParser {
    precision: Precision,
    clock: Arc<dyn Clock>,
}

impl Default for LineProtocolParser {
    fn default() -> Self {
        Self::new(Precision::Nanoseconds, Arc::new(SystemClock))
    }
}

impl LineProtocolParser {
    pub fn new(precision: Precision, clock: Arc<dyn Clock>) -> Self {
        Self { precision, clock }
    }

    fn parse_line(&self, line: &str, lineno: usize) -> Result<Metric, ParseError> {
        let err = |reason: &str| ParseError::new(lineno, reason);

        let key_end = find_unescaped(line, b' ', false).ok_or_else(|| err("missing fields"))?;
        let (key, rest) = (&line[..key_end], line[key_end..].trim_start_matches(' '));

        let fields_end = find_unescaped(rest, b' ', true).unwrap_or(rest.len());
        let (fields, timestamp) = (&rest[..fields_end], rest[fields_end..].trim());

        let at = if timestamp.is_empty() {
            self.clock.now()
        } else {
            let ts: i64 = timestamp.parse().map_err(|_| err("invalid timestamp"))?;
            self.to_system_time(ts)
                .ok_or_else(|| err("timestamp out of range"))?
        };

        let mut key_parts = split_unescaped(key, b',', false).into_iter();
        let name = unescape(key_parts.next().unwrap_or_default(), b", ");
        if name.is_empty() {
            return Err(err("missing measurement"));
        }

        let mut metric = Metric::new(name, at);
        for tag in key_parts {
            let (k, v) = split_pair(tag).ok_or_else(|| err("invalid tag"))?;
            if v.is_empty() {
                return Err(err("empty tag value"));
            }
            metric.add_tag(unescape(k, b",= "), unescape(v, b",= "));
        }

        if fields.is_empty() {
            return Err(err("missing fields"));
        }
        for field in split_unescaped(fields, b',', true) {
            let (k, v) = split_pair(field).ok_or_else(|| err("invalid field"))?;
            let value = parse_value(v).ok_or_else(|| err("invalid field value"))?;
            metric.add_field(unescape(k, b",= "), value);
        }

        Ok(metric)
    }

    fn to_system_time(&self, ts: i64) -> Option<SystemTime> {
        let scale: i64 = match self.precision {
            Precision::Nanoseconds => 1,
            Precision::Microseconds => 1_000,
            Precision::Milliseconds => 1_000_000,
            Precision::Seconds => 1_000_000_000,
        };
        let nanos = ts.checked_mul(scale)?;
        let offset = Duration::from_nanos(nanos.unsigned_abs());
        if nanos >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }
}

impl Parser for LineProtocolParser {
    fn parse(&self, buf: &[u8]) -> Result<Vec<Metric>, ParseError> {
        let text = std::str::from_utf8(buf).map_err(|_| ParseError::new(1, "invalid utf-8"))?;

        let mut metrics = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r').trim_start();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            metrics.push(self.parse_line(line, idx + 1)?);
        }
        Ok(metrics)
    }
}

/// Byte offset of the first unescaped `delim`, optionally ignoring quoted runs.
fn find_unescaped(s: &str, delim: u8, quotes: bool) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut in_quotes = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'"' if quotes => in_quotes = !in_quotes,
            b if b == delim && !in_quotes => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn split_unescaped(s: &str, delim: u8, quotes: bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(idx) = find_unescaped(rest, delim, quotes) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + 1..];
    }
    parts.push(rest);
    parts
}

fn split_pair(s: &str) -> Option<(&str, &str)> {
    let idx = find_unescaped(s, b'=', false)?;
    let (k, v) = (&s[..idx], &s[idx + 1..]);
    (!k.is_empty()).then_some((k, v))
}

/// Drop the backslash in front of any byte in `escaped`.
fn unescape(s: &str, escaped: &[u8]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii() && escaped.contains(&(next as u8)) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn parse_value(raw: &str) -> Option<FieldValue> {
    if let Some(inner) = raw.strip_prefix('"') {
        let inner = inner.strip_suffix('"')?;
        return Some(FieldValue::String(unescape(inner, b"\"\\")));
    }
    if let Some(int) = raw.strip_suffix('i') {
        return int.parse().ok().map(FieldValue::Integer);
    }
    if let Some(uint) = raw.strip_suffix('u') {
        return uint.parse().ok().map(FieldValue::Unsigned);
    }
    match raw {
        "t" | "T" | "true" | "True" | "TRUE" => return Some(FieldValue::Boolean(true)),
        "f" | "F" | "false" | "False" | "FALSE" => return Some(FieldValue::Boolean(false)),
        _ => {}
    }
    let float: f64 = raw.parse().ok()?;
    float.is_finite().then_some(FieldValue::Float(float))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn parser() -> LineProtocolParser {
        LineProtocolParser::new(
            Precision::Nanoseconds,
            Arc::new(FixedClock(UNIX_EPOCH + Duration::from_secs(42))),
        )
    }

    #[test]
    fn simple_line_uses_clock() {
        let metrics = parser().parse(b"cpu,host=a value=1").unwrap();
        assert_eq!(metrics.len(), 1);
        let m = &metrics[0];
        assert_eq!(m.name(), "cpu");
        assert_eq!(m.tag("host"), Some("a"));
        assert_eq!(m.field("value"), Some(&FieldValue::Float(1.0)));
        assert_eq!(m.timestamp(), UNIX_EPOCH + Duration::from_secs(42));
    }

    #[test]
    fn typed_fields_and_timestamp() {
        let line = br#"disk,path=/var free=10i,used=3u,ok=t,note="a \"b\", c" 1700000000000000000"#;
        let m = parser().parse(line).unwrap().remove(0);
        assert_eq!(m.field("free"), Some(&FieldValue::Integer(10)));
        assert_eq!(m.field("used"), Some(&FieldValue::Unsigned(3)));
        assert_eq!(m.field("ok"), Some(&FieldValue::Boolean(true)));
        assert_eq!(m.field("note"), Some(&FieldValue::String("a \"b\", c".into())));
        assert_eq!(m.tag("path"), Some("/var"));
        assert_eq!(m.timestamp(), UNIX_EPOCH + Duration::from_secs(1_700_000_000));
    }

    #[test]
    fn escaped_separators() {
        let m = parser()
            .parse(br"my\ cpu,host\=x=a\,b val\ ue=2")
            .unwrap()
            .remove(0);
        assert_eq!(m.name(), "my cpu");
        assert_eq!(m.tag("host=x"), Some("a,b"));
        assert_eq!(m.field("val ue"), Some(&FieldValue::Float(2.0)));
    }

    #[test]
    fn second_precision() {
        let parser = LineProtocolParser::new(Precision::Seconds, Arc::new(SystemClock));
        let m = parser.parse(b"cpu value=1 10").unwrap().remove(0);
        assert_eq!(m.timestamp(), UNIX_EPOCH + Duration::from_secs(10));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let metrics = parser()
            .parse(b"# header\n\ncpu value=1\r\nmem value=2\n")
            .unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[1].name(), "mem");
    }

    #[test]
    fn empty_payload_yields_no_metrics() {
        assert!(parser().parse(b"").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_lines() {
        for bad in [
            &b"cpu"[..],
            b"cpu,host=a",
            b"cpu value=",
            b"cpu value=abc",
            b"cpu,host value=1",
            b"cpu value=1 notatime",
            b"cpu value=\"unterminated",
        ] {
            assert!(parser().parse(bad).is_err(), "accepted {:?}", String::from_utf8_lossy(bad));
        }
    }

    #[test]
    fn error_reports_line_number() {
        let err = parser().parse(b"cpu value=1\nbroken\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
