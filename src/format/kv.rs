//! Typed key/value payloads

use std::fmt::Write;

use super::keys::{MsgFlags, SOH};

/// Name of the monotonic clock field
pub const CLOCK_KEY: &str = "CLOCK";

/// Value of one payload pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KvValue<'a> {
    Str(&'a str),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Already-serialized JSON, inserted verbatim
    Raw(&'a str),
}

impl KvValue<'_> {
    /// printf-style conversion the value stands for in a format template
    fn conversion(&self) -> &'static str {
        match self {
            KvValue::Str(_) => "\"%s\"",
            KvValue::Int(_) => "%ld",
            KvValue::UInt(_) => "%lu",
            KvValue::Float(_) => "%f",
            KvValue::Bool(_) | KvValue::Raw(_) => "%s",
        }
    }

    fn write_json(&self, out: &mut String) {
        let rendered = match self {
            KvValue::Str(s) => serde_json::to_string(s),
            KvValue::Int(n) => serde_json::to_string(n),
            KvValue::UInt(n) => serde_json::to_string(n),
            KvValue::Float(x) => serde_json::to_string(x),
            KvValue::Bool(b) => serde_json::to_string(b),
            KvValue::Raw(raw) => {
                out.push_str(raw);
                return;
            }
        };
        // serializing a scalar cannot fail
        out.push_str(rendered.as_deref().unwrap_or("null"));
    }
}

impl<'a> From<&'a str> for KvValue<'a> {
    fn from(value: &'a str) -> Self {
        KvValue::Str(value)
    }
}

impl<'a> From<&'a String> for KvValue<'a> {
    fn from(value: &'a String) -> Self {
        KvValue::Str(value)
    }
}

macro_rules! kv_from {
    ($variant:ident, $target:ty, $($ty:ty),+) => {
        $(impl From<$ty> for KvValue<'_> {
            fn from(value: $ty) -> Self {
                KvValue::$variant(value as $target)
            }
        })+
    };
}

kv_from!(Int, i64, i8, i16, i32, i64, isize);
kv_from!(UInt, u64, u8, u16, u32, u64, usize);
kv_from!(Float, f64, f32, f64);

impl From<bool> for KvValue<'_> {
    fn from(value: bool) -> Self {
        KvValue::Bool(value)
    }
}

/// One key/value pair of a structured message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KvPair<'a> {
    pub key: &'a str,
    pub value: KvValue<'a>,
}

impl<'a> KvPair<'a> {
    pub fn new(key: &'a str, value: impl Into<KvValue<'a>>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// Pair whose value is already JSON
    pub fn raw(key: &'a str, json: &'a str) -> Self {
        Self {
            key,
            value: KvValue::Raw(json),
        }
    }
}

/// SOH-separated key list
pub fn key_list(pairs: &[KvPair<'_>]) -> String {
    let mut keys = String::new();
    for (i, pair) in pairs.iter().enumerate() {
        if i > 0 {
            keys.push(SOH);
        }
        keys.push_str(pair.key);
    }
    keys
}

/// printf-style template the pairs describe, clock field included
pub fn format_template(pairs: &[KvPair<'_>], flags: MsgFlags) -> String {
    let mut template = String::from("{");
    for (i, pair) in pairs.iter().enumerate() {
        if i > 0 {
            template.push(',');
        }
        let _ = write!(template, "\"{}\":{}", pair.key, pair.value.conversion());
    }
    if flags.contains(MsgFlags::WITH_CLOCK) {
        if !pairs.is_empty() {
            template.push(',');
        }
        let _ = write!(template, "\"{}\":\"%s\"", CLOCK_KEY);
    }
    template.push('}');
    template
}

/// Serialize pairs into an object, keys verbatim and in order
///
/// `clock` is appended as a string field when given.
pub fn serialize_pairs(pairs: &[KvPair<'_>], clock: Option<&str>) -> String {
    let mut out = String::from("{");
    for (i, pair) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(pair.key);
        out.push_str("\":");
        pair.value.write_json(&mut out);
    }
    if let Some(clock) = clock {
        if !pairs.is_empty() {
            out.push(',');
        }
        let _ = write!(out, "\"{}\":\"{}\"", CLOCK_KEY, clock);
    }
    out.push('}');
    out
}

/// Monotonic clock reading as `secs.nanos`
pub fn monotonic_clock() -> String {
    match nix::time::clock_gettime(nix::time::ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => format!("{}.{:09}", ts.tv_sec(), ts.tv_nsec()),
        Err(_) => "0.000000000".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::keys::{count_conversions, validate_format, validate_keys};

    #[test]
    fn test_serialize_in_order() {
        let pairs = [
            KvPair::new("name", "svc \"x\""),
            KvPair::new("count", 3),
            KvPair::new("ok", true),
            KvPair::new("ratio", 0.5),
            KvPair::raw("obj", "{\"a\":[1,2]}"),
        ];
        assert_eq!(
            serialize_pairs(&pairs, None),
            "{\"name\":\"svc \\\"x\\\"\",\"count\":3,\"ok\":true,\"ratio\":0.5,\"obj\":{\"a\":[1,2]}}"
        );
    }

    #[test]
    fn test_clock_field_appended() {
        let pairs = [KvPair::new("a", 1u8)];
        assert_eq!(
            serialize_pairs(&pairs, Some("12.000000034")),
            "{\"a\":1,\"CLOCK\":\"12.000000034\"}"
        );
        assert_eq!(serialize_pairs(&[], Some("1.0")), "{\"CLOCK\":\"1.0\"}");
    }

    #[test]
    fn test_template_agrees_with_keys() {
        let pairs = [KvPair::new("k1", "v"), KvPair::new("k2", -4)];
        let keys = key_list(&pairs);
        assert_eq!(keys, "k1\u{1}k2");
        assert_eq!(validate_keys(pairs.len(), &keys), Ok(()));

        let template = format_template(&pairs, MsgFlags::NONE);
        assert_eq!(template, "{\"k1\":\"%s\",\"k2\":%ld}");
        assert!(validate_format(MsgFlags::NONE, 2, &template));

        let clocked = format_template(&pairs, MsgFlags::WITH_CLOCK);
        assert_eq!(count_conversions(&clocked), 3);
        assert!(validate_format(MsgFlags::WITH_CLOCK, 2, &clocked));
    }

    #[test]
    fn test_monotonic_clock_shape() {
        let clock = monotonic_clock();
        let (secs, nanos) = clock.split_once('.').unwrap();
        assert!(secs.parse::<u64>().is_ok());
        assert_eq!(nanos.len(), 9);
    }
}
