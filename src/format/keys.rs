//! Key list and format string agreement

use std::ops::BitOr;

use super::escape::escape_bytes;

/// Separator between keys in a key list
pub const SOH: char = '\u{1}';

/// Options of a structured call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MsgFlags(u32);

impl MsgFlags {
    pub const NONE: MsgFlags = MsgFlags(0);
    /// A monotonic clock field follows the caller's pairs
    pub const WITH_CLOCK: MsgFlags = MsgFlags(1 << 0);

    pub const fn contains(self, other: MsgFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MsgFlags {
    type Output = MsgFlags;

    fn bitor(self, rhs: MsgFlags) -> MsgFlags {
        MsgFlags(self.0 | rhs.0)
    }
}

/// Why a key list was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDefect {
    /// `kv_count` is zero
    Missing,
    /// Number of keys differs from `kv_count`
    CountMismatch { declared: usize, found: usize },
    /// Key `key` (1-based) holds a byte that cannot appear in a key
    InvalidChar { key: usize, byte: u8 },
}

impl KeyDefect {
    pub fn diagnostic(self, msgid: &str) -> String {
        match self {
            KeyDefect::Missing => format!("MISSING_KV {{\"MSGID\":\"{}\"}}", msgid),
            KeyDefect::CountMismatch { declared, found } => format!(
                "MISMATCHED_KEYS {{\"MSGID\":\"{}\",\"KV_COUNT\":{},\"KEYS\":{}}}",
                msgid, declared, found
            ),
            KeyDefect::InvalidChar { key, byte } => format!(
                "INVALID_KEY {{\"MSGID\":\"{}\",\"KEY\":{},\"INVALID_CHAR\":\"{}\"}}",
                msgid,
                key,
                escape_bytes(&[byte])
            ),
        }
    }
}

/// Check `kv_count` SOH-separated keys
///
/// Keys are printable ASCII; a backslash may only escape `"` or `\`.
pub fn validate_keys(kv_count: usize, keys: &str) -> Result<(), KeyDefect> {
    if kv_count == 0 {
        return Err(KeyDefect::Missing);
    }

    let bytes = keys.as_bytes();
    let mut current = 1;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == SOH as u8 {
            current += 1;
        } else if !(0x20..0x7f).contains(&b) {
            return Err(KeyDefect::InvalidChar { key: current, byte: b });
        } else if b == b'\\' {
            match bytes.get(i + 1) {
                Some(b'"') | Some(b'\\') => i += 1,
                next => {
                    return Err(KeyDefect::InvalidChar {
                        key: current,
                        byte: next.copied().unwrap_or(b'\\'),
                    })
                }
            }
        }
        i += 1;
    }

    if current != kv_count {
        return Err(KeyDefect::CountMismatch {
            declared: kv_count,
            found: current,
        });
    }
    Ok(())
}

/// Count conversions in a format string; `%%` is a literal
pub fn count_conversions(format: &str) -> usize {
    let bytes = format.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if bytes.get(i + 1) == Some(&b'%') {
                i += 1;
            } else {
                count += 1;
            }
        }
        i += 1;
    }
    count
}

/// Whether `format` carries one conversion per key (plus the clock)
pub fn validate_format(flags: MsgFlags, kv_count: usize, format: &str) -> bool {
    if kv_count == 0 {
        return false;
    }

    let expected = if flags.contains(MsgFlags::WITH_CLOCK) {
        kv_count + 1
    } else {
        kv_count
    };
    count_conversions(format) == expected
}
