//! Bounded, escaped excerpts of caller text for diagnostics

use std::fmt::Write;

/// Size of the excerpt buffer; at most one byte less is kept
pub const TRUNCATED_MSG_SIZE: usize = 128;

/// Keep at most `TRUNCATED_MSG_SIZE - 1` bytes of `source` and escape them
///
/// Escaping follows C string conventions: `\b \f \n \r \t \v \\ \"` by name,
/// any other byte outside printable ASCII as a three-digit octal escape.
pub fn truncate_and_escape(source: &str) -> String {
    escape_bytes(&source.as_bytes()[..source.len().min(TRUNCATED_MSG_SIZE - 1)])
}

/// Escape `bytes` without truncating
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 4);
    for &b in bytes {
        match b {
            0x08 => out.push_str("\\b"),
            0x0c => out.push_str("\\f"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x0b => out.push_str("\\v"),
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}
