//! Message validation and line assembly
//!
//! A structured line is `<object> <free text>`: the object carries the
//! key/value payload (or `{}`), the free text follows after one space.
//! Everything here is pure; diagnostics are rendered as strings and sent
//! by the caller.

pub mod dump;
pub mod escape;
pub mod json;
pub mod keys;
pub mod kv;
pub mod line;
pub mod msgid;

pub use dump::{hex_lines, DumpFormat};
pub use escape::{truncate_and_escape, TRUNCATED_MSG_SIZE};
pub use json::{validate_embedded_object, JsonDefect};
pub use keys::{validate_format, validate_keys, KeyDefect, MsgFlags, SOH};
pub use kv::{KvPair, KvValue};
pub use line::{BoundedLine, LINE_CAPACITY};
pub use msgid::{validate_msgid, MsgIdDefect, DEBUG_MSG_ID, MSGID_LEN};

/// Payload used when a line carries no pairs
pub const EMPTY_OBJECT: &str = "{}";
