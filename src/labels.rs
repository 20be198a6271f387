//! Severity and facility label tables
//!
//! Both tables map small integer codes to the spellings used by syslog and by
//! the configuration files. Lookups are linear; the tables are tiny.

use crate::error::{LogError, Result};

/// A code/label pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntLabel {
    pub label: &'static str,
    pub code: i32,
}

const fn entry(label: &'static str, code: i32) -> IntLabel {
    IntLabel { label, code }
}

/// Code used for the "none" threshold, which disables a context
pub const LEVEL_NONE_CODE: i32 = -1;

/// Severity labels, syslog spelling
pub static LEVEL_LABELS: &[IntLabel] = &[
    entry("none", LEVEL_NONE_CODE),
    entry("emerg", 0),
    entry("alert", 1),
    entry("crit", 2),
    entry("err", 3),
    entry("warning", 4),
    entry("notice", 5),
    entry("info", 6),
    entry("debug", 7),
];

/// Facility labels (codes are already shifted, as in `<syslog.h>`)
pub static FACILITY_LABELS: &[IntLabel] = &[
    entry("kern", 0 << 3),
    entry("user", 1 << 3),
    entry("mail", 2 << 3),
    entry("daemon", 3 << 3),
    entry("auth", 4 << 3),
    entry("syslog", 5 << 3),
    entry("lpr", 6 << 3),
    entry("news", 7 << 3),
    entry("uucp", 8 << 3),
    entry("cron", 9 << 3),
    entry("authpriv", 10 << 3),
    entry("ftp", 11 << 3),
    entry("local0", 16 << 3),
    entry("local1", 17 << 3),
    entry("local2", 18 << 3),
    entry("local3", 19 << 3),
    entry("local4", 20 << 3),
    entry("local5", 21 << 3),
    entry("local6", 22 << 3),
    entry("local7", 23 << 3),
];

/// Look up the label for a code
pub fn label_for(table: &[IntLabel], code: i32) -> Option<&'static str> {
    table.iter().find(|e| e.code == code).map(|e| e.label)
}

/// Look up the code for a label (exact, case-sensitive)
pub fn code_for(table: &[IntLabel], label: &str) -> Option<i32> {
    table.iter().find(|e| e.label == label).map(|e| e.code)
}

/// Level code -> label, `None` for unknown codes
pub fn level_to_string(code: i32) -> Option<&'static str> {
    label_for(LEVEL_LABELS, code)
}

/// Level label -> code, `None` for unknown labels
pub fn string_to_level(label: &str) -> Option<i32> {
    code_for(LEVEL_LABELS, label)
}

/// Facility code -> label
pub fn facility_to_string(code: i32) -> Option<&'static str> {
    label_for(FACILITY_LABELS, code)
}

/// Facility label -> code
pub fn string_to_facility(label: &str) -> Option<i32> {
    code_for(FACILITY_LABELS, label)
}

/// Label for a level code, `"?"` when unrecognized
pub fn level_label_or_unknown(code: i32) -> &'static str {
    level_to_string(code).unwrap_or("?")
}

/// Severity levels, most severe first
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Level {
    /// All levels in code order
    pub const ALL: [Level; 8] = [
        Level::Emergency,
        Level::Alert,
        Level::Critical,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    /// Numeric code (syslog priority)
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Canonical label
    pub fn as_str(self) -> &'static str {
        level_label_or_unknown(self.code())
    }

    /// Parse a canonical label; "none" is not a level
    pub fn from_label(label: &str) -> Option<Level> {
        string_to_level(label).and_then(|code| Level::try_from(code).ok())
    }
}

impl TryFrom<i32> for Level {
    type Error = LogError;

    fn try_from(code: i32) -> Result<Self> {
        Level::ALL
            .get(usize::try_from(code).map_err(|_| LogError::InvalidLevel)?)
            .copied()
            .ok_or(LogError::InvalidLevel)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code stored for an enabled-level threshold
pub fn threshold_to_code(threshold: Option<Level>) -> i32 {
    threshold.map_or(LEVEL_NONE_CODE, Level::code)
}

/// Decode a stored threshold; `Err` for codes that are neither none nor a level
pub fn threshold_from_code(code: i32) -> Result<Option<Level>> {
    if code == LEVEL_NONE_CODE {
        Ok(None)
    } else {
        Level::try_from(code).map(Some)
    }
}

/// Parse a configuration level string ("none" included)
pub fn parse_threshold(label: &str) -> Result<Option<Level>> {
    let code = string_to_level(label).ok_or(LogError::InvalidLevel)?;
    threshold_from_code(code)
}
