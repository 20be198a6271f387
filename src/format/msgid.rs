//! Message id rules

use crate::error::LogError;

use super::escape::truncate_and_escape;

/// Message ids must be shorter than this
pub const MSGID_LEN: usize = 32;

/// Stand-in message id dispatched with debug-level lines
pub const DEBUG_MSG_ID: &str = "DBGMSG";

/// Which message id rule a call broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgIdDefect {
    Missing,
    TooLong,
    ForbiddenChar,
    Empty,
}

impl MsgIdDefect {
    pub fn error(self) -> LogError {
        match self {
            MsgIdDefect::Empty => LogError::EmptyMsgId,
            _ => LogError::InvalidMsgId,
        }
    }

    /// Diagnostic line for the defect
    ///
    /// An empty id is reported later, with an excerpt of the whole line.
    pub fn diagnostic(self, msgid: Option<&str>) -> Option<String> {
        let shown = truncate_and_escape(msgid.unwrap_or(""));
        match self {
            MsgIdDefect::Missing => {
                Some("NULL_MSGID {} NULL MSGID provided for non-debug log".to_string())
            }
            MsgIdDefect::TooLong => Some(format!(
                "LONG_MSGID {{\"MSGID\":\"{}\"}} MSGID's length is restricted within 32 characters",
                shown
            )),
            MsgIdDefect::ForbiddenChar => Some(format!(
                "INVALID_MSGID {{\"MSGID\":\"{}\"}} MSGID contains space, {{ or }}.",
                shown
            )),
            MsgIdDefect::Empty => None,
        }
    }
}

/// Check a message id: present, non-empty, under 32 bytes, no space or brace
pub fn validate_msgid(msgid: Option<&str>) -> Result<(), MsgIdDefect> {
    let msgid = msgid.ok_or(MsgIdDefect::Missing)?;

    for (index, b) in msgid.bytes().enumerate() {
        if index >= MSGID_LEN - 1 {
            return Err(MsgIdDefect::TooLong);
        }
        if matches!(b, b' ' | b'{' | b'}') {
            return Err(MsgIdDefect::ForbiddenChar);
        }
    }

    if msgid.is_empty() {
        return Err(MsgIdDefect::Empty);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_31_chars() {
        let id = "A".repeat(31);
        assert_eq!(validate_msgid(Some(&id)), Ok(()));
        assert_eq!(validate_msgid(Some("SVC_START")), Ok(()));
    }

    #[test]
    fn test_defects() {
        assert_eq!(validate_msgid(None), Err(MsgIdDefect::Missing));
        assert_eq!(validate_msgid(Some("")), Err(MsgIdDefect::Empty));
        assert_eq!(validate_msgid(Some("a b")), Err(MsgIdDefect::ForbiddenChar));
        assert_eq!(validate_msgid(Some("{x")), Err(MsgIdDefect::ForbiddenChar));
        assert_eq!(validate_msgid(Some("x}")), Err(MsgIdDefect::ForbiddenChar));
        assert_eq!(validate_msgid(Some(&"A".repeat(32))), Err(MsgIdDefect::TooLong));
    }

    #[test]
    fn test_error_codes() {
        assert!(matches!(MsgIdDefect::Empty.error(), LogError::EmptyMsgId));
        assert!(matches!(MsgIdDefect::TooLong.error(), LogError::InvalidMsgId));
        assert!(matches!(MsgIdDefect::Missing.error(), LogError::InvalidMsgId));
    }

    #[test]
    fn test_diagnostics_escape_the_id() {
        let text = MsgIdDefect::ForbiddenChar
            .diagnostic(Some("a \"b\""))
            .unwrap();
        assert_eq!(
            text,
            "INVALID_MSGID {\"MSGID\":\"a \\\"b\\\"\"} MSGID contains space, { or }."
        );
        assert!(MsgIdDefect::Empty.diagnostic(Some("")).is_none());
        assert!(MsgIdDefect::Missing.diagnostic(None).unwrap().starts_with("NULL_MSGID"));
    }
}
