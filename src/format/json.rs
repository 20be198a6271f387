//! Validation of the embedded object at the head of a line

use serde_json::{Map, Value};

use super::line::LINE_CAPACITY;

/// Why the embedded object was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonDefect {
    /// No boundary within the line buffer
    TooMuchData,
    /// No prefix parses as an object
    Malformed,
}

impl JsonDefect {
    pub fn cause(self) -> &'static str {
        match self {
            JsonDefect::TooMuchData => "The json string exceeded 1024 bytes.",
            JsonDefect::Malformed => "The json string is wrong.",
        }
    }
}

/// Find the object that opens `text`, tolerating free text after it
///
/// Candidate boundaries are each `}` (each `} ` when `with_trailing`);
/// the first prefix that parses as an object wins and its length is
/// returned.
pub fn validate_embedded_object(text: &str, with_trailing: bool) -> Result<usize, JsonDefect> {
    let pattern = if with_trailing { "} " } else { "}" };
    let mut from = 0;

    while let Some(found) = text[from..].find(pattern) {
        let start = from + found;
        let boundary = start + pattern.len();
        if boundary > LINE_CAPACITY - 1 {
            return Err(JsonDefect::TooMuchData);
        }

        if serde_json::from_str::<Map<String, Value>>(&text[..boundary]).is_ok() {
            return Ok(boundary);
        }
        from = boundary;
    }

    Err(JsonDefect::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        assert_eq!(validate_embedded_object("{\"a\":1}", false), Ok(7));
        assert_eq!(validate_embedded_object("{}", false), Ok(2));
    }

    #[test]
    fn test_nested_braces_need_later_boundary() {
        let text = "{\"a\":{\"b\":1}} free text";
        assert_eq!(validate_embedded_object(text, true), Ok(14));
        assert_eq!(validate_embedded_object(text, false), Ok(13));
    }

    #[test]
    fn test_brace_inside_string() {
        let text = "{\"a\":\"} \"} tail";
        assert_eq!(validate_embedded_object(text, true), Ok(11));
    }

    #[test]
    fn test_trailing_mode_needs_space() {
        assert_eq!(validate_embedded_object("{\"a\":1}", true), Err(JsonDefect::Malformed));
        assert_eq!(validate_embedded_object("{\"a\":1} ", true), Ok(8));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(validate_embedded_object("{a:1}", false), Err(JsonDefect::Malformed));
        assert_eq!(validate_embedded_object("no braces", false), Err(JsonDefect::Malformed));
        assert_eq!(validate_embedded_object("[1]} ", true), Err(JsonDefect::Malformed));
    }

    #[test]
    fn test_boundary_past_buffer() {
        let text = format!("{{\"a\":\"{}\"}}", "x".repeat(1100));
        assert_eq!(validate_embedded_object(&text, false), Err(JsonDefect::TooMuchData));

        // exactly at the last usable byte
        let fits = format!("{{\"a\":\"{}\"}}", "x".repeat(1023 - 8));
        assert_eq!(fits.len(), 1023);
        assert_eq!(validate_embedded_object(&fits, false), Ok(1023));
    }

    #[test]
    fn test_causes() {
        assert_eq!(JsonDefect::TooMuchData.cause(), "The json string exceeded 1024 bytes.");
        assert_eq!(JsonDefect::Malformed.cause(), "The json string is wrong.");
    }
}
