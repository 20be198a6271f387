//! Error types and handling for shmlog

/// Result type alias for shmlog operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Error conditions surfaced to logging callers
///
/// Most variants are plain codes: they describe which rule a call broke and
/// carry no payload, because the facility reports the details through its own
/// diagnostic lines. `Io` and `Platform` only occur while setting up the
/// shared segment.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A required argument was missing or unusable
    #[error("invalid parameter")]
    InvalidParameter,

    /// Context index out of range
    #[error("invalid context index")]
    InvalidContextIndex,

    /// Handle does not refer to a registered context
    #[error("invalid context")]
    InvalidContext,

    /// Level code outside the severity range
    #[error("invalid level")]
    InvalidLevel,

    /// Message shape rejected (msgid, key/format agreement, payload)
    #[error("invalid format")]
    InvalidFormat,

    /// Data pointer or payload unusable
    #[error("invalid data")]
    InvalidData,

    /// Nothing to log
    #[error("no data")]
    NoData,

    /// Payload larger than the line buffer
    #[error("too much data")]
    TooMuchData,

    /// Level is not enabled for the context
    #[error("level disabled")]
    LevelDisabled,

    /// Line formatting failed
    #[error("format string failed")]
    FormatStringFailed,

    /// Context table is full
    #[error("too many contexts")]
    TooManyContexts,

    /// Context name fails the length or charset rule
    #[error("invalid context name")]
    InvalidContextName,

    /// No context with that name exists
    #[error("context not found")]
    ContextNotFound,

    /// Caller buffer cannot hold the result
    #[error("buffer too small")]
    BufferTooSmall,

    /// Message id is missing, too long or contains a space or brace
    #[error("invalid message id")]
    InvalidMsgId,

    /// Message id is an empty string
    #[error("empty message id")]
    EmptyMsgId,

    /// Logging is switched off
    #[error("logging disabled")]
    LoggingDisabled,

    /// Registry unavailable or of an unrecognized layout
    #[error("unknown registry state")]
    Unknown,

    /// I/O related errors (lock file, segment file, mmap)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Platform-specific errors
    #[error("Platform error: {message}")]
    Platform { message: String },
}

impl LogError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    /// Symbolic name of the condition, as used in diagnostics
    pub fn code_name(&self) -> &'static str {
        match self {
            LogError::InvalidParameter => "InvalidParameter",
            LogError::InvalidContextIndex => "InvalidContextIndex",
            LogError::InvalidContext => "InvalidContext",
            LogError::InvalidLevel => "InvalidLevel",
            LogError::InvalidFormat => "InvalidFormat",
            LogError::InvalidData => "InvalidData",
            LogError::NoData => "NoData",
            LogError::TooMuchData => "TooMuchData",
            LogError::LevelDisabled => "LevelDisabled",
            LogError::FormatStringFailed => "FormatStringFailed",
            LogError::TooManyContexts => "TooManyContexts",
            LogError::InvalidContextName => "InvalidContextName",
            LogError::ContextNotFound => "ContextNotFound",
            LogError::BufferTooSmall => "BufferTooSmall",
            LogError::InvalidMsgId => "InvalidMsgID",
            LogError::EmptyMsgId => "EmptyMsgID",
            LogError::LoggingDisabled => "LoggingDisabled",
            LogError::Unknown | LogError::Io { .. } | LogError::Platform { .. } => "Unknown",
        }
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}

impl From<nix::errno::Errno> for LogError {
    fn from(err: nix::errno::Errno) -> Self {
        Self::platform(err.desc())
    }
}
