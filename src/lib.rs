//! # shmlog - Process-shared logging contexts
//!
//! shmlog lets many unrelated processes share one table of named logging
//! contexts (component name -> enabled level and flags) without a daemon.
//! The table lives in a named shared memory segment guarded by an advisory
//! lock; every process attaches to it, creates the contexts it needs and
//! checks levels lock-free on the hot path.
//!
//! ## Features
//!
//! - **Shared registry**: versioned fixed-capacity table in a file-backed mapping
//! - **Hierarchical defaults**: `a.b.c` starts with the level of its nearest registered ancestor
//! - **Structured messages**: message ids, typed key/value payloads, bounded lines
//! - **Deterministic rejection**: malformed calls produce an escaped, bounded diagnostic
//! - **Dispatch**: system log under a full signal mask, optional console mirror
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 SharedLog                       │
//! ├─────────────────────────────────────────────────┤
//! │  Context resolver       │  Validator/formatter  │
//! │  - lookup / create      │  - msgid, keys, JSON  │
//! │  - levels and flags     │  - 1024-byte lines    │
//! └─────────────────────────────────────────────────┘
//!           │                         │
//!           ▼                         ▼
//! ┌─────────────────┐    ┌─────────────────────────┐
//! │ Shared registry │    │ Dispatch: syslog sink,  │
//! │ segment + lock  │    │ console, commands       │
//! └─────────────────┘    └─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use shmlog::{KvPair, Level, MsgFlags};
//!
//! let log = shmlog::global().expect("registry");
//! let ctx = log.get_context(Some("net.dhcp"))?;
//! log.msg(
//!     ctx,
//!     Level::Info,
//!     MsgFlags::NONE,
//!     Some("LEASE_ACQUIRED"),
//!     &[KvPair::new("iface", "eth0"), KvPair::new("ttl", 3600u32)],
//!     Some("lease renewed"),
//! )?;
//! # Ok::<(), shmlog::LogError>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod labels;
pub mod logger;
pub mod memory;
pub mod registry;

// Main API re-exports
pub use config::{ConfigLoader, FlagUpdate, JsonConfigLoader, LogConfig};
pub use dispatch::{CaptureBuffer, Console, LogSink, MemorySink, SyslogSink};
pub use error::{LogError, Result};
pub use format::{DumpFormat, KvPair, KvValue, MsgFlags};
pub use labels::{
    facility_to_string, level_to_string, string_to_facility, string_to_level, Level,
};
pub use logger::{global, SharedLog, SharedLogBuilder};
pub use registry::{AttachState, ConsoleConfig, ContextFlags, ContextHandle};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
