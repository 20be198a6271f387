//! Process-shared context registry
//!
//! The registry is a fixed-capacity table of named contexts placed in a
//! shared segment:
//! 1. Header (signature, version, capacity, count)
//! 2. Console windows and the dev-mode / context-logging switches
//! 3. The global context, then user contexts in creation order

pub mod constants;
pub mod layout;
pub mod resolver;
pub mod store;

pub use constants::*;
pub use layout::{ConsoleConfig, ContextFlags, ContextInfo, ContextRecord, GlobalRegistry};
pub use resolver::{validate_name, ContextHandle, Resolution};
pub use store::{AttachState, Registry};
