//! Shared segment, key derivation and the registry lock

pub mod config;
pub mod key;
pub mod lock;
pub mod segment;

pub use config::{BackingType, SegmentConfig};
pub use key::{locate_library, segment_key, segment_name};
pub use lock::{LockGuard, RegistryLock};
pub use segment::SharedSegment;
