//! Fixed layout of the registry placed in the shared segment
//!
//! Every field written after initialization is an atomic so that the lock-free
//! enabled check reads a whole aligned value. Names are written once, before
//! the record is published by bumping `num_user_contexts`.

use std::{
    cell::UnsafeCell,
    ops::{BitOr, BitOrAssign},
    sync::atomic::{AtomicI32, AtomicU32, Ordering},
};

use crate::labels::{threshold_from_code, threshold_to_code, Level};

use super::constants::*;

/// Per-context behavior flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ContextFlags(u32);

impl ContextFlags {
    pub const NONE: ContextFlags = ContextFlags(0);
    /// Prefix lines with the process id
    pub const LOG_PROCESS_IDS: ContextFlags = ContextFlags(1 << 0);
    /// Prefix lines with the thread id as well
    pub const LOG_THREAD_IDS: ContextFlags = ContextFlags(1 << 1);
    /// Mirror lines to stderr/stdout
    pub const LOG_TO_CONSOLE: ContextFlags = ContextFlags(1 << 2);
    /// Flags were set explicitly; bulk reloads leave them alone
    pub const OVERRIDDEN: ContextFlags = ContextFlags(1 << 3);

    pub const fn from_bits(bits: u32) -> Self {
        ContextFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: ContextFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set or clear `other`
    pub fn set(&mut self, other: ContextFlags, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for ContextFlags {
    type Output = ContextFlags;

    fn bitor(self, rhs: ContextFlags) -> ContextFlags {
        ContextFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ContextFlags {
    fn bitor_assign(&mut self, rhs: ContextFlags) {
        self.0 |= rhs.0;
    }
}

/// Level and flags of one context
#[repr(C)]
#[derive(Debug)]
pub struct ContextInfo {
    enabled_level: AtomicI32,
    flags: AtomicU32,
}

impl ContextInfo {
    /// Raw level code (-1 for none)
    pub fn level_code(&self) -> i32 {
        self.enabled_level.load(Ordering::Relaxed)
    }

    /// Decoded threshold; a corrupt code reads as disabled
    pub fn threshold(&self) -> Option<Level> {
        threshold_from_code(self.level_code()).unwrap_or(None)
    }

    pub fn set_threshold(&self, threshold: Option<Level>) {
        self.enabled_level
            .store(threshold_to_code(threshold), Ordering::Relaxed);
    }

    pub fn flags(&self) -> ContextFlags {
        ContextFlags::from_bits(self.flags.load(Ordering::Relaxed))
    }

    pub fn set_flags(&self, flags: ContextFlags) {
        self.flags.store(flags.bits(), Ordering::Relaxed);
    }
}

/// One entry of the context table
#[repr(C)]
pub struct ContextRecord {
    pub info: ContextInfo,
    name: UnsafeCell<[u8; CONTEXT_NAME_CAPACITY]>,
}

impl ContextRecord {
    /// Name bytes up to the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let raw = unsafe { &*self.name.get() };
        let len = raw.iter().position(|&b| b == 0).unwrap_or(CONTEXT_NAME_CAPACITY);
        &raw[..len]
    }

    /// Name as text; names are ASCII by construction
    pub fn name(&self) -> &str {
        std::str::from_utf8(self.name_bytes()).unwrap_or("")
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    /// Write name, level and flags of a record not yet visible to readers
    ///
    /// # Safety
    /// The registry lock must be held and the record must not be published
    /// (its index is not below `num_user_contexts`).
    pub unsafe fn initialize(&self, name: &str, level_code: i32, flags: ContextFlags) {
        let raw = &mut *self.name.get();
        let len = name.len().min(MAX_CONTEXT_NAME_LEN);
        raw.fill(0);
        raw[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.info.enabled_level.store(level_code, Ordering::Relaxed);
        self.info.flags.store(flags.bits(), Ordering::Relaxed);
    }
}

impl std::fmt::Debug for ContextRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRecord")
            .field("name", &self.name())
            .field("info", &self.info)
            .finish()
    }
}

/// Inclusive console level windows for stderr and stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub stderr_min: Level,
    pub stderr_max: Level,
    pub stdout_min: Level,
    pub stdout_max: Level,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            stderr_min: Level::Emergency,
            stderr_max: Level::Error,
            stdout_min: Level::Warning,
            stdout_max: Level::Debug,
        }
    }
}

impl ConsoleConfig {
    pub fn to_stderr(&self, level: Level) -> bool {
        level >= self.stderr_min && level <= self.stderr_max
    }

    pub fn to_stdout(&self, level: Level) -> bool {
        level >= self.stdout_min && level <= self.stdout_max
    }
}

/// Shared storage of a `ConsoleConfig`
#[repr(C)]
#[derive(Debug)]
pub struct ConsoleLevels {
    stderr_min: AtomicI32,
    stderr_max: AtomicI32,
    stdout_min: AtomicI32,
    stdout_max: AtomicI32,
}

impl ConsoleLevels {
    /// Current windows; corrupt codes fall back to the defaults
    pub fn load(&self) -> ConsoleConfig {
        let defaults = ConsoleConfig::default();
        let read = |field: &AtomicI32, fallback: Level| {
            Level::try_from(field.load(Ordering::Relaxed)).unwrap_or(fallback)
        };
        ConsoleConfig {
            stderr_min: read(&self.stderr_min, defaults.stderr_min),
            stderr_max: read(&self.stderr_max, defaults.stderr_max),
            stdout_min: read(&self.stdout_min, defaults.stdout_min),
            stdout_max: read(&self.stdout_max, defaults.stdout_max),
        }
    }

    pub fn store(&self, config: ConsoleConfig) {
        self.stderr_min.store(config.stderr_min.code(), Ordering::Relaxed);
        self.stderr_max.store(config.stderr_max.code(), Ordering::Relaxed);
        self.stdout_min.store(config.stdout_min.code(), Ordering::Relaxed);
        self.stdout_max.store(config.stdout_max.code(), Ordering::Relaxed);
    }
}

/// The whole registry, as laid out in the segment
#[repr(C)]
#[derive(Debug)]
pub struct GlobalRegistry {
    /// Zero until initialized, then `REGISTRY_SIGNATURE`
    pub signature: AtomicU32,
    /// `LAYOUT_VERSION` of the initializer
    pub version: AtomicU32,
    pub max_user_contexts: AtomicU32,
    pub num_user_contexts: AtomicU32,
    pub console: ConsoleLevels,
    pub dev_mode: AtomicU32,
    pub context_logging: AtomicU32,
    pub global_context: ContextRecord,
    pub user_contexts: [ContextRecord; MAX_USER_CONTEXTS],
}

/// Shape of a registry found in a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureState {
    /// All-zero signature: never initialized
    Uninitialized,
    /// Recognized signature and layout
    Valid,
    /// Anything else
    Foreign,
}

impl GlobalRegistry {
    /// Bytes needed to hold the registry
    pub const SIZE: usize = std::mem::size_of::<GlobalRegistry>();

    /// Classify the signature without touching anything else
    pub fn signature_state(&self) -> SignatureState {
        let signature = self.signature.load(Ordering::Acquire);
        if signature == 0 {
            return SignatureState::Uninitialized;
        }

        let version = self.version.load(Ordering::Relaxed);
        let capacity = self.max_user_contexts.load(Ordering::Relaxed) as usize;
        let count = self.num_user_contexts.load(Ordering::Relaxed) as usize;
        if signature == REGISTRY_SIGNATURE
            && version == LAYOUT_VERSION
            && capacity <= MAX_USER_CONTEXTS
            && count <= capacity
        {
            SignatureState::Valid
        } else {
            SignatureState::Foreign
        }
    }

    /// Write the default template over the whole registry
    ///
    /// # Safety
    /// `this` must point to at least `SIZE` writable bytes and the registry
    /// lock must be held.
    pub unsafe fn initialize(this: *mut GlobalRegistry) {
        std::ptr::write_bytes(this as *mut u8, 0, Self::SIZE);
        let registry = &*this;

        registry.version.store(LAYOUT_VERSION, Ordering::Relaxed);
        registry
            .max_user_contexts
            .store(MAX_USER_CONTEXTS as u32, Ordering::Relaxed);
        registry.console.store(ConsoleConfig::default());
        registry.dev_mode.store(1, Ordering::Relaxed);
        registry.context_logging.store(0, Ordering::Relaxed);
        registry
            .global_context
            .initialize(GLOBAL_CONTEXT_NAME, Level::Info.code(), ContextFlags::NONE);

        registry.user_contexts[0].initialize(LIB_CONTEXT_NAME, Level::Info.code(), ContextFlags::NONE);
        registry.num_user_contexts.store(1, Ordering::Release);

        registry.signature.store(REGISTRY_SIGNATURE, Ordering::Release);
    }

    /// Number of published user contexts
    pub fn user_count(&self) -> usize {
        (self.num_user_contexts.load(Ordering::Acquire) as usize).min(MAX_USER_CONTEXTS)
    }

    /// Capacity recorded in the segment
    pub fn capacity(&self) -> usize {
        (self.max_user_contexts.load(Ordering::Relaxed) as usize).min(MAX_USER_CONTEXTS)
    }

    /// Record at a public index (0 = global)
    pub fn record(&self, index: usize) -> Option<&ContextRecord> {
        match index {
            0 => Some(&self.global_context),
            i if i <= self.user_count() => Some(&self.user_contexts[i - 1]),
            _ => None,
        }
    }

    /// Published records, global first
    pub fn records(&self) -> impl Iterator<Item = (usize, &ContextRecord)> {
        std::iter::once(&self.global_context)
            .chain(self.user_contexts[..self.user_count()].iter())
            .enumerate()
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode.load(Ordering::Relaxed) != 0
    }

    pub fn context_logging(&self) -> bool {
        self.context_logging.load(Ordering::Relaxed) != 0
    }
}
