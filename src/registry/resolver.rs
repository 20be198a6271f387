//! Context lookup, creation and accessors

use std::sync::atomic::Ordering;

use crate::{
    error::{LogError, Result},
    labels::{threshold_from_code, Level},
};

use super::{
    constants::*,
    layout::{ConsoleConfig, ContextFlags, ContextInfo, ContextRecord, GlobalRegistry},
    store::Registry,
};

/// Exported identifier of a context: its index in the registry
///
/// Index 0 is the global context, which is also the default handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextHandle(u32);

impl ContextHandle {
    pub const GLOBAL: ContextHandle = ContextHandle(0);

    pub(crate) fn from_index(index: usize) -> Self {
        ContextHandle(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_global(self) -> bool {
        self.0 == 0
    }
}

/// How `get_or_create` satisfied a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(ContextHandle),
    Created(ContextHandle),
    /// Table full; the global context stands in
    Fallback(ContextHandle),
}

impl Resolution {
    pub fn handle(self) -> ContextHandle {
        match self {
            Resolution::Found(h) | Resolution::Created(h) | Resolution::Fallback(h) => h,
        }
    }
}

/// Check a context name against the length and charset rules
pub fn validate_name(name: &str) -> Result<()> {
    if name == GLOBAL_CONTEXT_NAME || name == LIB_CONTEXT_NAME {
        return Ok(());
    }

    if name.is_empty() || name.len() > MAX_CONTEXT_NAME_LEN {
        return Err(LogError::InvalidContextName);
    }

    let allowed = |c: u8| c.is_ascii_alphanumeric() || matches!(c, b'.' | b'-' | b'_');
    if !name.bytes().all(allowed) {
        return Err(LogError::InvalidContextName);
    }

    Ok(())
}

/// Level and flags a new context starts with
///
/// Walks up the dotted name ("A.B.C" -> "A.B" -> "A") and takes the first
/// registered ancestor; the global context otherwise. Lock must be held.
fn defaults_for<'a>(globals: &'a GlobalRegistry, name: &str) -> &'a ContextInfo {
    let mut parent = name;
    while let Some(dot) = parent.rfind('.') {
        parent = &parent[..dot];
        if let Some((_, record)) = globals
            .records()
            .skip(1)
            .find(|(_, record)| record.name_matches(parent))
        {
            return &record.info;
        }
    }
    &globals.global_context.info
}

fn scan(globals: &GlobalRegistry, name: &str) -> Option<ContextHandle> {
    globals
        .records()
        .find(|(_, record)| record.name_matches(name))
        .map(|(index, _)| ContextHandle::from_index(index))
}

impl Registry {
    /// Record behind a handle
    pub fn resolve(&self, handle: ContextHandle) -> Result<&ContextRecord> {
        self.globals()?
            .record(handle.index())
            .ok_or(LogError::InvalidContext)
    }

    /// Look a context up by name without creating it
    pub fn find(&self, name: &str) -> Result<ContextHandle> {
        let globals = self.globals()?;
        validate_name(name)?;

        let found = {
            let _guard = self.lock();
            scan(globals, name)
        };
        found.ok_or(LogError::ContextNotFound)
    }

    /// Look a context up by name, creating it with inherited defaults
    ///
    /// `None` is the global context.
    pub fn get_or_create(&self, name: Option<&str>) -> Result<Resolution> {
        let globals = self.globals()?;
        let Some(name) = name else {
            return Ok(Resolution::Found(ContextHandle::GLOBAL));
        };
        validate_name(name)?;

        let _guard = self.lock();

        if let Some(handle) = scan(globals, name) {
            return Ok(Resolution::Found(handle));
        }

        let count = globals.user_count();
        if count >= globals.capacity() {
            log::debug!("no more contexts available, {} falls back to global", name);
            return Ok(Resolution::Fallback(ContextHandle::GLOBAL));
        }

        let defaults = defaults_for(globals, name);
        let record = &globals.user_contexts[count];
        unsafe { record.initialize(name, defaults.level_code(), defaults.flags()) };
        globals
            .num_user_contexts
            .store(count as u32 + 1, Ordering::Release);

        log::debug!("added context {} at index {}", name, count + 1);
        Ok(Resolution::Created(ContextHandle::from_index(count + 1)))
    }

    /// Whether a handle names a published context (checked under the lock)
    pub fn contains(&self, handle: ContextHandle) -> Result<bool> {
        let globals = self.globals()?;
        let _guard = self.lock();
        Ok(handle.index() <= globals.user_count())
    }

    /// Number of contexts, global included
    pub fn count_contexts(&self) -> Result<usize> {
        Ok(1 + self.globals()?.user_count())
    }

    /// Handle at an index; 0 is the global context
    pub fn by_index(&self, index: usize) -> Result<ContextHandle> {
        if index > self.globals()?.user_count() {
            return Err(LogError::InvalidContextIndex);
        }
        Ok(ContextHandle::from_index(index))
    }

    pub fn name(&self, handle: ContextHandle) -> Result<&str> {
        Ok(self.resolve(handle)?.name())
    }

    /// Copy the name NUL-terminated into `buf`
    ///
    /// A short buffer receives a truncated name and `BufferTooSmall`.
    pub fn name_into(&self, handle: ContextHandle, buf: &mut [u8]) -> Result<usize> {
        let name = self.resolve(handle)?.name_bytes();
        if buf.len() <= 1 {
            return Err(LogError::InvalidParameter);
        }

        let len = name.len().min(buf.len() - 1);
        buf[..len].copy_from_slice(&name[..len]);
        buf[len] = 0;

        if len < name.len() {
            return Err(LogError::BufferTooSmall);
        }
        Ok(len)
    }

    /// Enabled threshold; `None` means the context is disabled
    pub fn level(&self, handle: ContextHandle) -> Result<Option<Level>> {
        Ok(self.resolve(handle)?.info.threshold())
    }

    pub fn set_level(&self, handle: ContextHandle, threshold: Option<Level>) -> Result<()> {
        let record = self.resolve(handle)?;
        let _guard = self.lock();
        record.info.set_threshold(threshold);
        Ok(())
    }

    /// Set the threshold from a raw code; -1 disables the context
    pub fn set_level_code(&self, handle: ContextHandle, code: i32) -> Result<()> {
        let threshold = threshold_from_code(code)?;
        self.set_level(handle, threshold)
    }

    pub fn flags(&self, handle: ContextHandle) -> Result<ContextFlags> {
        Ok(self.resolve(handle)?.info.flags())
    }

    /// Set or clear flags; the context is marked overridden either way
    pub fn set_flags(&self, handle: ContextHandle, flags: ContextFlags, on: bool) -> Result<()> {
        let record = self.resolve(handle)?;
        let _guard = self.lock();

        let mut current = record.info.flags();
        current.set(flags, on);
        current |= ContextFlags::OVERRIDDEN;
        record.info.set_flags(current);
        Ok(())
    }

    /// Replace a context's flags with the global context's
    pub fn inherit_global_flags(&self, handle: ContextHandle) -> Result<()> {
        let globals = self.globals()?;
        let record = self.resolve(handle)?;
        let _guard = self.lock();
        record.info.set_flags(globals.global_context.info.flags());
        Ok(())
    }

    /// Copy the global flags onto every context not explicitly overridden
    pub fn propagate_global_flags(&self) -> Result<usize> {
        let globals = self.globals()?;
        let _guard = self.lock();

        let flags = globals.global_context.info.flags();
        let mut updated = 0;
        for (_, record) in globals.records().skip(1) {
            if !record.info.flags().contains(ContextFlags::OVERRIDDEN) {
                record.info.set_flags(flags);
                updated += 1;
            }
        }
        Ok(updated)
    }

    pub fn dev_mode(&self) -> Result<bool> {
        Ok(self.globals()?.dev_mode())
    }

    pub fn set_dev_mode(&self, on: bool) -> Result<()> {
        let globals = self.globals()?;
        let _guard = self.lock();
        globals.dev_mode.store(on as u32, Ordering::Relaxed);
        Ok(())
    }

    pub fn context_logging(&self) -> Result<bool> {
        Ok(self.globals()?.context_logging())
    }

    pub fn set_context_logging(&self, on: bool) -> Result<()> {
        let globals = self.globals()?;
        let _guard = self.lock();
        globals.context_logging.store(on as u32, Ordering::Relaxed);
        Ok(())
    }

    pub fn console_config(&self) -> Result<ConsoleConfig> {
        Ok(self.globals()?.console.load())
    }

    pub fn set_console_config(&self, config: ConsoleConfig) -> Result<()> {
        let globals = self.globals()?;
        let _guard = self.lock();
        globals.console.store(config);
        Ok(())
    }
}
