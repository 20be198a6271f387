use std::{
    fs::OpenOptions,
    io::Write,
    os::unix::fs::OpenOptionsExt,
    sync::atomic::Ordering,
};

use crate::{
    dispatch::{check_enabled, identity},
    error::Result,
    format::truncate_and_escape,
    labels::{threshold_from_code, threshold_to_code, Level},
    registry::{ConsoleConfig, ContextFlags, ContextHandle, Resolution},
};

use super::{SharedLog, LIB_CONTEXT_UNSET};

impl SharedLog {
    /// Look up or create a context; `None` is the global context
    ///
    /// A full table is not an error: the global context is returned and a
    /// warning goes to the log.
    pub fn get_context(&self, name: Option<&str>) -> Result<ContextHandle> {
        match self.registry.get_or_create(name)? {
            Resolution::Fallback(handle) => {
                let global = self.registry.resolve(handle)?;
                self.diag_for(
                    global,
                    Level::Warning,
                    format_args!(
                        "TOO_MANY_CONTEXTS {{\"CONTEXT\":\"{}\"}} context table is full, using the global context",
                        truncate_and_escape(name.unwrap_or(""))
                    ),
                );
                Ok(handle)
            }
            resolution => Ok(resolution.handle()),
        }
    }

    /// `get_context` that never fails; errors yield the global context
    pub fn get_context_inline(&self, name: &str) -> ContextHandle {
        self.get_context(Some(name)).unwrap_or(ContextHandle::GLOBAL)
    }

    pub fn find_context(&self, name: &str) -> Result<ContextHandle> {
        self.registry.find(name)
    }

    pub fn count_contexts(&self) -> Result<usize> {
        self.registry.count_contexts()
    }

    pub fn context_by_index(&self, index: usize) -> Result<ContextHandle> {
        self.registry.by_index(index)
    }

    pub fn context_name(&self, handle: ContextHandle) -> Result<&str> {
        self.registry.name(handle)
    }

    /// Copy a context name into a C-style buffer
    pub fn context_name_into(&self, handle: ContextHandle, buf: &mut [u8]) -> Result<usize> {
        self.registry.name_into(handle, buf)
    }

    pub fn level(&self, handle: ContextHandle) -> Result<Option<Level>> {
        self.registry.level(handle)
    }

    /// Set a context's threshold; `None` disables it
    ///
    /// In developer mode the change is appended to the level audit file.
    pub fn set_level(&self, handle: ContextHandle, threshold: Option<Level>) -> Result<()> {
        let record = self.registry.resolve(handle)?;
        log::debug!(
            "set level {} => {}",
            record.name(),
            crate::labels::level_label_or_unknown(threshold_to_code(threshold))
        );

        if self.registry.dev_mode()? {
            self.audit_level_change(record.name(), record.info.level_code(), threshold_to_code(threshold));
        }
        self.registry.set_level(handle, threshold)
    }

    /// Set the threshold from a raw code (-1 disables)
    pub fn set_level_code(&self, handle: ContextHandle, code: i32) -> Result<()> {
        let threshold = threshold_from_code(code)?;
        self.set_level(handle, threshold)
    }

    pub fn flags(&self, handle: ContextHandle) -> Result<ContextFlags> {
        self.registry.flags(handle)
    }

    /// Set or clear flags, marking the context overridden
    pub fn set_flags(&self, handle: ContextHandle, flags: ContextFlags, on: bool) -> Result<()> {
        self.registry.set_flags(handle, flags, on)
    }

    /// Whether a call at `level` on `handle` would be dispatched
    pub fn is_enabled(&self, handle: ContextHandle, level: Level) -> bool {
        self.registry
            .resolve(handle)
            .map(|record| check_enabled(level.code(), record.info.threshold()).is_ok())
            .unwrap_or(false)
    }

    /// Designate the context this process's library logs to
    ///
    /// A handle that does not name a registered context is rejected with a
    /// warning and the previous value kept.
    pub fn set_lib_context(&self, handle: ContextHandle) {
        match self.registry.contains(handle) {
            Ok(true) => self.lib_context.store(handle.index() as u32, Ordering::Relaxed),
            _ => self.diag(
                Level::Warning,
                "UNKNOWN",
                "[]",
                format_args!(
                    "Invalid context was passed to set_lib_context. Value: {}. Process: {}",
                    handle.index(),
                    truncate_and_escape(&identity::process_cmdline())
                ),
            ),
        }
    }

    /// The library context; the pre-registered `<lib>` context when unset
    pub fn lib_context(&self) -> ContextHandle {
        match self.lib_context.load(Ordering::Relaxed) {
            LIB_CONTEXT_UNSET => ContextHandle::from_index(1),
            index => ContextHandle::from_index(index as usize),
        }
    }

    pub fn dev_mode(&self) -> Result<bool> {
        self.registry.dev_mode()
    }

    pub fn set_dev_mode(&self, on: bool) -> Result<()> {
        self.registry.set_dev_mode(on)
    }

    pub fn context_logging(&self) -> Result<bool> {
        self.registry.context_logging()
    }

    pub fn set_context_logging(&self, on: bool) -> Result<()> {
        self.registry.set_context_logging(on)
    }

    pub fn console_config(&self) -> Result<ConsoleConfig> {
        self.registry.console_config()
    }

    pub fn set_console_config(&self, config: ConsoleConfig) -> Result<()> {
        self.registry.set_console_config(config)
    }

    fn audit_level_change(&self, name: &str, from: i32, to: i32) {
        let line = format!(
            "PROCINFO:{} COMPONENT:{} ORIGINLEVEL:{} INPUTLEVEL:{}\n",
            identity::process_cmdline(),
            name,
            from,
            to
        );

        let written = OpenOptions::new()
            .append(true)
            .create(true)
            .mode(0o644)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&self.config.level_audit_path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = written {
            log::debug!(
                "level audit to {:?} failed: {}",
                self.config.level_audit_path,
                err
            );
        }
    }
}
