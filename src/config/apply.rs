//! Name-based operations a config loader drives

use crate::{
    error::Result,
    labels::parse_threshold,
    logger::SharedLog,
    registry::{ContextFlags, ContextHandle},
};

/// Flags a config entry sets (`Some(true)`), clears (`Some(false)`) or
/// leaves alone (`None`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagUpdate {
    pub log_process_ids: Option<bool>,
    pub log_thread_ids: Option<bool>,
    pub log_to_console: Option<bool>,
}

impl FlagUpdate {
    pub fn is_empty(&self) -> bool {
        self.log_process_ids.is_none() && self.log_thread_ids.is_none() && self.log_to_console.is_none()
    }

    /// Flags to set and flags to clear
    fn split(&self) -> (ContextFlags, ContextFlags) {
        let mut on = ContextFlags::NONE;
        let mut off = ContextFlags::NONE;
        let entries = [
            (self.log_process_ids, ContextFlags::LOG_PROCESS_IDS),
            (self.log_thread_ids, ContextFlags::LOG_THREAD_IDS),
            (self.log_to_console, ContextFlags::LOG_TO_CONSOLE),
        ];
        for (value, flag) in entries {
            match value {
                Some(true) => on |= flag,
                Some(false) => off |= flag,
                None => {}
            }
        }
        (on, off)
    }
}

impl SharedLog {
    /// Create `name` if needed, set its level from a label and give it the
    /// global context's flags
    pub fn configure_level(&self, name: &str, level: &str) -> Result<ContextHandle> {
        let threshold = parse_threshold(level)?;
        let handle = self.get_context(Some(name))?;
        self.set_level(handle, threshold)?;
        self.registry().inherit_global_flags(handle)?;
        Ok(handle)
    }

    /// Apply a flag update to `name`; touched contexts become overridden
    pub fn configure_flags(&self, name: &str, update: FlagUpdate) -> Result<()> {
        let handle = self.get_context(Some(name))?;
        let (on, off) = update.split();
        if !on.is_empty() {
            self.set_flags(handle, on, true)?;
        }
        if !off.is_empty() {
            self.set_flags(handle, off, false)?;
        }
        Ok(())
    }

    /// Set the level of one named context, or of every context when `name`
    /// is `None`; returns how many contexts were changed
    pub fn apply_override(&self, name: Option<&str>, level: &str) -> Result<usize> {
        let threshold = parse_threshold(level)?;

        match name {
            Some(name) => {
                let handle = self.get_context(Some(name))?;
                self.set_level(handle, threshold)?;
                Ok(1)
            }
            None => {
                let count = self.count_contexts()?;
                for index in 0..count {
                    let handle = self.context_by_index(index)?;
                    self.set_level(handle, threshold)?;
                }
                Ok(count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        let update = FlagUpdate {
            log_process_ids: Some(true),
            log_thread_ids: Some(false),
            log_to_console: None,
        };
        let (on, off) = update.split();
        assert_eq!(on, ContextFlags::LOG_PROCESS_IDS);
        assert_eq!(off, ContextFlags::LOG_THREAD_IDS);
        assert!(!update.is_empty());
        assert!(FlagUpdate::default().is_empty());
    }
}
