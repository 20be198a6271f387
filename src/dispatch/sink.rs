//! Destinations of finished lines

use std::{
    ffi::CString,
    os::raw::c_char,
    sync::{Arc, Mutex, OnceLock},
};

use crate::labels::Level;

/// Writes a finished line at a severity
pub trait LogSink: Send + Sync {
    fn emit(&self, level: Level, line: &str);
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn emit(&self, level: Level, line: &str) {
        (**self).emit(level, line)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn emit(&self, level: Level, line: &str) {
        (**self).emit(level, line)
    }
}

/// The system log, through `syslog(3)`
#[derive(Debug, Default, Clone, Copy)]
pub struct SyslogSink;

impl SyslogSink {
    /// Use the C library's default identity (the program name)
    pub fn new() -> Self {
        SyslogSink
    }

    /// Open the system log under `ident`
    ///
    /// `openlog(3)` keeps the pointer, so only the first identity given in
    /// a process takes effect.
    pub fn with_ident(ident: &str) -> Self {
        static IDENT: OnceLock<CString> = OnceLock::new();
        let ident = IDENT.get_or_init(|| c_text(ident));
        unsafe { libc::openlog(ident.as_ptr(), libc::LOG_NDELAY, libc::LOG_USER) };
        SyslogSink
    }
}

impl LogSink for SyslogSink {
    fn emit(&self, level: Level, line: &str) {
        let text = c_text(line);
        unsafe {
            libc::syslog(
                level.code(),
                b"%s\0".as_ptr() as *const c_char,
                text.as_ptr(),
            )
        };
    }
}

/// `text` up to its first NUL
fn c_text(text: &str) -> CString {
    let end = text.find('\0').unwrap_or(text.len());
    CString::new(&text[..end]).unwrap_or_default()
}

/// Keeps emitted lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records().into_iter().map(|(_, line)| line).collect()
    }

    /// Drain the captured lines
    pub fn take(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|mut records| std::mem::take(&mut *records))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn emit(&self, level: Level, line: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, line.to_string()));
        }
    }
}
