//! Console mirroring of logged lines

use std::{
    fmt,
    io::{self, Write},
    sync::{Arc, Mutex},
};

use crate::{labels::Level, registry::ConsoleConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stderr,
    Stdout,
}

/// The two console streams, each behind its own lock
pub struct Console {
    stderr: Mutex<Box<dyn Write + Send>>,
    stdout: Mutex<Box<dyn Write + Send>>,
}

impl Console {
    /// The process's stderr and stdout
    pub fn stdio() -> Self {
        Self::with_writers(Box::new(io::stderr()), Box::new(io::stdout()))
    }

    pub fn with_writers(stderr: Box<dyn Write + Send>, stdout: Box<dyn Write + Send>) -> Self {
        Self {
            stderr: Mutex::new(stderr),
            stdout: Mutex::new(stdout),
        }
    }

    /// A console writing into two in-memory buffers
    pub fn capture() -> (Self, CaptureBuffer, CaptureBuffer) {
        let stderr = CaptureBuffer::default();
        let stdout = CaptureBuffer::default();
        let console = Self::with_writers(Box::new(stderr.clone()), Box::new(stdout.clone()));
        (console, stderr, stdout)
    }

    /// Write `text`, adding a newline unless it already ends with one
    pub fn write_line(&self, stream: Stream, text: &str) {
        let target = match stream {
            Stream::Stderr => &self.stderr,
            Stream::Stdout => &self.stdout,
        };
        let Ok(mut out) = target.lock() else {
            return;
        };

        let end = if text.ends_with('\n') { "" } else { "\n" };
        if let Err(err) = write!(out, "{}{}", text, end).and_then(|_| out.flush()) {
            log::debug!("console write failed: {}", err);
        }
    }

    /// Write `text` to every stream whose window holds `level`
    pub fn mirror(&self, config: &ConsoleConfig, level: Level, text: &str) {
        if config.to_stderr(level) {
            self.write_line(Stream::Stderr, text);
        }
        if config.to_stdout(level) {
            self.write_line(Stream::Stdout, text);
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Shared in-memory writer
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "capture buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
