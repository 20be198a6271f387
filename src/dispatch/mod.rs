//! Delivery of finished lines to the system log and the console

pub mod command;
pub mod console;
pub mod identity;
pub mod signals;
pub mod sink;

use std::fmt;

use crate::{
    error::{LogError, Result},
    format::BoundedLine,
    labels::Level,
    registry::{ConsoleConfig, ContextFlags},
};

pub use command::{parse_command, Command, COMMAND_PREFIX};
pub use console::{CaptureBuffer, Console, Stream};
pub use identity::ptid_tag;
pub use signals::{ErrnoGuard, SignalMaskGuard};
pub use sink::{LogSink, MemorySink, SyslogSink};

/// Facility identifier carried by every line
pub const LOG_IDENTIFIER: &str = "shmlog";

/// Component name of the library's own diagnostics
pub const COMPONENT_NAME: &str = "shmlog";

/// Check a requested level against a context threshold
///
/// The level must be a severity code; it is enabled when at least as
/// severe as the threshold. A disabled context enables nothing.
pub fn check_enabled(level_code: i32, threshold: Option<Level>) -> Result<Level> {
    let level = Level::try_from(level_code)?;
    match threshold {
        Some(threshold) if level <= threshold => Ok(level),
        _ => Err(LogError::LevelDisabled),
    }
}

/// A line ready for delivery
#[derive(Debug, Clone, Copy)]
pub struct LineRecord<'a> {
    pub level: Level,
    pub context: &'a str,
    pub flags: ContextFlags,
    pub msgid: Option<&'a str>,
    pub text: &'a str,
}

/// Sink plus console
pub struct Dispatcher {
    sink: Box<dyn LogSink>,
    console: Console,
}

impl Dispatcher {
    pub fn new(sink: Box<dyn LogSink>, console: Console) -> Self {
        Self { sink, console }
    }

    /// Deliver a line: `<ptid> <ident> <context> <msgid> <text>`
    ///
    /// Signals are blocked around the sink write and `errno` is left as it
    /// was found. Contexts logging to the console also get
    /// `<program> <ptid> <context> <text>` on the streams whose window
    /// holds the level.
    pub fn write(&self, record: &LineRecord<'_>, console: &ConsoleConfig) {
        let _errno = ErrnoGuard::save();
        let ptid = ptid_tag(record.flags);

        let line = format!(
            "{} {} {} {} {}",
            ptid,
            LOG_IDENTIFIER,
            record.context,
            record.msgid.unwrap_or(""),
            record.text
        );
        self.emit_masked(record.level, &line);

        if record.flags.contains(ContextFlags::LOG_TO_CONSOLE) {
            let mirrored = format!(
                "{} {} {} {}",
                identity::program_name(),
                ptid,
                record.context,
                record.text
            );
            self.console.mirror(console, record.level, &mirrored);
        }
    }

    /// Send one of the library's own diagnostic lines
    pub fn diagnostic(&self, level: Level, context: &str, ptid: &str, text: fmt::Arguments<'_>) {
        let _errno = ErrnoGuard::save();

        let mut line = BoundedLine::new();
        let _ = fmt::write(
            &mut line,
            format_args!("{} {} {} {}", ptid, LOG_IDENTIFIER, context, text),
        );
        log::debug!("diagnostic: {}", line);
        self.emit_masked(level, line.as_str());
    }

    fn emit_masked(&self, level: Level, line: &str) {
        let _mask = SignalMaskGuard::block_all();
        self.sink.emit(level, line);
    }

    pub fn console(&self) -> &Console {
        &self.console
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("console", &self.console)
            .finish_non_exhaustive()
    }
}
