//! The per-process logging facility
//!
//! A [`SharedLog`] is one attachment to the shared registry together with
//! the sink, console and config loader this process uses. [`global()`]
//! returns a lazily attached instance with the default paths.

mod calls;
mod contexts;

use std::{
    fmt,
    sync::{atomic::AtomicU32, OnceLock},
};

use crate::{
    config::{ConfigLoader, JsonConfigLoader, LogConfig},
    dispatch::{
        parse_command, ptid_tag, Command, Console, Dispatcher, ErrnoGuard, LineRecord, LogSink,
        SyslogSink,
    },
    error::Result,
    labels::Level,
    registry::{AttachState, ContextRecord, Registry},
};

/// Sentinel for "library context not set"
const LIB_CONTEXT_UNSET: u32 = u32::MAX;

/// One process's logging facility
pub struct SharedLog {
    config: LogConfig,
    registry: Registry,
    dispatcher: Dispatcher,
    loader: Box<dyn ConfigLoader>,
    lib_context: AtomicU32,
}

/// Builder for [`SharedLog`]
pub struct SharedLogBuilder {
    config: LogConfig,
    sink: Option<Box<dyn LogSink>>,
    console: Option<Console>,
    loader: Option<Box<dyn ConfigLoader>>,
}

impl SharedLogBuilder {
    /// Where finished lines go; the system log by default
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Console mirror; stderr/stdout by default
    pub fn console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /// Loader run at first initialization and on reload;
    /// [`JsonConfigLoader`] over the configured paths by default
    pub fn loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Attach to the registry
    ///
    /// When this attach initialized the registry, the loader runs once
    /// before returning.
    pub fn attach(self) -> Result<SharedLog> {
        self.config.validate()?;
        let registry = Registry::open(&self.config)?;

        let loader = self
            .loader
            .unwrap_or_else(|| Box::new(JsonConfigLoader::from_config(&self.config)));
        let sink = self.sink.unwrap_or_else(|| Box::new(SyslogSink::new()));
        let console = self.console.unwrap_or_else(Console::stdio);

        let log = SharedLog {
            config: self.config,
            registry,
            dispatcher: Dispatcher::new(sink, console),
            loader,
            lib_context: AtomicU32::new(LIB_CONTEXT_UNSET),
        };

        if log.registry.state() == AttachState::Fresh {
            let found = log.loader.load(&log);
            log::debug!("initial configuration loaded (main file found: {})", found);
        }

        Ok(log)
    }
}

impl SharedLog {
    pub fn builder(config: LogConfig) -> SharedLogBuilder {
        SharedLogBuilder {
            config,
            sink: None,
            console: None,
            loader: None,
        }
    }

    /// Attach with the default sink, console and loader
    pub fn attach(config: LogConfig) -> Result<Self> {
        Self::builder(config).attach()
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// How the registry was found when attaching
    pub fn attach_state(&self) -> AttachState {
        self.registry.state()
    }

    /// Re-run the loader, then hand the global flags to every context
    /// whose flags were never set explicitly
    pub fn reload_config(&self) -> Result<usize> {
        let found = self.loader.load(self);
        log::debug!("configuration reloaded (main file found: {})", found);
        self.registry.propagate_global_flags()
    }

    /// Deliver a finished line, intercepting control commands
    fn write(&self, record: &ContextRecord, level: Level, msgid: Option<&str>, text: &str) -> Result<()> {
        let _errno = ErrnoGuard::save();

        if let Some(command) = parse_command(text) {
            match command {
                Command::LoadConf => {
                    if let Err(err) = self.reload_config() {
                        log::warn!("reload command failed: {}", err);
                    }
                }
            }
            return Ok(());
        }

        let console = self.registry.console_config()?;
        let line = LineRecord {
            level,
            context: record.name(),
            flags: record.info.flags(),
            msgid,
            text,
        };
        self.dispatcher.write(&line, &console);
        Ok(())
    }

    /// Library diagnostic under an arbitrary component name
    pub(crate) fn diag(&self, level: Level, context: &str, ptid: &str, text: fmt::Arguments<'_>) {
        self.dispatcher.diagnostic(level, context, ptid, text);
    }

    /// Library diagnostic about a call on `record`
    pub(crate) fn diag_for(&self, record: &ContextRecord, level: Level, text: fmt::Arguments<'_>) {
        let ptid = ptid_tag(record.info.flags());
        self.dispatcher.diagnostic(level, record.name(), &ptid, text);
    }
}

impl fmt::Debug for SharedLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLog")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// The process-wide instance over the default paths
///
/// Attached on first use; `None` when even a private registry could not be
/// set up.
pub fn global() -> Option<&'static SharedLog> {
    static GLOBAL: OnceLock<Option<SharedLog>> = OnceLock::new();
    GLOBAL
        .get_or_init(|| match SharedLog::attach(LogConfig::default()) {
            Ok(log) => Some(log),
            Err(err) => {
                log::warn!("shared log unavailable: {}", err);
                None
            }
        })
        .as_ref()
}
