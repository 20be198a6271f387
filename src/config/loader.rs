//! Configuration loading
//!
//! Config files are JSON objects:
//!
//! ```json
//! {
//!     "contextLogging": true,
//!     "contexts": [
//!         { "name": "svc", "level": "info", "logProcessIds": true }
//!     ],
//!     "overrides": [
//!         { "name": "svc.db", "level": "debug" },
//!         { "level": "err" }
//!     ]
//! }
//! ```
//!
//! `contextLogging` is only honoured in `default.conf`. An override without
//! a name applies to every registered context.

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    dispatch::COMPONENT_NAME,
    format::truncate_and_escape,
    labels::Level,
    logger::SharedLog,
};

use super::{apply::FlagUpdate, LogConfig};

/// Main config file, read first
pub const DEFAULT_CONFIG_FILE: &str = "default.conf";

const CONFIG_SUFFIX: &str = ".conf";

/// Applies configuration to an attached log
///
/// Runs once when a process initializes the registry and again on the
/// reload command.
pub trait ConfigLoader: Send + Sync {
    /// Returns whether the main configuration was found
    fn load(&self, log: &SharedLog) -> bool;
}

impl<F> ConfigLoader for F
where
    F: Fn(&SharedLog) -> bool + Send + Sync,
{
    fn load(&self, log: &SharedLog) -> bool {
        self(log)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(rename = "contextLogging")]
    context_logging: Option<Value>,
    contexts: Option<Value>,
    overrides: Option<Value>,
}

/// Reads `*.conf` files from a directory, then the overrides file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonConfigLoader {
    config_dir: PathBuf,
    overrides_path: PathBuf,
}

impl JsonConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>, overrides_path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            overrides_path: overrides_path.into(),
        }
    }

    pub fn from_config(config: &LogConfig) -> Self {
        Self::new(&config.config_dir, &config.overrides_path)
    }

    /// Apply one file; `false` when it could not be parsed or held nothing
    pub fn load_file(&self, log: &SharedLog, path: &Path) -> bool {
        let file = escaped(path);
        let parsed = fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|text| serde_json::from_str::<ConfigFile>(&text).map_err(|err| err.to_string()));
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("config {:?} unreadable: {}", path, err);
                error(log, format_args!("JSON_PARSE_ERR {{\"file\":\"{}\"}}", file));
                return false;
            }
        };

        if path.file_name() == Some(OsStr::new(DEFAULT_CONFIG_FILE)) {
            if let Some(value) = &parsed.context_logging {
                match value.as_bool() {
                    Some(flag) => {
                        if let Err(err) = log.set_context_logging(flag) {
                            log::warn!("cannot set context logging: {}", err);
                        }
                    }
                    None => error(log, format_args!("INV_CTXFLAG {{\"file\":\"{}\"}}", file)),
                }
            }
        }

        let mut found_context = false;
        if let Some(Value::Array(entries)) = &parsed.contexts {
            for (index, entry) in entries.iter().enumerate() {
                if !entry.is_null() {
                    found_context |= self.load_context(log, &file, index, entry);
                }
            }
        }

        let have_overrides = match &parsed.overrides {
            Some(Value::Array(entries)) => {
                self.load_overrides(log, &file, entries);
                true
            }
            Some(_) => {
                error(log, format_args!("PARSE_ERROR {{\"file\":\"{}\"}} Invalid overrides (ignoring)", file));
                false
            }
            None => false,
        };

        if !found_context && !have_overrides {
            error(log, format_args!("CTX_MISSING {{\"file\":\"{}\"}}", file));
            return false;
        }
        true
    }

    /// Returns whether the entry had a name
    fn load_context(&self, log: &SharedLog, file: &str, index: usize, entry: &Value) -> bool {
        let name = match entry.get("name") {
            None => {
                error(
                    log,
                    format_args!("NO_CTX_NAME {{\"index\":{},\"file\":\"{}\"}}", index, file),
                );
                return false;
            }
            Some(value) => match value.as_str() {
                Some(name) => name,
                None => {
                    error(
                        log,
                        format_args!("CTX_NAME_ERR {{\"index\":{},\"file\":\"{}\"}}", index, file),
                    );
                    return true;
                }
            },
        };
        let shown = truncate_and_escape(name);

        let level = match entry.get("level") {
            None => {
                error(
                    log,
                    format_args!("CTX_LVL_MISSING {{\"context\":\"{}\",\"file\":\"{}\"}}", shown, file),
                );
                return true;
            }
            Some(value) => match value.as_str() {
                Some(level) => level,
                None => {
                    error(
                        log,
                        format_args!("NO_CTX_LVL {{\"context\":\"{}\",\"file\":\"{}\"}}", shown, file),
                    );
                    return true;
                }
            },
        };

        if let Err(err) = log.configure_level(name, level) {
            error(
                log,
                format_args!(
                    "INIT_CTX_ERR {{\"file\":\"{}\",\"context\":\"{}\",\"err\":\"{}\"}}",
                    file,
                    shown,
                    err.code_name()
                ),
            );
            return true;
        }

        let update = FlagUpdate {
            log_process_ids: flag(log, entry, "logProcessIds", "INV_PSID", file, &shown),
            log_thread_ids: flag(log, entry, "logThreadIds", "INV_THID", file, &shown),
            log_to_console: flag(log, entry, "logToConsole", "INV_LOG_TO_CON", file, &shown),
        };
        if !update.is_empty() {
            if let Err(err) = log.configure_flags(name, update) {
                log::debug!("flags for {} not applied: {}", name, err);
                error(
                    log,
                    format_args!("SET_CTX_FLG_ERR {{\"file\":\"{}\",\"context\":\"{}\"}}", file, shown),
                );
            }
        }
        true
    }

    fn load_overrides(&self, log: &SharedLog, file: &str, entries: &[Value]) {
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                error(
                    log,
                    format_args!(
                        "PARSE_ERROR {{\"file\":\"{}\",\"index\":{}}} Invalid override (ignoring)",
                        file, index
                    ),
                );
                continue;
            }

            let Some(level) = entry.get("level") else {
                continue;
            };
            let Some(level) = level.as_str().filter(|l| crate::labels::string_to_level(l).is_some()) else {
                error(
                    log,
                    format_args!(
                        "PARSE_ERROR {{\"file\":\"{}\",\"index\":{}}} Invalid log level \"{}\" (ignoring)",
                        file,
                        index,
                        truncate_and_escape(&level.to_string())
                    ),
                );
                continue;
            };

            let name = entry.get("name").and_then(Value::as_str);
            if let Err(err) = log.apply_override(name, level) {
                error(
                    log,
                    format_args!(
                        "SET_CTX_LEVEL_FAIL {{\"file\":\"{}\", \"index\":{}}} Failed to set log level for {}: {}",
                        file,
                        index,
                        truncate_and_escape(name.unwrap_or("<all>")),
                        err.code_name()
                    ),
                );
            }
        }
    }
}

impl ConfigLoader for JsonConfigLoader {
    fn load(&self, log: &SharedLog) -> bool {
        let entries = match fs::read_dir(&self.config_dir) {
            Ok(entries) => entries,
            Err(err) => {
                error(
                    log,
                    format_args!("DIR_OPEN_ERR {{\"Error\":\"{}\"}}", truncate_and_escape(&err.to_string())),
                );
                return false;
            }
        };

        let default = self.config_dir.join(DEFAULT_CONFIG_FILE);
        let found_default = default.is_file();
        if found_default {
            self.load_file(log, &default);
        }

        if log.context_logging().unwrap_or(false) {
            let mut others: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    let name = entry.file_name();
                    let name = name.to_string_lossy();
                    !name.starts_with('.') && name.ends_with(CONFIG_SUFFIX) && name != DEFAULT_CONFIG_FILE
                })
                .map(|entry| entry.path())
                .collect();
            others.sort();

            for path in others.iter().filter(|path| path.is_file()) {
                self.load_file(log, path);
            }
        }

        // overrides last: an unnamed override walks the contexts defined so far
        if self.overrides_path.is_file() {
            self.load_file(log, &self.overrides_path);
        }

        found_default
    }
}

fn escaped(path: &Path) -> String {
    truncate_and_escape(&path.to_string_lossy())
}

fn error(log: &SharedLog, text: std::fmt::Arguments<'_>) {
    log.diag(Level::Error, COMPONENT_NAME, "[]", text);
}

/// Optional boolean flag of a context entry
fn flag(log: &SharedLog, entry: &Value, tag: &str, defect: &str, file: &str, context: &str) -> Option<bool> {
    let value = entry.get(tag)?;
    match value.as_bool() {
        Some(on) => Some(on),
        None => {
            error(
                log,
                format_args!("{} {{\"file\":\"{}\",\"context\":\"{}\"}}", defect, file, context),
            );
            None
        }
    }
}
