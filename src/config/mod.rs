//! Paths and knobs of the logging facility, plus configuration loading

pub mod apply;
pub mod loader;

use std::path::{Path, PathBuf};

use crate::error::{LogError, Result};

pub use apply::FlagUpdate;
pub use loader::{ConfigLoader, JsonConfigLoader, DEFAULT_CONFIG_FILE};

/// Where the facility keeps its shared state and reads its configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory holding the shared registry segment
    pub shm_dir: PathBuf,
    /// Lock file serializing registry mutations
    pub lock_path: PathBuf,
    /// Path the segment key is derived from; located at runtime when unset
    pub library_path: Option<PathBuf>,
    /// Key source when the library cannot locate itself
    pub fallback_library_path: PathBuf,
    /// Directory of `*.conf` files
    pub config_dir: PathBuf,
    /// Overrides file read after the config directory
    pub overrides_path: PathBuf,
    /// Audit file for level changes in developer mode
    pub level_audit_path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            shm_dir: PathBuf::from("/dev/shm"),
            lock_path: PathBuf::from("/dev/shm/shmlog.lock"),
            library_path: None,
            fallback_library_path: PathBuf::from("/usr/lib/libshmlog.so"),
            config_dir: PathBuf::from("/etc/shmlog.d"),
            overrides_path: PathBuf::from("/var/preferences/shmlog/overrides.conf"),
            level_audit_path: PathBuf::from("/tmp/shmlog-set-level.log"),
        }
    }
}

impl LogConfig {
    /// Keep every file of the facility under one directory
    pub fn in_directory(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            shm_dir: dir.to_path_buf(),
            lock_path: dir.join("shmlog.lock"),
            library_path: None,
            fallback_library_path: dir.join("libshmlog.so"),
            config_dir: dir.join("shmlog.d"),
            overrides_path: dir.join("overrides.conf"),
            level_audit_path: dir.join("set-level.log"),
        }
    }

    pub fn with_shm_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shm_dir = dir.into();
        self
    }

    pub fn with_lock_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = path.into();
        self
    }

    /// Derive the segment key from `path` instead of locating the library
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_fallback_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_library_path = path.into();
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_overrides_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides_path = path.into();
        self
    }

    pub fn with_level_audit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.level_audit_path = path.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.shm_dir,
            &self.lock_path,
            &self.fallback_library_path,
            &self.config_dir,
        ];
        if required.iter().any(|path| path.as_os_str().is_empty()) {
            return Err(LogError::InvalidParameter);
        }

        if self.lock_path.file_name().is_none() {
            return Err(LogError::InvalidParameter);
        }

        Ok(())
    }
}
