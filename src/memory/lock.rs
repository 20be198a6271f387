//! Advisory lock serializing registry mutations across processes

use std::{
    fs::{File, OpenOptions},
    os::{fd::AsRawFd, unix::fs::OpenOptionsExt},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use nix::sys::stat::{umask, Mode};

use crate::error::{LogError, Result};

/// Exclusive lock over the whole registry
///
/// `lockf(3)` record locks belong to the process, so threads of one process
/// are serialized by an in-process mutex taken first.
#[derive(Debug)]
pub struct RegistryLock {
    file: Option<File>,
    path: Option<PathBuf>,
    local: Mutex<()>,
}

impl RegistryLock {
    /// Open (creating if needed) the lock file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let previous = umask(Mode::empty());
        let opened = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o666)
            .open(path);
        umask(previous);

        let file = opened.map_err(|e| LogError::from_io(e, "Failed to open lock file"))?;

        Ok(Self {
            file: Some(file),
            path: Some(path.to_path_buf()),
            local: Mutex::new(()),
        })
    }

    /// A lock that only serializes threads of this process
    pub fn process_local() -> Self {
        Self {
            file: None,
            path: None,
            local: Mutex::new(()),
        }
    }

    /// Path of the lock file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the lock also excludes other processes
    pub fn is_shared(&self) -> bool {
        self.file.is_some()
    }

    /// Acquire the lock, blocking
    ///
    /// Failing to take the file lock is logged and the guard is returned
    /// anyway; the caller proceeds without cross-process exclusion.
    pub fn lock(&self) -> LockGuard<'_> {
        let local = self.local.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let fd = self.file.as_ref().map(|f| f.as_raw_fd());
        let held = match fd {
            Some(fd) => {
                if unsafe { libc::lockf(fd, libc::F_LOCK, 0) } == -1 {
                    log::warn!("registry lock error: {}", std::io::Error::last_os_error());
                    false
                } else {
                    true
                }
            }
            None => false,
        };

        LockGuard {
            _local: local,
            fd: if held { fd } else { None },
        }
    }
}

/// Scoped registry lock; released on drop
#[derive(Debug)]
pub struct LockGuard<'a> {
    _local: MutexGuard<'a, ()>,
    fd: Option<i32>,
}

impl LockGuard<'_> {
    /// Whether the cross-process lock is actually held
    pub fn is_held(&self) -> bool {
        self.fd.is_some()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(fd) = self.fd {
            if unsafe { libc::lockf(fd, libc::F_ULOCK, 0) } == -1 {
                log::warn!("registry unlock error: {}", std::io::Error::last_os_error());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };
    use tempfile::TempDir;

    #[test]
    fn test_lock_file_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shmlog.lock");
        let lock = RegistryLock::open(&path).unwrap();

        assert!(path.exists());
        assert!(lock.is_shared());
        let guard = lock.lock();
        assert!(guard.is_held());
    }

    #[test]
    fn test_relock_after_drop() {
        let dir = TempDir::new().unwrap();
        let lock = RegistryLock::open(dir.path().join("l")).unwrap();
        drop(lock.lock());
        assert!(lock.lock().is_held());
    }

    #[test]
    fn test_process_local_lock() {
        let lock = RegistryLock::process_local();
        assert!(!lock.is_shared());
        assert!(!lock.lock().is_held());
    }

    #[test]
    fn test_threads_are_serialized() {
        let dir = TempDir::new().unwrap();
        let lock = Arc::new(RegistryLock::open(dir.path().join("l")).unwrap());
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let _guard = lock.lock();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        assert!(RegistryLock::open("/nonexistent-dir/shmlog.lock").is_err());
    }
}
