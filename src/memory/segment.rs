//! Shared memory segment implementation

use std::{
    fs::{File, OpenOptions},
    os::unix::fs::OpenOptionsExt,
    ptr::NonNull,
};

use memmap2::{MmapMut, MmapOptions};
use nix::sys::stat::{umask, Mode};

use crate::error::{LogError, Result};

use super::config::{BackingType, SegmentConfig};

/// A mapped segment holding the registry
#[derive(Debug)]
pub struct SharedSegment {
    config: SegmentConfig,
    /// Memory mapping
    mmap: MmapMut,
    /// Base address, captured once so shared readers never need `&mut`
    base: NonNull<u8>,
    /// Backing file for file-backed segments
    _file: Option<File>,
    /// Whether this process created the backing file
    created: bool,
}

impl SharedSegment {
    /// Create or open a segment
    pub fn open(config: SegmentConfig) -> Result<Self> {
        config.validate()?;

        let (file, created, mut mmap) = match config.backing_type {
            BackingType::FileBacked => Self::map_file(&config)?,
            BackingType::Private => {
                let mmap = MmapMut::map_anon(config.size)
                    .map_err(|e| LogError::from_io(e, "Failed to create anonymous mapping"))?;
                (None, true, mmap)
            }
        };

        let base = NonNull::new(mmap.as_mut_ptr())
            .ok_or_else(|| LogError::platform("Mapping returned a null address"))?;

        log::debug!(
            "mapped {} segment {:?} ({} bytes, created: {})",
            config.backing_type.name(),
            config.name,
            mmap.len(),
            created
        );

        Ok(Self {
            config,
            mmap,
            base,
            _file: file,
            created,
        })
    }

    /// Open the backing file, grow it to the configured size and map it shared
    fn map_file(config: &SegmentConfig) -> Result<(Option<File>, bool, MmapMut)> {
        let path = config.file_path();
        let existed = path.exists();

        let file = if config.create {
            // segment permissions must not depend on the caller's umask
            let previous = umask(Mode::empty());
            let opened = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .mode(config.permissions)
                .open(&path);
            umask(previous);
            opened.map_err(|e| LogError::from_io(e, "Failed to create/open segment file"))?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|e| LogError::from_io(e, "Failed to open existing segment file"))?
        };

        let current = file
            .metadata()
            .map_err(|e| LogError::from_io(e, "Failed to stat segment file"))?
            .len();
        if current < config.size as u64 {
            file.set_len(config.size as u64)
                .map_err(|e| LogError::from_io(e, "Failed to set segment size"))?;
        }

        let mmap = unsafe {
            MmapOptions::new()
                .len(config.size)
                .map_mut(&file)
                .map_err(|e| LogError::from_io(e, "Failed to create memory mapping"))?
        };

        Ok((Some(file), !existed, mmap))
    }

    /// Typed pointer to the start of the segment
    ///
    /// The pointee lives as long as `self`; callers decide how to synchronize
    /// access to it.
    pub fn as_ptr<T>(&self) -> *mut T {
        self.base.as_ptr() as *mut T
    }

    /// Read-only view of the mapped bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Size of the mapping
    pub fn size(&self) -> usize {
        self.mmap.len()
    }

    /// Segment name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Backing type
    pub fn backing_type(&self) -> BackingType {
        self.config.backing_type
    }

    /// Whether this process created the backing storage
    pub fn created(&self) -> bool {
        self.created
    }

    /// Check if the segment is visible to other processes
    pub fn is_shared(&self) -> bool {
        matches!(self.config.backing_type, BackingType::FileBacked)
    }

    /// Flush changes of a file-backed segment
    pub fn flush(&self) -> Result<()> {
        self.mmap
            .flush()
            .map_err(|e| LogError::from_io(e, "Failed to flush memory mapping"))
    }
}

unsafe impl Send for SharedSegment {}
unsafe impl Sync for SharedSegment {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_backed_segment_is_zeroed_and_sized() {
        let dir = TempDir::new().unwrap();
        let config = SegmentConfig::new("seg", 8192).with_directory(dir.path());

        let segment = SharedSegment::open(config).unwrap();
        assert!(segment.created());
        assert!(segment.is_shared());
        assert_eq!(segment.size(), 8192);
        assert!(segment.as_slice().iter().all(|&b| b == 0));
        assert_eq!(std::fs::metadata(dir.path().join("seg")).unwrap().len(), 8192);
    }

    #[test]
    fn test_two_mappings_share_bytes() {
        let dir = TempDir::new().unwrap();
        let config = SegmentConfig::new("seg", 4096).with_directory(dir.path());

        let first = SharedSegment::open(config.clone()).unwrap();
        let second = SharedSegment::open(config).unwrap();
        assert!(!second.created());

        unsafe {
            *first.as_ptr::<u32>() = 0xC0FFEE;
        }
        assert_eq!(unsafe { *second.as_ptr::<u32>() }, 0xC0FFEE);
    }

    #[test]
    fn test_open_without_create_fails_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = SegmentConfig::new("missing", 4096)
            .with_directory(dir.path())
            .with_create(false);

        assert!(matches!(SharedSegment::open(config), Err(LogError::Io { .. })));
    }

    #[test]
    fn test_private_segment() {
        let config = SegmentConfig::new("", 4096).with_backing_type(BackingType::Private);
        let segment = SharedSegment::open(config).unwrap();
        assert!(!segment.is_shared());
        assert_eq!(segment.size(), 4096);
    }
}
