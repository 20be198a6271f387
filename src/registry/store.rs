//! Attaching to the shared registry

use std::ptr::NonNull;

use crate::{
    config::LogConfig,
    error::{LogError, Result},
    memory::{
        locate_library, segment_key, segment_name, BackingType, LockGuard, RegistryLock,
        SegmentConfig, SharedSegment,
    },
};

use super::layout::{GlobalRegistry, SignatureState};

/// Outcome of attaching to a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    /// Segment was blank and has been initialized from the template
    Fresh,
    /// Segment already held a registry of this layout
    Existing,
    /// Segment holds something else; the registry is unusable
    Corrupt,
}

/// A process's attachment to the shared registry
#[derive(Debug)]
pub struct Registry {
    segment: SharedSegment,
    lock: RegistryLock,
    header: NonNull<GlobalRegistry>,
    state: AttachState,
}

unsafe impl Send for Registry {}
unsafe impl Sync for Registry {}

impl Registry {
    /// Locate, open and attach the registry described by `config`
    ///
    /// Failing to open the lock file or the shared segment is not fatal: the
    /// registry then lives in a private mapping and logging keeps working for
    /// this process.
    pub fn open(config: &LogConfig) -> Result<Self> {
        let lock = match RegistryLock::open(&config.lock_path) {
            Ok(lock) => lock,
            Err(err) => {
                log::warn!("registry lock unavailable, locking in-process only: {}", err);
                RegistryLock::process_local()
            }
        };

        let library = config
            .library_path
            .clone()
            .or_else(locate_library)
            .unwrap_or_else(|| config.fallback_library_path.clone());
        let key = segment_key(&library);
        log::debug!("registry key {:08x} from {:?}", key, library);

        let shared = SegmentConfig::new(segment_name(key), GlobalRegistry::SIZE)
            .with_directory(&config.shm_dir);
        let segment = match SharedSegment::open(shared) {
            Ok(segment) => segment,
            Err(err) => {
                log::warn!("shared registry unavailable, using process-local defaults: {}", err);
                SharedSegment::open(
                    SegmentConfig::new("", GlobalRegistry::SIZE)
                        .with_backing_type(BackingType::Private),
                )?
            }
        };

        Self::attach(segment, lock)
    }

    /// Attach to an opened segment, initializing it if blank
    pub fn attach(segment: SharedSegment, lock: RegistryLock) -> Result<Self> {
        if segment.size() < GlobalRegistry::SIZE {
            return Err(LogError::platform(format!(
                "segment of {} bytes cannot hold the registry ({} bytes)",
                segment.size(),
                GlobalRegistry::SIZE
            )));
        }

        let header = NonNull::new(segment.as_ptr::<GlobalRegistry>())
            .ok_or_else(|| LogError::platform("segment has no base address"))?;

        let state = {
            let _guard = lock.lock();
            match unsafe { header.as_ref() }.signature_state() {
                SignatureState::Uninitialized => {
                    log::debug!("initializing registry in {:?}", segment.name());
                    unsafe { GlobalRegistry::initialize(header.as_ptr()) };
                    AttachState::Fresh
                }
                SignatureState::Valid => AttachState::Existing,
                SignatureState::Foreign => {
                    log::warn!("unrecognized registry in {:?}, not touching it", segment.name());
                    AttachState::Corrupt
                }
            }
        };

        Ok(Self {
            segment,
            lock,
            header,
            state,
        })
    }

    /// How the registry was found at attach time
    pub fn state(&self) -> AttachState {
        self.state
    }

    pub fn is_usable(&self) -> bool {
        self.state != AttachState::Corrupt
    }

    /// Whether other processes see this registry
    pub fn is_shared(&self) -> bool {
        self.segment.is_shared()
    }

    /// The registry record; `Unknown` when the segment held a foreign layout
    pub fn globals(&self) -> Result<&GlobalRegistry> {
        if !self.is_usable() {
            return Err(LogError::Unknown);
        }
        Ok(unsafe { self.header.as_ref() })
    }

    /// Acquire the registry lock
    pub fn lock(&self) -> LockGuard<'_> {
        self.lock.lock()
    }

    pub fn segment(&self) -> &SharedSegment {
        &self.segment
    }
}
