//! Configuration types for the shared registry segment

use std::path::PathBuf;

/// Types of segment backing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackingType {
    /// File in the shared memory directory, visible to every process
    #[default]
    FileBacked,
    /// Anonymous private mapping, visible to this process only
    Private,
}

impl BackingType {
    /// Get a human-readable name for the backing type
    pub fn name(&self) -> &'static str {
        match self {
            BackingType::FileBacked => "file-backed",
            BackingType::Private => "private",
        }
    }
}

/// Configuration for opening the registry segment
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// File name of the segment inside `directory`
    pub name: String,
    /// Minimum size of the segment in bytes
    pub size: usize,
    /// Backing type for the segment
    pub backing_type: BackingType,
    /// Directory holding file-backed segments
    pub directory: PathBuf,
    /// Whether to create the segment if it doesn't exist
    pub create: bool,
    /// Permissions for newly created segment files
    pub permissions: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: 0,
            backing_type: BackingType::default(),
            directory: PathBuf::from("/dev/shm"),
            create: true,
            permissions: 0o666,
        }
    }
}

impl SegmentConfig {
    /// Create a new segment configuration
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    /// Set the backing type
    pub fn with_backing_type(mut self, backing_type: BackingType) -> Self {
        self.backing_type = backing_type;
        self
    }

    /// Set the directory for file-backed segments
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set whether to create the segment if it doesn't exist
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Set the permissions for new segment files
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::LogError;

        if self.size == 0 {
            return Err(LogError::platform("Segment size must be greater than 0"));
        }

        if self.backing_type == BackingType::FileBacked {
            if self.name.is_empty() {
                return Err(LogError::platform("Segment name cannot be empty"));
            }
            if self.name.contains('/') {
                return Err(LogError::platform(format!(
                    "Segment name {:?} must not contain '/'",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// Full path of a file-backed segment
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }
}
