//! Constants for the shared registry layout

/// Magic number marking an initialized registry ("SLOG")
pub const REGISTRY_SIGNATURE: u32 = 0x534C_4F47;

/// Layout version; bump whenever `GlobalRegistry` changes shape
pub const LAYOUT_VERSION: u32 = 1;

/// Capacity of the user context table
pub const MAX_USER_CONTEXTS: usize = 256;

/// Longest context name
pub const MAX_CONTEXT_NAME_LEN: usize = 31;

/// Name storage per record (name plus NUL)
pub const CONTEXT_NAME_CAPACITY: usize = MAX_CONTEXT_NAME_LEN + 1;

/// Reserved name of the global context
pub const GLOBAL_CONTEXT_NAME: &str = "<global>";

/// Reserved name of the pre-registered library context
pub const LIB_CONTEXT_NAME: &str = "<lib>";
