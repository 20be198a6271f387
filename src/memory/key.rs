//! Segment key derivation from the library's install location

use std::{
    ffi::{CStr, OsStr},
    os::unix::{ffi::OsStrExt, fs::MetadataExt},
    path::{Path, PathBuf},
};

/// Project byte mixed into every key
pub const KEY_PROJECT_ID: u8 = b'A';

/// Prefix of segment file names
pub const SEGMENT_PREFIX: &str = "shmlog";

/// Resolve the file this code was loaded from
///
/// For a shared library this is the `.so` path; for a statically linked
/// binary it is the executable.
pub fn locate_library() -> Option<PathBuf> {
    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    let addr = locate_library as fn() -> Option<PathBuf> as *const libc::c_void;

    let found = unsafe { libc::dladdr(addr, &mut info) };
    if found == 0 || info.dli_fname.is_null() {
        log::debug!("dladdr could not resolve the library path");
        return None;
    }

    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    if name.to_bytes().is_empty() {
        return None;
    }
    Some(PathBuf::from(OsStr::from_bytes(name.to_bytes())))
}

/// Stable key for a file: inode and device of the file plus the project byte
///
/// Paths that cannot be stat'ed hash their spelling instead, so a missing
/// install never prevents attaching.
pub fn segment_key(path: &Path) -> u32 {
    match std::fs::metadata(path) {
        Ok(meta) => {
            (meta.ino() as u32 & 0xffff)
                | ((meta.dev() as u32 & 0xff) << 16)
                | ((KEY_PROJECT_ID as u32) << 24)
        }
        Err(err) => {
            log::debug!("stat {:?} failed ({}), hashing the path", path, err);
            fnv1a(path.as_os_str().as_bytes()) ^ ((KEY_PROJECT_ID as u32) << 24)
        }
    }
}

/// File name of the segment for a key
pub fn segment_name(key: u32) -> String {
    format!("{}-{:08x}", SEGMENT_PREFIX, key)
}

fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5u32, |hash, &b| {
        (hash ^ b as u32).wrapping_mul(0x0100_0193)
    })
}
