//! Process and thread identity

use std::{fs, sync::OnceLock};

use crate::registry::ContextFlags;

/// Longest command line reported in audit and warning lines
const MAX_CMDLINE: usize = 511;

pub fn pid() -> i32 {
    nix::unistd::getpid().as_raw()
}

pub fn tid() -> i32 {
    nix::unistd::gettid().as_raw()
}

/// Short name of the running program
pub fn program_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| {
        std::env::args_os()
            .next()
            .as_deref()
            .and_then(|arg0| std::path::Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Command line of this process with NULs shown as spaces
pub fn process_cmdline() -> String {
    let mut raw = fs::read("/proc/self/cmdline").unwrap_or_default();
    raw.truncate(MAX_CMDLINE);
    for b in raw.iter_mut() {
        if *b == 0 {
            *b = b' ';
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

/// `[]`, `[pid]` or `[pid:tid]` as the flags ask
///
/// The thread id is shown only when it differs from the process id.
pub fn ptid_tag(flags: ContextFlags) -> String {
    let wants_pid = flags.contains(ContextFlags::LOG_PROCESS_IDS);
    let wants_tid = flags.contains(ContextFlags::LOG_THREAD_IDS);
    if !wants_pid && !wants_tid {
        return "[]".to_string();
    }

    let (pid, tid) = (pid(), tid());
    if wants_tid && tid != pid {
        format!("[{}:{}]", pid, tid)
    } else {
        format!("[{}]", pid)
    }
}
