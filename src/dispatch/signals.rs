//! Signal mask and errno guards around the sink write

use nix::{
    errno::Errno,
    sys::signal::{pthread_sigmask, SigSet, SigmaskHow},
};

/// Blocks every signal for the calling thread until dropped
#[derive(Debug)]
pub struct SignalMaskGuard {
    previous: Option<SigSet>,
}

impl SignalMaskGuard {
    pub fn block_all() -> Self {
        let mut previous = SigSet::empty();
        match pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::all()), Some(&mut previous)) {
            Ok(()) => Self {
                previous: Some(previous),
            },
            Err(err) => {
                log::debug!("pthread_sigmask failed: {}", err);
                Self { previous: None }
            }
        }
    }
}

impl Drop for SignalMaskGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if let Err(err) = pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&previous), None) {
                log::debug!("restoring signal mask failed: {}", err);
            }
        }
    }
}

/// Restores `errno` to its value at construction when dropped
#[derive(Debug)]
pub struct ErrnoGuard {
    saved: i32,
}

impl ErrnoGuard {
    pub fn save() -> Self {
        Self {
            saved: Errno::last_raw(),
        }
    }
}

impl Drop for ErrnoGuard {
    fn drop(&mut self) {
        Errno::set_raw(self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    fn current_mask() -> SigSet {
        SigSet::thread_get_mask().unwrap()
    }

    #[test]
    fn test_mask_blocked_then_restored() {
        let before = current_mask();
        {
            let _guard = SignalMaskGuard::block_all();
            let during = current_mask();
            assert!(during.contains(Signal::SIGUSR1));
            assert!(during.contains(Signal::SIGTERM));
        }
        assert_eq!(current_mask().contains(Signal::SIGUSR1), before.contains(Signal::SIGUSR1));
    }

    #[test]
    fn test_errno_restored() {
        Errno::set_raw(libc::ENOENT);
        {
            let _guard = ErrnoGuard::save();
            Errno::set_raw(libc::EBADF);
        }
        assert_eq!(Errno::last_raw(), libc::ENOENT);
    }
}
