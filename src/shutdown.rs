//! Deferred shutdown on SIGINT / SIGTERM.
//!
//! The signal handler only stores `true` into a static flag. The server loop
//! reads the flag at the top of each iteration, which is only reached when no
//! session is in progress, so an admitted session always runs to completion.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set from signal context. Once true it stays true for the process.
static SIGNALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_signum: libc::c_int) {
    SIGNALLED.store(true, Ordering::SeqCst);
}

/// Handle to a process shutdown flag.
#[derive(Debug, Clone, Copy)]
pub struct Shutdown {
    flag: &'static AtomicBool,
}

impl Shutdown {
    /// Route SIGINT and SIGTERM to the process-wide flag.
    ///
    /// `SA_RESTART` keeps blocking socket reads and writes of an in-flight
    /// session going across the signal. Waiting in `poll` is still
    /// interrupted, which wakes an idle server.
    pub fn install() -> io::Result<Self> {
        for signum in [libc::SIGINT, libc::SIGTERM] {
            // SAFETY: `on_signal` only performs an atomic store, which is
            // async-signal-safe, and `action` is fully initialized.
            unsafe {
                let mut action: libc::sigaction = std::mem::zeroed();
                action.sa_sigaction = on_signal as *const () as libc::sighandler_t;
                action.sa_flags = libc::SA_RESTART;
                libc::sigemptyset(&mut action.sa_mask);
                if libc::sigaction(signum, &action, std::ptr::null_mut()) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
        }
        Ok(Self { flag: &SIGNALLED })
    }

    /// A flag not connected to any signal, requested only through `request`.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self {
            flag: Box::leak(Box::new(AtomicBool::new(false))),
        }
    }

    /// Ask the server to stop once it is idle.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Clear the process-wide flag so one test can signal more than one server.
#[cfg(test)]
pub(crate) fn reset_signalled() {
    SIGNALLED.store(false, Ordering::SeqCst);
}
