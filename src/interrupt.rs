//! Deferred handling of termination signals.
//!
//! While the live path is suspended, SIGINT/SIGTERM/SIGHUP must not kill the
//! process before the guard puts the path back. Inside a [`SignalDeferral`]
//! those signals only raise a flag that the materialization loop polls.
//!
//! The handler state is process-global because Unix signal handlers cannot
//! reach instance data. Deferrals nest: the first one installs the handlers,
//! the last one dropped puts back whatever disposition was there before
//! (`SIG_IGN` under `nohup`, for instance).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::MilestoneError;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static DEPTH: AtomicUsize = AtomicUsize::new(0);

#[cfg(unix)]
const DEFERRED_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP];

/// Dispositions replaced by [`install_handlers`], indexed like `DEFERRED_SIGNALS`
#[cfg(unix)]
static PREVIOUS: [AtomicUsize; 3] = [
    AtomicUsize::new(libc::SIG_DFL),
    AtomicUsize::new(libc::SIG_DFL),
    AtomicUsize::new(libc::SIG_DFL),
];

/// Keeps termination signals deferred until dropped
#[must_use = "signals are only deferred while the value is alive"]
pub struct SignalDeferral {
    _private: (),
}

/// Start deferring termination signals
pub fn defer_signals() -> SignalDeferral {
    if DEPTH.fetch_add(1, Ordering::SeqCst) == 0 {
        INTERRUPTED.store(false, Ordering::SeqCst);
        install_handlers();
    }
    SignalDeferral { _private: () }
}

impl Drop for SignalDeferral {
    fn drop(&mut self) {
        if DEPTH.fetch_sub(1, Ordering::SeqCst) == 1 {
            restore_previous_handlers();
        }
    }
}

/// Whether a deferred signal arrived
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Fail with [`MilestoneError::Interrupted`] if a deferred signal arrived
pub fn check() -> Result<(), MilestoneError> {
    if interrupted() {
        Err(MilestoneError::Interrupted)
    } else {
        Ok(())
    }
}

#[cfg(unix)]
extern "C" fn on_signal(_sig: libc::c_int) {
    // Only an atomic store: async-signal-safe
    INTERRUPTED.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
fn install_handlers() {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for (sig, slot) in DEFERRED_SIGNALS.iter().zip(&PREVIOUS) {
        // SAFETY: the handler only performs an atomic store
        let previous = unsafe { libc::signal(*sig, handler) };
        if previous == libc::SIG_ERR {
            log::debug!("Failed to install handler for signal {sig}");
        }
        slot.store(previous, Ordering::SeqCst);
    }
}

#[cfg(unix)]
fn restore_previous_handlers() {
    for (sig, slot) in DEFERRED_SIGNALS.iter().zip(&PREVIOUS) {
        let previous = slot.load(Ordering::SeqCst);
        if previous == libc::SIG_ERR {
            continue;
        }
        // SAFETY: `previous` was returned by `signal` for this very signal
        unsafe {
            libc::signal(*sig, previous);
        }
    }
}

#[cfg(not(unix))]
fn install_handlers() {}

#[cfg(not(unix))]
fn restore_previous_handlers() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_deferrals() {
        let outer = defer_signals();
        {
            let _inner = defer_signals();
            assert!(DEPTH.load(Ordering::SeqCst) >= 2);
        }
        assert!(DEPTH.load(Ordering::SeqCst) >= 1);
        drop(outer);
    }

    #[test]
    fn test_check_passes_without_signal() {
        let _deferral = defer_signals();
        assert!(check().is_ok());
    }
}
