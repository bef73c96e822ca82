use std::sync::atomic::{AtomicBool, Ordering};

// Set from the interrupt handler, never cleared.
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// The process-wide flag, for handing to `PingSession::run`.
pub fn stop_flag() -> &'static AtomicBool {
    &STOP_REQUESTED
}

/// Safe to call from a signal handler: a single atomic store.
pub fn request_stop() {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

pub fn stop_requested() -> bool {
    STOP_REQUESTED.load(Ordering::SeqCst)
}
