//! Process-wide suppression of the broken-pipe signal.
//!
//! Writing to a channel whose peer has gone away raises SIGPIPE on unix,
//! and the signal disposition is process-global. Writers may run
//! concurrently on several runtime threads, so a scoped mask-and-restore
//! would let one writer's restore un-mask the signal under another still
//! mid-write. The disposition is therefore set to ignore once, at first
//! writer construction, and never restored; a dead peer then surfaces as
//! an `EPIPE` io error.

#[cfg(unix)]
pub(crate) fn ignore_sigpipe() {
    use std::sync::Once;

    static IGNORE: Once = Once::new();

    IGNORE.call_once(|| {
        // SAFETY: SIG_IGN is a valid disposition for SIGPIPE.
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_IGN);
        }
    });
}

#[cfg(not(unix))]
pub(crate) fn ignore_sigpipe() {}
