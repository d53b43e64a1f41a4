//! Sync requests from storage to its owner.
//!
//! Backends call [`SyncRequest::request_sync`] after every change. The
//! owner decides when the actual write happens.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Something that can be told a sync is needed.
pub trait SyncRequest: Send + Sync {
    fn request_sync(&self);
}

/// Pending-sync flag shared between backends and their owner.
#[derive(Debug, Default)]
pub struct SyncSignal {
    pending: AtomicBool,
    requests: AtomicU64,
}

impl SyncSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a sync was requested and not yet taken.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clear the pending flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Set the pending flag again after a sync failed.
    pub fn request_again(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Total number of requests received.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl SyncRequest for SyncSignal {
    fn request_sync(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_signal_is_idle() {
        let signal = SyncSignal::new();
        assert!(!signal.is_pending());
        assert_eq!(signal.request_count(), 0);
    }

    #[test]
    fn requests_coalesce_until_taken() {
        let signal = SyncSignal::new();
        signal.request_sync();
        signal.request_sync();

        assert!(signal.is_pending());
        assert_eq!(signal.request_count(), 2);
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn request_again_does_not_count() {
        let signal = SyncSignal::new();
        signal.request_again();

        assert!(signal.is_pending());
        assert_eq!(signal.request_count(), 0);
    }
}
