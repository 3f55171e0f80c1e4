//==================================================
// File: runtime/abort.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Cooperative cancellation signal
// Objective: Let another thread request that an in-flight exec stop at its
//            next checkpoint, carrying a reason string
//==================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// Flag plus reason, observed by the interpreter at statement and loop checkpoints.
#[derive(Debug, Default)]
pub struct AbortSignal {
    requested: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, reason: impl Into<String>) {
        *self.reason.lock() = Some(reason.into());
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Consume a pending request. Only the first caller after `request` sees it.
    pub fn take(&self) -> Option<String> {
        if self.requested.swap(false, Ordering::AcqRel) {
            Some(self.reason.lock().take().unwrap_or_default())
        } else {
            None
        }
    }
}

/// Cloneable, thread-safe handle for requesting an abort.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    signal: Arc<AbortSignal>,
}

impl AbortHandle {
    pub(crate) fn new(signal: Arc<AbortSignal>) -> Self {
        Self { signal }
    }

    pub fn abort(&self, reason: impl Into<String>) {
        self.signal.request(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_take_consumes_request() {
        let signal = AbortSignal::new();
        assert_eq!(signal.take(), None);
        signal.request("stop now");
        assert!(signal.is_requested());
        assert_eq!(signal.take(), Some("stop now".to_string()));
        assert_eq!(signal.take(), None);
    }

    #[test]
    fn test_handle_crosses_threads() {
        let signal = Arc::new(AbortSignal::new());
        let handle = AbortHandle::new(Arc::clone(&signal));
        thread::spawn(move || handle.abort("from worker"))
            .join()
            .expect("worker thread");
        assert_eq!(signal.take(), Some("from worker".to_string()));
    }
}

//==================================================
// End of file
//==================================================
