//! Cooperative cancellation between trajectory steps

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag an operator (signal handler, another thread) can raise to
/// stop a long run at the next step boundary
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the driver can run again
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
