//! At most one live session per scope.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use klaywallet_protocol::WalletError;

/// A region of the application that owns one wallet session.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SessionScope {
    claimed: Arc<AtomicBool>,
}

impl SessionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session created in this scope is still alive.
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    pub(crate) fn claim(&self) -> Result<ScopeGuard, WalletError> {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WalletError::SessionConfig("session already declared".into()))?;
        Ok(ScopeGuard {
            claimed: Arc::clone(&self.claimed),
        })
    }
}

/// Releases the scope when dropped.
#[derive(Debug)]
pub(crate) struct ScopeGuard {
    claimed: Arc<AtomicBool>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.claimed.store(false, Ordering::Release);
    }
}
