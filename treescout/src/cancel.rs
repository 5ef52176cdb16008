use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{TreeError, TreeResult};

/// Cooperative cancellation flag shared between a caller and running work.
///
/// Builds and searches poll the token at every recursive step and before
/// every blocking I/O call. A child token observes its parent's cancellation
/// but can also be cancelled on its own without affecting the parent.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that is cancelled whenever this one is
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Returns `Err(TreeError::Cancelled)` once cancellation has been requested
    pub fn check(&self) -> TreeResult<()> {
        if self.is_cancelled() {
            Err(TreeError::Cancelled)
        } else {
            Ok(())
        }
    }
}
