//! Cooperative cancellation of long running fits and searches
//!
//! A [`CancelFlag`] can be cloned and handed to another thread. Iterative algorithms check it between iterations
//! and return [`BeamError::SearchCancelled`] once it is set.
use crate::error::{BeamError, BeamResult};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared flag requesting the cancellation of a running computation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Request cancellation. All clones of this flag see the request.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    /// Clear a previous cancellation request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
    /// Returns `true` if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
    /// Returns [`BeamError::SearchCancelled`] if cancellation was requested.
    ///
    /// # Errors
    ///
    /// This function will return an error if the flag is set.
    pub fn check(&self) -> BeamResult<()> {
        if self.is_cancelled() {
            Err(BeamError::SearchCancelled)
        } else {
            Ok(())
        }
    }
}
