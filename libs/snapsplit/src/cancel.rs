//! Cooperative cancellation shared between a caller and a running operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{SnapSplitError, SnapSplitResult};

/// A cancellation flag checked between boolean steps.
///
/// Clones share the same flag.
///
/// # Example
///
/// ```rust
/// use snapsplit::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns [`SnapSplitError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> SnapSplitResult<()> {
        if self.is_cancelled() {
            Err(SnapSplitError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_passes() {
        assert!(CancelToken::new().check().is_ok());
    }

    #[test]
    fn test_cancel_visible_across_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert_eq!(token.check(), Err(SnapSplitError::Cancelled));
    }
}
