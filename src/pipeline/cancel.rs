//! Cooperative cancellation for pipeline runs
//!
//! The caller signals via a cancellation token. The pipeline checks the
//! token at the checkpoint after each stage; a cancelled run returns no
//! hierarchy and nothing partial escapes.

use crate::error::{ConceptError, ConceptResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation token.
///
/// Cancellation while a stage is running has no effect until the next
/// checkpoint.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Checkpoint after `stage`: fails with `Cancelled` once signalled.
    pub fn checkpoint(&self, stage: &'static str) -> ConceptResult<()> {
        if self.is_cancelled() {
            tracing::info!(stage, "pipeline cancelled");
            return Err(ConceptError::Cancelled { stage });
        }
        Ok(())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_uncancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn test_cloned_token_shares_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_checkpoint_reports_stage() {
        let token = CancellationToken::new();
        assert!(token.checkpoint("merge").is_ok());
        token.cancel();
        assert!(matches!(
            token.checkpoint("merge"),
            Err(ConceptError::Cancelled { stage: "merge" })
        ));
    }
}
