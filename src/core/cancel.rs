use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::error::EngineError;

/// Cooperative cancellation shared between a caller and a running engine
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once `cancel` has been called
    pub fn checkpoint(&self, stage: &str) -> Result<(), EngineError> {
        if self.is_cancelled() {
            tracing::info!("Run cancelled at {}", stage);
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let handle = flag.clone();
        assert!(flag.checkpoint("start").is_ok());

        handle.cancel();
        assert!(flag.is_cancelled());
        assert_eq!(flag.checkpoint("solve"), Err(EngineError::Cancelled));
    }
}
