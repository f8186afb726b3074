use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Cooperative stop signal shared by the orchestrator and its workers.
///
/// Workers check it between items: the item in hand is finished, nothing new is
/// started. In-flight external calls are never aborted. The flag stays set until
/// [`ShutdownHandle::resume`] is called.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    stopping: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        if !self.stopping.swap(true, Ordering::SeqCst) {
            info!("🛑 SHUTDOWN: Stop requested, workers will finish their current item");
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Clear a previous stop request so later batches run normally
    pub fn resume(&self) {
        self.stopping.store(false, Ordering::SeqCst);
    }
}
