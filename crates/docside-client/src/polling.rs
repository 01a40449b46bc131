//! Per-document poll cancellation registry.
//!
//! The coordinator tracks one outstanding poll loop per document id and lets
//! callers cancel it from outside. A cancellation flag is created when
//! polling starts and removed when the loop terminates for any reason, so
//! the registry never grows beyond the set of in-flight polls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Tracks active poll loops and their cancellation flags.
///
/// Two polls for the same id are not expected concurrently (caller
/// contract); registering an id again replaces the previous flag. Polls for
/// different ids are fully independent.
#[derive(Default)]
pub struct PollingCoordinator {
    active: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl PollingCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a poll loop for a document and return its cancellation flag.
    pub(crate) fn register(&self, document_id: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.active
            .lock()
            .expect("poll registry poisoned")
            .insert(document_id.to_string(), flag.clone());
        debug!(
            subsystem = "polling",
            component = "coordinator",
            document_id,
            "Registered poll loop"
        );
        flag
    }

    /// Remove a document's entry once its poll loop terminated.
    pub(crate) fn finish(&self, document_id: &str) {
        self.active
            .lock()
            .expect("poll registry poisoned")
            .remove(document_id);
        debug!(
            subsystem = "polling",
            component = "coordinator",
            document_id,
            "Poll loop finished"
        );
    }

    /// Request cancellation of a document's poll loop.
    ///
    /// The next scheduled check inside that loop observes the flag and
    /// resolves the poll as cancelled instead of issuing another fetch.
    /// Returns false when no poll is active for the id.
    pub fn cancel(&self, document_id: &str) -> bool {
        let active = self.active.lock().expect("poll registry poisoned");
        match active.get(document_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                debug!(
                    subsystem = "polling",
                    component = "coordinator",
                    document_id,
                    "Cancellation requested"
                );
                true
            }
            None => false,
        }
    }

    /// Whether a poll loop is currently registered for the id.
    pub fn is_active(&self, document_id: &str) -> bool {
        self.active
            .lock()
            .expect("poll registry poisoned")
            .contains_key(document_id)
    }

    /// Number of currently registered poll loops.
    pub fn active_count(&self) -> usize {
        self.active.lock().expect("poll registry poisoned").len()
    }
}
