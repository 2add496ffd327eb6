use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::message::types::RequestId;

/// In-flight requests awaiting a response, at most one entry per id
#[derive(Default)]
pub(crate) struct PendingRequests {
    inner: Mutex<HashMap<RequestId, oneshot::Sender<Result<Value>>>>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a waiter under a freshly generated id that is not live
    pub(crate) fn register(&self, tx: oneshot::Sender<Result<Value>>) -> RequestId {
        let mut pending = self.inner.lock();
        loop {
            let id = RequestId::generate();
            if let Entry::Vacant(slot) = pending.entry(id.clone()) {
                slot.insert(tx);
                return id;
            }
        }
    }

    /// Remove the entry and hand it the outcome. Returns false when the id
    /// is unknown or already settled.
    pub(crate) fn settle(&self, id: &RequestId, outcome: Result<Value>) -> bool {
        match self.inner.lock().remove(id) {
            Some(tx) => {
                // Receiver gone means the caller stopped waiting; nothing to do.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&self, id: &RequestId) -> bool {
        self.inner.lock().remove(id).is_some()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: &RequestId) -> bool {
        self.inner.lock().contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

/// Removes the pending entry when the request future completes or is dropped
pub(crate) struct PendingGuard {
    pending: Arc<PendingRequests>,
    id: RequestId,
}

impl PendingGuard {
    pub(crate) fn new(pending: Arc<PendingRequests>, id: RequestId) -> Self {
        Self { pending, id }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}
