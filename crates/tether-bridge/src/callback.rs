use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tether_wire::Callback;

use crate::error::BridgeError;

/// Tracks outstanding asynchronous invocations awaiting host completion.
///
/// When the kernel suspends an override-declared method it hands the host a
/// pending [`Callback`]. The host must complete each cbid exactly once;
/// this registry is what makes "exactly once" checkable. The full dispatch
/// scheduler is a bounded extension point on top of this registry, not part
/// of this core.
#[derive(Default)]
pub struct CallbackRegistry {
    pending: Mutex<HashMap<String, Callback>>,
    completed: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a callback the kernel reported as pending.
    pub fn register(&self, callback: Callback) -> Result<(), BridgeError> {
        if lock(&self.completed).contains(&callback.cbid) {
            return Err(BridgeError::ContractViolation(format!(
                "callback {} was already completed",
                callback.cbid
            )));
        }

        let mut pending = lock(&self.pending);
        if pending.contains_key(&callback.cbid) {
            return Err(BridgeError::ContractViolation(format!(
                "callback {} is already pending",
                callback.cbid
            )));
        }

        tracing::debug!(cbid = %callback.cbid, method = %callback.method, "Callback pending");
        pending.insert(callback.cbid.clone(), callback);
        Ok(())
    }

    /// Snapshot of all callbacks still awaiting completion.
    pub fn pending(&self) -> Vec<Callback> {
        let mut callbacks: Vec<Callback> = lock(&self.pending).values().cloned().collect();
        callbacks.sort_by(|a, b| a.cbid.cmp(&b.cbid));
        callbacks
    }

    pub fn is_completed(&self, cbid: &str) -> bool {
        lock(&self.completed).contains(cbid)
    }

    /// Mark a cbid as completed. Called after the kernel accepted the
    /// completion; from here on any further completion of the same cbid is
    /// a contract violation.
    pub fn mark_completed(&self, cbid: &str) {
        lock(&self.pending).remove(cbid);
        lock(&self.completed).insert(cbid.to_string());
    }
}
