//! Executor that records calls and lets the test decide how each one ends.

use crate::executor::{CommandExecutor, Continuation};
use crate::types::NativeCall;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Entry {
    call: NativeCall,
    continuation: Option<Continuation>,
}

/// Records every [`NativeCall`] and parks its continuation.
///
/// Calls stay pending until the test resolves them by index with
/// [`succeed`](Self::succeed), [`fail`](Self::fail), or
/// [`abandon`](Self::abandon), in any order.
#[derive(Default)]
pub struct RecordingExecutor {
    entries: Mutex<Vec<Entry>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.entries().iter().map(|e| e.call.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Number of calls still waiting for a reply.
    pub fn pending(&self) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.continuation.is_some())
            .count()
    }

    /// Reply with success. Returns false if the call is unknown or already
    /// resolved.
    pub fn succeed(&self, index: usize, value: Value) -> bool {
        match self.take(index) {
            Some(continuation) => {
                continuation.success(value);
                true
            }
            None => false,
        }
    }

    pub fn fail(&self, index: usize, payload: Value) -> bool {
        match self.take(index) {
            Some(continuation) => {
                continuation.failure(payload);
                true
            }
            None => false,
        }
    }

    /// Drop the continuation without replying.
    pub fn abandon(&self, index: usize) -> bool {
        self.take(index).is_some()
    }

    // The lock is released before the caller replies, so a callback may
    // issue new calls through this executor.
    fn take(&self, index: usize) -> Option<Continuation> {
        self.entries()
            .get_mut(index)
            .and_then(|e| e.continuation.take())
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, call: NativeCall, continuation: Continuation) {
        self.entries().push(Entry {
            call,
            continuation: Some(continuation),
        });
    }
}
