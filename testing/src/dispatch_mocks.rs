//! Dispatcher double that records actions instead of reducing them

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use synced_todo_runtime::{Dispatch, StoreError};

/// Records every dispatched action, in order.
///
/// Lets domain operations be tested without a running store: assert on
/// [`actions`](Self::actions) to check whether (and what) an operation
/// dispatched. [`reject_all`](Self::reject_all) makes every dispatch fail as
/// if the store had been shut down.
#[derive(Debug)]
pub struct RecordingDispatcher<A> {
    actions: Arc<Mutex<Vec<A>>>,
    rejecting: Arc<AtomicBool>,
}

impl<A> RecordingDispatcher<A> {
    /// Create a dispatcher that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
            rejecting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail every later dispatch with [`StoreError::ShutdownInProgress`]
    pub fn reject_all(&self) {
        self.rejecting.store(true, Ordering::SeqCst);
    }

    /// Number of accepted actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.lock().unwrap().len()
    }

    /// Whether nothing has been dispatched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Clone> RecordingDispatcher<A> {
    /// Accepted actions in dispatch order
    #[must_use]
    pub fn actions(&self) -> Vec<A> {
        self.actions.lock().unwrap().clone()
    }
}

impl<A> Default for RecordingDispatcher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for RecordingDispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            actions: Arc::clone(&self.actions),
            rejecting: Arc::clone(&self.rejecting),
        }
    }
}

impl<A: Send + 'static> Dispatch<A> for RecordingDispatcher<A> {
    fn dispatch(&self, action: A) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let result = if self.rejecting.load(Ordering::SeqCst) {
            Err(StoreError::ShutdownInProgress)
        } else {
            self.actions.lock().unwrap().push(action);
            Ok(())
        };
        Box::pin(std::future::ready(result))
    }
}
