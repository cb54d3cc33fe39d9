//! Thread-safe queue for actions produced away from the main thread.
//!
//! Edits to a document are applied on the main thread only. Script bridges
//! and background jobs that finish work on a worker thread push the
//! resulting actions into an [`ActionQueue`]; the main thread drains it
//! between frames and runs each action through
//! [`EditActionHistory::execute`](super::EditActionHistory::execute).

use std::fmt;

use parking_lot::Mutex;

use super::action::{EditAction, Editable};

/// A thread-safe queue of pending [`EditAction`]s.
///
/// [`push()`](Self::push) only needs `&self`, so the queue can be shared
/// through an `Arc` with any number of producers.
pub struct ActionQueue<T: Editable> {
    queue: Mutex<Vec<Box<dyn EditAction<T>>>>,
}

impl<T: Editable> ActionQueue<T> {
    /// Creates a new empty action queue.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Enqueues an action.
    pub fn push(&self, action: Box<dyn EditAction<T>>) {
        self.queue.lock().push(action);
    }

    /// Drains all queued actions in submission order.
    pub fn drain(&self) -> Vec<Box<dyn EditAction<T>>> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Number of queued actions.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns `true` if there are no queued actions.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T: Editable> Default for ActionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Editable> fmt::Debug for ActionQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("pending", &self.len())
            .finish()
    }
}
