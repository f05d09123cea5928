//! Identity and cancellation for async work started by commands.
//!
//! Each request a command starts gets a [`TaskId`] (the owning type plus a
//! monotonically increasing generation) and a [`TaskHandle`] wrapping a
//! `tokio_util` [`CancellationToken`]. Starting newer work cancels the older
//! handle; callbacks check the token before publishing, and receivers compare
//! generations, so a late response can never replace a newer one.

use std::any::TypeId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    type_id: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(type_id: TypeId, generation: u64) -> Self {
        Self {
            type_id,
            generation,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Higher values were started later.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Cooperative: the task only stops publishing once it observes the token.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Shared generation source for one owner type.
///
/// Clones share the counter, so a value copied into a command snapshot still
/// hands out unique generations.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    next: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Returns the next generation, starting at 1.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Allocates a fresh handle for `T`.
    pub fn spawn_handle<T: 'static>(&self) -> TaskHandle {
        TaskHandle::new(
            TaskId::new(TypeId::of::<T>(), self.next()),
            CancellationToken::new(),
        )
    }
}
