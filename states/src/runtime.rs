use std::any::{Any, TypeId, type_name};
use std::collections::BTreeSet;

use flume::{Receiver, Sender};

use crate::{Graph, TopologyError};

/// A value routed to the state or compute registered under `target`.
pub(crate) struct Update {
    pub(crate) target: TypeId,
    pub(crate) target_name: &'static str,
    pub(crate) payload: Box<dyn Any + Send>,
}

/// Sending half of the update channel.
///
/// Cheap to clone and `Send`, so it can be moved into HTTP callbacks.
#[derive(Clone, Debug)]
pub struct Updater {
    send: Sender<Update>,
}

impl Updater {
    /// Replaces the registered `T` with `value` on the next sync.
    pub fn set<T: Any + Send>(&self, value: T) {
        self.push::<T>(Box::new(value));
    }

    /// Hands `message` to `T::assign_box` on the next sync.
    ///
    /// Lets a compute accept typed events instead of full replacements, so
    /// updates sent from different callbacks never overwrite each other.
    pub fn notify<T: Any>(&self, message: impl Any + Send) {
        self.push::<T>(Box::new(message));
    }

    fn push<T: Any>(&self, payload: Box<dyn Any + Send>) {
        let update = Update {
            target: TypeId::of::<T>(),
            target_name: type_name::<T>(),
            payload,
        };
        if self.send.send(update).is_err() {
            log::warn!(
                "Update for {} dropped: state context is gone",
                type_name::<T>()
            );
        }
    }
}

impl std::fmt::Debug for Update {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Update")
            .field("target", &self.target_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct StateRuntime {
    send: Sender<Update>,
    recv: Receiver<Update>,

    graph: Graph<TypeId>,
}

impl Default for StateRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRuntime {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            send,
            recv,
            graph: Graph::new(),
        }
    }

    pub fn updater(&self) -> Updater {
        Updater {
            send: self.send.clone(),
        }
    }

    pub(crate) fn drain(&self) -> impl Iterator<Item = Update> + '_ {
        self.recv.try_iter()
    }

    /// Records the edges `dep -> compute` for every dependency of `compute`.
    pub fn record(&mut self, compute: TypeId, deps: impl IntoIterator<Item = TypeId>) {
        for dep in deps {
            self.graph.route_to(dep, compute, ());
        }
    }

    pub fn verify_deps(&mut self) -> Result<(), TopologyError<TypeId>> {
        self.graph.topology_sort()
    }

    /// Computes that directly read `id`.
    pub fn dependents(&self, id: TypeId) -> BTreeSet<TypeId> {
        self.graph.dependents(id)
    }
}
