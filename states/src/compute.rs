use std::any::{Any, TypeId};
use std::fmt::Debug;

use crate::{Dep, Updater};

/// `(state ids, compute ids)` a compute reads.
pub type ComputeDeps = (&'static [TypeId], &'static [TypeId]);

/// A derived value that is recomputed when one of its dependencies changes.
///
/// `compute` never mutates `self`: new values (or messages) are sent through
/// the [`Updater`] and applied by [`crate::StateCtx::sync_computes`] via
/// [`Compute::assign_box`]. This keeps async work (HTTP callbacks) and the UI
/// thread on the same path.
pub trait Compute: Any + Debug {
    fn deps(&self) -> ComputeDeps;

    fn compute(&self, deps: Dep<'_>, updater: Updater);

    fn as_any(&self) -> &dyn Any;

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>);
}
