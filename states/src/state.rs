use std::any::{Any, type_name};
use std::fmt::Debug;

/// A value owned by [`crate::StateCtx`] and edited directly by the UI.
///
/// States are the inputs of the graph: computes list the states they read in
/// [`crate::Compute::deps`] and are marked dirty when one of them changes.
pub trait State: Any + Debug {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Applies a value sent through [`crate::Updater`].
    ///
    /// Most states only accept a full replacement of themselves, see
    /// [`assign_impl`].
    fn assign_box(&mut self, new_self: Box<dyn Any + Send>);
}

/// Replaces `target` with `new_self` when the box holds a `T`.
///
/// Any other payload is logged and dropped.
pub fn assign_impl<T: Any>(target: &mut T, new_self: Box<dyn Any + Send>) {
    match new_self.downcast::<T>() {
        Ok(value) => *target = *value,
        Err(_) => log::warn!(
            "Dropped update for {}: payload has a different type",
            type_name::<T>()
        ),
    }
}
