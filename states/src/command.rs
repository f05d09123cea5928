use std::any::Any;
use std::fmt::Debug;

use crate::{Dep, Updater};

/// A user intent executed against the current states and computes.
///
/// Commands carrying arguments are registered with their values through
/// [`crate::StateCtx::record_command`] and then dispatched by type.
pub trait Command: Any + Debug {
    fn run(&self, deps: Dep<'_>, updater: Updater);
}
