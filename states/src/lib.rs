//! Small reactive state runtime shared by the business and UI crates.

mod basic_state;
mod command;
mod compute;
mod ctx;
mod dep;
mod error;
mod graph;
mod runtime;
mod state;
mod state_sync_status;
mod task;

pub use basic_state::Time;
pub use command::Command;
pub use compute::{Compute, ComputeDeps};
pub use ctx::StateCtx;
pub use dep::Dep;
pub use error::Error;
pub use graph::{DepRoute, Graph, TopologyError};
pub use runtime::{StateRuntime, Updater};
pub use state::{State, assign_impl};
pub use state_sync_status::StateSyncStatus;
pub use task::{GenerationCounter, TaskHandle, TaskId};
