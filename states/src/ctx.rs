use std::{
    any::{Any, TypeId, type_name},
    collections::{BTreeMap, VecDeque},
};

use crate::{
    Command, Compute, Dep, Error, State, StateRuntime, StateSyncStatus, TopologyError, Updater,
};

#[derive(Debug)]
pub(crate) struct ComputeSlot {
    pub(crate) compute: Box<dyn Compute>,
    pub(crate) status: StateSyncStatus,
}

/// Owner of every state, compute and command of the app.
///
/// A frame goes through three steps:
/// 1. the UI reads states/computes and edits states (`state_mut`, `update`),
///    dispatching commands for user intents;
/// 2. [`StateCtx::sync_computes`] applies whatever commands and callbacks sent
///    through the [`Updater`];
/// 3. [`StateCtx::run_all_dirty`] reruns computes whose dependencies changed.
#[derive(Debug, Default)]
pub struct StateCtx {
    runtime: StateRuntime,

    states: BTreeMap<TypeId, Box<dyn State>>,
    computes: BTreeMap<TypeId, ComputeSlot>,
    commands: BTreeMap<TypeId, Box<dyn Command>>,

    command_queue: VecDeque<TypeId>,
}

impl StateCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state<T: State>(&mut self, state: T) {
        let id = TypeId::of::<T>();
        self.states.insert(id, Box::new(state));
        self.mark_dependents_dirty(id);
    }

    /// Registers (or replaces) a compute. It runs on the next `run_all_dirty`.
    pub fn record_compute<T: Compute>(&mut self, compute: T) {
        let id = TypeId::of::<T>();
        if !self.computes.contains_key(&id) {
            let (state_ids, compute_ids) = compute.deps();
            self.runtime
                .record(id, state_ids.iter().chain(compute_ids).copied());
        }
        self.computes.insert(
            id,
            ComputeSlot {
                compute: Box::new(compute),
                status: StateSyncStatus::BeforeInit,
            },
        );
    }

    /// Registers (or replaces) a command instance, arguments included.
    pub fn record_command<T: Command>(&mut self, command: T) {
        self.commands.insert(TypeId::of::<T>(), Box::new(command));
    }

    pub fn state<T: State>(&self) -> Option<&T> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|state| state.as_any().downcast_ref::<T>())
    }

    /// Mutable access without dirty tracking. Use [`StateCtx::update`] when
    /// computes must observe the change.
    ///
    /// # Panics
    /// Panics if the state type is not registered.
    pub fn state_mut<T: State>(&mut self) -> &mut T {
        self.states
            .get_mut(&TypeId::of::<T>())
            .and_then(|state| state.as_any_mut().downcast_mut::<T>())
            .unwrap_or_else(|| panic!("State {} is not registered", type_name::<T>()))
    }

    /// Edits a state in place and marks its dependents dirty.
    pub fn update<T: State>(&mut self, edit: impl FnOnce(&mut T)) {
        edit(self.state_mut::<T>());
        self.mark_dependents_dirty(TypeId::of::<T>());
    }

    pub fn cached<T: Compute>(&self) -> Option<&T> {
        self.computes
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.compute.as_any().downcast_ref::<T>())
    }

    pub fn updater(&self) -> Updater {
        self.runtime.updater()
    }

    pub fn runtime(&self) -> &StateRuntime {
        &self.runtime
    }

    pub fn sync_status<T: Compute>(&self) -> Option<StateSyncStatus> {
        self.computes.get(&TypeId::of::<T>()).map(|slot| slot.status)
    }

    pub fn mark_dirty<T: Any>(&mut self) {
        if let Some(slot) = self.computes.get_mut(&TypeId::of::<T>()) {
            slot.status = StateSyncStatus::Dirty;
        }
    }

    fn mark_dependents_dirty(&mut self, id: TypeId) {
        for dependent in self.runtime.dependents(id) {
            if let Some(slot) = self.computes.get_mut(&dependent) {
                slot.status = StateSyncStatus::Dirty;
            }
        }
    }

    /// Applies every pending update, in the order it was sent.
    pub fn sync_computes(&mut self) {
        let updates: Vec<_> = self.runtime.drain().collect();
        for update in updates {
            if let Some(slot) = self.computes.get_mut(&update.target) {
                slot.compute.assign_box(update.payload);
            } else if let Some(state) = self.states.get_mut(&update.target) {
                state.assign_box(update.payload);
            } else {
                log::warn!("Update for unregistered {} dropped", update.target_name);
                continue;
            }
            self.mark_dependents_dirty(update.target);
        }
    }

    /// Runs every compute that is dirty or never ran.
    pub fn run_all_dirty(&mut self) {
        let dirty: Vec<TypeId> = self
            .computes
            .iter_mut()
            .filter(|(_, slot)| slot.status != StateSyncStatus::Clean)
            .map(|(id, slot)| {
                slot.status = StateSyncStatus::Clean;
                *id
            })
            .collect();

        let dep = Dep::new(&self.states, &self.computes);
        for id in dirty {
            if let Some(slot) = self.computes.get(&id) {
                slot.compute.compute(dep, self.runtime.updater());
            }
        }
    }

    pub fn enqueue_command<T: Command>(&mut self) {
        self.command_queue.push_back(TypeId::of::<T>());
    }

    pub fn flush_commands(&mut self) {
        while let Some(id) = self.command_queue.pop_front() {
            if let Err(err) = self.run_command(id, "queued command") {
                log::error!("{err}");
            }
        }
    }

    /// Runs the registered `T` now. Its effects land on the next sync.
    pub fn dispatch<T: Command>(&self) {
        if let Err(err) = self.try_dispatch::<T>() {
            log::error!("{err}");
        }
    }

    pub fn try_dispatch<T: Command>(&self) -> Result<(), Error> {
        self.run_command(TypeId::of::<T>(), type_name::<T>())
    }

    fn run_command(&self, id: TypeId, context: &str) -> Result<(), Error> {
        let command = self
            .commands
            .get(&id)
            .ok_or_else(|| Error::command_not_found(id, context))?;
        command.run(Dep::new(&self.states, &self.computes), self.runtime.updater());
        Ok(())
    }

    pub fn verify_deps(&mut self) -> Result<(), TopologyError<TypeId>> {
        self.runtime.verify_deps()
    }
}
