use std::{
    any::{TypeId, type_name},
    collections::BTreeMap,
};

use crate::{Compute, Error, State, ctx::ComputeSlot};

/// Read-only view over the registered states and computes.
///
/// Handed to [`Compute::compute`] and [`crate::Command::run`].
#[derive(Clone, Copy)]
pub struct Dep<'a> {
    states: &'a BTreeMap<TypeId, Box<dyn State>>,
    computes: &'a BTreeMap<TypeId, ComputeSlot>,
}

impl<'a> Dep<'a> {
    pub(crate) fn new(
        states: &'a BTreeMap<TypeId, Box<dyn State>>,
        computes: &'a BTreeMap<TypeId, ComputeSlot>,
    ) -> Self {
        Self { states, computes }
    }

    pub fn try_state<T: State>(&self) -> Result<&'a T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|state| state.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::state_not_found(TypeId::of::<T>(), type_name::<T>()))
    }

    pub fn try_compute<T: Compute>(&self) -> Result<&'a T, Error> {
        self.computes
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.compute.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::compute_not_found(TypeId::of::<T>(), type_name::<T>()))
    }

    /// # Panics
    /// Panics if the state type is not registered.
    pub fn get_state_ref<T: State>(&self) -> &'a T {
        self.try_state::<T>().unwrap_or_else(|err| panic!("{err}"))
    }

    /// # Panics
    /// Panics if the compute type is not registered.
    pub fn get_compute_ref<T: Compute>(&self) -> &'a T {
        self.try_compute::<T>().unwrap_or_else(|err| panic!("{err}"))
    }
}
