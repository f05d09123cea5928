use std::any::Any;
use std::sync::Arc;

use qrgen_states::{State, assign_impl};

use crate::{EhttpFetcher, FetchService};

/// Network access as a state, so commands resolve it like any other dependency.
#[derive(Debug, Clone)]
pub struct FetchState {
    pub inner: Arc<dyn FetchService>,
}

impl FetchState {
    pub fn new(service: impl FetchService + 'static) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }
}

impl Default for FetchState {
    fn default() -> Self {
        Self::new(EhttpFetcher)
    }
}

impl State for FetchState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        assign_impl(self, new_self);
    }
}
