use std::any::Any;

use chrono::{DateTime, Utc};

use crate::{State, assign_impl};

/// Wall clock as seen by the graph.
///
/// The UI advances it once per frame; computes that depend on time (timeouts,
/// minimum durations) read it instead of calling `Utc::now()` so tests can
/// drive time explicitly.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    virt: DateTime<Utc>,
}

impl Default for Time {
    fn default() -> Self {
        Self { virt: Utc::now() }
    }
}

impl Time {
    pub fn at(virt: DateTime<Utc>) -> Self {
        Self { virt }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.virt
    }
}

impl State for Time {
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

impl AsMut<DateTime<Utc>> for Time {
    fn as_mut(&mut self) -> &mut DateTime<Utc> {
        &mut self.virt
    }
}

impl AsRef<DateTime<Utc>> for Time {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.virt
    }
}
