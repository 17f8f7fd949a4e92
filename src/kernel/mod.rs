// src/kernel/mod.rs

//! Discrete-event simulation kernel.
//!
//! - [`queue`] holds the timestamp-ordered event queue (FIFO on ties).
//! - [`event`] defines the workflow event protocol exchanged by entities.
//! - [`entity`] defines the [`Entity`] trait and the [`SimContext`] handed
//!   to handlers.
//! - [`world`] is the arena of VM and job records addressed by handle.
//! - [`simulation`] owns all of the above and drives `init -> run -> drain`.
//!
//! Nothing outside this module can advance the clock.

use std::fmt;

pub mod entity;
pub mod event;
pub mod queue;
pub mod simulation;
pub mod world;

pub use entity::{Entity, SimContext};
pub use event::{Event, WorkflowEvent};
pub use queue::EventQueue;
pub use simulation::{Phase, RunSummary, Simulation};
pub use world::World;

/// Simulated time in seconds.
pub type SimTime = f64;

/// Handle of an entity registered with a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

impl EntityId {
    /// Source used for events injected from outside the simulation.
    pub const EXTERNAL: EntityId = EntityId(usize::MAX);

    pub fn is_external(self) -> bool {
        self == Self::EXTERNAL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_external() {
            write!(f, "external")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
