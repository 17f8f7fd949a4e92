// src/kernel/entity.rs

//! Addressable actors and the context handed to their handlers.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

use crate::errors::{Result, WfsimError};
use crate::kernel::event::{Event, WorkflowEvent};
use crate::kernel::queue::EventQueue;
use crate::kernel::world::World;
use crate::kernel::{EntityId, SimTime};

/// An actor registered with the kernel.
///
/// Handlers run to completion before the next event is popped. They never
/// block: to "wait", an entity schedules a future event for itself.
pub trait Entity: Any {
    /// Human-readable name used in logs and error messages.
    fn name(&self) -> &str;

    /// Called once before the entity receives its first event.
    fn start(&mut self, _ctx: &mut SimContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Handle a single event addressed to this entity.
    fn process_event(&mut self, event: Event, ctx: &mut SimContext<'_>) -> Result<()>;

    /// Called once when the event queue first runs dry.
    ///
    /// Events scheduled here are processed before the run ends.
    fn drain(&mut self, _ctx: &mut SimContext<'_>) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Entity table owned by the simulation.
///
/// An entity is taken out of its slot while its handler runs, so a handler
/// never aliases itself through the table.
#[derive(Default)]
pub(crate) struct EntityTable {
    slots: Vec<Option<Box<dyn Entity>>>,
    names: Vec<String>,
    unstarted: VecDeque<EntityId>,
}

impl EntityTable {
    pub(crate) fn register(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let id = EntityId(self.slots.len());
        self.names.push(entity.name().to_string());
        self.slots.push(Some(entity));
        self.unstarted.push_back(id);
        id
    }

    pub(crate) fn take(&mut self, id: EntityId) -> Result<Box<dyn Entity>> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(WfsimError::UnknownEntity(id))
    }

    pub(crate) fn restore(&mut self, id: EntityId, entity: Box<dyn Entity>) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = Some(entity);
        }
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.slots.get(id.0)?.as_deref()
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        self.slots.get_mut(id.0)?.as_deref_mut()
    }

    pub(crate) fn name(&self, id: EntityId) -> &str {
        self.names.get(id.0).map(String::as_str).unwrap_or("external")
    }

    pub(crate) fn next_unstarted(&mut self) -> Option<EntityId> {
        self.unstarted.pop_front()
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        (0..self.slots.len()).map(EntityId).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

impl fmt::Debug for EntityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTable")
            .field("names", &self.names)
            .field("unstarted", &self.unstarted)
            .finish_non_exhaustive()
    }
}

/// View of the kernel handed to an entity while one of its hooks runs.
pub struct SimContext<'a> {
    me: EntityId,
    now: SimTime,
    queue: &'a mut EventQueue,
    entities: &'a mut EntityTable,
    world: &'a mut World,
}

impl<'a> SimContext<'a> {
    pub(crate) fn new(
        me: EntityId,
        now: SimTime,
        queue: &'a mut EventQueue,
        entities: &'a mut EntityTable,
        world: &'a mut World,
    ) -> Self {
        Self {
            me,
            now,
            queue,
            entities,
            world,
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Id of the entity whose hook is running.
    pub fn id(&self) -> EntityId {
        self.me
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// Schedule `payload` for `target` after `delay` seconds.
    pub fn send(&mut self, target: EntityId, delay: SimTime, payload: WorkflowEvent) -> Result<()> {
        self.queue.schedule(self.now, self.me, target, delay, payload)
    }

    /// Schedule `payload` for `target` at the current time.
    pub fn send_now(&mut self, target: EntityId, payload: WorkflowEvent) {
        self.queue.insert(self.now, self.me, target, payload);
    }

    /// Schedule `payload` for the running entity itself.
    pub fn schedule_self(&mut self, delay: SimTime, payload: WorkflowEvent) -> Result<()> {
        self.send(self.me, delay, payload)
    }

    /// Register a new entity; it is started before the next event is
    /// dispatched.
    pub fn spawn<E: Entity>(&mut self, entity: E) -> EntityId {
        self.entities.register(Box::new(entity))
    }

    pub fn entity_name(&self, id: EntityId) -> &str {
        self.entities.name(id)
    }
}
