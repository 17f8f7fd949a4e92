// src/kernel/simulation.rs

use std::fmt;

use tracing::{debug, info};

use crate::errors::{Result, WfsimError};
use crate::kernel::entity::{Entity, EntityTable, SimContext};
use crate::kernel::event::{Event, WorkflowEvent};
use crate::kernel::queue::EventQueue;
use crate::kernel::world::World;
use crate::kernel::{EntityId, SimTime};

/// Lifecycle of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Entities and initial events are being registered.
    Init,
    /// Events are being processed.
    Running,
    /// The queue ran dry after the drain hooks; the run is over.
    Finished,
}

/// Totals reported when [`Simulation::run`] returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub end_time: SimTime,
    pub events_processed: u64,
}

/// Simulation context: virtual clock, event queue, entity table and the
/// VM/job arena.
///
/// Lifecycle is `new` (init) -> [`run`](Self::run) -> drain. Handlers run
/// one at a time to completion; the clock only moves when the next event
/// is popped.
pub struct Simulation {
    clock: SimTime,
    queue: EventQueue,
    entities: EntityTable,
    world: World,
    phase: Phase,
    drained: bool,
    events_processed: u64,
    trace: blake3::Hasher,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("clock", &self.clock)
            .field("phase", &self.phase)
            .field("pending_events", &self.queue.len())
            .field("entities", &self.entities)
            .field("events_processed", &self.events_processed)
            .finish_non_exhaustive()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            queue: EventQueue::new(),
            entities: EntityTable::default(),
            world: World::new(),
            phase: Phase::Init,
            drained: false,
            events_processed: 0,
            trace: blake3::Hasher::new(),
        }
    }

    /// Register an entity. It is started when the run begins (or before the
    /// next dispatch if the run is already in progress).
    pub fn add_entity<E: Entity>(&mut self, entity: E) -> EntityId {
        let id = self.entities.register(Box::new(entity));
        debug!(entity = %id, name = self.entities.name(id), "entity registered");
        id
    }

    /// Inject an event from outside the simulation.
    pub fn send(&mut self, target: EntityId, delay: SimTime, payload: WorkflowEvent) -> Result<()> {
        self.queue
            .schedule(self.clock, EntityId::EXTERNAL, target, delay, payload)
    }

    /// Inject an event on behalf of a registered entity.
    pub fn send_from(
        &mut self,
        source: EntityId,
        target: EntityId,
        delay: SimTime,
        payload: WorkflowEvent,
    ) -> Result<()> {
        self.queue.schedule(self.clock, source, target, delay, payload)
    }

    pub fn clock(&self) -> SimTime {
        self.clock
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Typed access to a registered entity.
    pub fn entity<E: Entity>(&self, id: EntityId) -> Option<&E> {
        self.entities.get(id)?.as_any().downcast_ref::<E>()
    }

    pub fn entity_mut<E: Entity>(&mut self, id: EntityId) -> Option<&mut E> {
        self.entities.get_mut(id)?.as_any_mut().downcast_mut::<E>()
    }

    /// Hex digest over every dispatched event (time, source, target, tag).
    ///
    /// Two runs from identical inputs produce identical digests.
    pub fn trace_digest(&self) -> String {
        self.trace.finalize().to_hex().to_string()
    }

    /// Process every event up to and including time `until`, without
    /// draining. The clock is left at the last processed event.
    pub fn run_until(&mut self, until: SimTime) -> Result<()> {
        self.ensure_not_finished()?;
        self.phase = Phase::Running;
        self.start_pending()?;
        while self.queue.peek_time().is_some_and(|t| t <= until) {
            self.step()?;
        }
        Ok(())
    }

    /// Run until the queue is empty, invoke every entity's drain hook once,
    /// then run until the queue is empty again.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.ensure_not_finished()?;
        self.phase = Phase::Running;
        info!(entities = self.entities.len(), "simulation started");

        self.start_pending()?;
        self.process_queue()?;

        if !self.drained {
            self.drained = true;
            debug!(clock = self.clock, "event queue empty; draining entities");
            for id in self.entities.ids() {
                self.with_entity(id, |entity, ctx| entity.drain(ctx))?;
            }
            self.process_queue()?;
        }

        self.phase = Phase::Finished;
        info!(
            clock = self.clock,
            events = self.events_processed,
            "simulation finished"
        );

        Ok(RunSummary {
            end_time: self.clock,
            events_processed: self.events_processed,
        })
    }

    fn ensure_not_finished(&self) -> Result<()> {
        if self.phase == Phase::Finished {
            return Err(WfsimError::Other(anyhow::anyhow!(
                "simulation already finished"
            )));
        }
        Ok(())
    }

    fn process_queue(&mut self) -> Result<()> {
        self.start_pending()?;
        while !self.queue.is_empty() {
            self.step()?;
        }
        Ok(())
    }

    /// Pop and dispatch exactly one event.
    fn step(&mut self) -> Result<()> {
        let Some(event) = self.queue.pop() else {
            return Ok(());
        };

        self.clock = event.time;
        self.events_processed += 1;
        self.record(&event);

        let target = event.target;
        debug!(
            time = event.time,
            source = self.entities.name(event.source),
            target = self.entities.name(target),
            event = event.payload.name(),
            "dispatching event"
        );
        self.with_entity(target, |entity, ctx| entity.process_event(event, ctx))?;
        self.start_pending()
    }

    fn start_pending(&mut self) -> Result<()> {
        while let Some(id) = self.entities.next_unstarted() {
            self.with_entity(id, |entity, ctx| entity.start(ctx))?;
        }
        Ok(())
    }

    fn with_entity<F>(&mut self, id: EntityId, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Entity, &mut SimContext<'_>) -> Result<()>,
    {
        let mut entity = self.entities.take(id)?;
        let mut ctx = SimContext::new(
            id,
            self.clock,
            &mut self.queue,
            &mut self.entities,
            &mut self.world,
        );
        let result = f(entity.as_mut(), &mut ctx);
        self.entities.restore(id, entity);
        result
    }

    fn record(&mut self, event: &Event) {
        self.trace.update(&event.time.to_bits().to_le_bytes());
        self.trace.update(&(event.source.0 as u64).to_le_bytes());
        self.trace.update(&(event.target.0 as u64).to_le_bytes());
        self.trace.update(&event.payload.tag().to_le_bytes());
    }
}
