use std::any::Any;

use wfsim::errors::Result;
use wfsim::kernel::{Entity, EntityId, Event, SimContext, SimTime, WorkflowEvent};

/// An event as observed by a [`Probe`].
#[derive(Debug, Clone)]
pub struct Received {
    pub time: SimTime,
    pub source: EntityId,
    pub tag: i32,
    pub payload: WorkflowEvent,
}

/// A fake entity that:
/// - sends a scripted list of events when the simulation starts
/// - records every event it receives, with the receive time.
pub struct Probe {
    name: String,
    script: Vec<(SimTime, EntityId, WorkflowEvent)>,
    received: Vec<Received>,
}

impl Probe {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Vec::new(),
            received: Vec::new(),
        }
    }

    /// Send `payload` to `target` `delay` seconds after start.
    pub fn send_at(mut self, delay: SimTime, target: EntityId, payload: WorkflowEvent) -> Self {
        self.script.push((delay, target, payload));
        self
    }

    pub fn received(&self) -> &[Received] {
        &self.received
    }

    pub fn tags(&self) -> Vec<i32> {
        self.received.iter().map(|r| r.tag).collect()
    }

    /// Receive times of every event carrying `tag`.
    pub fn times_of(&self, tag: i32) -> Vec<SimTime> {
        self.received
            .iter()
            .filter(|r| r.tag == tag)
            .map(|r| r.time)
            .collect()
    }
}

impl Entity for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, ctx: &mut SimContext<'_>) -> Result<()> {
        for (delay, target, payload) in self.script.drain(..) {
            ctx.send(target, delay, payload)?;
        }
        Ok(())
    }

    fn process_event(&mut self, event: Event, _ctx: &mut SimContext<'_>) -> Result<()> {
        self.received.push(Received {
            time: event.time,
            source: event.source,
            tag: event.payload.tag(),
            payload: event.payload,
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
