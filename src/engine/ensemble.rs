// src/engine/ensemble.rs

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::dag::Dag;
use crate::engine::DagJob;
use crate::engine::listeners::DagJobListener;
use crate::errors::Result;
use crate::jobs::WorkflowId;
use crate::kernel::{Entity, EntityId, Event, SimContext, SimTime, WorkflowEvent};

/// A DAG waiting to be admitted.
#[derive(Debug, Clone)]
pub struct DagAdmission {
    pub dag: Arc<Dag>,
    pub priority: i32,
    pub submit_at: SimTime,
}

/// Admits a list of DAGs into one workflow engine and tells its listeners
/// when each DAG starts and finishes.
///
/// DAGs registered before the run are submitted at their `submit_at` time.
/// A `DAG_SUBMIT` sent to the manager while the run is in progress is
/// forwarded to the engine the same way.
pub struct EnsembleManager {
    engine: EntityId,
    admissions: Vec<DagAdmission>,
    listeners: Vec<Box<dyn DagJobListener>>,
    started: BTreeMap<WorkflowId, DagJob>,
    finished: BTreeMap<WorkflowId, DagJob>,
}

impl fmt::Debug for EnsembleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnsembleManager")
            .field("engine", &self.engine)
            .field("admissions", &self.admissions.len())
            .field("started", &self.started.len())
            .field("finished", &self.finished.len())
            .finish_non_exhaustive()
    }
}

impl EnsembleManager {
    pub fn new(engine: EntityId) -> Self {
        Self {
            engine,
            admissions: Vec::new(),
            listeners: Vec::new(),
            started: BTreeMap::new(),
            finished: BTreeMap::new(),
        }
    }

    /// Admit `dag` at time 0.
    pub fn add_dag(&mut self, dag: Arc<Dag>, priority: i32) {
        self.add_dag_at(dag, priority, 0.0);
    }

    /// Admit `dag` at simulated time `submit_at`.
    pub fn add_dag_at(&mut self, dag: Arc<Dag>, priority: i32, submit_at: SimTime) {
        self.admissions.push(DagAdmission {
            dag,
            priority,
            submit_at,
        });
    }

    pub fn add_dag_job_listener(&mut self, listener: impl DagJobListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn admissions(&self) -> &[DagAdmission] {
        &self.admissions
    }

    pub fn started_dags(&self) -> impl Iterator<Item = &DagJob> {
        self.started.values()
    }

    pub fn finished_dags(&self) -> impl Iterator<Item = &DagJob> {
        self.finished.values()
    }

    pub fn num_started(&self) -> usize {
        self.started.len()
    }

    pub fn num_finished(&self) -> usize {
        self.finished.len()
    }

    /// Every started DAG has finished.
    pub fn all_finished(&self) -> bool {
        self.started.len() == self.finished.len()
    }
}

impl Entity for EnsembleManager {
    fn name(&self) -> &str {
        "ensemble"
    }

    fn start(&mut self, ctx: &mut SimContext<'_>) -> Result<()> {
        info!(dags = self.admissions.len(), "submitting ensemble");
        for admission in &self.admissions {
            ctx.schedule_self(
                admission.submit_at,
                WorkflowEvent::DagSubmit {
                    dag: admission.dag.clone(),
                    priority: admission.priority,
                },
            )?;
        }
        Ok(())
    }

    fn process_event(&mut self, event: Event, ctx: &mut SimContext<'_>) -> Result<()> {
        let now = ctx.now();
        match event.payload {
            submit @ WorkflowEvent::DagSubmit { .. } => {
                debug!(time = now, "forwarding DAG submission to engine");
                ctx.send_now(self.engine, submit);
            }
            WorkflowEvent::DagStarted(dag_job) => {
                if self.started.contains_key(&dag_job.workflow) {
                    return Ok(());
                }
                for listener in self.listeners.iter_mut() {
                    listener.dag_started(&dag_job, now);
                }
                self.started.insert(dag_job.workflow, dag_job);
            }
            WorkflowEvent::DagFinished(dag_job) => {
                if self.finished.contains_key(&dag_job.workflow) {
                    return Ok(());
                }
                for listener in self.listeners.iter_mut() {
                    listener.dag_finished(&dag_job, now);
                }
                self.finished.insert(dag_job.workflow, dag_job);
            }
            other => return Err(other.unknown_to(self.name())),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
