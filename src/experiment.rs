// src/experiment.rs

//! End-to-end experiment: wires storage, cloud, workflow engine and ensemble
//! manager into one simulation, runs it and evaluates the outcome against
//! budget and deadline.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cloud::{Cloud, VmSpec};
use crate::config::ExperimentConfig;
use crate::config::loader::{load_dag, resolve_dag_path};
use crate::dag::Dag;
use crate::engine::{DagAdmission, EngineSettings, EnsembleManager, WorkflowEngine};
use crate::errors::{Result, WfsimError};
use crate::kernel::{SimTime, Simulation};
use crate::policy::{Provisioner, Scheduler, static_vm_count};
use crate::report::{SimulationReport, WorkflowLog};
use crate::storage::{StorageManager, TransferModel, TransferStats};
use crate::types::{ProvisionerKind, SchedulerKind};

/// Run parameters of an experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSettings {
    pub label: String,
    pub budget: f64,
    /// Seconds of simulated time.
    pub deadline: SimTime,
    pub scheduler: SchedulerKind,
    pub provisioner: ProvisionerKind,
    pub vm: VmSpec,
    /// VMs launched at start by the aggressive provisioner.
    pub initial_vms: usize,
    pub storage: TransferModel,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            label: "experiment".to_string(),
            budget: 100.0,
            deadline: 36000.0,
            scheduler: SchedulerKind::default(),
            provisioner: ProvisionerKind::default(),
            vm: VmSpec::default(),
            initial_vms: 1,
            storage: TransferModel::default(),
        }
    }
}

impl ExperimentSettings {
    /// VM count of the static policy; `None` for the aggressive policy.
    pub fn planned_vms(&self) -> Option<usize> {
        match self.provisioner {
            ProvisionerKind::Static => Some(static_vm_count(
                self.budget,
                self.deadline,
                self.vm.price_per_hour(),
            )),
            ProvisionerKind::Aggressive => None,
        }
    }

    fn provisioner(&self) -> Provisioner {
        Provisioner::new(
            self.provisioner,
            self.budget,
            self.deadline,
            self.vm.price_per_hour(),
            self.initial_vms,
        )
    }
}

/// A configured ensemble run.
#[derive(Debug, Clone)]
pub struct Experiment {
    settings: ExperimentSettings,
    dags: Vec<DagAdmission>,
}

impl Experiment {
    pub fn new(settings: ExperimentSettings) -> Self {
        Self {
            settings,
            dags: Vec::new(),
        }
    }

    /// Build an experiment from a validated config, loading every DAG file
    /// relative to `config_dir`. Each `[[dag]]` entry is admitted `copies`
    /// times, sharing one parsed graph.
    pub fn from_config(cfg: &ExperimentConfig, config_dir: &Path) -> Result<Self> {
        let mut experiment = Experiment::new(cfg.settings());
        for entry in cfg.dag.iter() {
            let path = resolve_dag_path(config_dir, &entry.path);
            let dag = Arc::new(load_dag(&path)?);
            for _ in 0..entry.copies {
                experiment.add_dag_at(dag.clone(), entry.priority, entry.submit_at);
            }
        }
        Ok(experiment)
    }

    pub fn settings(&self) -> &ExperimentSettings {
        &self.settings
    }

    pub fn dags(&self) -> &[DagAdmission] {
        &self.dags
    }

    pub fn add_dag(&mut self, dag: Arc<Dag>, priority: i32) -> &mut Self {
        self.add_dag_at(dag, priority, 0.0)
    }

    pub fn add_dag_at(&mut self, dag: Arc<Dag>, priority: i32, submit_at: SimTime) -> &mut Self {
        self.dags.push(DagAdmission {
            dag,
            priority,
            submit_at,
        });
        self
    }

    /// Run the experiment and fail with [`WfsimError::DeadlineExceeded`]
    /// if the ensemble did not finish by the deadline.
    pub fn simulate(&self) -> Result<ExperimentResult> {
        let result = self.simulate_unchecked()?;
        result.ensure_deadline()?;
        Ok(result)
    }

    /// Run the experiment without evaluating the deadline.
    pub fn simulate_unchecked(&self) -> Result<ExperimentResult> {
        let settings = &self.settings;
        let log = Rc::new(RefCell::new(WorkflowLog::default()));
        let mut sim = Simulation::new();

        let storage_id = sim.add_entity(StorageManager::new(settings.storage));

        let mut cloud = Cloud::new(storage_id);
        cloud.add_listener(log.clone());
        let cloud_id = sim.add_entity(cloud);

        let mut engine = WorkflowEngine::new(
            cloud_id,
            EngineSettings {
                budget: settings.budget,
                deadline: settings.deadline,
                vm_spec: settings.vm,
            },
            Scheduler::new(settings.scheduler),
            settings.provisioner(),
        );
        engine.add_listener(log.clone());
        let engine_id = sim.add_entity(engine);

        let mut ensemble = EnsembleManager::new(engine_id);
        for admission in self.dags.iter() {
            ensemble.add_dag_at(admission.dag.clone(), admission.priority, admission.submit_at);
        }
        ensemble.add_dag_job_listener(log.clone());
        let ensemble_id = sim.add_entity(ensemble);

        info!(
            label = %settings.label,
            dags = self.dags.len(),
            scheduler = ?settings.scheduler,
            provisioner = ?settings.provisioner,
            "running experiment"
        );
        let summary = sim.run()?;

        let engine = sim
            .entity::<WorkflowEngine>(engine_id)
            .ok_or(WfsimError::UnknownEntity(engine_id))?;
        let ensemble = sim
            .entity::<EnsembleManager>(ensemble_id)
            .ok_or(WfsimError::UnknownEntity(ensemble_id))?;
        let cloud = sim
            .entity::<Cloud>(cloud_id)
            .ok_or(WfsimError::UnknownEntity(cloud_id))?;
        let storage = sim
            .entity::<StorageManager>(storage_id)
            .ok_or(WfsimError::UnknownEntity(storage_id))?;

        let result = ExperimentResult {
            label: settings.label.clone(),
            budget: settings.budget,
            deadline: settings.deadline,
            cost: engine.cost(),
            actual_finish_time: engine.actual_finish_time().unwrap_or(0.0),
            planned_vms: engine.provisioner().planned_vms(),
            dags_admitted: engine.all_dags().len(),
            dags_completed: ensemble.num_finished(),
            jobs_completed: sim.world().completed_jobs().count(),
            vms_launched: sim.world().vm_census().launched(),
            stale_vm_requests: cloud.stale_requests(),
            transfers: storage.stats(),
            end_time: summary.end_time,
            events_processed: summary.events_processed,
            trace_digest: sim.trace_digest(),
            report: SimulationReport::from_world(&settings.label, sim.world()),
            log: log.borrow().clone(),
        };

        if result.budget_exceeded() {
            warn!(cost = result.cost, budget = result.budget, "budget exceeded");
        }
        info!(
            cost = result.cost,
            finish = result.actual_finish_time,
            jobs = result.jobs_completed,
            "experiment finished"
        );
        Ok(result)
    }
}

/// Outcome of one simulated experiment.
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub label: String,
    pub budget: f64,
    pub deadline: SimTime,
    /// Total finalized VM billing.
    pub cost: f64,
    /// Latest DAG finish time (0 if no DAG finished).
    pub actual_finish_time: SimTime,
    /// VM count of the static policy.
    pub planned_vms: Option<usize>,
    pub dags_admitted: usize,
    pub dags_completed: usize,
    pub jobs_completed: usize,
    pub vms_launched: usize,
    pub stale_vm_requests: usize,
    pub transfers: TransferStats,
    /// Clock when the event queue ran dry (after draining).
    pub end_time: SimTime,
    pub events_processed: u64,
    pub trace_digest: String,
    pub report: SimulationReport,
    pub log: WorkflowLog,
}

impl ExperimentResult {
    pub fn all_dags_completed(&self) -> bool {
        self.dags_completed == self.dags_admitted
    }

    /// Cost is only checked after the run; exceeding the budget never stops
    /// a simulation.
    pub fn budget_exceeded(&self) -> bool {
        self.cost > self.budget
    }

    /// Every DAG finished, at or before the deadline.
    pub fn deadline_met(&self) -> bool {
        self.all_dags_completed() && self.actual_finish_time <= self.deadline
    }

    /// A DAG that never finished counts as finishing at infinity.
    pub fn ensure_deadline(&self) -> Result<()> {
        if self.deadline_met() {
            return Ok(());
        }
        let finish_time = if self.all_dags_completed() {
            self.actual_finish_time
        } else {
            SimTime::INFINITY
        };
        Err(WfsimError::DeadlineExceeded {
            finish_time,
            deadline: self.deadline,
        })
    }
}
