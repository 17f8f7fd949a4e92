// tests/cloud_lifecycle.rs

mod common;
use crate::common::fixtures::chain;
use crate::common::probe::Probe;
use crate::common::{TestResult, init_tracing};

use std::cell::RefCell;
use std::rc::Rc;

use wfsim::cloud::{Cloud, VmId, VmSpec, VmState, billed_cost};
use wfsim::dag::TaskIdx;
use wfsim::engine::VmPool;
use wfsim::errors::WfsimError;
use wfsim::jobs::{JobId, WorkflowId};
use wfsim::kernel::event::tags;
use wfsim::kernel::{EntityId, Simulation, WorkflowEvent};
use wfsim::report::{LogEntry, WorkflowLog};
use wfsim::storage::{StorageManager, TransferModel};

struct Harness {
    sim: Simulation,
    cloud: EntityId,
    log: Rc<RefCell<WorkflowLog>>,
}

/// Storage + cloud, with a lifecycle log attached to the cloud.
fn harness() -> Harness {
    let log = Rc::new(RefCell::new(WorkflowLog::default()));
    let mut sim = Simulation::new();
    let storage = sim.add_entity(StorageManager::new(TransferModel::Void));
    let mut cloud = Cloud::new(storage);
    cloud.add_listener(log.clone());
    let cloud = sim.add_entity(cloud);
    Harness { sim, cloud, log }
}

fn spec(price: f64, provisioning: f64, deprovisioning: f64) -> VmSpec {
    VmSpec {
        price,
        billing_unit: 3600.0,
        provisioning_delay: provisioning,
        deprovisioning_delay: deprovisioning,
        ..VmSpec::default()
    }
}

fn stale_count(h: &Harness) -> usize {
    h.sim
        .entity::<Cloud>(h.cloud)
        .expect("cloud registered")
        .stale_requests()
}

#[test]
fn billing_rounds_partial_units_up() {
    assert_eq!(billed_cost(0.0, 3600.0, 1.0), 0.0);
    assert_eq!(billed_cost(-5.0, 3600.0, 1.0), 0.0);
    assert_eq!(billed_cost(1.0, 3600.0, 1.0), 1.0);
    assert_eq!(billed_cost(3600.0, 3600.0, 1.0), 1.0);
    assert_eq!(billed_cost(3601.0, 3600.0, 2.5), 5.0);
    assert_eq!(billed_cost(7200.5, 3600.0, 1.0), 3.0);
}

#[test]
fn launch_and_terminate_reply_to_the_requester() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vm = h.sim.world_mut().add_vm(&spec(2.0, 0.0, 0.0));
    let requester = h.sim.add_entity(
        Probe::new("requester")
            .send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(vm))
            .send_at(3601.0, h.cloud, WorkflowEvent::VmTerminate(vm)),
    );

    h.sim.run()?;

    let p = h.sim.entity::<Probe>(requester).expect("probe registered");
    assert_eq!(p.times_of(tags::VM_LAUNCHED), vec![0.0]);
    assert_eq!(p.times_of(tags::VM_TERMINATED), vec![3601.0]);

    let record = h.sim.world().vm(vm)?;
    assert_eq!(record.state(), VmState::Terminated);
    assert_eq!(record.launch_time(), Some(0.0));
    assert_eq!(record.terminate_time(), Some(3601.0));
    assert_eq!(record.owner(), Some(requester));
    // 3601s at 3600s units: two units of 2.0.
    assert_eq!(record.cost(), 4.0);
    Ok(())
}

#[test]
fn provisioning_delay_shifts_launch_time() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vm = h.sim.world_mut().add_vm(&spec(1.0, 30.0, 10.0));
    let requester = h.sim.add_entity(
        Probe::new("requester")
            .send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(vm))
            .send_at(100.0, h.cloud, WorkflowEvent::VmTerminate(vm)),
    );

    h.sim.run()?;

    let p = h.sim.entity::<Probe>(requester).expect("probe registered");
    assert_eq!(p.times_of(tags::VM_LAUNCHED), vec![30.0]);
    assert_eq!(p.times_of(tags::VM_TERMINATED), vec![110.0]);

    let record = h.sim.world().vm(vm)?;
    assert_eq!(record.launch_time(), Some(30.0));
    assert_eq!(record.runtime(), 70.0);
    assert_eq!(record.cost(), 1.0);
    Ok(())
}

#[test]
fn terminate_during_provisioning_costs_nothing() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vm = h.sim.world_mut().add_vm(&spec(1.0, 30.0, 0.0));
    let requester = h.sim.add_entity(
        Probe::new("requester")
            .send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(vm))
            .send_at(10.0, h.cloud, WorkflowEvent::VmTerminate(vm)),
    );

    h.sim.run()?;

    let p = h.sim.entity::<Probe>(requester).expect("probe registered");
    assert!(p.times_of(tags::VM_LAUNCHED).is_empty());
    assert_eq!(p.times_of(tags::VM_TERMINATED), vec![10.0]);

    let record = h.sim.world().vm(vm)?;
    assert_eq!(record.state(), VmState::Terminated);
    assert_eq!(record.launch_time(), None);
    assert_eq!(record.cost(), 0.0);
    assert!(
        !h.log
            .borrow()
            .entries()
            .iter()
            .any(|e| matches!(e, LogEntry::VmLaunched { .. }))
    );
    Ok(())
}

#[test]
fn repeated_terminate_is_counted_not_fatal() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vm = h.sim.world_mut().add_vm(&spec(1.0, 0.0, 50.0));
    let requester = h.sim.add_entity(
        Probe::new("requester")
            .send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(vm))
            .send_at(10.0, h.cloud, WorkflowEvent::VmTerminate(vm))
            // Still terminating.
            .send_at(20.0, h.cloud, WorkflowEvent::VmTerminate(vm))
            // Already terminated.
            .send_at(100.0, h.cloud, WorkflowEvent::VmTerminate(vm)),
    );

    h.sim.run()?;

    assert_eq!(stale_count(&h), 2);
    let p = h.sim.entity::<Probe>(requester).expect("probe registered");
    assert_eq!(p.times_of(tags::VM_TERMINATED), vec![60.0]);
    assert_eq!(h.sim.world().vm(vm)?.cost(), 1.0);
    Ok(())
}

#[test]
fn launching_a_vm_twice_is_an_error() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vm = h.sim.world_mut().add_vm(&spec(1.0, 0.0, 0.0));
    h.sim.add_entity(
        Probe::new("requester")
            .send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(vm))
            .send_at(1.0, h.cloud, WorkflowEvent::VmLaunch(vm)),
    );

    let err = h.sim.run().expect_err("second launch must fail");
    assert!(matches!(err, WfsimError::InvalidTransition { .. }));
    Ok(())
}

/// Launch one free VM and stop right after it is running.
fn running_vm(h: &mut Harness) -> Result<VmId, WfsimError> {
    let vm = h.sim.world_mut().add_vm(&spec(1.0, 0.0, 0.0));
    h.sim.add_entity(Probe::new("requester").send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(vm)));
    h.sim.run_until(1.0)?;
    Ok(vm)
}

#[test]
fn occupied_slot_refuses_any_second_job() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vm = running_vm(&mut h)?;
    let record = h.sim.world_mut().vm_mut(vm)?;
    assert_eq!(record.state(), VmState::Running);

    record.accept(JobId(0))?;
    let err = record.accept(JobId(1)).expect_err("slot is taken");
    assert!(matches!(err, WfsimError::VmAlreadyBusy { vm: v, job: JobId(1) } if v == vm));

    // The same job twice is still a second occupant.
    let err = record.accept(JobId(0)).expect_err("slot is taken");
    assert!(matches!(err, WfsimError::VmAlreadyBusy { vm: v, job: JobId(0) } if v == vm));
    assert_eq!(record.running_job(), Some(JobId(0)));
    Ok(())
}

#[test]
fn slot_of_a_vm_that_is_not_running_cannot_be_taken() -> TestResult {
    let mut h = harness();
    let vm = h.sim.world_mut().add_vm(&spec(1.0, 0.0, 0.0));

    let err = h
        .sim
        .world_mut()
        .vm_mut(vm)?
        .accept(JobId(0))
        .expect_err("VM is only created");
    assert!(matches!(err, WfsimError::InvalidTransition { ref from, .. } if from == "Created"));
    assert_eq!(h.sim.world().vm(vm)?.running_job(), None);
    Ok(())
}

#[test]
fn pool_refuses_to_hand_a_busy_vm_a_second_job() {
    let mut pool = VmPool::new();
    pool.requested(VmId(0));

    // Still provisioning: not schedulable.
    let err = pool.occupy(VmId(0), JobId(0)).expect_err("VM is pending");
    assert!(matches!(err, WfsimError::InvalidTransition { .. }));

    pool.launched(VmId(0));
    pool.occupy(VmId(0), JobId(0)).expect("VM is free");
    let err = pool.occupy(VmId(0), JobId(1)).expect_err("VM is busy");
    assert!(matches!(
        err,
        WfsimError::VmAlreadyBusy {
            vm: VmId(0),
            job: JobId(1)
        }
    ));
    assert_eq!(pool.busy_count(), 1);
    assert_eq!(pool.free_count(), 0);

    pool.release(VmId(0));
    pool.occupy(VmId(0), JobId(1)).expect("VM is free again");
}

#[test]
fn vm_rejects_a_job_not_submitted_to_it() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vm = running_vm(&mut h)?;
    let slot = h.sim.world().vm(vm)?.entity().expect("launched VM has a slot");
    let job = h.sim.world_mut().add_job(WorkflowId(0), chain(1, 10.0), TaskIdx(0), 0);

    h.sim.send(slot, 0.0, WorkflowEvent::JobSubmit(job))?;
    let err = h.sim.run().expect_err("job was never submitted");
    match err {
        WfsimError::InvalidTransition { subject, from, to } => {
            assert_eq!(subject, format!("{job} on {vm}"));
            assert_eq!(from, "Created");
            assert_eq!(to, "Submitted");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.sim.world().vm(vm)?.running_job(), None);
    Ok(())
}

#[test]
fn drain_terminates_live_vms() -> TestResult {
    init_tracing();

    let mut h = harness();
    let running = h.sim.world_mut().add_vm(&spec(1.0, 0.0, 0.0));
    let never_launched = h.sim.world_mut().add_vm(&spec(1.0, 0.0, 0.0));
    h.sim.add_entity(
        Probe::new("requester").send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(running)),
    );

    let summary = h.sim.run()?;

    assert_eq!(summary.end_time, 0.0);
    let world = h.sim.world();
    assert_eq!(world.vm(running)?.state(), VmState::Terminated);
    assert_eq!(world.vm(running)?.cost(), 0.0);
    assert_eq!(world.vm(never_launched)?.state(), VmState::Created);
    assert_eq!(world.vm_census().launched(), 1);

    let log = h.log.borrow();
    assert!(matches!(
        log.entries(),
        [LogEntry::VmLaunched { .. }, LogEntry::VmTerminated { cost, .. }] if *cost == 0.0
    ));
    Ok(())
}

#[test]
fn vm_states_partition_the_launched_fleet() -> TestResult {
    init_tracing();

    let mut h = harness();
    let vms: Vec<VmId> = (0..3)
        .map(|_| h.sim.world_mut().add_vm(&spec(1.0, 50.0, 20.0)))
        .collect();

    let mut requester = Probe::new("requester");
    for vm in &vms {
        requester = requester.send_at(0.0, h.cloud, WorkflowEvent::VmLaunch(*vm));
    }
    requester = requester
        .send_at(60.0, h.cloud, WorkflowEvent::VmTerminate(vms[0]))
        .send_at(100.0, h.cloud, WorkflowEvent::VmTerminate(vms[1]));
    h.sim.add_entity(requester);

    h.sim.run_until(10.0)?;
    let census = h.sim.world().vm_census();
    assert_eq!(census.provisioning, 3);
    assert_eq!(census.launched(), 3);

    h.sim.run_until(70.0)?;
    let census = h.sim.world().vm_census();
    assert_eq!(census.free, 2);
    assert_eq!(census.terminating, 1);
    assert_eq!(census.launched(), 3);

    h.sim.run_until(110.0)?;
    let census = h.sim.world().vm_census();
    assert_eq!(census.free, 1);
    assert_eq!(census.terminating, 1);
    assert_eq!(census.terminated, 1);
    assert_eq!(census.launched(), 3);

    h.sim.run()?;
    let census = h.sim.world().vm_census();
    assert_eq!(census.terminated, 3);
    assert_eq!(census.launched(), 3);
    Ok(())
}

#[test]
fn cloud_rejects_unknown_events() -> TestResult {
    init_tracing();

    let mut h = harness();
    h.sim.send(h.cloud, 0.0, WorkflowEvent::Custom(21434243))?;
    let err = h.sim.run().expect_err("unknown tag must fail");
    assert!(matches!(
        err,
        WfsimError::UnknownWorkflowEvent { ref entity, tag: 21434243 } if entity == "cloud"
    ));
    Ok(())
}
