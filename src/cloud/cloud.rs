// src/cloud/cloud.rs

use std::any::Any;
use std::fmt;

use tracing::{debug, info, warn};

use crate::cloud::{VmEntity, VmId, VmListener, VmState};
use crate::errors::{Result, WfsimError};
use crate::kernel::{Entity, EntityId, Event, SimContext, WorkflowEvent};

/// VM fleet manager.
///
/// Processes `VM_LAUNCH` / `VM_TERMINATE` requests, spawns one
/// [`VmEntity`] per launched VM and answers the requester with
/// `VM_LAUNCHED` / `VM_TERMINATED` once the provisioning or deprovisioning
/// delay has elapsed.
pub struct Cloud {
    storage: EntityId,
    listeners: Vec<Box<dyn VmListener>>,
    stale_requests: usize,
}

impl fmt::Debug for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cloud")
            .field("storage", &self.storage)
            .field("listeners", &self.listeners.len())
            .field("stale_requests", &self.stale_requests)
            .finish()
    }
}

impl Cloud {
    /// `storage` is the storage manager every spawned VM stages files with.
    pub fn new(storage: EntityId) -> Self {
        Self {
            storage,
            listeners: Vec::new(),
            stale_requests: 0,
        }
    }

    /// Register a lifecycle observer; observers are invoked in registration
    /// order.
    pub fn add_listener(&mut self, listener: impl VmListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Terminate requests that arrived for VMs already terminating or
    /// terminated. Requesters get no reply for these; this count and the
    /// warning naming the requester are the report.
    pub fn stale_requests(&self) -> usize {
        self.stale_requests
    }

    fn launch(&mut self, vm: VmId, requester: EntityId, ctx: &mut SimContext<'_>) -> Result<()> {
        let state = ctx.world().vm(vm)?.state();
        if state != VmState::Created {
            return Err(WfsimError::transition(vm.to_string(), state, VmState::Provisioning));
        }

        let storage = self.storage;
        let entity = ctx.spawn(VmEntity::new(vm, storage));
        let record = ctx.world_mut().vm_mut(vm)?;
        record.begin_provisioning(requester, entity)?;
        let delay = record.spec().provisioning_delay;

        debug!(vm = %vm, delay, "provisioning VM");
        ctx.schedule_self(delay, WorkflowEvent::VmProvisioned(vm))
    }

    fn provisioned(&mut self, vm: VmId, ctx: &mut SimContext<'_>) -> Result<()> {
        let now = ctx.now();
        let record = ctx.world_mut().vm_mut(vm)?;
        if record.state() != VmState::Provisioning {
            // Torn down before the launch completed.
            debug!(vm = %vm, state = ?record.state(), "ignoring stale launch completion");
            return Ok(());
        }
        record.mark_running(now)?;
        let owner = record.owner();

        info!(vm = %vm, time = now, "VM launched");
        let record = ctx.world().vm(vm)?;
        for listener in self.listeners.iter_mut() {
            listener.vm_launched(record, now);
        }

        if let Some(owner) = owner {
            ctx.send_now(owner, WorkflowEvent::VmLaunched(vm));
        }
        Ok(())
    }

    /// Start tearing `vm` down and finalize its billing.
    ///
    /// Fails with [`WfsimError::StaleVm`] when the VM is already terminating
    /// or terminated.
    pub fn terminate(&mut self, vm: VmId, ctx: &mut SimContext<'_>) -> Result<()> {
        let now = ctx.now();
        let record = ctx.world_mut().vm_mut(vm)?;
        match record.state() {
            VmState::Running | VmState::Provisioning => {}
            VmState::Terminating | VmState::Terminated => return Err(WfsimError::StaleVm(vm)),
            state => {
                return Err(WfsimError::transition(vm.to_string(), state, VmState::Terminating));
            }
        }
        record.begin_terminating(now)?;
        let delay = record.spec().deprovisioning_delay;

        info!(vm = %vm, time = now, cost = record.cost(), "VM terminating");
        let record = ctx.world().vm(vm)?;
        for listener in self.listeners.iter_mut() {
            listener.vm_terminated(record, now);
        }

        ctx.schedule_self(delay, WorkflowEvent::VmDeprovisioned(vm))
    }

    fn deprovisioned(&mut self, vm: VmId, ctx: &mut SimContext<'_>) -> Result<()> {
        let record = ctx.world_mut().vm_mut(vm)?;
        record.mark_terminated()?;
        let owner = record.owner();

        debug!(vm = %vm, "VM terminated");
        if let Some(owner) = owner {
            ctx.send_now(owner, WorkflowEvent::VmTerminated(vm));
        }
        Ok(())
    }
}

impl Entity for Cloud {
    fn name(&self) -> &str {
        "cloud"
    }

    fn process_event(&mut self, event: Event, ctx: &mut SimContext<'_>) -> Result<()> {
        match event.payload {
            WorkflowEvent::VmLaunch(vm) => self.launch(vm, event.source, ctx),
            WorkflowEvent::VmProvisioned(vm) => self.provisioned(vm, ctx),
            WorkflowEvent::VmTerminate(vm) => match self.terminate(vm, ctx) {
                Err(WfsimError::StaleVm(vm)) => {
                    warn!(
                        vm = %vm,
                        requester = %event.source,
                        "terminate request for a VM already shutting down; ignored"
                    );
                    self.stale_requests += 1;
                    Ok(())
                }
                other => other,
            },
            WorkflowEvent::VmDeprovisioned(vm) => self.deprovisioned(vm, ctx),
            other => Err(other.unknown_to(self.name())),
        }
    }

    /// Terminate every VM still provisioning or running so that all billing
    /// is final when the run ends.
    fn drain(&mut self, ctx: &mut SimContext<'_>) -> Result<()> {
        let live: Vec<VmId> = ctx
            .world()
            .vms()
            .filter(|vm| matches!(vm.state(), VmState::Provisioning | VmState::Running))
            .map(|vm| vm.id())
            .collect();

        if !live.is_empty() {
            info!(count = live.len(), time = ctx.now(), "terminating remaining VMs");
        }
        for vm in live {
            self.terminate(vm, ctx)?;
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
