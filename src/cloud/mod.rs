// src/cloud/mod.rs

//! Simulated cloud: VM records, the per-VM execution entity and the fleet
//! manager that launches and tears VMs down.

use std::cell::RefCell;
use std::rc::Rc;

use crate::kernel::SimTime;

#[allow(clippy::module_inception)]
pub mod cloud;
pub mod vm;
pub mod vm_entity;

pub use cloud::Cloud;
pub use vm::{Vm, VmId, VmSpec, VmState, billed_cost};
pub use vm_entity::VmEntity;

/// Observer of VM lifecycle milestones (cost and usage collectors).
pub trait VmListener {
    /// The VM reached `Running`.
    fn vm_launched(&mut self, vm: &Vm, now: SimTime);

    /// The VM entered `Terminating`; its cost is final.
    fn vm_terminated(&mut self, vm: &Vm, now: SimTime);
}

impl<T: VmListener + ?Sized> VmListener for Rc<RefCell<T>> {
    fn vm_launched(&mut self, vm: &Vm, now: SimTime) {
        self.borrow_mut().vm_launched(vm, now);
    }

    fn vm_terminated(&mut self, vm: &Vm, now: SimTime) {
        self.borrow_mut().vm_terminated(vm, now);
    }
}
