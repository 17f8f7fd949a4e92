// src/engine/listeners.rs

//! Observer traits for job and DAG lifecycle milestones.
//!
//! Observers are kept in an explicit list and invoked synchronously, in
//! registration order. Share one observer between several lists by
//! registering an `Rc<RefCell<T>>`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::DagJob;
use crate::jobs::Job;
use crate::kernel::SimTime;

pub trait JobListener {
    fn job_started(&mut self, job: &Job, now: SimTime);
    fn job_finished(&mut self, job: &Job, now: SimTime);
}

pub trait DagJobListener {
    fn dag_started(&mut self, dag: &DagJob, now: SimTime);
    fn dag_finished(&mut self, dag: &DagJob, now: SimTime);
}

impl<T: JobListener + ?Sized> JobListener for Rc<RefCell<T>> {
    fn job_started(&mut self, job: &Job, now: SimTime) {
        self.borrow_mut().job_started(job, now);
    }

    fn job_finished(&mut self, job: &Job, now: SimTime) {
        self.borrow_mut().job_finished(job, now);
    }
}

impl<T: DagJobListener + ?Sized> DagJobListener for Rc<RefCell<T>> {
    fn dag_started(&mut self, dag: &DagJob, now: SimTime) {
        self.borrow_mut().dag_started(dag, now);
    }

    fn dag_finished(&mut self, dag: &DagJob, now: SimTime) {
        self.borrow_mut().dag_finished(dag, now);
    }
}
