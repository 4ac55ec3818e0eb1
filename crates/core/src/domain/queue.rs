// Job Queue Domain Model

use crate::domain::job::{Job, JobId};
use serde::{Deserialize, Serialize};

/// Ordered backlog of jobs attached to one machine.
///
/// Strict FIFO by insertion; display order is queue order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobQueue {
    jobs: Vec<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job to the back of the queue
    pub fn enqueue(&mut self, job: Job) {
        self.jobs.push(job);
    }

    /// Remove the job with `job_id`, returning it (no-op if absent)
    pub fn remove(&mut self, job_id: JobId) -> Option<Job> {
        let index = self.jobs.iter().position(|j| j.job_id == job_id)?;
        Some(self.jobs.remove(index))
    }

    pub fn get(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.job_id == job_id)
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.get(job_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}
