use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ExecutionError, ExecutionResult};
use crate::id::JobId;
use crate::job::JobDetails;

/// Keeps job records beyond the lifetime of their coordinators.
pub trait JobStore: Send + Sync + 'static {
    fn create(&self, details: &JobDetails) -> ExecutionResult<()>;
    fn update(&self, details: &JobDetails) -> ExecutionResult<()>;
    fn get(&self, job_id: &JobId) -> ExecutionResult<JobDetails>;
    /// Returns all jobs in creation order.
    fn all(&self) -> ExecutionResult<Vec<JobDetails>>;
}

#[derive(Default)]
struct MemoryJobStoreState {
    jobs: HashMap<JobId, JobDetails>,
    order: Vec<JobId>,
}

pub struct MemoryJobStore {
    state: Mutex<MemoryJobStoreState>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryJobStoreState::default()),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, details: &JobDetails) -> ExecutionResult<()> {
        let mut state = self.state.lock()?;
        if state.jobs.contains_key(&details.job_id) {
            return Err(ExecutionError::invalid(format!(
                "job {} already exists",
                details.job_id
            )));
        }
        state.order.push(details.job_id);
        state.jobs.insert(details.job_id, details.clone());
        Ok(())
    }

    fn update(&self, details: &JobDetails) -> ExecutionResult<()> {
        let mut state = self.state.lock()?;
        let Some(record) = state.jobs.get_mut(&details.job_id) else {
            return Err(ExecutionError::JobNotFound(details.job_id));
        };
        *record = details.clone();
        Ok(())
    }

    fn get(&self, job_id: &JobId) -> ExecutionResult<JobDetails> {
        let state = self.state.lock()?;
        state
            .jobs
            .get(job_id)
            .cloned()
            .ok_or(ExecutionError::JobNotFound(*job_id))
    }

    fn all(&self) -> ExecutionResult<Vec<JobDetails>> {
        let state = self.state.lock()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .cloned()
            .collect())
    }
}
