mod coordinator;

use chrono::{DateTime, Utc};
pub use coordinator::{JobCoordinator, JobCoordinatorOptions};
use serde::{Deserialize, Serialize};

use crate::id::JobId;
use crate::protocol::{UnitOutcome, WorkUnit};

pub const DEFAULT_JOB_OWNER: &str = "Anonymous";
pub const DEFAULT_JOB_TYPE: &str = "Unspecified";

/// A task line: one argument vector executed `count` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub count: u64,
    pub args: Vec<String>,
}

impl Task {
    pub fn new(count: u64, args: Vec<String>) -> Self {
        Self { count, args }
    }
}

pub fn total_tasks(tasks: &[Task]) -> u64 {
    tasks.iter().map(|x| x.count).sum()
}

/// Expands task lines into work units in line order.
/// Sequence numbers are dense from zero across the whole job.
pub fn expand_tasks(job_id: JobId, tasks: &[Task]) -> impl Iterator<Item = WorkUnit> + '_ {
    tasks
        .iter()
        .enumerate()
        .flat_map(|(line_id, task)| (0..task.count).map(move |_| (line_id, task)))
        .zip(0u64..)
        .map(move |((line_id, task), sequence)| WorkUnit {
            job_id,
            line_id,
            sequence,
            args: task.args.clone(),
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub owner: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Ready,
    Running,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Ready,
    Success,
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub finished: u64,
    pub errored: u64,
    pub total: u64,
}

impl Progress {
    pub fn new(total: u64) -> Self {
        Self {
            finished: 0,
            errored: 0,
            total,
        }
    }

    pub fn resolved(&self) -> u64 {
        self.finished + self.errored
    }

    pub fn is_complete(&self) -> bool {
        self.resolved() == self.total
    }

    /// Counts one outcome unless every work unit has already been resolved.
    pub(crate) fn record(&mut self, outcome: UnitOutcome) -> bool {
        if self.resolved() >= self.total {
            return false;
        }
        match outcome {
            UnitOutcome::Finished => self.finished += 1,
            UnitOutcome::Errored => self.errored += 1,
        }
        true
    }
}

/// A point-in-time copy of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub job_id: JobId,
    pub owner: String,
    pub label: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub state: JobState,
    pub status: JobStatus,
    pub progress: Progress,
    pub last_modified: DateTime<Utc>,
}

impl JobDetails {
    pub fn new(job_id: JobId, metadata: &JobMetadata, total: u64) -> Self {
        Self {
            job_id,
            owner: metadata
                .owner
                .clone()
                .unwrap_or_else(|| DEFAULT_JOB_OWNER.to_string()),
            label: metadata
                .label
                .clone()
                .unwrap_or_else(|| job_id.to_string()),
            job_type: metadata
                .job_type
                .clone()
                .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string()),
            state: JobState::Ready,
            status: JobStatus::Ready,
            progress: Progress::new(total),
            last_modified: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == JobState::Complete
    }

    pub(crate) fn set_state(&mut self, state: JobState, status: JobStatus) {
        self.state = state;
        self.status = status;
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}
