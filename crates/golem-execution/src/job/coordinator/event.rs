use tokio::sync::oneshot;

use crate::job::JobDetails;
use crate::protocol::{OutputStream, UnitOutcome, WorkUnit};

pub enum JobCoordinatorEvent {
    RecordOutcome {
        unit: WorkUnit,
        outcome: UnitOutcome,
    },
    RecordSubmission {
        unit: WorkUnit,
        host: String,
    },
    AppendOutput {
        stream: OutputStream,
        chunk: String,
    },
    Stop {
        /// Whether the job was running when the request arrived.
        result: oneshot::Sender<bool>,
    },
    GetSnapshot {
        result: oneshot::Sender<JobDetails>,
    },
    SubmissionFinished {
        submitted: u64,
        stopped: bool,
    },
    Shutdown,
}
