mod core;
mod handler;

use tokio::sync::oneshot;

use crate::job::coordinator::options::JobCoordinatorOptions;
use crate::job::coordinator::writer::OutputWriter;
use crate::job::JobDetails;

/// Owns the details of one job. All progress and state changes happen here.
pub(super) struct JobCoordinatorActor {
    options: JobCoordinatorOptions,
    details: JobDetails,
    /// Stops the task submitter. Present while work units are being submitted.
    submitter_signal: Option<oneshot::Sender<()>>,
    audit: OutputWriter,
    stdout: OutputWriter,
    stderr: OutputWriter,
}
