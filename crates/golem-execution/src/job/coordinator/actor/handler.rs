use golem_server::actor::{ActorAction, ActorContext};
use log::{debug, info};
use tokio::sync::oneshot;

use crate::job::coordinator::actor::JobCoordinatorActor;
use crate::job::{JobDetails, JobState, JobStatus};
use crate::protocol::{OutputStream, UnitOutcome, WorkUnit};

impl JobCoordinatorActor {
    pub(super) fn handle_record_outcome(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        unit: WorkUnit,
        outcome: UnitOutcome,
    ) -> ActorAction {
        let job_id = self.details.job_id;
        if unit.job_id != job_id {
            return ActorAction::warn(format!(
                "job {job_id} received an outcome for work unit {} of job {}",
                unit.sequence, unit.job_id
            ));
        }
        if !self.details.progress.record(outcome) {
            return ActorAction::warn(format!(
                "job {job_id} has resolved all {} work units and ignores {outcome} for work unit {}",
                self.details.progress.total, unit.sequence
            ));
        }
        self.details.touch();
        self.audit.write(format!("{outcome} {unit}\n"));
        debug!(
            "job {job_id} work unit {} {outcome} ({}/{})",
            unit.sequence,
            self.details.progress.resolved(),
            self.details.progress.total
        );
        if self.details.progress.is_complete() {
            self.complete();
        }
        ActorAction::Continue
    }

    pub(super) fn handle_record_submission(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        unit: WorkUnit,
        host: String,
    ) -> ActorAction {
        self.audit.write(format!("SUBMITTED to {host} {unit}\n"));
        ActorAction::Continue
    }

    pub(super) fn handle_append_output(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        stream: OutputStream,
        chunk: String,
    ) -> ActorAction {
        match stream {
            OutputStream::Stdout => self.stdout.write(chunk),
            OutputStream::Stderr => self.stderr.write(chunk),
        }
        ActorAction::Continue
    }

    pub(super) fn handle_stop(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        result: oneshot::Sender<bool>,
    ) -> ActorAction {
        let running = self.details.state == JobState::Running;
        if running {
            if let Some(signal) = self.submitter_signal.take() {
                let _ = signal.send(());
            }
            self.details.set_state(JobState::Complete, JobStatus::Stopped);
            self.audit.write("STOPPED\n");
            self.save();
            info!("job {} stopped", self.details.job_id);
        }
        let _ = result.send(running);
        ActorAction::Continue
    }

    pub(super) fn handle_get_snapshot(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        result: oneshot::Sender<JobDetails>,
    ) -> ActorAction {
        let _ = result.send(self.details.clone());
        ActorAction::Continue
    }

    pub(super) fn handle_submission_finished(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        submitted: u64,
        stopped: bool,
    ) -> ActorAction {
        self.submitter_signal = None;
        debug!(
            "job {} submission finished: submitted {submitted} work units, stopped: {stopped}",
            self.details.job_id
        );
        ActorAction::Continue
    }
}
