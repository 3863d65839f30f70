use async_trait::async_trait;
use golem_server::actor::{Actor, ActorAction, ActorContext};
use log::{info, warn};
use tokio::sync::oneshot;

use crate::job::coordinator::actor::JobCoordinatorActor;
use crate::job::coordinator::event::JobCoordinatorEvent;
use crate::job::coordinator::options::JobCoordinatorOptions;
use crate::job::coordinator::submitter::TaskSubmitter;
use crate::job::coordinator::writer::{job_file_path, OutputWriter};
use crate::job::{total_tasks, JobDetails, JobState, JobStatus};

#[async_trait]
impl Actor for JobCoordinatorActor {
    type Message = JobCoordinatorEvent;
    type Options = JobCoordinatorOptions;

    fn name() -> &'static str {
        "JobCoordinatorActor"
    }

    fn new(options: JobCoordinatorOptions) -> Self {
        let job_id = options.job_id;
        let details = JobDetails::new(job_id, &options.metadata, total_tasks(&options.tasks));
        let path = |suffix| job_file_path(&options.log_dir, job_id, suffix);
        let audit = OutputWriter::spawn(path("log"));
        let stdout = OutputWriter::spawn(path("out"));
        let stderr = OutputWriter::spawn(path("err"));
        Self {
            options,
            details,
            submitter_signal: None,
            audit,
            stdout,
            stderr,
        }
    }

    async fn start(&mut self, ctx: &mut ActorContext<Self>) {
        let job_id = self.details.job_id;
        self.details.set_state(JobState::Running, JobStatus::Ready);
        info!(
            "job {job_id} is running with {} work units",
            self.details.progress.total
        );
        if self.details.progress.is_complete() {
            self.complete();
            return;
        }
        self.save();
        let (tx, rx) = oneshot::channel();
        self.submitter_signal = Some(tx);
        let submitter = TaskSubmitter::new(
            ctx.handle().clone(),
            job_id,
            self.options.tasks.clone(),
            self.options.queue.clone(),
            rx,
        );
        ctx.spawn(submitter.run());
    }

    fn receive(
        &mut self,
        ctx: &mut ActorContext<Self>,
        message: JobCoordinatorEvent,
    ) -> ActorAction {
        match message {
            JobCoordinatorEvent::RecordOutcome { unit, outcome } => {
                self.handle_record_outcome(ctx, unit, outcome)
            }
            JobCoordinatorEvent::RecordSubmission { unit, host } => {
                self.handle_record_submission(ctx, unit, host)
            }
            JobCoordinatorEvent::AppendOutput { stream, chunk } => {
                self.handle_append_output(ctx, stream, chunk)
            }
            JobCoordinatorEvent::Stop { result } => self.handle_stop(ctx, result),
            JobCoordinatorEvent::GetSnapshot { result } => self.handle_get_snapshot(ctx, result),
            JobCoordinatorEvent::SubmissionFinished { submitted, stopped } => {
                self.handle_submission_finished(ctx, submitted, stopped)
            }
            JobCoordinatorEvent::Shutdown => ActorAction::Stop,
        }
    }

    async fn stop(self, _ctx: &mut ActorContext<Self>) {
        let Self {
            options,
            details,
            submitter_signal,
            audit,
            stdout,
            stderr,
        } = self;
        if let Some(signal) = submitter_signal {
            let _ = signal.send(());
        }
        audit.join().await;
        stdout.join().await;
        stderr.join().await;
        if let Err(e) = options.store.update(&details) {
            warn!("failed to save job {}: {e}", details.job_id);
        }
        info!("job coordinator for job {} has stopped", details.job_id);
    }
}

impl JobCoordinatorActor {
    /// Marks the job as successfully completed and closes the output files.
    pub(super) fn complete(&mut self) {
        self.audit.write("COMPLETED\n");
        if !self.details.is_complete() {
            self.details.set_state(JobState::Complete, JobStatus::Success);
            self.save();
            info!("job {} completed", self.details.job_id);
        }
        self.audit.close();
        self.stdout.close();
        self.stderr.close();
    }

    pub(super) fn save(&self) {
        if let Err(e) = self.options.store.update(&self.details) {
            warn!("failed to save job {}: {e}", self.details.job_id);
        }
    }
}
