use std::collections::HashMap;
use std::mem;

use async_trait::async_trait;
use golem_server::actor::{Actor, ActorAction, ActorContext};
use log::{info, warn};

use crate::master::actor::MasterActor;
use crate::master::event::MasterEvent;
use crate::master::options::MasterOptions;

#[async_trait]
impl Actor for MasterActor {
    type Message = MasterEvent;
    type Options = MasterOptions;

    fn name() -> &'static str {
        "MasterActor"
    }

    fn new(options: MasterOptions) -> Self {
        Self {
            options,
            jobs: HashMap::new(),
            workers: HashMap::new(),
        }
    }

    fn receive(&mut self, ctx: &mut ActorContext<Self>, message: MasterEvent) -> ActorAction {
        match message {
            MasterEvent::CreateJob {
                metadata,
                tasks,
                result,
            } => self.handle_create_job(ctx, metadata, tasks, result),
            MasterEvent::GetJob { job_id, result } => self.handle_get_job(ctx, job_id, result),
            MasterEvent::ListJobs { result } => self.handle_list_jobs(ctx, result),
            MasterEvent::RemoveJob { job_id, result } => {
                self.handle_remove_job(ctx, job_id, result)
            }
            MasterEvent::RegisterWorker { worker } => self.handle_register_worker(ctx, worker),
            MasterEvent::DeregisterWorker { node_id } => {
                self.handle_deregister_worker(ctx, node_id)
            }
            MasterEvent::GetWorker { node_id, result } => {
                self.handle_get_worker(ctx, node_id, result)
            }
            MasterEvent::ListWorkers { result } => self.handle_list_workers(ctx, result),
            MasterEvent::Shutdown => ActorAction::Stop,
        }
    }

    async fn stop(mut self, _ctx: &mut ActorContext<Self>) {
        // Worker handles try to deregister when they shut down.
        // This is expected to fail since the master no longer receives messages.
        for (node_id, worker) in mem::take(&mut self.workers) {
            if let Err(e) = worker.shutdown().await {
                warn!("failed to shut down worker {node_id}: {e}");
            }
        }
        for (_, job) in mem::take(&mut self.jobs) {
            job.shutdown().await;
        }
        info!("master has stopped");
    }
}

impl MasterActor {
    pub(super) fn options(&self) -> &MasterOptions {
        &self.options
    }
}
