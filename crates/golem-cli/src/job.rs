use std::sync::Arc;
use std::time::Duration;

use golem_common::config::AppConfig;
use golem_execution::connection::Connection;
use golem_execution::id::JobId;
use golem_execution::job::{JobDetails, JobMetadata, Task};
use golem_execution::local::{LocalWorker, LocalWorkerOptions};
use golem_execution::master::{Master, MasterOptions};
use golem_execution::store::MemoryJobStore;
use golem_server::actor::ActorSystem;
use golem_telemetry::telemetry::{init_telemetry, shutdown_telemetry};
use log::{error, info, warn};

use crate::runner::RunArgs;

const JOB_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run_job(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;
    if let Some(log_dir) = &args.log_dir {
        config.job.log_dir = log_dir.to_string_lossy().into_owned();
    }
    init_telemetry(&config.telemetry)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let details = runtime.block_on(run(config, args))?;
    println!("{}", serde_json::to_string_pretty(&details)?);

    shutdown_telemetry();

    Ok(())
}

async fn run(config: AppConfig, args: RunArgs) -> Result<JobDetails, Box<dyn std::error::Error>> {
    let tasks: Vec<Task> = serde_json::from_slice(&tokio::fs::read(&args.tasks).await?)?;
    let mut system = ActorSystem::new();
    let master = Master::start(
        &mut system,
        MasterOptions::new(&config, Arc::new(MemoryJobStore::new())),
    );

    for i in 0..args.workers {
        let (master_side, worker_side) =
            Connection::duplex(format!("local-{i}"), config.worker.connection_buffer);
        let worker = LocalWorker::new(LocalWorkerOptions::new(&config, args.capacity), worker_side);
        tokio::spawn(async move {
            if let Err(e) = worker.run().await {
                error!("local worker {i} failed: {e}");
            }
        });
        master.accept_worker(master_side).await?;
    }

    let metadata = JobMetadata {
        owner: args.owner,
        label: args.label,
        job_type: args.job_type,
    };
    let job_id = master.create_job(metadata, tasks).await?;
    info!("submitted job {job_id}");

    let details = wait_for_job(&master, job_id).await?;

    master.kill_all();
    master.shutdown().await?;
    system.join().await;
    Ok(details)
}

/// Polls the job until it completes. Ctrl-C stops the job.
async fn wait_for_job(master: &Master, job_id: JobId) -> Result<JobDetails, Box<dyn std::error::Error>> {
    let mut interval = tokio::time::interval(JOB_POLL_INTERVAL);
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                info!("stopping job {job_id}...");
                if let Err(e) = master.stop_job(job_id).await {
                    warn!("failed to stop job {job_id}: {e}");
                }
            }
            _ = interval.tick() => {
                let details = master.job_details(job_id).await?;
                if details.is_complete() {
                    return Ok(details);
                }
            }
        }
    }
}
