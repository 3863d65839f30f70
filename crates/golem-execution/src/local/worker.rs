use log::{info, warn};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::connection::Connection;
use crate::error::ExecutionResult;
use crate::local::executor::execute;
use crate::local::options::LocalWorkerOptions;
use crate::protocol::{MessageKind, WorkerMessage};

enum LocalWorkerEvent {
    Message(Option<WorkerMessage>),
    CheckIn,
    UnitDone,
}

/// Speaks the worker protocol over a connection to the master.
/// Work units run concurrently, one child process each.
pub struct LocalWorker {
    options: LocalWorkerOptions,
    connection: Connection,
}

impl LocalWorker {
    pub fn new(options: LocalWorkerOptions, connection: Connection) -> Self {
        Self {
            options,
            connection,
        }
    }

    /// Runs until the master closes the connection or sends `DIE`.
    /// Running child processes are killed when the worker exits.
    pub async fn run(self) -> ExecutionResult<()> {
        let Self {
            options,
            mut connection,
        } = self;
        connection.send(WorkerMessage::hello(options.capacity)).await?;
        let start = tokio::time::Instant::now() + options.checkin_interval;
        let mut checkin = tokio::time::interval_at(start, options.checkin_interval);
        checkin.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut units = JoinSet::new();
        loop {
            let event = tokio::select! {
                x = connection.recv() => LocalWorkerEvent::Message(x),
                _ = checkin.tick() => LocalWorkerEvent::CheckIn,
                Some(_) = units.join_next(), if !units.is_empty() => LocalWorkerEvent::UnitDone,
            };
            match event {
                LocalWorkerEvent::Message(None) => {
                    info!("the master closed the connection");
                    break;
                }
                LocalWorkerEvent::Message(Some(message)) => match message.kind {
                    MessageKind::Start => match message.work_unit() {
                        Ok(unit) => {
                            units.spawn(execute(unit, connection.sender()));
                        }
                        Err(e) => {
                            warn!("received an invalid work unit: {e}");
                            // The master counts the unit as running until it hears back.
                            let reply =
                                WorkerMessage::new(MessageKind::JobError, message.job_id, message.body);
                            connection.send(reply).await?;
                        }
                    },
                    MessageKind::Die => {
                        info!("the master asked the worker to terminate");
                        break;
                    }
                    MessageKind::Restart => {
                        info!("the master asked the worker to restart; there is nothing to restart");
                    }
                    kind => warn!("received unexpected message {kind}"),
                },
                LocalWorkerEvent::CheckIn => connection.send(WorkerMessage::checkin()).await?,
                LocalWorkerEvent::UnitDone => {}
            }
        }
        units.abort_all();
        Ok(())
    }
}
