use std::future::Future;

use async_trait::async_trait;
use log::{error, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinSet};

const ACTOR_CHANNEL_SIZE: usize = 8;

/// An actor owns its state exclusively and processes one message at a time.
///
/// The message handler is synchronous. Any asynchronous work must be spawned
/// via [`ActorContext::spawn`], and its result must be sent back to the actor
/// as another message.
#[async_trait]
pub trait Actor: Sized + Send + 'static {
    type Message: Send + 'static;
    type Options: Send + 'static;

    fn name() -> &'static str;
    fn new(options: Self::Options) -> Self;
    /// Called once before the actor receives its first message.
    async fn start(&mut self, _ctx: &mut ActorContext<Self>) {}
    fn receive(&mut self, ctx: &mut ActorContext<Self>, message: Self::Message) -> ActorAction;
    /// Called once after the actor stops receiving messages.
    async fn stop(self, _ctx: &mut ActorContext<Self>) {}
}

pub enum ActorAction {
    Continue,
    Warn(String),
    Fail(String),
    Stop,
}

impl ActorAction {
    pub fn warn(message: impl ToString) -> Self {
        ActorAction::Warn(message.to_string())
    }

    pub fn fail(message: impl ToString) -> Self {
        ActorAction::Fail(message.to_string())
    }
}

pub struct ActorHandle<T>
where
    T: Actor,
{
    sender: mpsc::Sender<T::Message>,
    stopped: watch::Receiver<bool>,
}

impl<T> Clone for ActorHandle<T>
where
    T: Actor,
{
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stopped: self.stopped.clone(),
        }
    }
}

impl<T: Actor> ActorHandle<T> {
    /// Creates the actor and runs it as a detached task on the current runtime.
    pub fn new(options: T::Options) -> Self {
        let (handle, runner) = ActorRunner::create(options);
        tokio::spawn(runner.run());
        handle
    }

    pub async fn send(&self, message: T::Message) -> Result<(), mpsc::error::SendError<T::Message>> {
        self.sender.send(message).await
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    pub async fn wait_for_stop(mut self) {
        // We ignore the receiver error since the sender must have been dropped in this case,
        // which means the actor has stopped.
        let _ = self.stopped.wait_for(|x| *x).await;
    }
}

pub struct ActorContext<T: Actor> {
    handle: ActorHandle<T>,
    tasks: JoinSet<()>,
}

impl<T: Actor> ActorContext<T> {
    fn new(handle: ActorHandle<T>) -> Self {
        Self {
            handle,
            tasks: JoinSet::new(),
        }
    }

    pub fn handle(&self) -> &ActorHandle<T> {
        &self.handle
    }

    /// Spawns a task owned by the actor. The task is aborted when the actor stops.
    pub fn spawn<F>(&mut self, task: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task)
    }

    /// Removes finished tasks so that the task set does not grow unbounded.
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("{} task panicked: {e}", T::name());
                }
            }
        }
    }
}

struct ActorRunner<T: Actor> {
    actor: T,
    ctx: ActorContext<T>,
    receiver: mpsc::Receiver<T::Message>,
    stopped: watch::Sender<bool>,
}

impl<T: Actor> ActorRunner<T> {
    fn create(options: T::Options) -> (ActorHandle<T>, Self) {
        let (tx, rx) = mpsc::channel(ACTOR_CHANNEL_SIZE);
        let (stopped_tx, stopped_rx) = watch::channel::<bool>(false);
        let handle = ActorHandle {
            sender: tx,
            stopped: stopped_rx,
        };
        let runner = Self {
            actor: T::new(options),
            ctx: ActorContext::new(handle.clone()),
            receiver: rx,
            stopped: stopped_tx,
        };
        (handle, runner)
    }

    async fn run(self) {
        let Self {
            mut actor,
            mut ctx,
            mut receiver,
            stopped,
        } = self;
        actor.start(&mut ctx).await;
        while let Some(message) = receiver.recv().await {
            match actor.receive(&mut ctx, message) {
                ActorAction::Continue => {}
                ActorAction::Warn(message) => {
                    warn!("{}: {message}", T::name());
                }
                ActorAction::Fail(message) => {
                    error!("{} failed: {message}", T::name());
                    break;
                }
                ActorAction::Stop => break,
            }
            ctx.reap();
        }
        receiver.close();
        actor.stop(&mut ctx).await;
        ctx.tasks.abort_all();
        let _ = stopped.send(true);
    }
}

/// A collection of actors whose lifetime is bound to the system.
pub struct ActorSystem {
    tasks: JoinSet<()>,
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorSystem {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<T: Actor>(&mut self, options: T::Options) -> ActorHandle<T> {
        let (handle, runner) = ActorRunner::create(options);
        self.tasks.spawn(runner.run());
        handle
    }

    /// Waits for all actors in the system to stop.
    pub async fn join(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!("actor task failed: {e}");
            }
        }
    }
}
