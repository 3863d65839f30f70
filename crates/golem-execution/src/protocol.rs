//! The message protocol spoken between the master and its workers.
//!
//! Every message is a JSON object `{"kind": ..., "job_id": ..., "body": ...}`.
//! The body of `START`, `JOBFINISHED` and `JOBERROR` messages is itself a
//! JSON-encoded [`WorkUnit`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, ExecutionResult};
use crate::id::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// Handshake from the worker. The body is the worker capacity.
    Hello,
    /// Liveness ping from the worker.
    Checkin,
    /// A work unit sent to the worker.
    Start,
    /// A chunk of standard output captured by the worker.
    Cout,
    /// A chunk of standard error captured by the worker.
    Cerror,
    JobFinished,
    JobError,
    Restart,
    Die,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Hello => "HELLO",
            MessageKind::Checkin => "CHECKIN",
            MessageKind::Start => "START",
            MessageKind::Cout => "COUT",
            MessageKind::Cerror => "CERROR",
            MessageKind::JobFinished => "JOBFINISHED",
            MessageKind::JobError => "JOBERROR",
            MessageKind::Restart => "RESTART",
            MessageKind::Die => "DIE",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Finished,
    Errored,
}

impl UnitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOutcome::Finished => "FINISHED",
            UnitOutcome::Errored => "ERRORED",
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One execution of one task line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub job_id: JobId,
    pub line_id: usize,
    /// Unique within the job and dense from zero across all task lines.
    pub sequence: u64,
    pub args: Vec<String>,
}

impl WorkUnit {
    pub fn encode(&self) -> ExecutionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(body: &str) -> ExecutionResult<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.job_id,
            self.sequence,
            self.line_id,
            self.args.join(" ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerMessage {
    pub kind: MessageKind,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub body: String,
}

impl WorkerMessage {
    pub fn new(kind: MessageKind, job_id: Option<JobId>, body: impl Into<String>) -> Self {
        Self {
            kind,
            job_id,
            body: body.into(),
        }
    }

    pub fn hello(capacity: usize) -> Self {
        Self::new(MessageKind::Hello, None, capacity.to_string())
    }

    pub fn checkin() -> Self {
        Self::new(MessageKind::Checkin, None, "")
    }

    pub fn start(unit: &WorkUnit) -> ExecutionResult<Self> {
        Ok(Self::new(MessageKind::Start, Some(unit.job_id), unit.encode()?))
    }

    pub fn output(stream: OutputStream, job_id: JobId, chunk: impl Into<String>) -> Self {
        let kind = match stream {
            OutputStream::Stdout => MessageKind::Cout,
            OutputStream::Stderr => MessageKind::Cerror,
        };
        Self::new(kind, Some(job_id), chunk)
    }

    pub fn outcome(outcome: UnitOutcome, unit: &WorkUnit) -> ExecutionResult<Self> {
        let kind = match outcome {
            UnitOutcome::Finished => MessageKind::JobFinished,
            UnitOutcome::Errored => MessageKind::JobError,
        };
        Ok(Self::new(kind, Some(unit.job_id), unit.encode()?))
    }

    pub fn restart() -> Self {
        Self::new(MessageKind::Restart, None, "")
    }

    pub fn die() -> Self {
        Self::new(MessageKind::Die, None, "")
    }

    /// Parses the capacity advertised in a `HELLO` message.
    pub fn capacity(&self) -> ExecutionResult<usize> {
        self.body
            .trim()
            .parse::<usize>()
            .map_err(|e| ExecutionError::InvalidCapacity(format!("`{}`: {e}", self.body)))
    }

    pub fn work_unit(&self) -> ExecutionResult<WorkUnit> {
        WorkUnit::decode(&self.body)
    }

    pub fn encode(&self) -> ExecutionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(data: &str) -> ExecutionResult<Self> {
        Ok(serde_json::from_str(data)?)
    }
}
