use super::AttemptId;
use super::ExecutionResult;
use super::Fragment;
use super::GenerationError;

/// Results reported back by generation workers. Every variant names the
/// attempt it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Synthesized(AttemptId, Fragment),
    StreamDelta(AttemptId, Fragment),
    StreamFinished(AttemptId),
    StreamFailed(AttemptId, GenerationError),
    SandboxFinished(AttemptId, Result<ExecutionResult, String>),
}

impl Event {
    pub fn attempt(&self) -> AttemptId {
        match self {
            Event::Synthesized(attempt, _)
            | Event::StreamDelta(attempt, _)
            | Event::StreamFinished(attempt)
            | Event::StreamFailed(attempt, _)
            | Event::SandboxFinished(attempt, _) => return *attempt,
        }
    }
}
