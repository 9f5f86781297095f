use std::fmt;

use tokio::task::JoinHandle;

use super::FragmentKind;

/// Monotonically increasing identity of a generation attempt. Events carry
/// the id of the attempt that produced them so stale ones can be dropped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(pub u64);

impl AttemptId {
    pub fn next(&self) -> AttemptId {
        return AttemptId(self.0 + 1);
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "#{}", self.0);
    }
}

/// The one in-flight attempt. Dropping the handle does not cancel the task,
/// `abort` must be called.
pub struct GenerationRequest {
    pub attempt: AttemptId,
    pub kind: FragmentKind,
    pub handle: JoinHandle<()>,
}

impl GenerationRequest {
    pub fn abort(self) {
        self.handle.abort();
    }
}
