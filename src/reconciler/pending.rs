use tokio::task::JoinHandle;

use crate::relation::ToggleIntent;
use crate::remote::RemoteError;

/// How the remote side of one toggle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The remote mutation succeeded (or was a harmless duplicate).
    Confirmed { attempts: u32 },
    /// Every attempt failed, or retrying was abandoned.
    Failed {
        error: RemoteError,
        attempts: u32,
        rolled_back: bool,
    },
    /// The remote task was aborted before it finished.
    Cancelled,
}

impl ToggleOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ToggleOutcome::Confirmed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ToggleOutcome::Failed { .. })
    }
}

/// Non-blocking notification published when a toggle's remote mutation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleFailure {
    pub intent: ToggleIntent,
    pub error: RemoteError,
    pub rolled_back: bool,
}

/// Handle to the remote half of a toggle.
///
/// Dropping the handle detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct PendingToggle {
    intent: ToggleIntent,
    handle: JoinHandle<ToggleOutcome>,
}

impl PendingToggle {
    pub(crate) fn new(intent: ToggleIntent, handle: JoinHandle<ToggleOutcome>) -> Self {
        Self { intent, handle }
    }

    pub fn intent(&self) -> &ToggleIntent {
        &self.intent
    }

    /// Cancel the remote call. Local state keeps the optimistic value.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the remote call to settle.
    pub async fn outcome(self) -> ToggleOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => ToggleOutcome::Cancelled,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}
