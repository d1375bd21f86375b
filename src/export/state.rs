use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Progress of a single export.
///
/// ```text
/// Received -> Validated -> Converting -> Merged -> Done
///     \           \             \           \
///      `-----------`-------------`-----------`--> Failed
/// ```
///
/// `Merged -> Failed` covers a merged PDF whose result could not be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    /// Request accepted, nothing checked yet.
    Received,
    /// Validation raised no errors.
    Validated,
    /// Conversion tasks are running.
    Converting,
    /// The merged PDF is on disk.
    Merged,
    /// The result is persisted.
    Done,
    /// Stopped by an error.
    Failed,
}

impl ExportState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_advance_to(self, next: ExportState) -> bool {
        use ExportState::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Validated, Converting)
                | (Converting, Merged)
                | (Merged, Done)
                | (Received | Validated | Converting | Merged, Failed)
        )
    }

    /// Lowercase name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Converting => "converting",
            Self::Merged => "merged",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of one export, logged on every transition.
pub(super) struct StateTracker<'a> {
    export_id: &'a str,
    state: ExportState,
}

impl<'a> StateTracker<'a> {
    pub(super) fn new(export_id: &'a str) -> Self {
        debug!(export_id, state = %ExportState::Received, "Export state");
        Self {
            export_id,
            state: ExportState::Received,
        }
    }

    pub(super) fn advance(&mut self, next: ExportState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal export transition {} -> {next}",
            self.state
        );
        debug!(export_id = self.export_id, from = %self.state, to = %next, "Export state");
        self.state = next;
    }

    pub(super) fn fail(&mut self) {
        self.advance(ExportState::Failed);
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> ExportState {
        self.state
    }
}
