use slotkit_core::UndoAction;

use crate::error::OperationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug)]
pub enum OutcomeStatus {
    Succeeded,
    Failed(OperationError),
}

/// What a slot operation produced, for the caller to act on: a message to show,
/// an undo action to keep and whether its cached sample views are stale.
#[derive(Debug)]
pub struct OperationOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    pub severity: Severity,
    pub undo_action: Option<UndoAction>,
    pub samples_changed: bool,
}

impl OperationOutcome {
    pub fn succeeded(message: String, undo_action: Option<UndoAction>) -> Self {
        Self {
            status: OutcomeStatus::Succeeded,
            message,
            severity: Severity::Success,
            undo_action,
            samples_changed: true,
        }
    }

    pub fn failed(error: OperationError) -> Self {
        Self {
            message: error.to_string(),
            status: OutcomeStatus::Failed(error),
            severity: Severity::Error,
            undo_action: None,
            samples_changed: false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }

    pub fn error(&self) -> Option<&OperationError> {
        match &self.status {
            OutcomeStatus::Failed(e) => Some(e),
            OutcomeStatus::Succeeded => None,
        }
    }
}
