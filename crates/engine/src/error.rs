use std::fmt;

use slotkit_core::CoreError;
use slotkit_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("no store is attached to this session")]
    NoStore,

    #[error("store rejected request: {0}")]
    Rejected(String),

    #[error("replay failed: {0}")]
    ReplayFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Add,
    Replace,
    Delete,
    Move,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Move => "move",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a slot operation did not happen. The display text is the user-facing
/// message.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Arguments were out of range; nothing was sent to the store.
    #[error("Invalid request: {0}")]
    Invalid(#[from] CoreError),

    /// The store lacks the call this operation needs; nothing was sent to it.
    #[error("{scope} not available")]
    CapabilityMissing { scope: &'static str },

    /// The store answered `success: false`.
    #[error("{message}")]
    Rejected { verb: Verb, message: String },

    /// The store call itself failed.
    #[error("Failed to {verb} sample: {source}")]
    Exception {
        verb: Verb,
        #[source]
        source: StorageError,
    },
}

impl OperationError {
    /// A rejection carrying the store's reason, or a generic one when it gave none.
    pub fn rejected(verb: Verb, reason: Option<String>) -> Self {
        let message = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("Failed to {verb} sample"));
        Self::Rejected { verb, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_missing_message() {
        let err = OperationError::CapabilityMissing {
            scope: "Sample management",
        };
        assert_eq!(err.to_string(), "Sample management not available");
    }

    #[test]
    fn rejection_falls_back_to_generic_message() {
        assert_eq!(
            OperationError::rejected(Verb::Delete, None).to_string(),
            "Failed to delete sample"
        );
        assert_eq!(
            OperationError::rejected(Verb::Add, Some("  ".into())).to_string(),
            "Failed to add sample"
        );
        assert_eq!(
            OperationError::rejected(Verb::Add, Some("Kit A0 is locked".into())).to_string(),
            "Kit A0 is locked"
        );
    }

    #[test]
    fn exception_message_is_prefixed() {
        let err = OperationError::Exception {
            verb: Verb::Move,
            source: StorageError::NotFound("kit A0".into()),
        };
        assert_eq!(err.to_string(), "Failed to move sample: not found: kit A0");
    }
}
