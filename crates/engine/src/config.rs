use serde::{Deserialize, Serialize};

pub const DEFAULT_UNDO_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Undo entries kept before the oldest is dropped.
    pub undo_depth: usize,
    /// Suppress pre-state reads and undo actions, as when replaying history.
    pub skip_undo_recording: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_depth: DEFAULT_UNDO_DEPTH,
            skip_undo_recording: false,
        }
    }
}
