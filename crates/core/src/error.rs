use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid voice number {0} (expected 1-4)")]
    InvalidVoice(u8),

    #[error("invalid slot number {0} (expected 0-11)")]
    InvalidSlot(u8),

    #[error("voice {voice} is full")]
    VoiceFull { voice: u8 },

    #[error("slot {slot} would leave a gap in voice {voice}")]
    SlotGap { voice: u8, slot: u8 },

    #[error("slot {slot} of voice {voice} is empty")]
    SlotEmpty { voice: u8, slot: u8 },

    #[error("slot {slot} of voice {voice} is occupied more than once")]
    DuplicateSlot { voice: u8, slot: u8 },

    #[error("sample {path} already exists in voice {voice}")]
    DuplicatePath { voice: u8, path: String },

    #[error("invalid placement mode: {0}")]
    InvalidPlacementMode(String),

    #[error("action cannot be reversed: {0}")]
    Irreversible(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
