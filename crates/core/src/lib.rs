pub mod clock;
pub mod error;
pub mod ids;
pub mod model;
pub mod slots;
pub mod undo_action;

pub use error::CoreError;
pub use ids::*;
pub use model::*;
pub use slots::VoiceSlots;
pub use undo_action::{PriorOccupant, SlotCommand, SlotDelta, SnapshotEntry, UndoAction, UndoKind};
