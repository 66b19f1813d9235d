use serde::{Deserialize, Serialize};
use slotkit_core::{
    PlacementMode, Sample, SampleId, SampleOptions, SlotDelta, SlotNumber, VoiceNumber,
};

use crate::error::StorageError;

/// Envelope every port call answers with. `success: false` is a rejection the
/// store chose to report; an `Err` from the call itself is a failure to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreReply<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> StoreReply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedSample {
    pub sample_id: SampleId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeletedSample {
    /// Samples later in the voice, with the slots they moved between.
    pub affected_samples: Vec<SlotDelta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedSample {
    /// The moved sample at its final position.
    pub moved_sample: Sample,
    pub replaced_sample: Option<Sample>,
    pub affected_samples: Vec<SlotDelta>,
}

/// Which port calls a store actually offers. Callers check this before
/// issuing any call, so a missing capability never costs I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub add_sample: bool,
    pub replace_sample: bool,
    pub delete_sample: bool,
    pub move_in_kit: bool,
    pub move_between_kits: bool,
    pub list_samples: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            add_sample: true,
            replace_sample: true,
            delete_sample: true,
            move_in_kit: true,
            move_between_kits: true,
            list_samples: true,
        }
    }
}

/// Persistence port for kit slot records.
///
/// Implementations must serialize writes per kit: a delete's reindex and an add
/// to the same voice may never interleave. Every mutation must be atomic.
pub trait SampleStore {
    fn capabilities(&self) -> Capabilities;

    fn add_sample(
        &mut self,
        _kit_name: &str,
        _voice: VoiceNumber,
        _slot: SlotNumber,
        _source_path: &str,
        _options: &SampleOptions,
    ) -> Result<StoreReply<AddedSample>, StorageError> {
        Err(StorageError::Unsupported("add_sample"))
    }

    fn replace_sample(
        &mut self,
        _kit_name: &str,
        _voice: VoiceNumber,
        _slot: SlotNumber,
        _source_path: &str,
        _options: &SampleOptions,
    ) -> Result<StoreReply<AddedSample>, StorageError> {
        Err(StorageError::Unsupported("replace_sample"))
    }

    fn delete_sample(
        &mut self,
        _kit_name: &str,
        _voice: VoiceNumber,
        _slot: SlotNumber,
    ) -> Result<StoreReply<DeletedSample>, StorageError> {
        Err(StorageError::Unsupported("delete_sample"))
    }

    fn move_sample_in_kit(
        &mut self,
        _kit_name: &str,
        _from_voice: VoiceNumber,
        _from_slot: SlotNumber,
        _to_voice: VoiceNumber,
        _to_slot: SlotNumber,
        _mode: PlacementMode,
    ) -> Result<StoreReply<MovedSample>, StorageError> {
        Err(StorageError::Unsupported("move_sample_in_kit"))
    }

    #[allow(clippy::too_many_arguments)]
    fn move_sample_between_kits(
        &mut self,
        _from_kit: &str,
        _from_voice: VoiceNumber,
        _from_slot: SlotNumber,
        _to_kit: &str,
        _to_voice: VoiceNumber,
        _to_slot: SlotNumber,
        _mode: PlacementMode,
    ) -> Result<StoreReply<MovedSample>, StorageError> {
        Err(StorageError::Unsupported("move_sample_between_kits"))
    }

    fn list_samples_for_kit(
        &self,
        _kit_name: &str,
    ) -> Result<StoreReply<Vec<Sample>>, StorageError> {
        Err(StorageError::Unsupported("list_samples_for_kit"))
    }
}
