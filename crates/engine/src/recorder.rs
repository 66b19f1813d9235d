use slotkit_core::{
    PlacementMode, PriorOccupant, Sample, SampleDescriptor, SlotDelta, SlotNumber, SnapshotEntry,
    UndoAction, UndoKind, VoiceNumber,
};
use slotkit_storage::SampleStore;
use tracing::warn;

/// Reads the state an undo action needs. A failed read is logged and reported
/// as "nothing known"; it never fails the operation that asked.
pub struct UndoRecorder<'a, S: SampleStore> {
    store: &'a S,
    kit_name: &'a str,
}

impl<'a, S: SampleStore> UndoRecorder<'a, S> {
    pub fn new(store: &'a S, kit_name: &'a str) -> Self {
        Self { store, kit_name }
    }

    /// The sample a replace is about to overwrite. `Unknown` when the kit
    /// could not be read, so undo never mistakes it for an empty slot.
    pub fn old_sample_for_undo(&self, voice: VoiceNumber, slot: SlotNumber) -> PriorOccupant {
        let Some(samples) = self.read_kit() else {
            return PriorOccupant::Unknown;
        };
        samples
            .into_iter()
            .find(|s| s.voice == voice && s.slot == slot)
            .map_or(PriorOccupant::Empty, |s| PriorOccupant::Sample(s.descriptor()))
    }

    /// The sample a delete is about to remove.
    pub fn sample_to_delete_for_undo(
        &self,
        voice: VoiceNumber,
        slot: SlotNumber,
    ) -> Option<SampleDescriptor> {
        self.sample_at(voice, slot)
    }

    /// Every sample of the two voices a same-kit move touches, in voice then
    /// slot order. Empty when the kit could not be read.
    pub fn capture_state_snapshot(
        &self,
        from_voice: VoiceNumber,
        to_voice: VoiceNumber,
    ) -> Vec<SnapshotEntry> {
        let Some(samples) = self.read_kit() else {
            return Vec::new();
        };
        samples
            .into_iter()
            .filter(|s| s.voice == from_voice || s.voice == to_voice)
            .map(|s| SnapshotEntry {
                voice: s.voice,
                slot: s.slot,
                filename: s.filename,
                source_path: s.source_path,
                is_stereo: s.is_stereo,
                wav_bitrate: s.wav_bitrate,
                wav_sample_rate: s.wav_sample_rate,
            })
            .collect()
    }

    fn sample_at(&self, voice: VoiceNumber, slot: SlotNumber) -> Option<SampleDescriptor> {
        self.read_kit()?
            .into_iter()
            .find(|s| s.voice == voice && s.slot == slot)
            .map(|s| s.descriptor())
    }

    fn read_kit(&self) -> Option<Vec<Sample>> {
        if !self.store.capabilities().list_samples {
            warn!(kit = self.kit_name, "store cannot list samples; undo state not captured");
            return None;
        }
        match self.store.list_samples_for_kit(self.kit_name) {
            Ok(reply) if reply.success => reply.data,
            Ok(reply) => {
                warn!(
                    kit = self.kit_name,
                    error = reply.error.as_deref().unwrap_or("unknown"),
                    "sample list rejected; undo state not captured"
                );
                None
            }
            Err(e) => {
                warn!(kit = self.kit_name, error = %e, "sample list failed; undo state not captured");
                None
            }
        }
    }
}

pub fn add_sample_action(
    kit_name: &str,
    voice: VoiceNumber,
    slot: SlotNumber,
    sample: SampleDescriptor,
) -> UndoAction {
    UndoAction::new(UndoKind::AddSample {
        kit_name: kit_name.to_string(),
        voice,
        slot,
        sample,
    })
}

pub fn replace_sample_action(
    kit_name: &str,
    voice: VoiceNumber,
    slot: SlotNumber,
    old_sample: PriorOccupant,
    new_sample: SampleDescriptor,
) -> UndoAction {
    UndoAction::new(UndoKind::ReplaceSample {
        kit_name: kit_name.to_string(),
        voice,
        slot,
        old_sample,
        new_sample,
    })
}

pub fn reindex_samples_action(
    kit_name: &str,
    voice: VoiceNumber,
    deleted_slot: SlotNumber,
    deleted_sample: Option<SampleDescriptor>,
    affected: Vec<SlotDelta>,
) -> UndoAction {
    UndoAction::new(UndoKind::ReindexSamples {
        kit_name: kit_name.to_string(),
        voice,
        deleted_slot,
        deleted_sample,
        affected,
    })
}

/// Source and destination of a move, as requested.
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest<'a> {
    pub from_kit: &'a str,
    pub from_voice: VoiceNumber,
    pub from_slot: SlotNumber,
    pub to_kit: &'a str,
    pub to_voice: VoiceNumber,
    pub to_slot: SlotNumber,
    pub mode: PlacementMode,
}

pub fn move_sample_action(
    request: &MoveRequest<'_>,
    moved_sample: &Sample,
    replaced_sample: Option<&Sample>,
    affected: Vec<SlotDelta>,
    snapshot: Vec<SnapshotEntry>,
) -> UndoAction {
    UndoAction::new(UndoKind::MoveSample {
        kit_name: request.from_kit.to_string(),
        from_voice: request.from_voice,
        from_slot: request.from_slot,
        to_voice: request.to_voice,
        to_slot: request.to_slot,
        mode: request.mode,
        moved_sample: moved_sample.descriptor(),
        final_slot: moved_sample.slot,
        replaced_sample: replaced_sample.map(Sample::descriptor),
        affected,
        snapshot,
    })
}

pub fn move_between_kits_action(
    request: &MoveRequest<'_>,
    moved_sample: &Sample,
    replaced_sample: Option<&Sample>,
    affected: Vec<SlotDelta>,
) -> UndoAction {
    UndoAction::new(UndoKind::MoveSampleBetweenKits {
        from_kit: request.from_kit.to_string(),
        from_voice: request.from_voice,
        from_slot: request.from_slot,
        to_kit: request.to_kit.to_string(),
        to_voice: request.to_voice,
        to_slot: request.to_slot,
        mode: request.mode,
        moved_sample: moved_sample.descriptor(),
        final_slot: moved_sample.slot,
        replaced_sample: replaced_sample.map(Sample::descriptor),
        affected,
    })
}
