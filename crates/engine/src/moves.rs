use slotkit_core::{PlacementMode, SlotNumber, VoiceNumber};
use slotkit_storage::SampleStore;
use tracing::{debug, info, warn};

use crate::error::{OperationError, Verb};
use crate::outcome::OperationOutcome;
use crate::recorder::{self, MoveRequest, UndoRecorder};
use crate::service::{failed, settle};

const IN_KIT_SCOPE: &str = "Sample move";
const CROSS_KIT_SCOPE: &str = "Cross-kit sample move";

/// Relocates a sample between two slot coordinates, within one kit or across kits.
pub struct MoveEngine<'a, S: SampleStore> {
    store: Option<&'a mut S>,
    kit_name: &'a str,
    skip_undo_recording: bool,
}

impl<'a, S: SampleStore> MoveEngine<'a, S> {
    pub fn new(store: Option<&'a mut S>, kit_name: &'a str) -> Self {
        Self {
            store,
            kit_name,
            skip_undo_recording: false,
        }
    }

    pub fn skip_undo_recording(mut self, skip: bool) -> Self {
        self.skip_undo_recording = skip;
        self
    }

    /// Move a sample out of this engine's kit. A `to_kit` naming another kit
    /// selects a cross-kit move.
    pub fn move_sample(
        &mut self,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
        to_kit: Option<&str>,
    ) -> OperationOutcome {
        let from_kit = self.kit_name;
        let request = MoveRequest {
            from_kit,
            from_voice,
            from_slot,
            to_kit: to_kit.unwrap_or(from_kit),
            to_voice,
            to_slot,
            mode,
        };
        if request.to_kit == from_kit {
            self.move_in_kit(&request)
        } else {
            self.move_between_kits(&request)
        }
    }

    fn move_in_kit(&mut self, request: &MoveRequest<'_>) -> OperationOutcome {
        let record = !self.skip_undo_recording;
        let Some(store) = self
            .store
            .as_deref_mut()
            .filter(|s| s.capabilities().move_in_kit)
        else {
            return failed(OperationError::CapabilityMissing {
                scope: IN_KIT_SCOPE,
            });
        };

        // The move may shift several slots in both voices, so keep both whole.
        let snapshot = if record {
            UndoRecorder::new(&*store, request.from_kit)
                .capture_state_snapshot(request.from_voice, request.to_voice)
        } else {
            Vec::new()
        };

        debug!(
            kit = request.from_kit,
            from_voice = request.from_voice.get(),
            from_slot = request.from_slot.get(),
            to_voice = request.to_voice.get(),
            to_slot = request.to_slot.get(),
            mode = request.mode.as_str(),
            "moving sample"
        );
        let moved = match settle(
            Verb::Move,
            store.move_sample_in_kit(
                request.from_kit,
                request.from_voice,
                request.from_slot,
                request.to_voice,
                request.to_slot,
                request.mode,
            ),
        ) {
            Ok(moved) => moved,
            Err(e) => return failed(e),
        };

        let undo_action = match (record, moved) {
            (true, Some(moved)) => Some(recorder::move_sample_action(
                request,
                &moved.moved_sample,
                moved.replaced_sample.as_ref(),
                moved.affected_samples,
                snapshot,
            )),
            (true, None) => {
                warn!(kit = request.from_kit, "move reported no result; undo not recorded");
                None
            }
            (false, _) => None,
        };
        info!(kit = request.from_kit, "sample moved");
        OperationOutcome::succeeded(
            format!(
                "Sample moved from voice {}, slot {} to voice {}, slot {}",
                request.from_voice,
                request.from_slot.ordinal(),
                request.to_voice,
                request.to_slot.ordinal()
            ),
            undo_action,
        )
    }

    fn move_between_kits(&mut self, request: &MoveRequest<'_>) -> OperationOutcome {
        let record = !self.skip_undo_recording;
        let Some(store) = self
            .store
            .as_deref_mut()
            .filter(|s| s.capabilities().move_between_kits)
        else {
            return failed(OperationError::CapabilityMissing {
                scope: CROSS_KIT_SCOPE,
            });
        };

        debug!(
            from_kit = request.from_kit,
            to_kit = request.to_kit,
            from_voice = request.from_voice.get(),
            from_slot = request.from_slot.get(),
            to_voice = request.to_voice.get(),
            to_slot = request.to_slot.get(),
            mode = request.mode.as_str(),
            "moving sample between kits"
        );
        // The store reports every displaced sample with its original slot, so
        // no snapshot is needed here.
        let moved = match settle(
            Verb::Move,
            store.move_sample_between_kits(
                request.from_kit,
                request.from_voice,
                request.from_slot,
                request.to_kit,
                request.to_voice,
                request.to_slot,
                request.mode,
            ),
        ) {
            Ok(moved) => moved,
            Err(e) => return failed(e),
        };

        let undo_action = match (record, moved) {
            (true, Some(moved)) => Some(recorder::move_between_kits_action(
                request,
                &moved.moved_sample,
                moved.replaced_sample.as_ref(),
                moved.affected_samples,
            )),
            (true, None) => {
                warn!(
                    from_kit = request.from_kit,
                    to_kit = request.to_kit,
                    "cross-kit move reported no result; undo not recorded"
                );
                None
            }
            (false, _) => None,
        };
        info!(from_kit = request.from_kit, to_kit = request.to_kit, "sample moved between kits");
        OperationOutcome::succeeded(
            format!(
                "Sample moved from voice {}, slot {} to kit {} voice {}, slot {}",
                request.from_voice,
                request.from_slot.ordinal(),
                request.to_kit,
                request.to_voice,
                request.to_slot.ordinal()
            ),
            undo_action,
        )
    }
}
