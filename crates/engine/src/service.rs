use slotkit_core::{PriorOccupant, SampleDescriptor, SampleOptions, SlotNumber, VoiceNumber};
use slotkit_storage::{Capabilities, SampleStore, StorageError, StoreReply};
use tracing::{debug, info, warn};

use crate::error::{OperationError, Verb};
use crate::outcome::OperationOutcome;
use crate::recorder::{self, UndoRecorder};

const SCOPE: &str = "Sample management";

/// Single-slot operations on one kit.
pub struct SampleOperations<'a, S: SampleStore> {
    store: Option<&'a mut S>,
    kit_name: &'a str,
    skip_undo_recording: bool,
}

impl<'a, S: SampleStore> SampleOperations<'a, S> {
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

    pub fn add(
        &mut self,
        voice: VoiceNumber,
        slot: SlotNumber,
        source_path: &str,
        options: &SampleOptions,
    ) -> OperationOutcome {
        let (kit_name, record) = (self.kit_name, !self.skip_undo_recording);
        let store = match self.store_with(|c| c.add_sample) {
            Ok(store) => store,
            Err(e) => return failed(e),
        };

        debug!(kit_name, voice = voice.get(), slot = slot.get(), source_path, "adding sample");
        if let Err(e) = settle(
            Verb::Add,
            store.add_sample(kit_name, voice, slot, source_path, options),
        ) {
            return failed(e);
        }

        let undo_action = record.then(|| {
            recorder::add_sample_action(
                kit_name,
                voice,
                slot,
                SampleDescriptor::with_options(source_path, options),
            )
        });
        info!(kit_name, voice = voice.get(), slot = slot.get(), "sample added");
        OperationOutcome::succeeded(
            format!("Sample added to voice {voice}, slot {}", slot.ordinal()),
            undo_action,
        )
    }

    pub fn replace(
        &mut self,
        voice: VoiceNumber,
        slot: SlotNumber,
        source_path: &str,
        options: &SampleOptions,
    ) -> OperationOutcome {
        let (kit_name, record) = (self.kit_name, !self.skip_undo_recording);
        let store = match self.store_with(|c| c.replace_sample) {
            Ok(store) => store,
            Err(e) => return failed(e),
        };

        let old_sample = if record {
            UndoRecorder::new(&*store, kit_name).old_sample_for_undo(voice, slot)
        } else {
            PriorOccupant::Unknown
        };

        debug!(kit_name, voice = voice.get(), slot = slot.get(), source_path, "replacing sample");
        if let Err(e) = settle(
            Verb::Replace,
            store.replace_sample(kit_name, voice, slot, source_path, options),
        ) {
            return failed(e);
        }

        let undo_action = record.then(|| {
            recorder::replace_sample_action(
                kit_name,
                voice,
                slot,
                old_sample,
                SampleDescriptor::with_options(source_path, options),
            )
        });
        info!(kit_name, voice = voice.get(), slot = slot.get(), "sample replaced");
        OperationOutcome::succeeded(
            format!("Sample replaced in voice {voice}, slot {}", slot.ordinal()),
            undo_action,
        )
    }

    /// Delete the sample at `slot`; the store closes the gap by moving every
    /// later sample down one slot.
    pub fn delete(&mut self, voice: VoiceNumber, slot: SlotNumber) -> OperationOutcome {
        let (kit_name, record) = (self.kit_name, !self.skip_undo_recording);
        let store = match self.store_with(|c| c.delete_sample) {
            Ok(store) => store,
            Err(e) => return failed(e),
        };

        let deleted_sample = if record {
            UndoRecorder::new(&*store, kit_name).sample_to_delete_for_undo(voice, slot)
        } else {
            None
        };

        debug!(kit_name, voice = voice.get(), slot = slot.get(), "deleting sample");
        let deleted = match settle(Verb::Delete, store.delete_sample(kit_name, voice, slot)) {
            Ok(data) => data,
            Err(e) => return failed(e),
        };
        let affected = deleted.map(|d| d.affected_samples).unwrap_or_default();

        info!(
            kit_name,
            voice = voice.get(),
            slot = slot.get(),
            reindexed = affected.len(),
            "sample deleted"
        );
        let undo_action = record.then(|| {
            recorder::reindex_samples_action(kit_name, voice, slot, deleted_sample, affected)
        });
        OperationOutcome::succeeded(
            format!("Sample deleted from voice {voice}, slot {}", slot.ordinal()),
            undo_action,
        )
    }

    fn store_with(
        &mut self,
        has: impl Fn(&Capabilities) -> bool,
    ) -> Result<&mut S, OperationError> {
        match self.store.as_deref_mut() {
            Some(store) if has(&store.capabilities()) => Ok(store),
            _ => Err(OperationError::CapabilityMissing { scope: SCOPE }),
        }
    }
}

/// Map a port answer onto the operation error taxonomy.
pub(crate) fn settle<T>(
    verb: Verb,
    result: Result<StoreReply<T>, StorageError>,
) -> Result<Option<T>, OperationError> {
    match result {
        Err(source) => Err(OperationError::Exception { verb, source }),
        Ok(reply) if !reply.success => Err(OperationError::rejected(verb, reply.error)),
        Ok(reply) => Ok(reply.data),
    }
}

pub(crate) fn failed(error: OperationError) -> OperationOutcome {
    warn!(error = %error, "sample operation failed");
    OperationOutcome::failed(error)
}
