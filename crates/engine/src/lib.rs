pub mod config;
pub mod error;
pub mod moves;
pub mod outcome;
pub mod recorder;
pub mod service;
pub mod undo;

pub use config::EngineConfig;
pub use error::{EngineError, OperationError, Verb};
pub use moves::MoveEngine;
pub use outcome::{OperationOutcome, OutcomeStatus, Severity};
pub use recorder::UndoRecorder;
pub use service::SampleOperations;
pub use undo::UndoManager;

use slotkit_core::{
    PlacementMode, Sample, SampleOptions, SlotNumber, UndoAction, UndoActionId, VoiceNumber,
};
use slotkit_storage::SampleStore;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoResult {
    Applied(UndoActionId),
    Empty,
}

/// Slot editing for one kit at a time, with its undo history.
///
/// Each `handle_*` call runs one operation and returns its outcome; a
/// successful undo-eligible operation also lands on the undo stack and clears
/// the redo stack.
pub struct KitSession<S: SampleStore> {
    kit_name: String,
    store: Option<S>,
    config: EngineConfig,
    undo_manager: UndoManager,
}

impl<S: SampleStore> KitSession<S> {
    pub fn new(kit_name: &str, store: S) -> Self {
        Self::with_config(kit_name, Some(store), EngineConfig::default())
    }

    pub fn with_config(kit_name: &str, store: Option<S>, config: EngineConfig) -> Self {
        Self {
            kit_name: kit_name.to_string(),
            store,
            undo_manager: UndoManager::new(config.undo_depth),
            config,
        }
    }

    /// A session with no store behind it; every operation reports unavailable.
    pub fn unwired(kit_name: &str) -> Self {
        Self::with_config(kit_name, None, EngineConfig::default())
    }

    pub fn kit_name(&self) -> &str {
        &self.kit_name
    }

    /// Switch the kit subsequent operations address. History is kept, since
    /// every action names the kit it touched.
    pub fn select_kit(&mut self, kit_name: &str) {
        self.kit_name = kit_name.to_string();
    }

    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> Option<&mut S> {
        self.store.as_mut()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_skip_undo_recording(&mut self, skip: bool) {
        self.config.skip_undo_recording = skip;
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo_manager
    }

    pub fn handle_sample_add(
        &mut self,
        voice: u8,
        slot: u8,
        source_path: &str,
        options: Option<&SampleOptions>,
    ) -> OperationOutcome {
        let (voice, slot) = match coordinates(voice, slot) {
            Ok(c) => c,
            Err(e) => return service::failed(e),
        };
        let options = options.cloned().unwrap_or_default();
        let outcome = self
            .operations()
            .add(voice, slot, source_path, &options);
        self.record(outcome)
    }

    pub fn handle_sample_replace(
        &mut self,
        voice: u8,
        slot: u8,
        source_path: &str,
        options: Option<&SampleOptions>,
    ) -> OperationOutcome {
        let (voice, slot) = match coordinates(voice, slot) {
            Ok(c) => c,
            Err(e) => return service::failed(e),
        };
        let options = options.cloned().unwrap_or_default();
        let outcome = self
            .operations()
            .replace(voice, slot, source_path, &options);
        self.record(outcome)
    }

    pub fn handle_sample_delete(&mut self, voice: u8, slot: u8) -> OperationOutcome {
        let (voice, slot) = match coordinates(voice, slot) {
            Ok(c) => c,
            Err(e) => return service::failed(e),
        };
        let outcome = self.operations().delete(voice, slot);
        self.record(outcome)
    }

    pub fn handle_sample_move(
        &mut self,
        from_voice: u8,
        from_slot: u8,
        to_voice: u8,
        to_slot: u8,
        mode: PlacementMode,
        to_kit: Option<&str>,
    ) -> OperationOutcome {
        let coords = coordinates(from_voice, from_slot)
            .and_then(|from| coordinates(to_voice, to_slot).map(|to| (from, to)));
        let ((from_voice, from_slot), (to_voice, to_slot)) = match coords {
            Ok(c) => c,
            Err(e) => return service::failed(e),
        };
        let skip = self.config.skip_undo_recording;
        let outcome = MoveEngine::new(self.store.as_mut(), &self.kit_name)
            .skip_undo_recording(skip)
            .move_sample(from_voice, from_slot, to_voice, to_slot, mode, to_kit);
        self.record(outcome)
    }

    /// Reverse the most recent recorded action.
    pub fn undo(&mut self) -> Result<UndoResult, EngineError> {
        let Some(action) = self.undo_manager.pop_undo() else {
            return Ok(UndoResult::Empty);
        };
        let store = self.store.as_mut().ok_or(EngineError::NoStore)?;
        undo::replay(store, &action.undo_commands()?)?;
        info!(action = action.type_name(), description = %action.description, "undone");
        let id = action.id;
        self.undo_manager.push_redo(action);
        Ok(UndoResult::Applied(id))
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self) -> Result<UndoResult, EngineError> {
        let Some(action) = self.undo_manager.pop_redo() else {
            return Ok(UndoResult::Empty);
        };
        let store = self.store.as_mut().ok_or(EngineError::NoStore)?;
        undo::replay(store, &action.redo_commands())?;
        info!(action = action.type_name(), description = %action.description, "redone");
        let id = action.id;
        self.undo_manager.push_undo(action);
        Ok(UndoResult::Applied(id))
    }

    pub fn samples_for_kit(&self) -> Result<Vec<Sample>, EngineError> {
        let store = self.store.as_ref().ok_or(EngineError::NoStore)?;
        let reply = store.list_samples_for_kit(&self.kit_name)?;
        if !reply.success {
            return Err(EngineError::Rejected(reply.error.unwrap_or_else(|| {
                format!("could not list samples of kit {}", self.kit_name)
            })));
        }
        Ok(reply.data.unwrap_or_default())
    }

    pub fn samples_for_voice(&self, voice: VoiceNumber) -> Result<Vec<Sample>, EngineError> {
        Ok(self
            .samples_for_kit()?
            .into_iter()
            .filter(|s| s.voice == voice)
            .collect())
    }

    /// Occupied slot numbers of a voice, ascending.
    pub fn voice_occupancy(&self, voice: VoiceNumber) -> Result<Vec<SlotNumber>, EngineError> {
        let mut slots: Vec<SlotNumber> = self
            .samples_for_voice(voice)?
            .into_iter()
            .map(|s| s.slot)
            .collect();
        slots.sort();
        Ok(slots)
    }

    fn operations(&mut self) -> SampleOperations<'_, S> {
        SampleOperations::new(self.store.as_mut(), &self.kit_name)
            .skip_undo_recording(self.config.skip_undo_recording)
    }

    fn record(&mut self, outcome: OperationOutcome) -> OperationOutcome {
        if let Some(action) = &outcome.undo_action {
            self.push_action(action.clone());
        }
        outcome
    }

    fn push_action(&mut self, action: UndoAction) {
        self.undo_manager.push_undo(action);
        self.undo_manager.clear_redo();
    }
}

fn coordinates(voice: u8, slot: u8) -> Result<(VoiceNumber, SlotNumber), OperationError> {
    Ok((VoiceNumber::new(voice)?, SlotNumber::new(slot)?))
}
